// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{
	_prelude::*,
	obs::{FlowKind, FlowOutcome},
};

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"dealer_storefront_flow_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Lock-free counters describing order submissions and their status polls.
#[derive(Debug, Default)]
pub struct PollMetrics {
	submissions: AtomicU64,
	polls: AtomicU64,
	approvals: AtomicU64,
	rejections: AtomicU64,
	timeouts: AtomicU64,
}
impl PollMetrics {
	/// Records an order submission attempt.
	pub fn record_submission(&self) {
		self.submissions.fetch_add(1, Ordering::Relaxed);
	}

	/// Records a single status poll.
	pub fn record_poll(&self) {
		self.polls.fetch_add(1, Ordering::Relaxed);
	}

	/// Records an approved order.
	pub fn record_approval(&self) {
		self.approvals.fetch_add(1, Ordering::Relaxed);
	}

	/// Records a rejected submission or declined order.
	pub fn record_rejection(&self) {
		self.rejections.fetch_add(1, Ordering::Relaxed);
	}

	/// Records a poll loop that ran out of budget.
	pub fn record_timeout(&self) {
		self.timeouts.fetch_add(1, Ordering::Relaxed);
	}

	/// Returns a point-in-time copy of every counter.
	pub fn snapshot(&self) -> PollMetricsSnapshot {
		PollMetricsSnapshot {
			submissions: self.submissions.load(Ordering::Relaxed),
			polls: self.polls.load(Ordering::Relaxed),
			approvals: self.approvals.load(Ordering::Relaxed),
			rejections: self.rejections.load(Ordering::Relaxed),
			timeouts: self.timeouts.load(Ordering::Relaxed),
		}
	}
}

/// Snapshot returned by [`PollMetrics::snapshot`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PollMetricsSnapshot {
	/// Submissions attempted.
	pub submissions: u64,
	/// Status polls issued.
	pub polls: u64,
	/// Orders approved.
	pub approvals: u64,
	/// Submissions rejected or orders declined.
	pub rejections: u64,
	/// Poll loops that exhausted their budget.
	pub timeouts: u64,
}
