//! Optional observability helpers for storefront flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `dealer_storefront.flow` with the `flow`
//!   and `stage` (call site) fields, plus warning and debug events for failures that a flow
//!   swallows into an outcome value.
//! - Enable `metrics` to increment the `dealer_storefront_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`.

mod counter;
mod span;

pub use counter::*;
pub use span::*;

pub(crate) use span::{flow_debug, flow_warn};

// self
use crate::_prelude::*;

/// Storefront flows observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Captcha challenge and verification.
	Captcha,
	/// Secret → bearer token exchange.
	Handshake,
	/// Session restoration and re-authentication.
	Session,
	/// Order submission and status polling.
	Order,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Captcha => "captcha",
			FlowKind::Handshake => "handshake",
			FlowKind::Session => "session",
			FlowKind::Order => "order",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a storefront operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure, whether propagated or folded into an outcome value.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
