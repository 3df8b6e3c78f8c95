//! Order submission and status polling.
//!
//! A submission walks [`OrderState`] from `Idle` through `Submitting` and `Polling` to one of
//! the terminal states. Submission is never retried: a refused captcha is final for that
//! attempt. Polling is bounded by the configured budget and waits the configured interval
//! between two non-terminal polls, never after the last one. Dropping the future abandons the
//! loop; the tracker keeps the last published state.

pub mod selection;
pub mod status;

pub use selection::*;
pub use status::*;

// self
use crate::{
	_prelude::*,
	auth::{CorrelationCode, Secret},
	backend::{ApiRequest, HEADER_CORRELATION, HEADER_TOKEN, Operation, TransportErrorMapper},
	flows::{Storefront, session::FacilityBody},
	http::ApiHttpClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Progress of the current (or last) order submission.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum OrderState {
	/// Nothing submitted yet.
	#[default]
	Idle,
	/// The order request is in flight.
	Submitting,
	/// Waiting for the backend to settle the order.
	Polling {
		/// 1-based number of the poll in flight.
		attempt: u32,
	},
	/// The backend approved the order.
	Approved,
	/// The submission or the order was refused.
	Rejected,
	/// The poll budget ran out before a terminal status arrived.
	TimedOut,
}
impl OrderState {
	/// Returns `true` for `Approved`, `Rejected`, and `TimedOut`.
	pub fn is_terminal(self) -> bool {
		matches!(self, Self::Approved | Self::Rejected | Self::TimedOut)
	}
}

/// Why an order ended in [`OrderState::Rejected`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RejectionReason {
	/// The submission was refused, most often because the captcha did not match.
	InvalidCaptcha,
	/// The submission never reached the backend.
	ServiceUnavailable,
	/// Status `-1`.
	Declined {
		/// Backend-provided explanation.
		message: Option<String>,
	},
	/// Status `-2`.
	Failed {
		/// Backend-provided explanation.
		message: Option<String>,
	},
}
impl RejectionReason {
	/// User-facing explanation.
	pub fn message(&self) -> String {
		match self {
			Self::InvalidCaptcha => "The captcha is invalid. Please try again.".into(),
			Self::ServiceUnavailable =>
				"The service is temporarily unavailable. Please try again later.".into(),
			Self::Declined { message } | Self::Failed { message } => message
				.as_deref()
				.map(str::trim)
				.filter(|text| !text.is_empty())
				.unwrap_or("The order could not be completed.")
				.to_owned(),
		}
	}
}

/// Terminal result of [`Storefront::submit_order`].
#[derive(Clone, Debug, PartialEq)]
pub enum OrderOutcome {
	/// The order was approved and the user was sent to the profile view.
	Approved {
		/// Refreshed order list; `None` when it could not be fetched.
		orders: Option<Vec<OrderSummary>>,
	},
	/// The submission or the order was refused.
	Rejected(RejectionReason),
	/// No terminal status arrived within the poll budget.
	TimedOut {
		/// Polls issued before giving up.
		attempts: u32,
	},
}
impl OrderOutcome {
	/// State published for this outcome.
	pub fn state(&self) -> OrderState {
		match self {
			Self::Approved { .. } => OrderState::Approved,
			Self::Rejected(_) => OrderState::Rejected,
			Self::TimedOut { .. } => OrderState::TimedOut,
		}
	}

	/// User-facing explanation.
	pub fn message(&self) -> String {
		match self {
			Self::Approved { .. } => "The order was approved.".into(),
			Self::Rejected(reason) => reason.message(),
			Self::TimedOut { .. } =>
				"The order is still being processed. Please check your orders later.".into(),
		}
	}
}

/// Shared container for the order state machine.
#[derive(Debug, Default)]
pub struct OrderTracker {
	state: RwLock<OrderState>,
	last_outcome: RwLock<Option<OrderOutcome>>,
	in_flight: AsyncMutex<()>,
}
impl OrderTracker {
	/// Current state.
	pub fn state(&self) -> OrderState {
		*self.state.read()
	}

	/// Outcome of the most recent finished submission.
	pub fn last_outcome(&self) -> Option<OrderOutcome> {
		self.last_outcome.read().clone()
	}

	fn publish(&self, state: OrderState) {
		*self.state.write() = state;
	}

	fn settle(&self, outcome: &OrderOutcome) {
		self.publish(outcome.state());
		*self.last_outcome.write() = Some(outcome.clone());
	}
}

#[derive(Serialize)]
struct SubmitBody<'a> {
	modification_id: &'a str,
	color_id: &'a str,
	dealer_id: &'a str,
	filial_id: u32,
	captcha: &'a str,
}

impl<C, M> Storefront<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Submits the persisted selection with a solved captcha and polls until the order
	/// settles.
	///
	/// Precondition failures ([`Error::MissingData`], [`Error::OrderInFlight`],
	/// [`Error::Unauthenticated`]) return before anything is sent and leave the tracker as it
	/// was. Once the submission is sent, every remote failure folds into the outcome.
	pub async fn submit_order(&self, captcha: &str) -> Result<OrderOutcome> {
		const KIND: FlowKind = FlowKind::Order;

		let span = FlowSpan::new(KIND, "submit_order");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.submit_order_inner(captcha.trim())).await;

		match &result {
			Ok(OrderOutcome::Approved { .. }) =>
				obs::record_flow_outcome(KIND, FlowOutcome::Success),
			_ => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn submit_order_inner(&self, captcha: &str) -> Result<OrderOutcome> {
		if captcha.is_empty() {
			return Err(Error::MissingData { field: "captcha" });
		}

		let selection = self.order_selection().await?;

		selection.validate()?;

		let Some(_in_flight) = self.orders.in_flight.try_lock() else {
			return Err(Error::OrderInFlight);
		};
		let Some((code, token)) = self.stored_credentials().await? else {
			return Err(Error::Unauthenticated);
		};
		let request =
			ApiRequest::post(Operation::OrderSubmit, self.config.endpoints.order_submit.clone())
				.header(HEADER_CORRELATION, code.as_str())
				.header(HEADER_TOKEN, token.expose())
				.json(&SubmitBody {
					modification_id: &selection.modification_id,
					color_id: &selection.color_id,
					dealer_id: &selection.dealer_id,
					filial_id: self.config.facility_id,
					captcha,
				})?;

		self.poll_metrics.record_submission();
		self.orders.publish(OrderState::Submitting);

		if let Err(e) = self.send(request).await {
			obs::flow_warn!("order submission refused: {e}");

			let reason = match e {
				Error::Transport(_) => RejectionReason::ServiceUnavailable,
				_ => RejectionReason::InvalidCaptcha,
			};

			return Ok(self.finish(OrderOutcome::Rejected(reason)));
		}

		let outcome = self.poll_until_settled(&selection.modification_id, &code, &token).await;

		Ok(self.finish(outcome))
	}

	async fn poll_until_settled(
		&self,
		modification_id: &str,
		code: &CorrelationCode,
		token: &Secret,
	) -> OrderOutcome {
		let budget = self.config.poll_budget;
		let interval = self.config.poll_interval.unsigned_abs();

		for attempt in 1..=budget {
			self.orders.publish(OrderState::Polling { attempt });
			self.poll_metrics.record_poll();

			match self.fetch_order_status(modification_id, code).await {
				Ok(OrderStatusReport { status: OrderStatus::Approved, .. }) => {
					let orders = match self.fetch_orders(code, token).await {
						Ok(orders) => Some(orders),
						Err(e) => {
							obs::flow_warn!("order list fetch failed after approval: {e}");

							None
						},
					};

					self.navigator.navigate(&self.config.profile_path);

					return OrderOutcome::Approved { orders };
				},
				Ok(OrderStatusReport { status: OrderStatus::Declined, message }) =>
					return OrderOutcome::Rejected(RejectionReason::Declined { message }),
				Ok(OrderStatusReport { status: OrderStatus::Failed, message }) =>
					return OrderOutcome::Rejected(RejectionReason::Failed { message }),
				Ok(OrderStatusReport { status: OrderStatus::Pending(raw), .. }) => {
					obs::flow_debug!("order pending with status {raw} after poll {attempt}");
				},
				Err(e) => {
					obs::flow_warn!("status poll {attempt} failed: {e}");
				},
			}

			if attempt < budget {
				tokio::time::sleep(interval).await;
			}
		}

		OrderOutcome::TimedOut { attempts: budget }
	}

	fn finish(&self, outcome: OrderOutcome) -> OrderOutcome {
		match &outcome {
			OrderOutcome::Approved { .. } => self.poll_metrics.record_approval(),
			OrderOutcome::Rejected(_) => self.poll_metrics.record_rejection(),
			OrderOutcome::TimedOut { .. } => self.poll_metrics.record_timeout(),
		}

		self.orders.settle(&outcome);

		outcome
	}

	/// Fetches the status of the order placed for `modification_id` once.
	pub async fn order_status(&self, modification_id: &str) -> Result<OrderStatusReport> {
		if modification_id.trim().is_empty() {
			return Err(Error::MissingData { field: "modification id" });
		}

		let Some(code) = self.stored_code().await? else {
			return Err(Error::Unauthenticated);
		};

		self.fetch_order_status(modification_id.trim(), &code).await
	}

	/// Fetches the authenticated user's order list.
	pub async fn orders(&self) -> Result<Vec<OrderSummary>> {
		let Some((code, token)) = self.stored_credentials().await? else {
			return Err(Error::Unauthenticated);
		};

		self.fetch_orders(&code, &token).await
	}

	// The status endpoint takes the correlation code as its `token` query parameter.
	async fn fetch_order_status(
		&self,
		modification_id: &str,
		code: &CorrelationCode,
	) -> Result<OrderStatusReport> {
		let request =
			ApiRequest::get(Operation::OrderStatus, self.config.endpoints.order_status.clone())
				.query("modification_id", modification_id)
				.query(HEADER_TOKEN, code.as_str());

		self.dispatch(request).await
	}

	async fn fetch_orders(
		&self,
		code: &CorrelationCode,
		token: &Secret,
	) -> Result<Vec<OrderSummary>> {
		let request =
			ApiRequest::post(Operation::OrderList, self.config.endpoints.order_list.clone())
				.header(HEADER_CORRELATION, code.as_str())
				.header(HEADER_TOKEN, token.expose())
				.json(&FacilityBody { filial_id: self.config.facility_id })?;

		self.dispatch::<OrderListReply>(request).await.map(OrderListReply::into_orders)
	}
}
