//! Order status codes and the shapes returned by the status and order-list endpoints.

// crates.io
use serde::Deserializer;
// self
use crate::{_prelude::*, backend::lenient};

/// Status of a submitted order as reported by the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum OrderStatus {
	/// Code `1`.
	Approved,
	/// Code `-1`.
	Declined,
	/// Code `-2`.
	Failed,
	/// Any other code; the order is still being processed.
	Pending(String),
}
impl OrderStatus {
	/// Classifies a raw backend code.
	pub fn from_code(code: &str) -> Self {
		match code.trim() {
			"1" => Self::Approved,
			"-1" => Self::Declined,
			"-2" => Self::Failed,
			other => Self::Pending(other.to_owned()),
		}
	}

	/// Returns `true` for codes that end polling.
	pub fn is_terminal(&self) -> bool {
		!matches!(self, Self::Pending(_))
	}
}

/// Body of a status poll.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct OrderStatusReport {
	/// Classified status.
	#[serde(deserialize_with = "status_code")]
	pub status: OrderStatus,
	/// Backend-provided explanation, mostly present on rejection.
	#[serde(default)]
	pub message: Option<String>,
}

/// Entry of the authenticated order list.
///
/// Only a few fields are typed; everything else is kept verbatim in `details`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct OrderSummary {
	/// Order identifier.
	#[serde(default, alias = "order_id", deserialize_with = "lenient::optional_text")]
	pub id: Option<String>,
	/// Ordered modification.
	#[serde(default, deserialize_with = "lenient::optional_text")]
	pub modification_id: Option<String>,
	/// Raw status code.
	#[serde(default, deserialize_with = "lenient::optional_text")]
	pub status: Option<String>,
	/// Remaining fields.
	#[serde(flatten)]
	pub details: BTreeMap<String, serde_json::Value>,
}

/// Order list body: either a bare array or wrapped in `data`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum OrderListReply {
	Bare(Vec<OrderSummary>),
	Wrapped { data: Vec<OrderSummary> },
}
impl OrderListReply {
	pub(crate) fn into_orders(self) -> Vec<OrderSummary> {
		match self {
			Self::Bare(orders) | Self::Wrapped { data: orders } => orders,
		}
	}
}

fn status_code<'de, D>(deserializer: D) -> Result<OrderStatus, D::Error>
where
	D: Deserializer<'de>,
{
	lenient::text(deserializer).map(|code| OrderStatus::from_code(&code))
}
