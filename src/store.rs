//! Storage contract and built-in backends for the session's string slots.
//!
//! The storefront persists a handful of plain strings: the correlation code, the captcha
//! secret, the bearer token, the cached profile JSON, and the current order selection. There is
//! no local expiry; a value lives until a flow clears it.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::_prelude::*;

/// Boxed future returned by [`SessionStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Key-value backend shared by every storefront flow.
///
/// Writes must be durable once the returned future resolves; flows read back what they wrote
/// without any further synchronization.
pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Reads the value stored in `slot`, if any.
	fn get(&self, slot: StoreSlot) -> StoreFuture<'_, Option<String>>;

	/// Stores `value` in `slot`, replacing any previous value.
	fn set(&self, slot: StoreSlot, value: String) -> StoreFuture<'_, ()>;

	/// Removes every listed slot. Missing slots are ignored.
	fn clear<'a>(&'a self, slots: &'a [StoreSlot]) -> StoreFuture<'a, ()>;
}

/// Named storage slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StoreSlot {
	/// Correlation code shared with the identity provider.
	#[serde(rename = "rcode")]
	CorrelationCode,
	/// Secret returned by the captcha check.
	#[serde(rename = "secret")]
	CaptchaSecret,
	/// Bearer token returned by the token exchange.
	#[serde(rename = "oauth2_token")]
	BearerToken,
	/// Cached profile JSON.
	#[serde(rename = "profile")]
	Profile,
	/// Selected vehicle modification.
	#[serde(rename = "modification_id")]
	ModificationId,
	/// Selected body color.
	#[serde(rename = "color_id")]
	ColorId,
	/// Selected dealer.
	#[serde(rename = "dealer_id")]
	DealerId,
}
impl StoreSlot {
	/// Slots wiped when the backend rejects the session.
	pub const CREDENTIALS: [StoreSlot; 4] = [
		StoreSlot::CorrelationCode,
		StoreSlot::CaptchaSecret,
		StoreSlot::BearerToken,
		StoreSlot::Profile,
	];
	/// Slots holding the order selection.
	pub const SELECTION: [StoreSlot; 3] =
		[StoreSlot::ModificationId, StoreSlot::ColorId, StoreSlot::DealerId];

	/// Storage key used by persistent backends.
	pub const fn key(self) -> &'static str {
		match self {
			StoreSlot::CorrelationCode => "rcode",
			StoreSlot::CaptchaSecret => "secret",
			StoreSlot::BearerToken => "oauth2_token",
			StoreSlot::Profile => "profile",
			StoreSlot::ModificationId => "modification_id",
			StoreSlot::ColorId => "color_id",
			StoreSlot::DealerId => "dealer_id",
		}
	}
}
impl Display for StoreSlot {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.key())
	}
}

/// Error type produced by [`SessionStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn slot_keys_match_serde_names() {
		for slot in StoreSlot::CREDENTIALS.into_iter().chain(StoreSlot::SELECTION) {
			let payload = serde_json::to_string(&slot).expect("Slot should serialize.");

			assert_eq!(payload, format!("\"{}\"", slot.key()));
		}

		assert_eq!(StoreSlot::BearerToken.to_string(), "oauth2_token");
	}
}
