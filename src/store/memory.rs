//! Thread-safe in-memory [`SessionStore`] implementation for tests and short-lived sessions.

// self
use crate::{
	_prelude::*,
	store::{SessionStore, StoreError, StoreFuture, StoreSlot},
};

type SlotMap = Arc<RwLock<HashMap<StoreSlot, String>>>;

/// Storage backend that keeps slots in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(SlotMap);
impl MemoryStore {
	/// Returns a copy of every populated slot.
	pub fn snapshot(&self) -> HashMap<StoreSlot, String> {
		self.0.read().clone()
	}

	fn clear_now(map: SlotMap, slots: &[StoreSlot]) -> Result<(), StoreError> {
		let mut guard = map.write();

		for slot in slots {
			guard.remove(slot);
		}

		Ok(())
	}
}
impl SessionStore for MemoryStore {
	fn get(&self, slot: StoreSlot) -> StoreFuture<'_, Option<String>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().get(&slot).cloned()) })
	}

	fn set(&self, slot: StoreSlot, value: String) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().insert(slot, value);

			Ok(())
		})
	}

	fn clear<'a>(&'a self, slots: &'a [StoreSlot]) -> StoreFuture<'a, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::clear_now(map, slots) })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn set_get_and_clear() {
		let store = MemoryStore::default();

		store
			.set(StoreSlot::CorrelationCode, "abc123".into())
			.await
			.expect("Writing the correlation code should succeed.");
		store
			.set(StoreSlot::DealerId, "7".into())
			.await
			.expect("Writing the dealer id should succeed.");

		assert_eq!(
			store.get(StoreSlot::CorrelationCode).await.expect("Read should succeed."),
			Some("abc123".into())
		);

		store.clear(&StoreSlot::CREDENTIALS).await.expect("Clearing credentials should succeed.");

		assert_eq!(store.get(StoreSlot::CorrelationCode).await.expect("Read should succeed."), None);
		assert_eq!(store.snapshot().get(&StoreSlot::DealerId).map(String::as_str), Some("7"));
	}
}
