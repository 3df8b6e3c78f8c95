// std
use std::{env, process};
// self
use dealer_storefront::store::{FileStore, MemoryStore, SessionStore, StoreSlot};

#[tokio::test]
async fn memory_store_clears_only_requested_slots() {
	let store = MemoryStore::default();

	for (slot, value) in [
		(StoreSlot::CorrelationCode, "abc"),
		(StoreSlot::BearerToken, "tok"),
		(StoreSlot::DealerId, "d-3"),
	] {
		store.set(slot, value.to_owned()).await.expect("Write should succeed.");
	}

	store.clear(&StoreSlot::CREDENTIALS).await.expect("Clear should succeed.");

	assert_eq!(store.get(StoreSlot::BearerToken).await.expect("Read should succeed."), None);
	assert_eq!(
		store.get(StoreSlot::DealerId).await.expect("Read should succeed.").as_deref(),
		Some("d-3")
	);
}

#[tokio::test]
async fn file_store_survives_reopen_and_clear() {
	let path = env::temp_dir().join(format!("dealer-storefront-it-{}.json", process::id()));
	let store = FileStore::open(&path).expect("Store should open.");

	store.set(StoreSlot::CorrelationCode, "abc".into()).await.expect("Write should succeed.");
	store.set(StoreSlot::ColorId, "c-7".into()).await.expect("Write should succeed.");
	store.clear(&StoreSlot::SELECTION).await.expect("Clear should succeed.");

	let reopened = FileStore::open(&path).expect("Store should reopen.");

	assert_eq!(
		reopened.get(StoreSlot::CorrelationCode).await.expect("Read should succeed.").as_deref(),
		Some("abc")
	);
	assert_eq!(reopened.get(StoreSlot::ColorId).await.expect("Read should succeed."), None);

	let _ = std::fs::remove_file(&path);
}
