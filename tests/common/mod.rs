#![allow(dead_code)]

// std
use std::sync::{Arc, Mutex};
// crates.io
use httpmock::MockServer;
// self
use dealer_storefront::{
	backend::{DefaultBackendStrategy, ReqwestTransportErrorMapper},
	config::StorefrontConfig,
	ext::Navigator,
	flows::{ReqwestStorefront, Storefront},
	http::ReqwestHttpClient,
	reqwest::Client,
	store::{MemoryStore, SessionStore, StoreSlot},
	url::Url,
};

/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
/// `httpmock` during tests.
pub fn test_reqwest_http_client() -> ReqwestHttpClient {
	let client = Client::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.redirect(dealer_storefront::reqwest::redirect::Policy::none())
		.build()
		.expect("Failed to build insecure Reqwest client for tests.");

	ReqwestHttpClient::with_client(client)
}

/// Config whose identity and API bases live on the mock server.
pub fn mock_config(server: &MockServer) -> StorefrontConfig {
	StorefrontConfig::builder()
		.identity_base(
			Url::parse(&server.url("/oneid/")).expect("Mock identity base should parse."),
		)
		.api_base(Url::parse(&server.url("/api/")).expect("Mock API base should parse."))
		.build()
		.expect("Mock config should build.")
}

/// Navigator that records in-app navigation requests.
#[derive(Clone, Debug, Default)]
pub struct Visits(Arc<Mutex<Vec<String>>>);
impl Visits {
	pub fn paths(&self) -> Vec<String> {
		self.0.lock().expect("Visits lock should not be poisoned.").clone()
	}
}
impl Navigator for Visits {
	fn navigate(&self, path: &str) {
		self.0.lock().expect("Visits lock should not be poisoned.").push(path.to_owned());
	}

	fn redirect(&self, _: &Url) {}
}

/// Constructs a [`Storefront`] backed by an in-memory store and the reqwest transport.
pub fn build_reqwest_test_storefront(
	config: StorefrontConfig,
) -> (ReqwestStorefront, Arc<MemoryStore>, Visits) {
	let store_backend = Arc::new(MemoryStore::default());
	let store: Arc<dyn SessionStore> = store_backend.clone();
	let visits = Visits::default();
	let storefront = Storefront::with_http_client(
		store,
		config,
		Arc::new(DefaultBackendStrategy),
		test_reqwest_http_client(),
		Arc::new(ReqwestTransportErrorMapper),
	)
	.with_navigator(Arc::new(visits.clone()));

	(storefront, store_backend, visits)
}

/// Writes the given slots into the store.
pub async fn seed(store: &MemoryStore, slots: &[(StoreSlot, &str)]) {
	for (slot, value) in slots {
		store.set(*slot, (*value).to_owned()).await.expect("Seeding the store should succeed.");
	}
}

/// Reads a slot straight from the in-memory backend.
pub fn slot(store: &MemoryStore, slot: StoreSlot) -> Option<String> {
	store.snapshot().get(&slot).cloned()
}
