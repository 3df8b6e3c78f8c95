//! Dealership storefront client core: captcha-gated identity handshakes, self-healing sessions,
//! and polled purchase orders over a typed async API.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod ext;
pub mod flows;
pub mod http;
pub mod obs;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and scripted fakes for tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::collections::VecDeque;
	// crates.io
	use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
	// self
	use crate::{
		backend::{Operation, TransportErrorMapper},
		config::StorefrontConfig,
		error::{TransientError, TransportError},
		ext::Navigator,
		flows::Storefront,
		http::{ApiHttpClient, ResponseMetadata, ResponseMetadataSlot},
		store::{MemoryStore, SessionStore},
	};

	/// Storefront wired to the scripted transport.
	pub type ScriptedStorefront = Storefront<ScriptedHttpClient, ScriptedErrorMapper>;

	/// Reply served by [`ScriptedHttpClient`] for a single request.
	#[derive(Clone, Debug)]
	pub enum ScriptedReply {
		/// HTTP response with the given status and body.
		Respond {
			/// HTTP status code.
			status: u16,
			/// Raw response body.
			body: String,
		},
		/// Transport failure before any response arrives.
		Unreachable,
	}
	impl ScriptedReply {
		/// Builds a `200 OK` reply carrying `body`.
		pub fn ok(body: impl Into<String>) -> Self {
			Self::Respond { status: 200, body: body.into() }
		}

		/// Builds a reply with an arbitrary status.
		pub fn status(status: u16, body: impl Into<String>) -> Self {
			Self::Respond { status, body: body.into() }
		}
	}

	/// Request observed by [`ScriptedHttpClient`].
	#[derive(Clone, Debug)]
	pub struct SeenRequest {
		/// HTTP method.
		pub method: String,
		/// Full request URL.
		pub url: Url,
		/// Header pairs in dispatch order.
		pub headers: Vec<(String, String)>,
		/// Raw request body.
		pub body: Vec<u8>,
	}
	impl SeenRequest {
		/// Returns the value of the named header, if present.
		pub fn header(&self, name: &str) -> Option<&str> {
			self.headers.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
		}

		/// Returns the value of the named query parameter, if present.
		pub fn query(&self, name: &str) -> Option<String> {
			self.url.query_pairs().find(|(key, _)| key == name).map(|(_, v)| v.into_owned())
		}
	}

	#[derive(Debug, Default)]
	struct Script {
		routes: HashMap<String, VecDeque<ScriptedReply>>,
		seen: Vec<SeenRequest>,
	}

	/// In-process transport that replays scripted replies per URL path.
	///
	/// Replies queued for a path are consumed in order; the last one keeps repeating. Paths
	/// without a script answer `404`.
	#[derive(Clone, Debug, Default)]
	pub struct ScriptedHttpClient(Arc<Mutex<Script>>);
	impl ScriptedHttpClient {
		/// Queues `replies` for requests whose URL path equals `path`.
		pub fn route<I>(&self, path: &str, replies: I) -> &Self
		where
			I: IntoIterator<Item = ScriptedReply>,
		{
			self.0.lock().routes.entry(path.to_owned()).or_default().extend(replies);

			self
		}

		/// Returns every request observed so far.
		pub fn seen(&self) -> Vec<SeenRequest> {
			self.0.lock().seen.clone()
		}

		/// Returns the requests observed for `path`.
		pub fn seen_on(&self, path: &str) -> Vec<SeenRequest> {
			self.0.lock().seen.iter().filter(|req| req.url.path() == path).cloned().collect()
		}

		fn reply(&self, request: SeenRequest) -> ScriptedReply {
			let mut script = self.0.lock();
			let path = request.url.path().to_owned();

			script.seen.push(request);

			match script.routes.get_mut(&path) {
				Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(ScriptedReply::Unreachable),
				Some(queue) => queue.front().cloned().unwrap_or(ScriptedReply::Unreachable),
				None => ScriptedReply::status(404, "{\"message\":\"not found\"}"),
			}
		}
	}
	impl ApiHttpClient for ScriptedHttpClient {
		type Handle = ScriptedHandle;
		type TransportError = ScriptedTransportError;

		fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
			ScriptedHandle { client: self.clone(), slot }
		}
	}

	/// Handle returned by [`ScriptedHttpClient::with_metadata`].
	pub struct ScriptedHandle {
		client: ScriptedHttpClient,
		slot: ResponseMetadataSlot,
	}
	impl<'c> AsyncHttpClient<'c> for ScriptedHandle {
		type Error = HttpClientError<ScriptedTransportError>;
		type Future =
			Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

		fn call(&'c self, request: HttpRequest) -> Self::Future {
			Box::pin(async move {
				self.slot.take();

				let url = Url::parse(&request.uri().to_string())
					.map_err(|e| HttpClientError::Other(e.to_string()))?;
				let headers = request
					.headers()
					.iter()
					.map(|(k, v)| (k.as_str().to_owned(), v.to_str().unwrap_or_default().to_owned()))
					.collect();
				let seen = SeenRequest {
					method: request.method().to_string(),
					url,
					headers,
					body: request.body().clone(),
				};

				match self.client.reply(seen) {
					ScriptedReply::Respond { status, body } => {
						self.slot.store(ResponseMetadata { status: Some(status), retry_after: None });

						let mut response = HttpResponse::new(body.into_bytes());

						*response.status_mut() = oauth2::http::StatusCode::from_u16(status)
							.map_err(|e| HttpClientError::Other(e.to_string()))?;

						Ok(response)
					},
					ScriptedReply::Unreachable =>
						Err(HttpClientError::Reqwest(Box::new(ScriptedTransportError))),
				}
			})
		}
	}

	/// Transport failure produced by [`ScriptedReply::Unreachable`].
	#[derive(Debug, ThisError)]
	#[error("Scripted endpoint is unreachable.")]
	pub struct ScriptedTransportError;

	/// Maps scripted transport failures into network errors.
	#[derive(Clone, Debug, Default)]
	pub struct ScriptedErrorMapper;
	impl TransportErrorMapper<ScriptedTransportError> for ScriptedErrorMapper {
		fn map_transport_error(
			&self,
			operation: Operation,
			metadata: Option<&ResponseMetadata>,
			error: HttpClientError<ScriptedTransportError>,
		) -> Error {
			match error {
				HttpClientError::Reqwest(inner) => TransportError::network(*inner).into(),
				other => TransientError::Backend {
					operation,
					message: other.to_string(),
					status: metadata.and_then(|meta| meta.status),
					retry_after: None,
				}
				.into(),
			}
		}
	}

	/// Navigator that records every requested navigation.
	#[derive(Clone, Debug, Default)]
	pub struct RecordingNavigator {
		visits: Arc<Mutex<Vec<String>>>,
		redirects: Arc<Mutex<Vec<Url>>>,
	}
	impl RecordingNavigator {
		/// In-app paths visited so far.
		pub fn visits(&self) -> Vec<String> {
			self.visits.lock().clone()
		}

		/// Full-page redirects requested so far.
		pub fn redirects(&self) -> Vec<Url> {
			self.redirects.lock().clone()
		}
	}
	impl Navigator for RecordingNavigator {
		fn navigate(&self, path: &str) {
			self.visits.lock().push(path.to_owned());
		}

		fn redirect(&self, url: &Url) {
			self.redirects.lock().push(url.clone());
		}
	}

	/// Config pointing at `https://scripted.test` with a zero poll interval.
	pub fn scripted_config() -> StorefrontConfig {
		StorefrontConfig::builder()
			.identity_base(
				Url::parse("https://scripted.test/oneid/")
					.expect("Scripted identity base should parse."),
			)
			.api_base(
				Url::parse("https://scripted.test/api/").expect("Scripted API base should parse."),
			)
			.poll_interval(Duration::ZERO)
			.build()
			.expect("Scripted config should build.")
	}

	/// Builds a storefront over the scripted transport, an in-memory store, and a recording
	/// navigator.
	pub fn build_scripted_storefront(
		config: StorefrontConfig,
	) -> (ScriptedStorefront, ScriptedHttpClient, Arc<MemoryStore>, RecordingNavigator) {
		let http_client = ScriptedHttpClient::default();
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn SessionStore> = store_backend.clone();
		let navigator = RecordingNavigator::default();
		let storefront = Storefront::with_http_client(
			store,
			config,
			Arc::new(crate::backend::DefaultBackendStrategy),
			http_client.clone(),
			ScriptedErrorMapper,
		)
		.with_navigator(Arc::new(navigator.clone()));

		(storefront, http_client, store_backend, navigator)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use oauth2;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
