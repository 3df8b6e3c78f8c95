//! Storefront flows: identity handshake, session restoration, and order submission.
//!
//! [`Storefront`] owns every collaborator a flow needs (transport, error mapper, session
//! store, backend strategy, navigator) plus the shared state containers the UI reads from.
//! The flows themselves live in [`identity`], [`session`], and [`order`].

pub mod identity;
pub mod order;
pub mod session;

pub use identity::*;
pub use order::*;
pub use session::*;

// crates.io
use oauth2::AsyncHttpClient;
// self
use crate::{
	_prelude::*,
	auth::{CorrelationCode, Secret},
	backend::{self, ApiRequest, BackendStrategy, TransportErrorMapper},
	config::StorefrontConfig,
	ext::{Navigator, NoopNavigator},
	http::{ApiHttpClient, ResponseMetadataSlot},
	obs::{self, PollMetrics},
	store::{SessionStore, StoreSlot},
};
#[cfg(feature = "reqwest")]
use crate::{backend::ReqwestTransportErrorMapper, http::ReqwestHttpClient};

#[cfg(feature = "reqwest")]
/// Storefront specialized for the crate's default reqwest transport stack.
pub type ReqwestStorefront = Storefront<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Coordinates the identity, session, and order flows against one backend.
///
/// Cloning is cheap; clones share the store, the state containers, and the single-flight
/// guards.
#[derive(Clone)]
pub struct Storefront<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for every outbound request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Durable slots holding the session credentials and the order selection.
	pub store: Arc<dyn SessionStore>,
	/// Endpoints, facility context, and polling policy.
	pub config: StorefrontConfig,
	/// Strategy that classifies non-success responses.
	pub strategy: Arc<dyn BackendStrategy>,
	/// Receiver of navigation requests.
	pub navigator: Arc<dyn Navigator>,
	/// Counters describing submissions and polls.
	pub poll_metrics: Arc<PollMetrics>,
	session: Arc<SessionState>,
	orders: Arc<OrderTracker>,
	handshake_guard: Arc<AsyncMutex<()>>,
	code_guard: Arc<AsyncMutex<()>>,
}
impl<C, M> Storefront<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a storefront that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		store: Arc<dyn SessionStore>,
		config: StorefrontConfig,
		strategy: Arc<dyn BackendStrategy>,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			store,
			config,
			strategy,
			navigator: Arc::new(NoopNavigator),
			poll_metrics: Default::default(),
			session: Default::default(),
			orders: Default::default(),
			handshake_guard: Default::default(),
			code_guard: Default::default(),
		}
	}

	/// Replaces the navigator that receives redirects and in-app navigation requests.
	pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
		self.navigator = navigator;

		self
	}

	/// Shares an existing session state container, e.g. one the UI already observes.
	pub fn with_session_state(mut self, session: Arc<SessionState>) -> Self {
		self.session = session;

		self
	}

	/// Shares an existing order tracker.
	pub fn with_order_tracker(mut self, orders: Arc<OrderTracker>) -> Self {
		self.orders = orders;

		self
	}

	/// Session state container updated by [`Storefront::restore_session`].
	pub fn session_state(&self) -> &Arc<SessionState> {
		&self.session
	}

	/// Order tracker updated by [`Storefront::submit_order`].
	pub fn order_tracker(&self) -> &Arc<OrderTracker> {
		&self.orders
	}

	/// Sends `request` and returns the status and body of a successful response.
	///
	/// Transport failures go through the mapper; non-success statuses go through the
	/// backend strategy.
	async fn send(&self, request: ApiRequest) -> Result<(u16, Vec<u8>)> {
		let operation = request.operation;
		let meta = ResponseMetadataSlot::default();
		let handle = self.http_client.with_metadata(meta.clone());
		let response = handle.call(request.into_http()?).await.map_err(|err| {
			self.transport_mapper.map_transport_error(operation, meta.take().as_ref(), err)
		})?;
		let status = response.status().as_u16();
		let body = response.into_body();

		if !(200..300).contains(&status) {
			return Err(backend::classify_failure(
				self.strategy.as_ref(),
				operation,
				meta.take().as_ref(),
				status,
				&body,
			));
		}

		Ok((status, body))
	}

	/// Sends `request` and decodes the JSON body of a successful response.
	async fn dispatch<T>(&self, request: ApiRequest) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let operation = request.operation;
		let (status, body) = self.send(request).await?;

		backend::decode_body(operation, Some(status), &body)
	}

	async fn stored_code(&self) -> Result<Option<CorrelationCode>> {
		let Some(raw) = self.store.get(StoreSlot::CorrelationCode).await? else {
			return Ok(None);
		};

		match CorrelationCode::new(&raw) {
			Ok(code) => Ok(Some(code)),
			Err(e) => {
				obs::flow_warn!("ignoring unusable stored correlation code: {e}");

				Ok(None)
			},
		}
	}

	async fn stored_secret(&self, slot: StoreSlot) -> Result<Option<Secret>> {
		Ok(self.store.get(slot).await?.map(Secret::from).filter(|secret| !secret.is_blank()))
	}

	/// Correlation code and bearer token, when both are stored.
	async fn stored_credentials(&self) -> Result<Option<(CorrelationCode, Secret)>> {
		let Some(code) = self.stored_code().await? else {
			return Ok(None);
		};

		Ok(self.stored_secret(StoreSlot::BearerToken).await?.map(|token| (code, token)))
	}
}
#[cfg(feature = "reqwest")]
impl Storefront<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a storefront over the default reqwest transport.
	///
	/// The client never follows HTTP redirects so correlation headers stay on the configured
	/// hosts.
	pub fn new(store: Arc<dyn SessionStore>, config: StorefrontConfig) -> Result<Self> {
		Ok(Self::with_http_client(
			store,
			config,
			Arc::new(backend::DefaultBackendStrategy),
			ReqwestHttpClient::without_redirects()?,
			Arc::new(ReqwestTransportErrorMapper),
		))
	}
}
impl<C, M> Debug for Storefront<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Storefront")
			.field("config", &self.config)
			.field("session", &self.session.snapshot())
			.field("order_state", &self.orders.state())
			.finish()
	}
}
