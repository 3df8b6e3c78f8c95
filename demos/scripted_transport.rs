//! Drives the whole purchase journey against an in-process transport.
//!
//! 1. Implement [`ApiHttpClient`] so the transport records [`ResponseMetadata`] via the provided
//!    [`ResponseMetadataSlot`].
//! 2. Provide a [`TransportErrorMapper`] for the transport's error type.
//! 3. Pass both to [`Storefront::with_http_client`] and run captcha, handshake, session, and
//!    order calls without touching the network.

// std
use std::{
	error::Error as StdError,
	fmt::{Display, Formatter, Result as FmtResult},
	future::Future,
	pin::Pin,
	sync::{
		Arc,
		atomic::{AtomicU32, Ordering},
	},
};
// crates.io
use color_eyre::Result;
use time::Duration;
use url::Url;
// self
use dealer_storefront::{
	backend::{DefaultBackendStrategy, Operation, TransportErrorMapper},
	config::StorefrontConfig,
	error::{Error, TransientError, TransportError},
	ext::Navigator,
	flows::{CaptchaCheck, OrderSelection, Storefront},
	http::{ApiHttpClient, ResponseMetadata, ResponseMetadataSlot},
	oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse, http::StatusCode},
	store::{MemoryStore, SessionStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let config = StorefrontConfig::builder()
		.identity_base(Url::parse("https://id.dealer.test/oneid/")?)
		.api_base(Url::parse("https://shop.dealer.test/api/")?)
		.poll_interval(Duration::milliseconds(200))
		.poll_budget(5)
		.build()?;
	let store: Arc<dyn SessionStore> = Arc::new(MemoryStore::default());
	let storefront: Storefront<DemoHttpClient, DemoErrorMapper> = Storefront::with_http_client(
		store,
		config,
		Arc::new(DefaultBackendStrategy),
		DemoHttpClient::default(),
		DemoErrorMapper,
	)
	.with_navigator(Arc::new(PrintingNavigator));

	println!("Captcha image: {}.", storefront.captcha_challenge_url().await?);

	match storefront.verify_captcha("7k2p").await {
		CaptchaCheck::Verified { redirect_url } => storefront.redirect_to(&redirect_url),
		CaptchaCheck::Rejected => println!("The captcha was rejected."),
	}

	println!("Handshake: {:?}.", storefront.complete_handshake().await);
	println!("Session: {:?}.", storefront.restore_session().await?);

	if let Some(profile) = storefront.session().profile {
		println!("Signed in as {}.", profile.name.as_deref().unwrap_or("an unnamed client"));
	}

	storefront.select_order(&OrderSelection::new("m-1", "c-7", "d-3")).await?;

	let outcome = storefront.submit_order("9q4x").await?;

	println!("Order finished: {}", outcome.message());
	println!("Poll metrics: {:?}.", storefront.poll_metrics.snapshot());

	Ok(())
}

#[derive(Clone, Debug)]
struct DemoTransportError(&'static str);
impl Display for DemoTransportError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "demo transport failure: {}", self.0)
	}
}
impl StdError for DemoTransportError {}

/// Answers every storefront endpoint from canned bodies; the order stays pending for two polls.
#[derive(Clone, Debug, Default)]
struct DemoHttpClient {
	polls: Arc<AtomicU32>,
}
impl ApiHttpClient for DemoHttpClient {
	type Handle = DemoHttpHandle;
	type TransportError = DemoTransportError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		DemoHttpHandle { slot, polls: self.polls.clone() }
	}
}

struct DemoHttpHandle {
	slot: ResponseMetadataSlot,
	polls: Arc<AtomicU32>,
}
impl DemoHttpHandle {
	fn answer(&self, path: &str) -> Option<(u16, String)> {
		let body = match path {
			"/oneid/captcha/check" =>
				r#"{"url":"https://id.dealer.test/oneid/continue","secret":"demo-secret"}"#.into(),
			"/oneid/token" => r#"{"token":"demo-token"}"#.into(),
			"/api/profile" => r#"{"name":"Demo Client","client_type":"physical"}"#.into(),
			"/api/orders/submit" => "{}".into(),
			"/api/orders/status" => {
				let poll = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
				let status = if poll < 3 { 0 } else { 1 };

				format!(r#"{{"status":{status}}}"#)
			},
			"/api/orders" => r#"[{"id":1,"modification_id":"m-1","status":"1"}]"#.into(),
			_ => return None,
		};

		Some((200, body))
	}
}
impl<'a> AsyncHttpClient<'a> for DemoHttpHandle {
	type Error = HttpClientError<DemoTransportError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'a + Send + Sync>>;

	fn call(&'a self, request: HttpRequest) -> Self::Future {
		Box::pin(async move {
			self.slot.take();

			let Some((status, body)) = self.answer(request.uri().path()) else {
				return Err(HttpClientError::Reqwest(Box::new(DemoTransportError("unknown route"))));
			};

			self.slot.store(ResponseMetadata { status: Some(status), retry_after: None });

			let mut response = HttpResponse::new(body.into_bytes());

			*response.status_mut() = StatusCode::from_u16(status)
				.map_err(|e| HttpClientError::Other(e.to_string()))?;

			Ok(response)
		})
	}
}

#[derive(Clone, Default)]
struct DemoErrorMapper;
impl TransportErrorMapper<DemoTransportError> for DemoErrorMapper {
	fn map_transport_error(
		&self,
		operation: Operation,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<DemoTransportError>,
	) -> Error {
		match error {
			HttpClientError::Reqwest(inner) => TransportError::network(*inner).into(),
			other => TransientError::Backend {
				operation,
				message: format!("Demo transport error during {operation}: {other}."),
				status: metadata.and_then(|meta| meta.status),
				retry_after: None,
			}
			.into(),
		}
	}
}

struct PrintingNavigator;
impl Navigator for PrintingNavigator {
	fn navigate(&self, path: &str) {
		println!("Navigate to {path}.");
	}

	fn redirect(&self, url: &Url) {
		println!("Redirect to {url}.");
	}
}
