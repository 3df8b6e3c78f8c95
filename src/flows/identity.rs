//! Captcha-gated identity handshake.
//!
//! The identity provider authenticates a browser session in three hops: the user solves a
//! captcha served for the session's correlation code, the captcha check answers with a hosted
//! redirect URL plus a one-time secret, and once the provider sends the user back, the secret
//! is exchanged for the bearer token used by every storefront call.

// self
use crate::{
	_prelude::*,
	auth::{CorrelationCode, Secret},
	backend::{
		ApiRequest, HEADER_CAPTCHA, HEADER_CORRELATION, HEADER_SECRET, Operation,
		TransportErrorMapper,
	},
	flows::Storefront,
	http::ApiHttpClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	store::StoreSlot,
};

/// Result of [`Storefront::verify_captcha`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptchaCheck {
	/// The provider accepted the captcha; send the user to `redirect_url`.
	Verified {
		/// Provider-hosted URL that continues the identity flow.
		redirect_url: Url,
	},
	/// The captcha was wrong, or the provider could not be reached.
	Rejected,
}

/// Result of [`Storefront::complete_handshake`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandshakeOutcome {
	/// A bearer token is now stored.
	Completed,
	/// No token was obtained; the user has to solve a new captcha.
	Failed,
}
impl HandshakeOutcome {
	/// Returns `true` for [`HandshakeOutcome::Completed`].
	pub fn is_completed(self) -> bool {
		matches!(self, Self::Completed)
	}
}

#[derive(Debug, Deserialize)]
struct CaptchaReply {
	#[serde(alias = "redirect_url")]
	url: Url,
	secret: Secret,
}

#[derive(Debug, Deserialize)]
struct TokenReply {
	#[serde(alias = "access_token")]
	token: Secret,
	#[serde(default)]
	secret: Option<Secret>,
}

impl<C, M> Storefront<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Returns the stored correlation code, generating and persisting one when absent.
	pub async fn correlation_code(&self) -> Result<CorrelationCode> {
		let _guard = self.code_guard.lock().await;

		if let Some(code) = self.stored_code().await? {
			return Ok(code);
		}

		let code = CorrelationCode::generate();

		self.store.set(StoreSlot::CorrelationCode, code.to_string()).await?;

		Ok(code)
	}

	/// Builds the captcha image URL for the current correlation code.
	///
	/// The `t` parameter carries the current Unix time in milliseconds so every call yields a
	/// fresh image. No request is sent.
	pub async fn captcha_challenge_url(&self) -> Result<Url> {
		let code = self.correlation_code().await?;
		let stamp = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
		let mut url = self.config.endpoints.captcha_image.clone();

		url.query_pairs_mut()
			.append_pair(HEADER_CORRELATION, code.as_str())
			.append_pair("t", &stamp.to_string());

		Ok(url)
	}

	/// Sends the solved captcha to the identity provider.
	///
	/// On success the returned secret is persisted for [`Storefront::complete_handshake`].
	/// Every failure, including a blank value or an unreachable provider, folds into
	/// [`CaptchaCheck::Rejected`].
	pub async fn verify_captcha(&self, value: &str) -> CaptchaCheck {
		const KIND: FlowKind = FlowKind::Captcha;

		let span = FlowSpan::new(KIND, "verify_captcha");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.verify_captcha_inner(value.trim())).await;

		match result {
			Ok(check @ CaptchaCheck::Verified { .. }) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Success);

				check
			},
			Ok(CaptchaCheck::Rejected) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);

				CaptchaCheck::Rejected
			},
			Err(e) => {
				obs::flow_warn!("captcha verification failed: {e}");
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);

				CaptchaCheck::Rejected
			},
		}
	}

	async fn verify_captcha_inner(&self, value: &str) -> Result<CaptchaCheck> {
		if value.is_empty() {
			return Ok(CaptchaCheck::Rejected);
		}

		let code = self.correlation_code().await?;
		let request =
			ApiRequest::get(Operation::CaptchaCheck, self.config.endpoints.captcha_check.clone())
				.query(HEADER_CORRELATION, code.as_str())
				.query(HEADER_CAPTCHA, value)
				.header(HEADER_CORRELATION, code.as_str())
				.header(HEADER_CAPTCHA, value);
		let reply = self.dispatch::<CaptchaReply>(request).await?;

		if reply.secret.is_blank() {
			obs::flow_debug!("captcha check answered without a secret");

			return Ok(CaptchaCheck::Rejected);
		}

		self.store.set(StoreSlot::CaptchaSecret, reply.secret.expose().to_owned()).await?;

		Ok(CaptchaCheck::Verified { redirect_url: reply.url })
	}

	/// Exchanges the stored captcha secret for a bearer token.
	///
	/// Concurrent callers are serialized so at most one exchange is in flight.
	pub async fn complete_handshake(&self) -> HandshakeOutcome {
		const KIND: FlowKind = FlowKind::Handshake;

		let span = FlowSpan::new(KIND, "complete_handshake");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let _singleflight = self.handshake_guard.lock().await;
				let Some(code) = self.stored_code().await? else {
					return Err(Error::MissingData { field: "correlation code" });
				};
				let Some(secret) = self.stored_secret(StoreSlot::CaptchaSecret).await? else {
					return Err(Error::MissingData { field: "captcha secret" });
				};

				self.exchange_secret(&code, &secret).await
			})
			.await;

		match result {
			Ok(_) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Success);

				HandshakeOutcome::Completed
			},
			Err(e) => {
				obs::flow_warn!("handshake failed: {e}");
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);

				HandshakeOutcome::Failed
			},
		}
	}

	/// Asks the navigator for a full-page redirect, typically to the URL returned by
	/// [`Storefront::verify_captcha`].
	pub fn redirect_to(&self, url: &Url) {
		self.navigator.redirect(url);
	}

	/// Runs the token exchange for `code` + `secret` and persists the resulting credentials.
	///
	/// The code and secret are written back as well, so callers may pass values that were
	/// cleared from the store beforehand. Returns the new bearer token.
	pub(crate) async fn exchange_secret(
		&self,
		code: &CorrelationCode,
		secret: &Secret,
	) -> Result<Secret> {
		let request = ApiRequest::post(
			Operation::TokenExchange,
			self.config.endpoints.token_exchange.clone(),
		)
		.header(HEADER_CORRELATION, code.as_str())
		.header(HEADER_SECRET, secret.expose());
		let reply = self.dispatch::<TokenReply>(request).await?;

		if reply.token.is_blank() {
			return Err(Error::MissingData { field: "bearer token" });
		}

		let next_secret = reply.secret.filter(|rotated| !rotated.is_blank());

		self.store.set(StoreSlot::CorrelationCode, code.to_string()).await?;
		self.store
			.set(
				StoreSlot::CaptchaSecret,
				next_secret.as_ref().unwrap_or(secret).expose().to_owned(),
			)
			.await?;
		self.store.set(StoreSlot::BearerToken, reply.token.expose().to_owned()).await?;

		Ok(reply.token)
	}
}
