//! Session restoration with one-shot re-authentication.
//!
//! [`Storefront::restore_session`] runs on every application start. It never loops: a
//! rejected session gets exactly one silent re-authentication (token exchange with the
//! stored secret, then one more profile fetch) before it is reported as
//! [`SessionOutcome::Rejected`].

// self
use crate::{
	_prelude::*,
	auth::{CorrelationCode, Secret, UserProfile},
	backend::{ApiRequest, HEADER_CORRELATION, HEADER_TOKEN, Operation, TransportErrorMapper},
	flows::Storefront,
	http::ApiHttpClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	store::StoreSlot,
};

/// Point-in-time view of [`SessionState`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
	/// `true` once a profile fetch succeeded with the stored credentials.
	pub authorized: bool,
	/// Profile of the authorized user.
	pub profile: Option<UserProfile>,
}

/// Shared container for the session's authorization flag and profile.
#[derive(Debug, Default)]
pub struct SessionState(RwLock<SessionSnapshot>);
impl SessionState {
	/// Returns a copy of the current state.
	pub fn snapshot(&self) -> SessionSnapshot {
		self.0.read().clone()
	}

	/// Returns `true` when the session is authorized.
	pub fn is_authorized(&self) -> bool {
		self.0.read().authorized
	}

	/// Returns the profile of the authorized user, if any.
	pub fn profile(&self) -> Option<UserProfile> {
		self.0.read().profile.clone()
	}

	fn authorize(&self, profile: UserProfile) {
		*self.0.write() = SessionSnapshot { authorized: true, profile: Some(profile) };
	}

	fn reset(&self) {
		*self.0.write() = SessionSnapshot::default();
	}
}

/// Result of [`Storefront::restore_session`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionOutcome {
	/// No correlation code or bearer token is stored; nothing was sent.
	Anonymous,
	/// The profile was fetched and the session is authorized.
	Authorized {
		/// `true` when a silent re-authentication was needed first.
		reauthenticated: bool,
	},
	/// The backend rejected the session and the single re-authentication did not recover it.
	Rejected,
	/// The profile could not be fetched for a reason unrelated to the credentials.
	Unavailable,
}

/// Body shared by the profile and order-list calls.
#[derive(Serialize)]
pub(crate) struct FacilityBody {
	pub(crate) filial_id: u32,
}

impl<C, M> Storefront<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Decides whether the stored credentials still describe a valid session.
	///
	/// Only storage failures surface as `Err`; remote failures are folded into the outcome.
	pub async fn restore_session(&self) -> Result<SessionOutcome> {
		const KIND: FlowKind = FlowKind::Session;

		let span = FlowSpan::new(KIND, "restore_session");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.restore_session_inner()).await;

		match &result {
			Ok(SessionOutcome::Authorized { .. }) =>
				obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Ok(SessionOutcome::Anonymous) => {},
			_ => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn restore_session_inner(&self) -> Result<SessionOutcome> {
		let Some((code, token)) = self.stored_credentials().await? else {
			self.session.reset();

			return Ok(SessionOutcome::Anonymous);
		};

		match self.fetch_profile(&code, &token).await {
			Ok(profile) => {
				self.adopt_profile(profile).await?;

				Ok(SessionOutcome::Authorized { reauthenticated: false })
			},
			Err(e) if e.is_credential_rejected() => self.reauthenticate(code).await,
			Err(e) => {
				obs::flow_warn!("profile fetch failed, keeping stored credentials: {e}");
				self.session.reset();

				Ok(SessionOutcome::Unavailable)
			},
		}
	}

	/// Clears the rejected credentials, then tries one exchange with the secret they held.
	async fn reauthenticate(&self, code: CorrelationCode) -> Result<SessionOutcome> {
		let _singleflight = self.handshake_guard.lock().await;
		let secret = self.stored_secret(StoreSlot::CaptchaSecret).await?;

		self.store.clear(&StoreSlot::CREDENTIALS).await?;
		self.session.reset();

		let Some(secret) = secret else {
			obs::flow_debug!("session rejected and no captcha secret is stored");

			return Ok(SessionOutcome::Rejected);
		};
		let token = match self.exchange_secret(&code, &secret).await {
			Ok(token) => token,
			Err(e) => {
				obs::flow_warn!("re-authentication exchange failed: {e}");

				return Ok(SessionOutcome::Rejected);
			},
		};

		match self.fetch_profile(&code, &token).await {
			Ok(profile) => {
				self.adopt_profile(profile).await?;

				Ok(SessionOutcome::Authorized { reauthenticated: true })
			},
			Err(e) => {
				obs::flow_warn!("profile fetch failed after re-authentication: {e}");

				if e.is_credential_rejected() {
					self.store.clear(&StoreSlot::CREDENTIALS).await?;
				}

				Ok(SessionOutcome::Rejected)
			},
		}
	}

	async fn fetch_profile(&self, code: &CorrelationCode, token: &Secret) -> Result<UserProfile> {
		let request = ApiRequest::post(Operation::Profile, self.config.endpoints.profile.clone())
			.header(HEADER_CORRELATION, code.as_str())
			.header(HEADER_TOKEN, token.expose())
			.json(&FacilityBody { filial_id: self.config.facility_id })?;

		self.dispatch(request).await
	}

	async fn adopt_profile(&self, profile: UserProfile) -> Result<()> {
		match serde_json::to_string(&profile) {
			Ok(cached) => self.store.set(StoreSlot::Profile, cached).await?,
			Err(e) => obs::flow_warn!("profile could not be cached: {e}"),
		}

		self.session.authorize(profile);

		Ok(())
	}

	/// Forgets the session: clears the credential slots and resets [`SessionState`].
	///
	/// The order selection is kept.
	pub async fn logout(&self) -> Result<()> {
		self.store.clear(&StoreSlot::CREDENTIALS).await?;
		self.session.reset();

		Ok(())
	}

	/// Returns the current session state.
	pub fn session(&self) -> SessionSnapshot {
		self.session.snapshot()
	}

	/// Reads the profile cached by the last successful restoration.
	///
	/// Unreadable cache entries are treated as absent.
	pub async fn cached_profile(&self) -> Result<Option<UserProfile>> {
		let Some(raw) = self.store.get(StoreSlot::Profile).await? else {
			return Ok(None);
		};

		match serde_json::from_str(&raw) {
			Ok(profile) => Ok(Some(profile)),
			Err(e) => {
				obs::flow_warn!("ignoring unreadable cached profile: {e}");

				Ok(None)
			},
		}
	}
}
