//! Failure classification hooks.
//!
//! Flows never look at raw status codes. A [`BackendStrategy`] decides whether a refused
//! request means "the session is gone" (re-authenticate), "this input is wrong" (surface to
//! the user), or "try again later".

// self
use crate::{_prelude::*, backend::Operation};

/// Strategy hook that maps non-success responses into the storefront error taxonomy.
///
/// Implementors work on crate-owned data only, so custom backends can be supported without
/// depending on the transport in use.
pub trait BackendStrategy: Send + Sync {
	/// Classifies a failed backend call.
	fn classify_failure(&self, ctx: &FailureContext) -> FailureKind;
}

/// Canonical failure categories produced by a [`BackendStrategy`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
	/// Credentials are expired, revoked, or unknown to the backend.
	CredentialRejected,
	/// The request itself was refused (bad captcha, invalid payload).
	Rejected,
	/// Failure is temporary.
	Transient,
}

/// Primitive facts about a failed call, handed to [`BackendStrategy::classify_failure`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailureContext {
	/// Operation that failed.
	pub operation: Operation,
	/// HTTP status code, when available.
	pub http_status: Option<u16>,
	/// Machine-readable error code from the response body.
	pub error_code: Option<String>,
	/// Human-readable message from the response body.
	pub message: Option<String>,
	/// Preview of a non-JSON response body.
	pub body_preview: Option<String>,
}
impl FailureContext {
	const BODY_PREVIEW_LIMIT: usize = 256;

	/// Creates a new context for `operation`.
	pub fn new(operation: Operation) -> Self {
		Self { operation, http_status: None, error_code: None, message: None, body_preview: None }
	}

	/// Adds an HTTP status code.
	pub fn with_http_status(mut self, status: u16) -> Self {
		self.http_status = Some(status);

		self
	}

	/// Adds the machine-readable error code.
	pub fn with_error_code(mut self, code: impl Into<String>) -> Self {
		self.error_code = Some(code.into());

		self
	}

	/// Adds the human-readable message.
	pub fn with_message(mut self, message: impl Into<String>) -> Self {
		self.message = Some(message.into());

		self
	}

	/// Adds a truncated body preview.
	pub fn with_body_preview(mut self, body: impl Into<String>) -> Self {
		let body = body.into();

		self.body_preview = Some(if body.chars().count() > Self::BODY_PREVIEW_LIMIT {
			body.chars().take(Self::BODY_PREVIEW_LIMIT).chain(['…']).collect()
		} else {
			body
		});

		self
	}
}

/// Heuristics matching the storefront API and the OneID-style identity provider.
///
/// Structured error codes win, then body text, then the HTTP status. Only `401` and `419`
/// are read as credential rejection; `403` is a refusal of the request, not of the session.
#[derive(Debug, Default)]
pub struct DefaultBackendStrategy;
impl Display for DefaultBackendStrategy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("default-backend-strategy")
	}
}
impl BackendStrategy for DefaultBackendStrategy {
	fn classify_failure(&self, ctx: &FailureContext) -> FailureKind {
		if let Some(kind) = ctx.error_code.as_deref().and_then(classify_code) {
			return kind;
		}
		if let Some(kind) = ctx.body_preview.as_deref().and_then(classify_text) {
			return kind;
		}

		classify_status(ctx.http_status)
	}
}

fn classify_code(code: &str) -> Option<FailureKind> {
	let code = code.trim().to_ascii_lowercase();

	match code.as_str() {
		"unauthorized" | "unauthenticated" | "invalid_token" | "token_expired" | "expired_token"
		| "session_expired" => Some(FailureKind::CredentialRejected),
		"invalid_captcha" | "captcha_mismatch" | "validation_error" | "bad_request" =>
			Some(FailureKind::Rejected),
		"temporarily_unavailable" | "server_error" | "timeout" => Some(FailureKind::Transient),
		_ => None,
	}
}

fn classify_text(body: &str) -> Option<FailureKind> {
	let lowered = body.to_ascii_lowercase();

	match lowered.as_str() {
		text if text.contains("unauthorized") || text.contains("unauthenticated") =>
			Some(FailureKind::CredentialRejected),
		text if text.contains("captcha") => Some(FailureKind::Rejected),
		text if text.contains("temporarily unavailable") || text.contains("try again") =>
			Some(FailureKind::Transient),
		_ => None,
	}
}

fn classify_status(status: Option<u16>) -> FailureKind {
	match status {
		Some(401 | 419) => FailureKind::CredentialRejected,
		Some(408 | 425 | 429) => FailureKind::Transient,
		Some(code) if code >= 500 => FailureKind::Transient,
		Some(_) => FailureKind::Rejected,
		None => FailureKind::Transient,
	}
}
