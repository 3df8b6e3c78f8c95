//! Backend call plumbing: operation labels, request building, transport error mapping, and
//! response classification.
//!
//! Every remote call goes through the same boundary: the transport either fails (mapped by a
//! [`TransportErrorMapper`]), returns a non-success status (classified by a
//! [`BackendStrategy`]), or returns a body that is decoded with path-aware diagnostics.
//! Credential rejection is decided here, once, instead of by each flow inspecting status codes.

pub mod request;
pub mod strategy;

pub(crate) mod lenient;

pub use request::*;
pub use strategy::*;

// crates.io
use oauth2::HttpClientError;
// self
use crate::{
	_prelude::*,
	error::{TransientError, TransportError},
	http::ResponseMetadata,
};

/// Remote operations consumed by the storefront.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
	/// Captcha image retrieval (URL only, never fetched by the crate).
	CaptchaImage,
	/// Captcha verification against the identity provider.
	CaptchaCheck,
	/// Captcha secret → bearer token exchange.
	TokenExchange,
	/// Authenticated user profile fetch.
	Profile,
	/// Purchase order submission.
	OrderSubmit,
	/// Order status poll.
	OrderStatus,
	/// Authenticated order list fetch.
	OrderList,
}
impl Operation {
	/// Every operation, in declaration order.
	pub const ALL: [Operation; 7] = [
		Operation::CaptchaImage,
		Operation::CaptchaCheck,
		Operation::TokenExchange,
		Operation::Profile,
		Operation::OrderSubmit,
		Operation::OrderStatus,
		Operation::OrderList,
	];

	/// Returns a stable label suitable for logs and error messages.
	pub const fn as_str(self) -> &'static str {
		match self {
			Operation::CaptchaImage => "captcha_image",
			Operation::CaptchaCheck => "captcha_check",
			Operation::TokenExchange => "token_exchange",
			Operation::Profile => "profile",
			Operation::OrderSubmit => "order_submit",
			Operation::OrderStatus => "order_status",
			Operation::OrderList => "order_list",
		}
	}
}
impl Display for Operation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Maps HTTP transport failures into storefront [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a storefront error.
	fn map_transport_error(
		&self,
		operation: Operation,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		operation: Operation,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(operation, meta, *inner),
			HttpClientError::Http(inner) => crate::error::ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => TransientError::Backend {
				operation,
				message: format!("HTTP client error: {message}"),
				status: meta_status(meta),
				retry_after: meta_retry_after(meta),
			}
			.into(),
			_ => TransientError::Backend {
				operation,
				message: "unrecognized HTTP client error".into(),
				status: meta_status(meta),
				retry_after: meta_retry_after(meta),
			}
			.into(),
		}
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(
	operation: Operation,
	meta: Option<&ResponseMetadata>,
	err: ReqwestError,
) -> Error {
	if err.is_builder() {
		return crate::error::ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TransientError::Backend {
			operation,
			message: "request timed out".into(),
			status: meta_status(meta).or_else(|| err.status().map(|code| code.as_u16())),
			retry_after: meta_retry_after(meta),
		}
		.into();
	}

	TransportError::from(err).into()
}

/// Error payload shape shared by the identity provider and the storefront API.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorBody {
	#[serde(alias = "code")]
	error: Option<serde_json::Value>,
	#[serde(alias = "error_description", alias = "detail")]
	message: Option<String>,
}

/// Converts a non-success response into a classified storefront error.
pub(crate) fn classify_failure(
	strategy: &dyn BackendStrategy,
	operation: Operation,
	meta: Option<&ResponseMetadata>,
	status: u16,
	body: &[u8],
) -> Error {
	let mut ctx = FailureContext::new(operation).with_http_status(status);
	let parsed = serde_json::from_slice::<ErrorBody>(body).ok();
	let message =
		parsed.as_ref().and_then(|b| b.message.clone()).filter(|m| !m.trim().is_empty());

	if let Some(code) = parsed.as_ref().and_then(|b| b.error.as_ref()).and_then(error_code_text) {
		ctx = ctx.with_error_code(code);
	}
	if let Some(message) = message.as_ref() {
		ctx = ctx.with_message(message.clone());
	}
	if parsed.is_none() && !body.is_empty() {
		ctx = ctx.with_body_preview(String::from_utf8_lossy(body).into_owned());
	}

	let reason = message.unwrap_or_else(|| format!("HTTP status {status}"));

	match strategy.classify_failure(&ctx) {
		FailureKind::CredentialRejected => Error::CredentialRejected { reason },
		FailureKind::Rejected => Error::Rejected { operation, status: Some(status), reason },
		FailureKind::Transient => TransientError::Backend {
			operation,
			message: reason,
			status: Some(status),
			retry_after: meta_retry_after(meta),
		}
		.into(),
	}
}

/// Decodes a success body, keeping the JSON path of the first mismatch.
pub(crate) fn decode_body<T>(operation: Operation, status: Option<u16>, body: &[u8]) -> Result<T>
where
	T: DeserializeOwned,
{
	let mut de = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut de)
		.map_err(|source| TransientError::ResponseParse { operation, source, status }.into())
}

fn error_code_text(value: &serde_json::Value) -> Option<String> {
	match value {
		serde_json::Value::String(text) => Some(text.clone()),
		serde_json::Value::Number(number) => Some(number.to_string()),
		_ => None,
	}
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}

fn meta_retry_after(meta: Option<&ResponseMetadata>) -> Option<Duration> {
	meta.and_then(|value| value.retry_after)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn unauthorized_status_becomes_credential_rejection() {
		let err = classify_failure(
			&DefaultBackendStrategy,
			Operation::Profile,
			None,
			401,
			br#"{"message":"Token expired"}"#,
		);

		match err {
			Error::CredentialRejected { reason } => assert_eq!(reason, "Token expired"),
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}

	#[test]
	fn error_code_overrides_status_classification() {
		let err = classify_failure(
			&DefaultBackendStrategy,
			Operation::Profile,
			None,
			400,
			br#"{"error":"invalid_token"}"#,
		);

		assert!(err.is_credential_rejected());

		let err = classify_failure(
			&DefaultBackendStrategy,
			Operation::OrderSubmit,
			None,
			400,
			br#"{"code":"invalid_captcha","message":"Wrong captcha"}"#,
		);

		assert!(matches!(
			err,
			Error::Rejected { operation: Operation::OrderSubmit, status: Some(400), .. }
		));
	}

	#[test]
	fn server_errors_are_transient_and_keep_retry_hint() {
		let meta = ResponseMetadata { status: Some(503), retry_after: Some(Duration::seconds(9)) };
		let err = classify_failure(
			&DefaultBackendStrategy,
			Operation::OrderStatus,
			Some(&meta),
			503,
			b"upstream busy",
		);

		match err {
			Error::Transient(TransientError::Backend { status, retry_after, message, .. }) => {
				assert_eq!(status, Some(503));
				assert_eq!(retry_after, Some(Duration::seconds(9)));
				assert_eq!(message, "HTTP status 503");
			},
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}

	#[test]
	fn decode_body_reports_json_path() {
		#[derive(Debug, Deserialize)]
		#[allow(dead_code)]
		struct Reply {
			inner: Inner,
		}
		#[derive(Debug, Deserialize)]
		#[allow(dead_code)]
		struct Inner {
			token: String,
		}

		let err = decode_body::<Reply>(
			Operation::TokenExchange,
			Some(200),
			br#"{"inner":{"token":7}}"#,
		)
		.expect_err("A numeric token must fail to decode.");

		match err {
			Error::Transient(TransientError::ResponseParse { source, status, .. }) => {
				assert_eq!(source.path().to_string(), "inner.token");
				assert_eq!(status, Some(200));
			},
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}

	#[test]
	fn operation_labels_are_unique() {
		let labels: std::collections::HashSet<_> =
			Operation::ALL.iter().map(|op| op.as_str()).collect();

		assert_eq!(labels.len(), Operation::ALL.len());
		assert_eq!(Operation::OrderStatus.to_string(), "order_status");
	}
}
