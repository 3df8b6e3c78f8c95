//! Storefront-level error types shared across flows, transports, and stores.

// self
use crate::{_prelude::*, backend::Operation};

/// Storefront-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical storefront error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Temporary upstream failure; safe to retry.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Backend no longer accepts the stored credentials.
	#[error("Backend rejected the session credentials: {reason}.")]
	CredentialRejected {
		/// Backend- or storefront-supplied reason string.
		reason: String,
	},
	/// Backend refused the request itself (wrong captcha, invalid payload).
	#[error("The {operation} call was rejected: {reason}.")]
	Rejected {
		/// Operation that was refused.
		operation: Operation,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Backend- or storefront-supplied reason string.
		reason: String,
	},
	/// A required input is missing or blank.
	#[error("Missing required data: {field}.")]
	MissingData {
		/// Name of the missing field.
		field: &'static str,
	},
	/// No correlation code or bearer token is stored.
	#[error("No authenticated session is available.")]
	Unauthenticated,
	/// Another order submission is still running.
	#[error("An order submission is already in flight.")]
	OrderInFlight,
}
impl Error {
	/// Returns `true` when the backend signalled that the credentials are no longer valid.
	pub fn is_credential_rejected(&self) -> bool {
		matches!(self, Self::CredentialRejected { .. })
	}

	/// Returns `true` for network-level and temporary upstream failures.
	pub fn is_transient(&self) -> bool {
		matches!(self, Self::Transient(_) | Self::Transport(_))
	}
}

/// Configuration and request-construction failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Request payload could not be serialized.
	#[error("Request body for the {operation} call could not be serialized.")]
	RequestBody {
		/// Operation whose payload failed.
		operation: Operation,
		/// Underlying serializer failure.
		#[source]
		source: serde_json::Error,
	},
	/// Storefront configuration failed validation.
	#[error(transparent)]
	Invalid(#[from] crate::config::StorefrontConfigError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Temporary failure variants (safe to retry).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Backend returned an unexpected but non-fatal response.
	#[error("The {operation} endpoint returned an unexpected response: {message}.")]
	Backend {
		/// Operation that failed.
		operation: Operation,
		/// Backend- or storefront-supplied message summarizing the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Backend responded with JSON that does not match the expected shape.
	#[error("The {operation} endpoint returned malformed JSON.")]
	ResponseParse {
		/// Operation whose response failed to parse.
		operation: Operation,
		/// Structured parsing failure including the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the backend.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the backend.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::store::StoreError;

	#[test]
	fn store_error_converts_into_storefront_error_with_source() {
		let store_error = StoreError::Backend { message: "disk unavailable".into() };
		let error: Error = store_error.clone().into();

		assert!(matches!(error, Error::Storage(_)));
		assert!(error.to_string().contains("disk unavailable"));

		let source = StdError::source(&error)
			.expect("Storefront error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn classification_helpers_match_variants() {
		let rejected = Error::CredentialRejected { reason: "token expired".into() };
		let network: Error = TransportError::network(std::io::Error::other("reset")).into();
		let missing = Error::MissingData { field: "dealer id" };

		assert!(rejected.is_credential_rejected());
		assert!(!rejected.is_transient());
		assert!(network.is_transient());
		assert!(!network.is_credential_rejected());
		assert_eq!(missing.to_string(), "Missing required data: dealer id.");
	}
}
