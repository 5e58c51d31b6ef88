//! Courier-level error types shared across configuration, identity calls, and stores.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical courier error exposed by public APIs.
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
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// The identity endpoint rejected an authentication attempt.
	#[error("Authentication was rejected with status {status}: {reason}.")]
	AuthenticationRejected {
		/// HTTP status code returned by the login endpoint.
		status: u16,
		/// Best-effort response body text, falling back to the status reason.
		reason: String,
	},
	/// The identity endpoint rejected a renewal attempt.
	#[error("Renewal was rejected with status {status}: {reason}.")]
	RenewalRejected {
		/// HTTP status code returned by the refresh endpoint.
		status: u16,
		/// Best-effort response body text, falling back to the status reason.
		reason: String,
	},
	/// The identity endpoint rejected an introspection attempt.
	#[error("Introspection was rejected with status {status}: {reason}.")]
	IntrospectionRejected {
		/// HTTP status code returned by the introspect endpoint.
		status: u16,
		/// Best-effort response body text, falling back to the status reason.
		reason: String,
	},
	/// Renewal failed while dispatching a request; stored credentials were cleared beforehand.
	#[error("Session expired, sign in again: {reason}.")]
	SessionExpired {
		/// Failure summary of the renewal call that ended the session.
		reason: String,
	},
	/// A success response carried a body this crate could not decode.
	#[error("Identity endpoint returned malformed JSON (status {status}).")]
	MalformedResponse {
		/// Structured parsing failure with the offending JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the undecodable response.
		status: u16,
	},

	/// No authorization header was supplied to a verifier.
	#[error("Authorization header is missing.")]
	MissingAuthorization,
	/// The authorization header does not carry a bearer credential.
	#[error("Authorization header is not a bearer credential.")]
	MalformedAuthorization,
	/// Introspection reported the presented credential as inactive.
	#[error("Credential is no longer active.")]
	InactiveCredential,
}

/// Configuration and validation failures raised while resolving endpoints.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Base endpoint URL was not provided.
	#[error("Base URL is required.")]
	MissingBaseUrl,
	/// Base endpoint URL cannot be parsed.
	#[error("Base URL is invalid.")]
	InvalidBaseUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A resolved operation endpoint cannot be parsed.
	#[error("The {endpoint} endpoint URL is invalid.")]
	InvalidEndpoint {
		/// Endpoint label (login, refresh, introspect).
		endpoint: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Tenant identifier failed validation.
	#[error(transparent)]
	InvalidTenant(#[from] crate::config::TenantIdError),
	/// A configured header name or value cannot be represented on the wire.
	#[error("Header `{name}` cannot be represented as an HTTP header.")]
	InvalidHeader {
		/// Offending header name as supplied by the caller.
		name: String,
		/// Underlying header construction failure.
		#[source]
		source: http::Error,
	},
	/// A request payload could not be serialized.
	#[error("Request payload could not be serialized.")]
	RequestBuild {
		/// Underlying serialization failure.
		#[source]
		source: serde_json::Error,
	},
}

/// Transport-level failures (DNS, TCP, TLS, interrupted bodies).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while dispatching the request.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
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
