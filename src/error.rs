//! Crate-level error types shared across the service, token clients, and caches.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Temporary upstream failure; retry with backoff.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Provider rejected the grant (e.g., bad assertion or subject token).
	#[error("Token endpoint rejected the grant: {reason}.")]
	InvalidGrant {
		/// Provider-supplied reason string.
		reason: String,
	},
	/// Client authentication failed or credentials are malformed.
	#[error("Client authentication failed: {reason}.")]
	InvalidClient {
		/// Provider-supplied reason string.
		reason: String,
	},
	/// Requested scopes exceed what the client registration allows.
	#[error("Token lacks the required scopes: {reason}.")]
	InsufficientScope {
		/// Provider-supplied reason string.
		reason: String,
	},
}

/// Configuration and validation failures raised before any token client runs.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// No client configuration was supplied for the call.
	#[error("Client configuration is required.")]
	MissingClientConfiguration,
	/// Grant type falls outside the supported set.
	#[error(
		"Grant type `{grant}` is not in the supported set \
		 (urn:ietf:params:oauth:grant-type:jwt-bearer, client_credentials, \
		 urn:ietf:params:oauth:grant-type:token-exchange)."
	)]
	UnsupportedGrantType {
		/// Offending grant-type value taken from the configuration.
		grant: String,
	},
	/// No inbound bearer token was available for a user-bound grant.
	#[error("No authenticated bearer token found in the caller context; cannot perform {action}.")]
	MissingBearerToken {
		/// Grant the caller attempted (on-behalf-of or token-exchange).
		action: &'static str,
	},
	/// Client identifier must be non-empty.
	#[error("Client identifier cannot be empty.")]
	EmptyClientId,
	/// Secret-based authentication methods require a client secret.
	#[error("Client secret is required for the `{method}` authentication method.")]
	MissingClientSecret {
		/// Authentication method label.
		method: &'static str,
	},
	/// Token exchange requires a target audience.
	#[error("Token exchange requires an audience in the client configuration.")]
	MissingAudience,
}

/// Temporary failure variants (safe to retry).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Token endpoint returned an unexpected but non-fatal response.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Provider- or crate-supplied message summarizing the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Token endpoint responded with malformed JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
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
