//! Token secret wrapper and the access-token response value stored in caches.

// self
use crate::_prelude::*;

/// Redacted token secret wrapper keeping sensitive material out of logs.
///
/// Unlike a plain string the wrapper also hashes structurally, because inbound
/// assertions and subject tokens participate in grant-request cache keys.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Opaque access-token response returned by token clients and stored in caches.
///
/// The value is immutable once built; caches clone it freely and callers read
/// the secret through [`TokenSecret::expose`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenResponse {
	/// Issued access token; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Token type reported by the endpoint (typically `Bearer`).
	pub token_type: Option<String>,
	/// Instant the response was received.
	pub issued_at: OffsetDateTime,
	/// Expiry instant derived from the endpoint's `expires_in`, when reported.
	pub expires_at: Option<OffsetDateTime>,
}
impl AccessTokenResponse {
	/// Returns a builder seeded with the issued access token.
	pub fn builder(access_token: impl Into<String>) -> AccessTokenResponseBuilder {
		AccessTokenResponseBuilder::new(access_token)
	}

	/// Seconds remaining until expiry at the provided instant, when known.
	pub fn expires_in_at(&self, instant: OffsetDateTime) -> Option<Duration> {
		self.expires_at.map(|at| at - instant)
	}

	/// Returns `true` when the token expires within `leeway` of the provided instant.
	///
	/// Responses without a reported expiry never go stale; external cache
	/// backends may apply their own lifetime policy on top.
	pub fn is_stale_at(&self, instant: OffsetDateTime, leeway: Duration) -> bool {
		match self.expires_at {
			Some(at) => at - instant <= leeway,
			None => false,
		}
	}
}
impl Debug for AccessTokenResponse {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccessTokenResponse")
			.field("access_token", &"<redacted>")
			.field("token_type", &self.token_type)
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Builder for [`AccessTokenResponse`].
#[derive(Clone, Debug)]
pub struct AccessTokenResponseBuilder {
	access_token: TokenSecret,
	token_type: Option<String>,
	issued_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
}
impl AccessTokenResponseBuilder {
	fn new(access_token: impl Into<String>) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			token_type: None,
			issued_at: None,
			expires_at: None,
			expires_in: None,
		}
	}

	/// Sets the reported token type.
	pub fn token_type(mut self, token_type: impl Into<String>) -> Self {
		self.token_type = Some(token_type.into());

		self
	}

	/// Sets the issued-at instant.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets a relative expiry duration from the issued instant.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Consumes the builder and produces an [`AccessTokenResponse`].
	pub fn build(self) -> AccessTokenResponse {
		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = match (self.expires_at, self.expires_in) {
			(Some(instant), _) => Some(instant),
			(None, Some(delta)) => Some(issued_at + delta),
			(None, None) => None,
		};

		AccessTokenResponse {
			access_token: self.access_token,
			token_type: self.token_type,
			issued_at,
			expires_at,
		}
	}
}
