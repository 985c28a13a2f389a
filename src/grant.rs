//! Grant-type identifiers and the per-grant request values used as cache keys.

// std
use std::collections::BTreeMap;
// self
use crate::{_prelude::*, config::ClientConfiguration, token::TokenSecret};

/// RFC 8693 subject token type submitted with token-exchange grants.
pub const SUBJECT_TOKEN_TYPE_JWT: &str = "urn:ietf:params:oauth:token-type:jwt";

/// OAuth 2.0 grant types understood by the access-token service.
///
/// The supported set is closed; [`GrantType::Other`] captures out-of-band
/// values admitted by configuration text so dispatch can reject them with a
/// typed error instead of panicking on an unrepresentable state.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GrantType {
	/// JWT bearer grant used for on-behalf-of exchanges (RFC 7523).
	JwtBearer,
	/// Client Credentials grant for machine-to-machine tokens (RFC 6749).
	ClientCredentials,
	/// Token Exchange grant (RFC 8693).
	TokenExchange,
	/// Out-of-band value admitted by configuration text; always rejected at dispatch.
	Other(String),
}
impl GrantType {
	const CLIENT_CREDENTIALS: &'static str = "client_credentials";
	const JWT_BEARER: &'static str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
	const TOKEN_EXCHANGE: &'static str = "urn:ietf:params:oauth:grant-type:token-exchange";

	/// Returns the wire identifier submitted as the `grant_type` form parameter.
	pub fn as_str(&self) -> &str {
		match self {
			GrantType::JwtBearer => Self::JWT_BEARER,
			GrantType::ClientCredentials => Self::CLIENT_CREDENTIALS,
			GrantType::TokenExchange => Self::TOKEN_EXCHANGE,
			GrantType::Other(value) => value,
		}
	}

	/// Returns `true` when the grant type is in the supported set.
	pub fn is_supported(&self) -> bool {
		!matches!(self, GrantType::Other(_))
	}
}
impl From<String> for GrantType {
	fn from(value: String) -> Self {
		match value.as_str() {
			Self::JWT_BEARER => GrantType::JwtBearer,
			Self::CLIENT_CREDENTIALS => GrantType::ClientCredentials,
			Self::TOKEN_EXCHANGE => GrantType::TokenExchange,
			_ => GrantType::Other(value),
		}
	}
}
impl From<GrantType> for String {
	fn from(value: GrantType) -> Self {
		value.as_str().to_owned()
	}
}
impl Display for GrantType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Common surface for per-grant request values.
///
/// Implementations are immutable and compare structurally, so each request
/// doubles as the cache key for its grant's token cache.
pub trait GrantRequest: Send + Sync {
	/// Client configuration the request was built from.
	fn configuration(&self) -> &ClientConfiguration;

	/// Grant type submitted as the `grant_type` form parameter.
	fn grant_type(&self) -> GrantType;

	/// Appends grant-specific form parameters for the token endpoint.
	fn append_form(&self, form: &mut BTreeMap<String, String>);
}

/// Request value for the client-credentials grant.
///
/// The configuration alone identifies the request; no inbound token exists for
/// machine-to-machine principals.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClientCredentialsGrantRequest {
	/// Client configuration describing the target registration.
	pub configuration: ClientConfiguration,
}
impl ClientCredentialsGrantRequest {
	/// Creates a request from the provided configuration.
	pub fn new(configuration: ClientConfiguration) -> Self {
		Self { configuration }
	}
}
impl GrantRequest for ClientCredentialsGrantRequest {
	fn configuration(&self) -> &ClientConfiguration {
		&self.configuration
	}

	fn grant_type(&self) -> GrantType {
		GrantType::ClientCredentials
	}

	fn append_form(&self, _form: &mut BTreeMap<String, String>) {}
}

/// Request value for the on-behalf-of (JWT bearer) grant.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OnBehalfOfGrantRequest {
	/// Client configuration describing the target registration.
	pub configuration: ClientConfiguration,
	/// Inbound user assertion exchanged for the downstream token.
	pub assertion: TokenSecret,
}
impl OnBehalfOfGrantRequest {
	/// Creates a request from the configuration and the resolved inbound token.
	pub fn new(configuration: ClientConfiguration, assertion: impl Into<String>) -> Self {
		Self { configuration, assertion: TokenSecret::new(assertion) }
	}
}
impl GrantRequest for OnBehalfOfGrantRequest {
	fn configuration(&self) -> &ClientConfiguration {
		&self.configuration
	}

	fn grant_type(&self) -> GrantType {
		GrantType::JwtBearer
	}

	fn append_form(&self, form: &mut BTreeMap<String, String>) {
		form.insert("assertion".into(), self.assertion.expose().to_owned());
		form.insert("requested_token_use".into(), "on_behalf_of".into());
	}
}

/// Request value for the token-exchange grant.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TokenExchangeGrantRequest {
	/// Client configuration describing the target registration.
	pub configuration: ClientConfiguration,
	/// Inbound subject token being exchanged.
	pub subject_token: TokenSecret,
}
impl TokenExchangeGrantRequest {
	/// Creates a request from the configuration and the resolved inbound token.
	pub fn new(configuration: ClientConfiguration, subject_token: impl Into<String>) -> Self {
		Self { configuration, subject_token: TokenSecret::new(subject_token) }
	}
}
impl GrantRequest for TokenExchangeGrantRequest {
	fn configuration(&self) -> &ClientConfiguration {
		&self.configuration
	}

	fn grant_type(&self) -> GrantType {
		GrantType::TokenExchange
	}

	fn append_form(&self, form: &mut BTreeMap<String, String>) {
		form.insert("subject_token".into(), self.subject_token.expose().to_owned());
		form.insert("subject_token_type".into(), SUBJECT_TOKEN_TYPE_JWT.into());

		if let Some(audience) = &self.configuration.audience {
			form.insert("audience".into(), audience.clone());
		}
	}
}
