//! Client configuration values consumed by the access-token service.

// self
use crate::{_prelude::*, error::ConfigError, grant::GrantType, token::TokenSecret};

/// Client authentication modes for token endpoint calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	#[default]
	/// HTTP Basic with `client_id`/`client_secret`.
	ClientSecretBasic,
	/// Form POST body parameters for `client_id`/`client_secret`.
	ClientSecretPost,
}
impl ClientAuthMethod {
	/// Returns the RFC 7591 method label.
	pub const fn as_str(self) -> &'static str {
		match self {
			ClientAuthMethod::ClientSecretBasic => "client_secret_basic",
			ClientAuthMethod::ClientSecretPost => "client_secret_post",
		}
	}
}
impl Display for ClientAuthMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Credentials and method used to authenticate the client registration.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientAuthentication {
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// Client secret for secret-based authentication methods.
	pub client_secret: Option<TokenSecret>,
	/// Token endpoint authentication method.
	pub method: ClientAuthMethod,
}

/// Immutable configuration identifying a registered OAuth 2.0 client and its grant.
///
/// Values compare structurally and hash, so grant requests built from a
/// configuration can serve as cache keys. Construct through
/// [`ClientConfiguration::builder`], which validates the registration before a
/// value escapes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientConfiguration {
	/// Token endpoint the grant is submitted to.
	pub token_endpoint: Url,
	/// Grant type used when acquiring tokens for this client.
	pub grant_type: GrantType,
	/// Scopes requested for issued tokens, in configuration order.
	pub scope: Vec<String>,
	/// Client authentication settings.
	pub authentication: ClientAuthentication,
	/// Target audience for token-exchange grants.
	pub audience: Option<String>,
}
impl ClientConfiguration {
	/// Creates a new builder for the provided token endpoint and grant type.
	pub fn builder(token_endpoint: Url, grant_type: GrantType) -> ClientConfigurationBuilder {
		ClientConfigurationBuilder::new(token_endpoint, grant_type)
	}
}

/// Builder for [`ClientConfiguration`] values.
#[derive(Clone, Debug)]
pub struct ClientConfigurationBuilder {
	token_endpoint: Url,
	grant_type: GrantType,
	scope: Vec<String>,
	client_id: Option<String>,
	client_secret: Option<TokenSecret>,
	auth_method: ClientAuthMethod,
	audience: Option<String>,
}
impl ClientConfigurationBuilder {
	fn new(token_endpoint: Url, grant_type: GrantType) -> Self {
		Self {
			token_endpoint,
			grant_type,
			scope: Vec::new(),
			client_id: None,
			client_secret: None,
			auth_method: ClientAuthMethod::default(),
			audience: None,
		}
	}

	/// Sets the scopes requested for issued tokens.
	pub fn scope<I, S>(mut self, scope: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scope = scope.into_iter().map(Into::into).collect();

		self
	}

	/// Sets the OAuth 2.0 client identifier.
	pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
		self.client_id = Some(client_id.into());

		self
	}

	/// Sets the client secret.
	pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
		self.client_secret = Some(TokenSecret::new(client_secret));

		self
	}

	/// Overrides the token endpoint authentication method.
	pub fn auth_method(mut self, method: ClientAuthMethod) -> Self {
		self.auth_method = method;

		self
	}

	/// Sets the target audience for token-exchange grants.
	pub fn audience(mut self, audience: impl Into<String>) -> Self {
		self.audience = Some(audience.into());

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfiguration, ConfigError> {
		let client_id =
			self.client_id.filter(|id| !id.is_empty()).ok_or(ConfigError::EmptyClientId)?;

		if self.client_secret.is_none() {
			return Err(ConfigError::MissingClientSecret { method: self.auth_method.as_str() });
		}
		if matches!(self.grant_type, GrantType::TokenExchange) && self.audience.is_none() {
			return Err(ConfigError::MissingAudience);
		}

		Ok(ClientConfiguration {
			token_endpoint: self.token_endpoint,
			grant_type: self.grant_type,
			scope: self.scope,
			authentication: ClientAuthentication {
				client_id,
				client_secret: self.client_secret,
				method: self.auth_method,
			},
			audience: self.audience,
		})
	}
}
