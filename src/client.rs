//! Token clients that submit grant requests to the token endpoint.
//!
//! [`HttpTokenClient`] is the only in-tree [`TokenClient`] implementation; it is
//! generic over the grant request type, so one instance backs the on-behalf-of,
//! client-credentials, and token-exchange paths at once. Grant-specific form
//! parameters come from [`GrantRequest::append_form`], client authentication
//! from the configuration, and error classification from RFC-guided heuristics
//! over the endpoint's OAuth error fields, body text, and HTTP status.

// std
use std::collections::BTreeMap;
// crates.io
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
// self
use crate::{
	_prelude::*,
	config::ClientAuthMethod,
	error::{ConfigError, TransientError},
	grant::GrantRequest,
	http::{OAuth2HttpClient, TokenEndpointRequest, TokenEndpointResponse},
	token::AccessTokenResponse,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Boxed future returned by token client calls.
pub type TokenFuture<'a> = Pin<Box<dyn Future<Output = Result<AccessTokenResponse>> + 'a + Send>>;

/// Contract for clients that resolve a grant request into a token response.
///
/// One implementation exists per grant type from the service's point of view;
/// a generic implementation such as [`HttpTokenClient`] may satisfy all of them
/// simultaneously. Transport and endpoint failures propagate unchanged and are
/// never cached by callers.
pub trait TokenClient<R>
where
	Self: Send + Sync,
	R: GrantRequest,
{
	/// Submits the grant request and returns the token endpoint's response.
	fn get_token_response<'a>(&'a self, request: &'a R) -> TokenFuture<'a>;
}

/// HTTP-backed token client serving every grant request type.
pub struct HttpTokenClient<C>
where
	C: ?Sized + OAuth2HttpClient,
{
	http_client: Arc<C>,
}
impl<C> HttpTokenClient<C>
where
	C: ?Sized + OAuth2HttpClient,
{
	/// Creates a client over the provided transport.
	pub fn with_http_client(http_client: impl Into<Arc<C>>) -> Self {
		Self { http_client: http_client.into() }
	}
}
#[cfg(feature = "reqwest")]
impl HttpTokenClient<ReqwestHttpClient> {
	/// Creates a client backed by the crate's default reqwest transport.
	pub fn new() -> Self {
		Self::with_http_client(ReqwestHttpClient::default())
	}
}
#[cfg(feature = "reqwest")]
impl Default for HttpTokenClient<ReqwestHttpClient> {
	fn default() -> Self {
		Self::new()
	}
}
impl<C> Clone for HttpTokenClient<C>
where
	C: ?Sized + OAuth2HttpClient,
{
	fn clone(&self) -> Self {
		Self { http_client: self.http_client.clone() }
	}
}
impl<C> Debug for HttpTokenClient<C>
where
	C: ?Sized + OAuth2HttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("HttpTokenClient").finish_non_exhaustive()
	}
}
impl<C, R> TokenClient<R> for HttpTokenClient<C>
where
	C: ?Sized + OAuth2HttpClient,
	R: GrantRequest,
{
	fn get_token_response<'a>(&'a self, request: &'a R) -> TokenFuture<'a> {
		Box::pin(async move {
			let endpoint_request = build_endpoint_request(request)?;
			let response = self.http_client.post_form(endpoint_request).await?;

			parse_token_response(response)
		})
	}
}

/// Builds the token endpoint form POST for a grant request.
///
/// The form always carries `grant_type`, the configured scopes (space-joined),
/// and the grant-specific parameters; client credentials land in the Basic
/// authorization header or the form body depending on the configured method.
pub(crate) fn build_endpoint_request<R>(request: &R) -> Result<TokenEndpointRequest>
where
	R: ?Sized + GrantRequest,
{
	let configuration = request.configuration();
	let authentication = &configuration.authentication;
	let mut form = BTreeMap::new();

	form.insert("grant_type".to_owned(), request.grant_type().as_str().to_owned());

	if !configuration.scope.is_empty() {
		form.insert("scope".to_owned(), configuration.scope.join(" "));
	}

	request.append_form(&mut form);

	let secret = authentication
		.client_secret
		.as_ref()
		.ok_or(ConfigError::MissingClientSecret { method: authentication.method.as_str() })?;
	let basic_auth = match authentication.method {
		ClientAuthMethod::ClientSecretBasic =>
			Some(basic_credentials(&authentication.client_id, secret.expose())),
		ClientAuthMethod::ClientSecretPost => {
			form.insert("client_id".to_owned(), authentication.client_id.clone());
			form.insert("client_secret".to_owned(), secret.expose().to_owned());

			None
		},
	};

	Ok(TokenEndpointRequest {
		url: configuration.token_endpoint.clone(),
		basic_auth,
		form: form.into_iter().collect(),
	})
}

fn basic_credentials(client_id: &str, client_secret: &str) -> String {
	BASE64.encode(format!("{client_id}:{client_secret}"))
}

#[derive(Deserialize)]
struct RawTokenResponse {
	access_token: String,
	token_type: Option<String>,
	expires_in: Option<i64>,
}

#[derive(Default, Deserialize)]
struct RawErrorResponse {
	error: Option<String>,
	error_description: Option<String>,
}

enum RejectionKind {
	InvalidGrant,
	InvalidClient,
	InsufficientScope,
	Transient,
}

pub(crate) fn parse_token_response(response: TokenEndpointResponse) -> Result<AccessTokenResponse> {
	if !response.is_success() {
		return Err(map_error_response(response));
	}

	let mut deserializer = serde_json::Deserializer::from_slice(&response.body);
	let raw: RawTokenResponse = serde_path_to_error::deserialize(&mut deserializer).map_err(
		|source| TransientError::TokenResponseParse { source, status: Some(response.status) },
	)?;
	let mut builder =
		AccessTokenResponse::builder(raw.access_token).issued_at(OffsetDateTime::now_utc());

	if let Some(token_type) = raw.token_type {
		builder = builder.token_type(token_type);
	}
	if let Some(expires_in) = raw.expires_in {
		builder = builder.expires_in(Duration::seconds(expires_in));
	}

	Ok(builder.build())
}

fn map_error_response(response: TokenEndpointResponse) -> Error {
	let parsed = serde_json::from_slice::<RawErrorResponse>(&response.body).unwrap_or_default();
	let reason = match (&parsed.error, &parsed.error_description) {
		(_, Some(description)) => description.clone(),
		(Some(error), None) => error.clone(),
		(None, None) => format!("HTTP status {}", response.status),
	};
	let kind = classify_oauth_error(parsed.error.as_deref(), parsed.error_description.as_deref())
		.or_else(|| classify_body(&response.body))
		.unwrap_or_else(|| classify_status(response.status));

	match kind {
		RejectionKind::InvalidGrant => Error::InvalidGrant { reason },
		RejectionKind::InvalidClient => Error::InvalidClient { reason },
		RejectionKind::InsufficientScope => Error::InsufficientScope { reason },
		RejectionKind::Transient => TransientError::TokenEndpoint {
			message: reason,
			status: Some(response.status),
			retry_after: response.retry_after,
		}
		.into(),
	}
}

fn classify_oauth_error(
	oauth_error: Option<&str>,
	error_description: Option<&str>,
) -> Option<RejectionKind> {
	oauth_error
		.and_then(match_exact_value)
		.or_else(|| error_description.and_then(match_exact_value))
}

fn match_exact_value(value: &str) -> Option<RejectionKind> {
	if value.eq_ignore_ascii_case("invalid_grant") || value.eq_ignore_ascii_case("access_denied") {
		Some(RejectionKind::InvalidGrant)
	} else if value.eq_ignore_ascii_case("invalid_client")
		|| value.eq_ignore_ascii_case("unauthorized_client")
	{
		Some(RejectionKind::InvalidClient)
	} else if value.eq_ignore_ascii_case("invalid_scope")
		|| value.eq_ignore_ascii_case("insufficient_scope")
	{
		Some(RejectionKind::InsufficientScope)
	} else if value.eq_ignore_ascii_case("temporarily_unavailable")
		|| value.eq_ignore_ascii_case("server_error")
	{
		Some(RejectionKind::Transient)
	} else {
		None
	}
}

fn classify_body(body: &[u8]) -> Option<RejectionKind> {
	let lowered = String::from_utf8_lossy(body).to_ascii_lowercase();

	match lowered.as_str() {
		text if text.contains("invalid_grant") => Some(RejectionKind::InvalidGrant),
		text if text.contains("invalid_client") => Some(RejectionKind::InvalidClient),
		text if text.contains("insufficient_scope") || text.contains("invalid_scope") =>
			Some(RejectionKind::InsufficientScope),
		text if text.contains("temporarily_unavailable") => Some(RejectionKind::Transient),
		_ => None,
	}
}

fn classify_status(status: u16) -> RejectionKind {
	match status {
		400 | 404 | 410 => RejectionKind::InvalidGrant,
		401 => RejectionKind::InvalidClient,
		403 => RejectionKind::InsufficientScope,
		_ => RejectionKind::Transient,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		config::ClientConfiguration,
		grant::{
			ClientCredentialsGrantRequest, GrantType, OnBehalfOfGrantRequest,
			TokenExchangeGrantRequest,
		},
	};

	fn configuration(grant_type: GrantType, method: ClientAuthMethod) -> ClientConfiguration {
		ClientConfiguration::builder(
			Url::parse("https://login.example.com/tenant/oauth2/v2.0/token")
				.expect("Token endpoint fixture should parse successfully."),
			grant_type,
		)
		.client_id("client-1")
		.client_secret("secret-1")
		.auth_method(method)
		.scope(["api.read", "api.write"])
		.audience("downstream-api")
		.build()
		.expect("Client configuration fixture should build successfully.")
	}

	fn form_value<'f>(form: &'f [(String, String)], key: &str) -> Option<&'f str> {
		form.iter().find(|(name, _)| name == key).map(|(_, value)| value.as_str())
	}

	#[test]
	fn client_credentials_form_carries_grant_scope_and_post_credentials() {
		let request = ClientCredentialsGrantRequest::new(configuration(
			GrantType::ClientCredentials,
			ClientAuthMethod::ClientSecretPost,
		));
		let endpoint_request = build_endpoint_request(&request)
			.expect("Endpoint request should build for client credentials.");

		assert_eq!(endpoint_request.basic_auth, None);
		assert_eq!(form_value(&endpoint_request.form, "grant_type"), Some("client_credentials"));
		assert_eq!(form_value(&endpoint_request.form, "scope"), Some("api.read api.write"));
		assert_eq!(form_value(&endpoint_request.form, "client_id"), Some("client-1"));
		assert_eq!(form_value(&endpoint_request.form, "client_secret"), Some("secret-1"));
	}

	#[test]
	fn on_behalf_of_form_carries_assertion_and_basic_credentials() {
		let request = OnBehalfOfGrantRequest::new(
			configuration(GrantType::JwtBearer, ClientAuthMethod::ClientSecretBasic),
			"inbound-jwt",
		);
		let endpoint_request = build_endpoint_request(&request)
			.expect("Endpoint request should build for on-behalf-of.");

		assert_eq!(
			endpoint_request.basic_auth.as_deref(),
			Some(BASE64.encode("client-1:secret-1").as_str()),
		);
		assert_eq!(
			form_value(&endpoint_request.form, "grant_type"),
			Some("urn:ietf:params:oauth:grant-type:jwt-bearer"),
		);
		assert_eq!(form_value(&endpoint_request.form, "assertion"), Some("inbound-jwt"));
		assert_eq!(
			form_value(&endpoint_request.form, "requested_token_use"),
			Some("on_behalf_of"),
		);
		assert_eq!(form_value(&endpoint_request.form, "client_secret"), None);
	}

	#[test]
	fn token_exchange_form_carries_subject_parameters() {
		let request = TokenExchangeGrantRequest::new(
			configuration(GrantType::TokenExchange, ClientAuthMethod::ClientSecretBasic),
			"inbound-jwt",
		);
		let endpoint_request = build_endpoint_request(&request)
			.expect("Endpoint request should build for token exchange.");

		assert_eq!(
			form_value(&endpoint_request.form, "grant_type"),
			Some("urn:ietf:params:oauth:grant-type:token-exchange"),
		);
		assert_eq!(form_value(&endpoint_request.form, "subject_token"), Some("inbound-jwt"));
		assert_eq!(
			form_value(&endpoint_request.form, "subject_token_type"),
			Some("urn:ietf:params:oauth:token-type:jwt"),
		);
		assert_eq!(form_value(&endpoint_request.form, "audience"), Some("downstream-api"));
	}

	#[test]
	fn successful_responses_parse_into_access_token_responses() {
		let response = TokenEndpointResponse {
			status: 200,
			retry_after: None,
			body: br#"{"access_token":"issued","token_type":"Bearer","expires_in":3600}"#.to_vec(),
		};
		let parsed =
			parse_token_response(response).expect("Well-formed responses should parse.");

		assert_eq!(parsed.access_token.expose(), "issued");
		assert_eq!(parsed.token_type.as_deref(), Some("Bearer"));
		assert_eq!(
			parsed.expires_in_at(parsed.issued_at),
			Some(Duration::seconds(3600)),
		);
	}

	#[test]
	fn malformed_success_bodies_surface_as_parse_failures() {
		let response = TokenEndpointResponse {
			status: 200,
			retry_after: None,
			body: br#"{"token_type":"Bearer"}"#.to_vec(),
		};
		let err = parse_token_response(response)
			.expect_err("Responses without access_token should fail to parse.");

		assert!(matches!(
			err,
			Error::Transient(TransientError::TokenResponseParse { status: Some(200), .. }),
		));
	}

	#[test]
	fn oauth_error_fields_drive_classification() {
		let response = |body: &[u8], status| TokenEndpointResponse {
			status,
			retry_after: None,
			body: body.to_vec(),
		};
		let invalid_grant = map_error_response(response(
			br#"{"error":"invalid_grant","error_description":"assertion is expired"}"#,
			400,
		));
		let invalid_client = map_error_response(response(br#"{"error":"invalid_client"}"#, 401));
		let insufficient = map_error_response(response(br#"{"error":"invalid_scope"}"#, 400));

		assert!(matches!(
			&invalid_grant,
			Error::InvalidGrant { reason } if reason == "assertion is expired",
		));
		assert!(matches!(invalid_client, Error::InvalidClient { .. }));
		assert!(matches!(insufficient, Error::InsufficientScope { .. }));
	}

	#[test]
	fn status_codes_drive_classification_for_opaque_bodies() {
		let response = |status, retry_after| TokenEndpointResponse {
			status,
			retry_after,
			body: b"upstream exploded".to_vec(),
		};

		assert!(matches!(map_error_response(response(400, None)), Error::InvalidGrant { .. }));
		assert!(matches!(map_error_response(response(401, None)), Error::InvalidClient { .. }));
		assert!(matches!(
			map_error_response(response(403, None)),
			Error::InsufficientScope { .. },
		));
		assert!(matches!(
			map_error_response(response(503, Some(Duration::seconds(30)))),
			Error::Transient(TransientError::TokenEndpoint {
				status: Some(503),
				retry_after: Some(retry),
				..
			}) if retry == Duration::seconds(30),
		));
	}

	#[test]
	fn body_hints_outrank_status_codes() {
		let err = map_error_response(TokenEndpointResponse {
			status: 500,
			retry_after: None,
			body: b"error=invalid_grant: refresh no longer valid".to_vec(),
		});

		assert!(matches!(err, Error::InvalidGrant { .. }));
	}
}
