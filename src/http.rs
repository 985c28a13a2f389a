//! Transport primitives for token endpoint calls.
//!
//! The module exposes [`OAuth2HttpClient`] alongside the [`TokenEndpointRequest`]
//! and [`TokenEndpointResponse`] value types so downstream crates can integrate
//! custom HTTP stacks. Transports submit a single form POST and hand back the
//! raw response; interpreting the body (success parsing, error classification)
//! belongs to the token client layer, never to the transport.

// std
use std::ops::Deref;
// crates.io
#[cfg(feature = "reqwest")] use reqwest::header::{AUTHORIZATION, HeaderMap, RETRY_AFTER};
#[cfg(feature = "reqwest")] use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, error::TransportError};

/// Boxed future returned by transport calls.
pub type HttpFuture<'a> =
	Pin<Box<dyn Future<Output = Result<TokenEndpointResponse, TransportError>> + 'a + Send>>;

/// Form POST submitted to a token endpoint.
#[derive(Clone)]
pub struct TokenEndpointRequest {
	/// Token endpoint receiving the POST.
	pub url: Url,
	/// Base64 credentials for HTTP Basic client authentication.
	pub basic_auth: Option<String>,
	/// URL-encoded form parameters, sorted by key.
	pub form: Vec<(String, String)>,
}
impl Debug for TokenEndpointRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		// The form carries secrets (client_secret, assertion, subject_token).
		f.debug_struct("TokenEndpointRequest")
			.field("url", &self.url.as_str())
			.field("basic_auth_set", &self.basic_auth.is_some())
			.field("form_keys", &self.form.iter().map(|(key, _)| key.as_str()).collect::<Vec<_>>())
			.finish()
	}
}

/// Raw token endpoint response captured for parsing and error mapping.
#[derive(Clone, Debug)]
pub struct TokenEndpointResponse {
	/// HTTP status code returned by the token endpoint.
	pub status: u16,
	/// Retry-After hint expressed as a relative duration, when supplied.
	pub retry_after: Option<Duration>,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl TokenEndpointResponse {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Abstraction over HTTP transports capable of executing token endpoint POSTs.
///
/// The trait is the crate's only dependency on an HTTP stack. Implementations
/// must submit the form with `application/x-www-form-urlencoded` encoding and
/// never follow redirects, matching OAuth 2.0 guidance that token endpoints
/// return results directly instead of delegating to another URI. Network and IO
/// failures surface as [`TransportError`]; non-2xx responses are returned
/// verbatim for the caller to classify.
pub trait OAuth2HttpClient
where
	Self: 'static + Send + Sync,
{
	/// Submits the form POST and captures the raw response.
	fn post_form(&self, request: TokenEndpointRequest) -> HttpFuture<'_>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
/// Configure any custom [`ReqwestClient`] to disable redirect following before
/// wrapping it, because the crate submits client secrets with every request.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl OAuth2HttpClient for ReqwestHttpClient {
	fn post_form(&self, request: TokenEndpointRequest) -> HttpFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let mut builder = client.post(request.url.clone()).form(&request.form);

			if let Some(credentials) = &request.basic_auth {
				builder = builder.header(AUTHORIZATION, format!("Basic {credentials}"));
			}

			let response = builder.send().await.map_err(TransportError::from)?;
			let status = response.status().as_u16();
			let retry_after = parse_retry_after(response.headers());
			let body = response.bytes().await.map_err(TransportError::from)?.to_vec();

			Ok(TokenEndpointResponse { status, retry_after, body })
		})
	}
}

#[cfg(feature = "reqwest")]
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(secs as i64));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}
