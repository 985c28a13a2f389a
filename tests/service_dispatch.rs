// std
use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};
// crates.io
use time::Duration;
use url::Url;
// self
use oauth2_relay::{
	cache::MemoryTokenCache,
	client::{TokenClient, TokenFuture},
	config::{ClientAuthMethod, ClientConfiguration},
	error::{ConfigError, Error},
	grant::{ClientCredentialsGrantRequest, GrantRequest, GrantType, OnBehalfOfGrantRequest},
	resolver::{BearerTokenResolver, EmptyBearerTokenResolver, StaticBearerTokenResolver},
	service::AccessTokenService,
	token::AccessTokenResponse,
};

/// Token client double that counts invocations and mints a distinct token per call.
struct CountingTokenClient {
	calls: AtomicUsize,
	fail_first: bool,
}
impl CountingTokenClient {
	fn new() -> Arc<Self> {
		Arc::new(Self { calls: AtomicUsize::new(0), fail_first: false })
	}

	fn failing_once() -> Arc<Self> {
		Arc::new(Self { calls: AtomicUsize::new(0), fail_first: true })
	}

	fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl<R> TokenClient<R> for CountingTokenClient
where
	R: GrantRequest,
{
	fn get_token_response<'a>(&'a self, _request: &'a R) -> TokenFuture<'a> {
		let call = self.calls.fetch_add(1, Ordering::SeqCst);
		let fail = self.fail_first && call == 0;

		Box::pin(async move {
			if fail {
				return Err(Error::InvalidClient { reason: "first call rejected by fixture".into() });
			}

			Ok(AccessTokenResponse::builder(format!("token-{call}"))
				.token_type("Bearer")
				.expires_in(Duration::minutes(30))
				.build())
		})
	}
}

fn service_with(
	resolver: Arc<dyn BearerTokenResolver>,
	client: Arc<CountingTokenClient>,
) -> AccessTokenService {
	AccessTokenService::new(resolver, client.clone(), client.clone(), client)
}

fn configuration(grant_type: GrantType) -> ClientConfiguration {
	ClientConfiguration::builder(
		Url::parse("https://login.example.com/tenant/oauth2/v2.0/token")
			.expect("Token endpoint fixture should parse successfully."),
		grant_type,
	)
	.client_id("client-1")
	.client_secret("secret-1")
	.auth_method(ClientAuthMethod::ClientSecretPost)
	.scope(["api://downstream/.default"])
	.audience("downstream-api")
	.build()
	.expect("Client configuration fixture should build successfully.")
}

#[tokio::test]
async fn missing_configuration_is_rejected() {
	let client = CountingTokenClient::new();
	let service = service_with(Arc::new(EmptyBearerTokenResolver), client.clone());
	let err = service
		.get_access_token(None)
		.await
		.expect_err("Calls without a configuration should be rejected.");

	assert!(matches!(err, Error::Config(ConfigError::MissingClientConfiguration)));
	assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn unsupported_grant_types_never_reach_a_token_client() {
	let client = CountingTokenClient::new();
	let service =
		service_with(Arc::new(StaticBearerTokenResolver::new("inbound-jwt")), client.clone());

	for value in ["password", "authorization_code", "refresh_token", "urn:example:custom"] {
		let config = configuration(GrantType::Other(value.into()));
		let err = service
			.get_access_token(Some(&config))
			.await
			.expect_err("Out-of-band grant types should be rejected.");

		assert!(
			matches!(&err, Error::Config(ConfigError::UnsupportedGrantType { grant }) if grant == value),
		);
		assert!(err.to_string().contains(value));
		assert!(err.to_string().contains("client_credentials"));
	}

	assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn user_bound_grants_require_an_inbound_token() {
	for (grant_type, action) in
		[(GrantType::JwtBearer, "on-behalf-of"), (GrantType::TokenExchange, "token-exchange")]
	{
		let client = CountingTokenClient::new();
		let service = service_with(Arc::new(EmptyBearerTokenResolver), client.clone());
		let config = configuration(grant_type);
		let err = service
			.get_access_token(Some(&config))
			.await
			.expect_err("User-bound grants should fail without an inbound token.");

		assert!(matches!(
			&err,
			Error::Config(ConfigError::MissingBearerToken { action: reported }) if *reported == action,
		));
		assert!(err.to_string().contains(action));
		assert_eq!(client.calls(), 0);
	}
}

#[tokio::test]
async fn client_credentials_without_a_resolver_token_still_succeeds() {
	let client = CountingTokenClient::new();
	let service = service_with(Arc::new(EmptyBearerTokenResolver), client.clone());
	let config = configuration(GrantType::ClientCredentials);
	let response = service
		.get_access_token(Some(&config))
		.await
		.expect("Client credentials should not consult the resolver.");

	assert_eq!(response.access_token.expose(), "token-0");
	assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn cached_grants_invoke_the_client_once() {
	let client = CountingTokenClient::new();
	let cache: Arc<MemoryTokenCache<ClientCredentialsGrantRequest>> =
		Arc::new(MemoryTokenCache::new());
	let service = service_with(Arc::new(EmptyBearerTokenResolver), client.clone())
		.with_client_credentials_cache(cache);
	let config = configuration(GrantType::ClientCredentials);
	let first = service
		.get_access_token(Some(&config))
		.await
		.expect("First cached call should succeed.");
	let second = service
		.get_access_token(Some(&config))
		.await
		.expect("Second cached call should succeed.");

	assert_eq!(first, second);
	assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn on_behalf_of_caches_per_resolved_assertion() {
	let client = CountingTokenClient::new();
	let cache: Arc<MemoryTokenCache<OnBehalfOfGrantRequest>> = Arc::new(MemoryTokenCache::new());
	let service = service_with(Arc::new(StaticBearerTokenResolver::new("inbound-jwt")), client.clone())
		.with_on_behalf_of_cache(cache);
	let config = configuration(GrantType::JwtBearer);
	let first = service
		.get_access_token(Some(&config))
		.await
		.expect("First on-behalf-of call should succeed.");
	let second = service
		.get_access_token(Some(&config))
		.await
		.expect("Second on-behalf-of call should succeed.");

	assert_eq!(first, second);
	assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn disabled_caching_reaches_the_client_every_call() {
	let client = CountingTokenClient::new();
	let service = service_with(Arc::new(EmptyBearerTokenResolver), client.clone());
	let config = configuration(GrantType::ClientCredentials);
	let first = service
		.get_access_token(Some(&config))
		.await
		.expect("First uncached call should succeed.");
	let second = service
		.get_access_token(Some(&config))
		.await
		.expect("Second uncached call should succeed.");

	assert_ne!(first.access_token.expose(), second.access_token.expose());
	assert_eq!(client.calls(), 2);
}

#[tokio::test]
async fn concurrent_identical_requests_share_one_client_call() {
	let client = CountingTokenClient::new();
	let cache: Arc<MemoryTokenCache<ClientCredentialsGrantRequest>> =
		Arc::new(MemoryTokenCache::new());
	let service = service_with(Arc::new(EmptyBearerTokenResolver), client.clone())
		.with_client_credentials_cache(cache);
	let config = configuration(GrantType::ClientCredentials);
	let (first, second) = tokio::join!(
		service.get_access_token(Some(&config)),
		service.get_access_token(Some(&config)),
	);
	let first = first.expect("First concurrent call should succeed.");
	let second = second.expect("Second concurrent call should succeed.");

	assert_eq!(first.access_token.expose(), second.access_token.expose());
	assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn client_failures_are_never_memoized() {
	let client = CountingTokenClient::failing_once();
	let cache: Arc<MemoryTokenCache<ClientCredentialsGrantRequest>> =
		Arc::new(MemoryTokenCache::new());
	let service = service_with(Arc::new(EmptyBearerTokenResolver), client.clone())
		.with_client_credentials_cache(cache);
	let config = configuration(GrantType::ClientCredentials);
	let err = service
		.get_access_token(Some(&config))
		.await
		.expect_err("The fixture rejects its first call.");

	assert!(matches!(err, Error::InvalidClient { .. }));

	let recovered = service
		.get_access_token(Some(&config))
		.await
		.expect("The retry should reach the client again and succeed.");

	assert_eq!(recovered.access_token.expose(), "token-1");
	assert_eq!(client.calls(), 2);
}
