//! Access-token service facade: grant dispatch plus cache-aside orchestration.

// std
use std::sync::atomic::{AtomicBool, Ordering};
// self
use crate::{
	_prelude::*,
	cache::TokenCache,
	client::TokenClient,
	config::ClientConfiguration,
	error::ConfigError,
	grant::{
		ClientCredentialsGrantRequest, GrantRequest, GrantType, OnBehalfOfGrantRequest,
		TokenExchangeGrantRequest,
	},
	obs::{self, CacheOutcome, FlowKind, FlowOutcome, FlowSpan},
	resolver::BearerTokenResolver,
	token::AccessTokenResponse,
};

/// Dispatches access-token requests to grant-specific token clients with
/// optional per-grant caching.
///
/// The service owns no mutable state and performs no locking of its own, so it
/// is safe to share across tasks behind an `Arc`. Deduplication of concurrent
/// identical requests is delegated entirely to the injected caches; when a
/// grant's cache is absent, every call reaches its token client.
pub struct AccessTokenService {
	resolver: Arc<dyn BearerTokenResolver>,
	on_behalf_of_client: Arc<dyn TokenClient<OnBehalfOfGrantRequest>>,
	client_credentials_client: Arc<dyn TokenClient<ClientCredentialsGrantRequest>>,
	token_exchange_client: Arc<dyn TokenClient<TokenExchangeGrantRequest>>,
	on_behalf_of_cache: Option<Arc<dyn TokenCache<OnBehalfOfGrantRequest>>>,
	client_credentials_cache: Option<Arc<dyn TokenCache<ClientCredentialsGrantRequest>>>,
	token_exchange_cache: Option<Arc<dyn TokenCache<TokenExchangeGrantRequest>>>,
}
impl AccessTokenService {
	/// Creates a service over the provided resolver and grant-specific clients.
	///
	/// Caching starts disabled for every grant type; attach caches with the
	/// `with_*_cache` methods.
	pub fn new(
		resolver: Arc<dyn BearerTokenResolver>,
		on_behalf_of_client: Arc<dyn TokenClient<OnBehalfOfGrantRequest>>,
		client_credentials_client: Arc<dyn TokenClient<ClientCredentialsGrantRequest>>,
		token_exchange_client: Arc<dyn TokenClient<TokenExchangeGrantRequest>>,
	) -> Self {
		Self {
			resolver,
			on_behalf_of_client,
			client_credentials_client,
			token_exchange_client,
			on_behalf_of_cache: None,
			client_credentials_cache: None,
			token_exchange_cache: None,
		}
	}

	/// Attaches a cache for on-behalf-of grant requests.
	pub fn with_on_behalf_of_cache(
		mut self,
		cache: Arc<dyn TokenCache<OnBehalfOfGrantRequest>>,
	) -> Self {
		self.on_behalf_of_cache = Some(cache);

		self
	}

	/// Attaches a cache for client-credentials grant requests.
	pub fn with_client_credentials_cache(
		mut self,
		cache: Arc<dyn TokenCache<ClientCredentialsGrantRequest>>,
	) -> Self {
		self.client_credentials_cache = Some(cache);

		self
	}

	/// Attaches a cache for token-exchange grant requests.
	pub fn with_token_exchange_cache(
		mut self,
		cache: Arc<dyn TokenCache<TokenExchangeGrantRequest>>,
	) -> Self {
		self.token_exchange_cache = Some(cache);

		self
	}

	/// Acquires an access token for the provided client configuration.
	///
	/// Fails with [`ConfigError::MissingClientConfiguration`] when no
	/// configuration is supplied, and with [`ConfigError::UnsupportedGrantType`]
	/// when the configured grant type falls outside the supported set; neither
	/// failure reaches a token client. User-bound grants additionally require
	/// the resolver to produce an inbound bearer token.
	pub async fn get_access_token(
		&self,
		configuration: Option<&ClientConfiguration>,
	) -> Result<AccessTokenResponse> {
		let configuration = configuration.ok_or(ConfigError::MissingClientConfiguration)?;

		obs::debug_grant_selected(&configuration.grant_type);

		match &configuration.grant_type {
			GrantType::JwtBearer => self.execute_on_behalf_of(configuration).await,
			GrantType::ClientCredentials => self.execute_client_credentials(configuration).await,
			GrantType::TokenExchange => self.execute_token_exchange(configuration).await,
			GrantType::Other(value) =>
				Err(ConfigError::UnsupportedGrantType { grant: value.clone() }.into()),
		}
	}

	async fn execute_on_behalf_of(
		&self,
		configuration: &ClientConfiguration,
	) -> Result<AccessTokenResponse> {
		const KIND: FlowKind = FlowKind::OnBehalfOf;

		let span = FlowSpan::new(KIND, "on_behalf_of");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let assertion = self
					.resolver
					.token()
					.ok_or(ConfigError::MissingBearerToken { action: "on-behalf-of" })?;
				let request = OnBehalfOfGrantRequest::new(configuration.clone(), assertion);

				cache_or_fetch(
					KIND,
					self.on_behalf_of_cache.as_deref(),
					self.on_behalf_of_client.as_ref(),
					request,
				)
				.await
			})
			.await;

		record_result(KIND, &result);

		result
	}

	async fn execute_client_credentials(
		&self,
		configuration: &ClientConfiguration,
	) -> Result<AccessTokenResponse> {
		const KIND: FlowKind = FlowKind::ClientCredentials;

		let span = FlowSpan::new(KIND, "client_credentials");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let request = ClientCredentialsGrantRequest::new(configuration.clone());

				cache_or_fetch(
					KIND,
					self.client_credentials_cache.as_deref(),
					self.client_credentials_client.as_ref(),
					request,
				)
				.await
			})
			.await;

		record_result(KIND, &result);

		result
	}

	async fn execute_token_exchange(
		&self,
		configuration: &ClientConfiguration,
	) -> Result<AccessTokenResponse> {
		const KIND: FlowKind = FlowKind::TokenExchange;

		let span = FlowSpan::new(KIND, "token_exchange");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let subject_token = self
					.resolver
					.token()
					.ok_or(ConfigError::MissingBearerToken { action: "token-exchange" })?;
				let request = TokenExchangeGrantRequest::new(configuration.clone(), subject_token);

				cache_or_fetch(
					KIND,
					self.token_exchange_cache.as_deref(),
					self.token_exchange_client.as_ref(),
					request,
				)
				.await
			})
			.await;

		record_result(KIND, &result);

		result
	}
}
impl Debug for AccessTokenService {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccessTokenService")
			.field("on_behalf_of_cache_enabled", &self.on_behalf_of_cache.is_some())
			.field("client_credentials_cache_enabled", &self.client_credentials_cache.is_some())
			.field("token_exchange_cache_enabled", &self.token_exchange_cache.is_some())
			.finish()
	}
}

/// Cache-aside helper shared by every grant path.
///
/// A present cache answers through its atomic get-or-compute primitive, which
/// also owns the single-flight guarantee; an absent cache routes straight to
/// the token client on every call. Compute failures propagate uncached.
async fn cache_or_fetch<K>(
	kind: FlowKind,
	cache: Option<&dyn TokenCache<K>>,
	client: &dyn TokenClient<K>,
	request: K,
) -> Result<AccessTokenResponse>
where
	K: GrantRequest + 'static + Clone + Eq + Hash + Send + Sync,
{
	match cache {
		Some(cache) => {
			let computed = AtomicBool::new(false);
			let result = cache
				.get_or_compute(
					&request,
					Box::new(|key| {
						computed.store(true, Ordering::Relaxed);

						client.get_token_response(key)
					}),
				)
				.await;

			if result.is_ok() {
				let outcome = if computed.load(Ordering::Relaxed) {
					CacheOutcome::Miss
				} else {
					CacheOutcome::Hit
				};

				obs::record_cache_outcome(kind, outcome);
			}

			result
		},
		None => {
			obs::record_cache_outcome(kind, CacheOutcome::Bypass);

			client.get_token_response(&request).await
		},
	}
}

fn record_result(kind: FlowKind, result: &Result<AccessTokenResponse>) {
	match result {
		Ok(_) => obs::record_flow_outcome(kind, FlowOutcome::Success),
		Err(_) => obs::record_flow_outcome(kind, FlowOutcome::Failure),
	}
}
