//! Inbound bearer-token resolution for user-bound grants.

// self
use crate::token::TokenSecret;

/// Resolves the inbound bearer token from the caller's validation context.
///
/// On-behalf-of and token-exchange grants forward the caller's own token to the
/// authorization server; implementations typically read it from the request
/// context of the surrounding framework. Absence is a normal outcome and is
/// reported as `None`, never as an error.
pub trait BearerTokenResolver: Send + Sync {
	/// Returns the inbound bearer token, when one is present.
	fn token(&self) -> Option<String>;
}

/// Resolver that always yields the same inbound token.
///
/// Useful for tests and for call sites that already hold the caller's token.
#[derive(Clone, Debug)]
pub struct StaticBearerTokenResolver(TokenSecret);
impl StaticBearerTokenResolver {
	/// Wraps a fixed inbound token.
	pub fn new(token: impl Into<String>) -> Self {
		Self(TokenSecret::new(token))
	}
}
impl BearerTokenResolver for StaticBearerTokenResolver {
	fn token(&self) -> Option<String> {
		Some(self.0.expose().to_owned())
	}
}

/// Resolver for contexts without an authenticated caller (e.g., background jobs).
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyBearerTokenResolver;
impl BearerTokenResolver for EmptyBearerTokenResolver {
	fn token(&self) -> Option<String> {
		None
	}
}
