//! Token cache contract and the in-memory single-flight implementation.

// self
use crate::{_prelude::*, client::TokenFuture, token::AccessTokenResponse};

/// Producer invoked on cache miss for the supplied key.
pub type ComputeToken<'a, K> = Box<dyn FnOnce(&'a K) -> TokenFuture<'a> + 'a + Send>;

/// Cache contract for grant-request-keyed access-token responses.
///
/// `get_or_compute` must behave atomically per key: when N concurrent callers
/// request the same absent key, at most one compute invocation executes and all
/// N observe its outcome. Failed computations must never be memoized, so a
/// subsequent caller retries the compute. Capacity and eviction policy are the
/// backend's own concern.
pub trait TokenCache<K>
where
	Self: Send + Sync,
	K: 'static + Clone + Eq + Hash + Send + Sync,
{
	/// Returns the cached response for `key`, or computes, stores, and returns it.
	fn get_or_compute<'a>(&'a self, key: &'a K, compute: ComputeToken<'a, K>) -> TokenFuture<'a>;
}

/// In-process [`TokenCache`] with per-key single-flight guards.
///
/// Entries whose token expires within the configured leeway are treated as
/// absent and dropped on lookup, so callers never receive a response about to
/// expire. Responses without a reported expiry stay until replaced.
pub struct MemoryTokenCache<K>
where
	K: 'static + Clone + Eq + Hash + Send + Sync,
{
	entries: RwLock<HashMap<K, AccessTokenResponse>>,
	guards: Mutex<HashMap<K, Arc<AsyncMutex<()>>>>,
	leeway: Duration,
}
impl<K> MemoryTokenCache<K>
where
	K: 'static + Clone + Eq + Hash + Send + Sync,
{
	const DEFAULT_LEEWAY: Duration = Duration::seconds(10);

	/// Creates a cache with the default staleness leeway (10 seconds).
	pub fn new() -> Self {
		Self::with_leeway(Self::DEFAULT_LEEWAY)
	}

	/// Creates a cache that treats tokens expiring within `leeway` as absent.
	pub fn with_leeway(leeway: Duration) -> Self {
		Self {
			entries: RwLock::new(HashMap::new()),
			guards: Mutex::new(HashMap::new()),
			leeway: if leeway.is_negative() { Duration::ZERO } else { leeway },
		}
	}

	/// Number of entries currently held, stale ones included.
	pub fn len(&self) -> usize {
		self.entries.read().len()
	}

	/// Returns `true` when the cache holds no entries.
	pub fn is_empty(&self) -> bool {
		self.entries.read().is_empty()
	}

	/// Returns (and creates on demand) the single-flight guard for a key.
	fn guard_for(&self, key: &K) -> Arc<AsyncMutex<()>> {
		let mut guards = self.guards.lock();

		guards.entry(key.clone()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
	}

	fn fetch_fresh(&self, key: &K, now: OffsetDateTime) -> Option<AccessTokenResponse> {
		let stale = {
			let entries = self.entries.read();

			match entries.get(key) {
				Some(hit) if !hit.is_stale_at(now, self.leeway) => return Some(hit.clone()),
				Some(_) => true,
				None => false,
			}
		};

		if stale {
			self.entries.write().remove(key);
		}

		None
	}

	fn store(&self, key: K, response: AccessTokenResponse) {
		self.entries.write().insert(key, response);
	}
}
impl<K> Default for MemoryTokenCache<K>
where
	K: 'static + Clone + Eq + Hash + Send + Sync,
{
	fn default() -> Self {
		Self::new()
	}
}
impl<K> Debug for MemoryTokenCache<K>
where
	K: 'static + Clone + Eq + Hash + Send + Sync,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("MemoryTokenCache")
			.field("entries", &self.entries.read().len())
			.field("leeway", &self.leeway)
			.finish()
	}
}
impl<K> TokenCache<K> for MemoryTokenCache<K>
where
	K: 'static + Clone + Eq + Hash + Send + Sync,
{
	fn get_or_compute<'a>(&'a self, key: &'a K, compute: ComputeToken<'a, K>) -> TokenFuture<'a> {
		Box::pin(async move {
			let guard = self.guard_for(key);
			let _singleflight = guard.lock().await;

			if let Some(hit) = self.fetch_fresh(key, OffsetDateTime::now_utc()) {
				return Ok(hit);
			}

			let response = compute(key).await?;

			self.store(key.clone(), response.clone());

			Ok(response)
		})
	}
}
