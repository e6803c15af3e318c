//! Object cache used for cache-aside reads of detail pages.

use std::{
	any::Any,
	future::Future,
	num::NonZeroUsize,
	sync::Arc,
	time::{Duration, Instant},
};

use lru::LruCache;
use tokio::sync::Mutex;
use uuid::Uuid;

/// A cached value. Readers downcast it back to the type they stored.
pub type Object = Arc<dyn Any + Send + Sync>;

pub type Cache = Arc<dyn CacheBackend>;

#[axum::async_trait]
pub trait CacheBackend: Send + Sync {
	async fn get(&self, key: &str) -> Option<Object>;

	/// Stores `value` with the backend's default lifetime.
	async fn set(&self, key: String, value: Object);
}

/// Cache key of a post's detail page.
pub fn post_key(id: Uuid) -> String {
	format!("post-{id}")
}

/// Returns the cached value under `key`, or loads it and caches the result.
///
/// Nothing is cached when `load` finds no value. A cached value of another type
/// counts as a miss and is overwritten.
pub async fn read_through<T, E, F, Fut>(
	cache: &dyn CacheBackend,
	key: &str,
	load: F,
) -> Result<Option<T>, E>
where
	T: Clone + Send + Sync + 'static,
	F: FnOnce() -> Fut,
	Fut: Future<Output = Result<Option<T>, E>>,
{
	if let Some(hit) = cache.get(key).await {
		if let Ok(value) = hit.downcast::<T>() {
			tracing::trace!(key, "cache hit");

			return Ok(Some(T::clone(&value)));
		}
	}

	let Some(value) = load().await? else {
		return Ok(None);
	};

	cache.set(key.to_owned(), Arc::new(value.clone())).await;
	tracing::trace!(key, "cache populated");

	Ok(Some(value))
}

struct Entry {
	value: Object,
	expires_at: Instant,
}

/// An in-process LRU cache whose entries expire after a fixed lifetime.
pub struct MemoryCache {
	entries: Mutex<LruCache<String, Entry>>,
	ttl: Duration,
}

impl MemoryCache {
	pub fn new(capacity: NonZeroUsize, ttl: Duration) -> Self {
		Self {
			entries: Mutex::new(LruCache::new(capacity)),
			ttl,
		}
	}
}

#[axum::async_trait]
impl CacheBackend for MemoryCache {
	async fn get(&self, key: &str) -> Option<Object> {
		let mut entries = self.entries.lock().await;

		let expired = match entries.get(key) {
			Some(entry) if entry.expires_at > Instant::now() => return Some(entry.value.clone()),
			Some(_) => true,
			None => false,
		};

		if expired {
			entries.pop(key);
		}

		None
	}

	async fn set(&self, key: String, value: Object) {
		let entry = Entry {
			value,
			expires_at: Instant::now() + self.ttl,
		};

		self.entries.lock().await.put(key, entry);
	}
}
