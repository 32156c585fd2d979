//! In-process response cache with absolute expiry.
//!
//! Values are stored type-erased and cloned out on hit. Expired entries are
//! dropped lazily on lookup.

use dashmap::DashMap;
use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::observability::metrics;

struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
    expires_at: Instant,
}

pub struct MemoryCache {
    entries: DashMap<String, CacheEntry>,
    default_ttl: Duration,
}

impl MemoryCache {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl,
        }
    }

    pub fn get<T: Clone + Send + Sync + 'static>(&self, key: &str) -> Option<T> {
        let now = Instant::now();
        let hit = self.entries.get(key).and_then(|entry| {
            if entry.expires_at > now {
                entry.value.downcast_ref::<T>().cloned()
            } else {
                None
            }
        });

        if hit.is_none() {
            self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
        }
        metrics::record_cache_lookup(key, hit.is_some());
        hit
    }

    pub fn set<T: Send + Sync + 'static>(&self, key: impl Into<String>, value: T) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    pub fn set_with_ttl<T: Send + Sync + 'static>(&self, key: impl Into<String>, value: T, ttl: Duration) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                value: Arc::new(value),
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Cached value for `key`, or the result of `load` (cached when `Ok`).
    pub async fn get_or_try_insert_with<T, E, F, Fut>(&self, key: &str, load: F) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get::<T>(key) {
            return Ok(value);
        }
        let value = load().await?;
        self.set(key, value.clone());
        Ok(value)
    }

    pub fn remove(&self, key: &str) {
        self.entries.remove(key);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entries", &self.entries.len())
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_and_type_mismatch() {
        let cache = MemoryCache::new(Duration::from_secs(30));
        cache.set("brands", vec!["Azure".to_string()]);

        assert_eq!(cache.get::<Vec<String>>("brands"), Some(vec!["Azure".to_string()]));
        assert_eq!(cache.get::<u32>("brands"), None);
        assert_eq!(cache.get::<Vec<String>>("types"), None);
    }

    #[test]
    fn test_expired_entries_are_dropped() {
        let cache = MemoryCache::new(Duration::from_secs(30));
        cache.set_with_ttl("brands", 1u32, Duration::ZERO);

        assert_eq!(cache.get::<u32>("brands"), None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_loader_runs_once_while_fresh() {
        let cache = MemoryCache::new(Duration::from_secs(30));
        let first: Result<u32, ()> = cache.get_or_try_insert_with("n", || async { Ok(1) }).await;
        let second: Result<u32, ()> = cache.get_or_try_insert_with("n", || async { Ok(2) }).await;
        assert_eq!((first, second), (Ok(1), Ok(1)));

        let failed: Result<u32, &str> = cache.get_or_try_insert_with("m", || async { Err("down") }).await;
        assert_eq!(failed, Err("down"));
        assert_eq!(cache.len(), 1);
    }
}
