use crate::core::{DbError, Result};
use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Key/value store shared by every process instance that drives the same
/// schemas. Individual key operations are expected to be atomic.
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value`; `ttl = None` keeps it until evicted or deleted.
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}

/// In-process cache with per-entry expiry.
///
/// Sharing one instance between several `DynamicModels` contexts behaves
/// like a cache server shared between processes.
pub struct InMemoryCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
}

impl InMemoryCache {
    /// Unbounded: entries leave only by expiry or delete.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(LruCache::unbounded()),
        }
    }

    /// Keeps at most `capacity` entries, evicting the least recently used.
    ///
    /// An evicted last-modified stamp reads as "never invalidated", the same
    /// as an expired one, so types compiled before the eviction look current
    /// again. Size it above the number of live model schemas.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) -> Result<()> {
        self.entries.lock()?.clear();
        Ok(())
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueCache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| DbError::CacheUnavailable(e.to_string()))?;

        let expired = match entries.get(key) {
            Some(entry) if entry.is_expired(Instant::now()) => true,
            Some(entry) => return Ok(Some(entry.value.clone())),
            None => return Ok(None),
        };
        if expired {
            entries.pop(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| DbError::CacheUnavailable(e.to_string()))?;
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        entries.put(key.to_string(), CacheEntry { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| DbError::CacheUnavailable(e.to_string()))?;
        entries.pop(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let cache = InMemoryCache::new();
        assert_eq!(cache.get("k").await.unwrap(), None);
        cache.set("k", "v".into(), None).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("v"));
        cache.delete("k").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let cache = InMemoryCache::new();
        cache
            .set("k", "v".into(), Some(Duration::from_millis(10)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_capacity_evicts_least_recent() {
        let cache = InMemoryCache::with_capacity(2);
        cache.set("a", "1".into(), None).await.unwrap();
        cache.set("b", "2".into(), None).await.unwrap();
        cache.set("c", "3".into(), None).await.unwrap();
        assert_eq!(cache.get("a").await.unwrap(), None);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_default_cache_never_evicts() {
        let cache = InMemoryCache::new();
        for i in 0..10_000 {
            cache.set(&format!("k{}", i), i.to_string(), None).await.unwrap();
        }
        assert_eq!(cache.get("k0").await.unwrap().as_deref(), Some("0"));
        assert_eq!(cache.len(), 10_000);
    }
}
