use super::KeyValueCache;
use crate::core::{DbError, Result, clock};
use chrono::{DateTime, SecondsFormat, Utc};
use log::warn;
use std::sync::Arc;
use std::time::Duration;

/// Last-modified timestamps per model type name.
///
/// This is the only cross-process source of staleness truth: a compiled
/// record type is current while its declared-at stamp is not older than the
/// stamp stored here.
#[derive(Clone)]
pub struct LastModifiedCache {
    backend: Arc<dyn KeyValueCache>,
    key_prefix: String,
    timeout: Duration,
}

impl LastModifiedCache {
    pub fn new(backend: Arc<dyn KeyValueCache>, key_prefix: impl Into<String>, timeout: Duration) -> Self {
        Self {
            backend,
            key_prefix: key_prefix.into(),
            timeout,
        }
    }

    pub fn backend(&self) -> &Arc<dyn KeyValueCache> {
        &self.backend
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn cache_key(&self, type_name: &str) -> String {
        format!("{}{}", self.key_prefix, type_name.to_lowercase())
    }

    pub async fn get_last_modified(&self, type_name: &str) -> Result<Option<DateTime<Utc>>> {
        let Some(raw) = self.backend.get(&self.cache_key(type_name)).await? else {
            return Ok(None);
        };
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| Some(ts.with_timezone(&Utc)))
            .map_err(|e| {
                DbError::CacheUnavailable(format!(
                    "Corrupt last-modified entry for '{}': {}",
                    type_name, e
                ))
            })
    }

    /// Stamps `type_name` as modified now with the configured timeout.
    pub async fn update_last_modified(&self, type_name: &str) -> Result<DateTime<Utc>> {
        let now = clock::now();
        self.update_last_modified_at(type_name, now, self.timeout).await?;
        Ok(now)
    }

    pub async fn update_last_modified_at(
        &self,
        type_name: &str,
        timestamp: DateTime<Utc>,
        timeout: Duration,
    ) -> Result<()> {
        let value = timestamp.to_rfc3339_opts(SecondsFormat::Micros, true);
        self.backend
            .set(&self.cache_key(type_name), value, Some(timeout))
            .await
    }

    pub async fn clear_last_modified(&self, type_name: &str) -> Result<()> {
        self.backend.delete(&self.cache_key(type_name)).await
    }

    /// Whether a type declared at `declared` is still current.
    ///
    /// A missing entry means no invalidation was ever recorded. An
    /// unreachable cache counts as stale.
    pub async fn is_current(&self, type_name: &str, declared: DateTime<Utc>) -> bool {
        match self.get_last_modified(type_name).await {
            Ok(None) => true,
            Ok(Some(last_modified)) => declared >= last_modified,
            Err(err) => {
                warn!(
                    "last-modified lookup failed for '{}', treating compiled type as stale: {}",
                    type_name, err
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;

    fn cache() -> LastModifiedCache {
        LastModifiedCache::new(
            Arc::new(InMemoryCache::new()),
            "test_",
            Duration::from_secs(60),
        )
    }

    #[tokio::test]
    async fn test_get_and_update_last_modified() {
        let cache = cache();
        assert_eq!(cache.get_last_modified("Invoice").await.unwrap(), None);
        let stamped = cache.update_last_modified("Invoice").await.unwrap();
        assert_eq!(cache.get_last_modified("invoice").await.unwrap(), Some(stamped));
    }

    #[tokio::test]
    async fn test_clear_last_modified() {
        let cache = cache();
        cache.update_last_modified("Invoice").await.unwrap();
        cache.clear_last_modified("Invoice").await.unwrap();
        assert_eq!(cache.get_last_modified("Invoice").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_is_current_compares_stamps() {
        let cache = cache();
        let declared = clock::now();
        assert!(cache.is_current("Invoice", declared).await);
        cache.update_last_modified("Invoice").await.unwrap();
        assert!(!cache.is_current("Invoice", declared).await);
        assert!(cache.is_current("Invoice", clock::now()).await);
    }

    #[test]
    fn test_cache_key_uses_prefix() {
        assert_eq!(cache().cache_key("SimpleModel"), "test_simplemodel");
    }
}
