use async_trait::async_trait;
use runtime_models::cache::{InMemoryCache, KeyValueCache, LastModifiedCache};
use runtime_models::{DbError, DynamicModels, ModelSchema, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Cache backend that can be switched off to simulate an outage.
struct FlakyCache {
    inner: InMemoryCache,
    down: AtomicBool,
}

impl FlakyCache {
    fn new() -> Self {
        Self {
            inner: InMemoryCache::new(),
            down: AtomicBool::new(false),
        }
    }

    fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.down.load(Ordering::SeqCst) {
            return Err(DbError::CacheUnavailable("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueCache for FlakyCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.check()?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<()> {
        self.check()?;
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.check()?;
        self.inner.delete(key).await
    }
}

#[tokio::test]
async fn test_entries_expire() -> anyhow::Result<()> {
    let cache = InMemoryCache::new();
    cache
        .set("short", "1".into(), Some(Duration::from_millis(20)))
        .await?;
    cache.set("forever", "2".into(), None).await?;

    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(cache.get("short").await?, None);
    assert_eq!(cache.get("forever").await?, Some("2".to_string()));
    Ok(())
}

#[tokio::test]
async fn test_keys_are_prefixed_and_lowercased() -> anyhow::Result<()> {
    let backend = Arc::new(InMemoryCache::new());
    let cache = LastModifiedCache::new(backend.clone(), "dynamic_models_", Duration::from_secs(60));

    let stamp = cache.update_last_modified("SalesInvoice").await?;
    assert_eq!(cache.cache_key("SalesInvoice"), "dynamic_models_salesinvoice");
    assert!(backend.get("dynamic_models_salesinvoice").await?.is_some());
    assert_eq!(cache.get_last_modified("salesinvoice").await?, Some(stamp));
    Ok(())
}

#[tokio::test]
async fn test_missing_entry_counts_as_current() -> anyhow::Result<()> {
    let cache = LastModifiedCache::new(
        Arc::new(InMemoryCache::new()),
        "test_",
        Duration::from_secs(60),
    );
    let declared = runtime_models::core::clock::now();
    assert!(cache.is_current("Invoice", declared).await);

    cache.update_last_modified("Invoice").await?;
    assert!(!cache.is_current("Invoice", declared).await);

    cache.clear_last_modified("Invoice").await?;
    assert!(cache.is_current("Invoice", declared).await);
    Ok(())
}

#[tokio::test]
async fn test_corrupt_entry_counts_as_stale() -> anyhow::Result<()> {
    let backend = Arc::new(InMemoryCache::new());
    let cache = LastModifiedCache::new(backend.clone(), "test_", Duration::from_secs(60));
    backend.set("test_invoice", "yesterday".into(), None).await?;

    assert!(matches!(
        cache.get_last_modified("Invoice").await,
        Err(DbError::CacheUnavailable(_))
    ));
    assert!(!cache.is_current("Invoice", runtime_models::core::clock::now()).await);
    Ok(())
}

#[tokio::test]
async fn test_cache_outage_forces_rebuild() -> anyhow::Result<()> {
    let backend = Arc::new(FlakyCache::new());
    let models = DynamicModels::builder()
        .cache_backend(backend.clone())
        .build()?;

    let mut schema = ModelSchema::new(&models, "invoice");
    schema.save().await?;
    let before = schema.as_model().await?;
    assert_eq!(schema.as_model().await?.id(), before.id());

    backend.set_down(true);
    let during = schema.as_model().await?;
    assert_ne!(during.id(), before.id());

    // writes through any type are refused while staleness cannot be decided
    assert!(matches!(
        during.create(&models, Vec::<(&str, i64)>::new()).await,
        Err(DbError::OutdatedModel(_))
    ));

    backend.set_down(false);
    let after = schema.as_model().await?;
    assert_eq!(after.id(), during.id());
    Ok(())
}
