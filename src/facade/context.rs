use super::ModelSchema;
use crate::cache::{InMemoryCache, KeyValueCache, LastModifiedCache};
use crate::config::DynamicModelsConfig;
use crate::core::{DbError, Result};
use crate::fields::FieldKindRegistry;
use crate::model::{ModelFactory, ModelRegistry, RecordType};
use crate::schema::{MemorySchemaStore, SchemaStore};
use crate::storage::{InMemoryStorage, StorageEngine};
use log::debug;
use std::sync::Arc;

/// Everything the schema entities need: configuration, the storage engine
/// tables live in, schema storage, the type registry, the invalidation
/// cache and the field-kind resolver.
///
/// Cheap to share behind an `Arc`; every [`ModelSchema`] and
/// [`FieldSchema`](super::FieldSchema) holds one.
pub struct DynamicModels {
    config: DynamicModelsConfig,
    engine: Arc<dyn StorageEngine>,
    store: Arc<dyn SchemaStore>,
    registry: Arc<ModelRegistry>,
    cache: LastModifiedCache,
    field_kinds: FieldKindRegistry,
}

impl DynamicModels {
    pub fn builder() -> DynamicModelsBuilder {
        DynamicModelsBuilder::default()
    }

    /// In-memory collaborators and default configuration. Uses its own
    /// registry rather than [`ModelRegistry::global`].
    pub fn in_memory() -> Arc<Self> {
        Arc::new(Self::assemble(
            DynamicModelsConfig::default(),
            Arc::new(InMemoryStorage::new()),
            Arc::new(MemorySchemaStore::new()),
            Arc::new(ModelRegistry::new()),
            Arc::new(InMemoryCache::new()),
            FieldKindRegistry::default(),
        ))
    }

    fn assemble(
        config: DynamicModelsConfig,
        engine: Arc<dyn StorageEngine>,
        store: Arc<dyn SchemaStore>,
        registry: Arc<ModelRegistry>,
        cache_backend: Arc<dyn KeyValueCache>,
        field_kinds: FieldKindRegistry,
    ) -> Self {
        let cache = LastModifiedCache::new(
            cache_backend,
            config.cache_key_prefix.clone(),
            config.cache_timeout,
        );
        Self {
            config,
            engine,
            store,
            registry,
            cache,
            field_kinds,
        }
    }

    pub fn config(&self) -> &DynamicModelsConfig {
        &self.config
    }

    pub fn engine(&self) -> &Arc<dyn StorageEngine> {
        &self.engine
    }

    pub fn store(&self) -> &Arc<dyn SchemaStore> {
        &self.store
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub fn cache(&self) -> &LastModifiedCache {
        &self.cache
    }

    pub fn field_kinds(&self) -> &FieldKindRegistry {
        &self.field_kinds
    }

    pub fn factory(&self) -> ModelFactory<'_> {
        ModelFactory::new(self)
    }

    /// Pre-write guard: `model` must still be the registered type of its
    /// schema and must not be older than the schema's last invalidation.
    pub async fn ensure_current(&self, model: &RecordType) -> Result<()> {
        let registered = self
            .registry
            .get(model.namespace(), model.type_name())?
            .is_some_and(|current| current.id() == model.id());

        if !registered {
            debug!("record type '{}' was replaced", model.type_name());
            return Err(DbError::OutdatedModel(model.type_name().to_string()));
        }
        if !self.cache.is_current(model.type_name(), model.declared()).await {
            return Err(DbError::OutdatedModel(model.type_name().to_string()));
        }
        Ok(())
    }

    /// Every persisted model schema.
    pub async fn model_schemas(self: &Arc<Self>) -> Result<Vec<ModelSchema>> {
        let rows = self.store.list_models().await?;
        Ok(rows
            .into_iter()
            .map(|row| ModelSchema::from_row(self.clone(), row))
            .collect())
    }

    /// Current record type of the model schema called `name`.
    pub async fn get_model(self: &Arc<Self>, name: &str) -> Result<Arc<RecordType>> {
        let schema = ModelSchema::get_by_name(self, name)
            .await?
            .ok_or_else(|| DbError::SchemaNotFound(format!("model schema '{}'", name)))?;
        schema.as_model().await
    }
}

/// Builder for [`DynamicModels`]; unset collaborators default to the
/// in-memory implementations.
#[derive(Default)]
pub struct DynamicModelsBuilder {
    config: Option<DynamicModelsConfig>,
    engine: Option<Arc<dyn StorageEngine>>,
    store: Option<Arc<dyn SchemaStore>>,
    registry: Option<Arc<ModelRegistry>>,
    cache_backend: Option<Arc<dyn KeyValueCache>>,
    field_kinds: Option<FieldKindRegistry>,
}

impl DynamicModelsBuilder {
    pub fn config(mut self, config: DynamicModelsConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn engine(mut self, engine: Arc<dyn StorageEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn store(mut self, store: Arc<dyn SchemaStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Share a registry, e.g. [`ModelRegistry::global`].
    pub fn registry(mut self, registry: Arc<ModelRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn cache_backend(mut self, backend: Arc<dyn KeyValueCache>) -> Self {
        self.cache_backend = Some(backend);
        self
    }

    pub fn field_kinds(mut self, field_kinds: FieldKindRegistry) -> Self {
        self.field_kinds = Some(field_kinds);
        self
    }

    pub fn build(self) -> Result<Arc<DynamicModels>> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(Arc::new(DynamicModels::assemble(
            config,
            self.engine.unwrap_or_else(|| Arc::new(InMemoryStorage::new())),
            self.store.unwrap_or_else(|| Arc::new(MemorySchemaStore::new())),
            self.registry.unwrap_or_else(|| Arc::new(ModelRegistry::new())),
            self.cache_backend.unwrap_or_else(|| Arc::new(InMemoryCache::new())),
            self.field_kinds.unwrap_or_default(),
        )))
    }
}
