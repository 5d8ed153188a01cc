use super::RecordType;
use crate::core::{DbError, Result};
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

lazy_static! {
    static ref GLOBAL_REGISTRY: Arc<ModelRegistry> = Arc::new(ModelRegistry::new());
}

type RegistryKey = (String, String);

/// Process-local map of live record types keyed by (namespace, type name).
///
/// Readers take a snapshot of the map (one `Arc` clone) and never block
/// writers. Every mutation builds a new map and swaps it in (copy-on-write).
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: RwLock<Arc<HashMap<RegistryKey, Arc<RecordType>>>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry shared by every `DynamicModels` that does not bring its own.
    pub fn global() -> Arc<ModelRegistry> {
        GLOBAL_REGISTRY.clone()
    }

    fn snapshot(&self) -> Result<Arc<HashMap<RegistryKey, Arc<RecordType>>>> {
        Ok(self.models.read()?.clone())
    }

    fn key(namespace: &str, type_name: &str) -> RegistryKey {
        (namespace.to_string(), type_name.to_string())
    }

    pub fn is_registered(&self, namespace: &str, type_name: &str) -> Result<bool> {
        Ok(self
            .snapshot()?
            .contains_key(&Self::key(namespace, type_name)))
    }

    pub fn get(&self, namespace: &str, type_name: &str) -> Result<Option<Arc<RecordType>>> {
        Ok(self
            .snapshot()?
            .get(&Self::key(namespace, type_name))
            .cloned())
    }

    /// Registers `model`, replacing whatever was registered under its name.
    pub fn register(&self, namespace: &str, model: Arc<RecordType>) -> Result<()> {
        let mut guard = self.models.write()?;
        let mut models = (**guard).clone();
        models.insert(Self::key(namespace, model.type_name()), model);
        *guard = Arc::new(models);
        Ok(())
    }

    pub fn unregister(&self, namespace: &str, type_name: &str) -> Result<Arc<RecordType>> {
        let mut guard = self.models.write()?;
        let mut models = (**guard).clone();
        let removed = models
            .remove(&Self::key(namespace, type_name))
            .ok_or_else(|| DbError::NotRegistered {
                namespace: namespace.to_string(),
                type_name: type_name.to_string(),
            })?;
        *guard = Arc::new(models);
        Ok(removed)
    }

    /// Types registered under `namespace`, sorted by type name.
    pub fn list(&self, namespace: &str) -> Result<Vec<Arc<RecordType>>> {
        let mut models: Vec<Arc<RecordType>> = self
            .snapshot()?
            .iter()
            .filter(|((ns, _), _)| ns == namespace)
            .map(|(_, model)| model.clone())
            .collect();
        models.sort_by(|a, b| a.type_name().cmp(b.type_name()));
        Ok(models)
    }

    pub fn clear(&self) -> Result<()> {
        *self.models.write()? = Arc::new(HashMap::new());
        Ok(())
    }
}
