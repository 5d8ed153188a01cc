use crate::core::{DbError, Result};
use crate::fields::FieldDeclaration;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_NAMESPACE: &str = "dynamic_models";
pub const DEFAULT_CACHE_KEY_PREFIX: &str = "dynamic_models_";
pub const DEFAULT_CACHE_TIMEOUT: Duration = Duration::from_secs(60 * 60 * 24);

/// Process-wide defaults for generated record types.
///
/// Loaded once at start-up and shared read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DynamicModelsConfig {
    /// Registry namespace of every generated type
    pub namespace: String,

    /// Optional prefix for generated table names
    pub table_prefix: Option<String>,

    /// Fields merged into every generated type
    pub default_fields: Vec<FieldDeclaration>,

    /// Length substituted for bounded text fields saved without one.
    /// `None` makes such saves fail instead.
    pub default_charfield_max_length: Option<u32>,

    /// Prefix of invalidation cache keys
    pub cache_key_prefix: String,

    /// Lifetime of invalidation cache entries, in seconds when serialized
    #[serde(serialize_with = "serialize_secs", deserialize_with = "deserialize_secs")]
    pub cache_timeout: Duration,
}

impl Default for DynamicModelsConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            table_prefix: None,
            default_fields: Vec::new(),
            default_charfield_max_length: None,
            cache_key_prefix: DEFAULT_CACHE_KEY_PREFIX.to_string(),
            cache_timeout: DEFAULT_CACHE_TIMEOUT,
        }
    }
}

impl DynamicModelsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the registry namespace
    pub fn namespace(mut self, namespace: &str) -> Self {
        self.namespace = namespace.to_string();
        self
    }

    /// Set the table name prefix
    pub fn table_prefix(mut self, prefix: &str) -> Self {
        self.table_prefix = Some(prefix.to_string());
        self
    }

    /// Add a field merged into every generated type
    pub fn default_field(mut self, field: FieldDeclaration) -> Self {
        self.default_fields.push(field);
        self
    }

    /// Set the fallback length of bounded text fields
    pub fn default_charfield_max_length(mut self, max_length: u32) -> Self {
        self.default_charfield_max_length = Some(max_length);
        self
    }

    /// Set the cache key prefix
    pub fn cache_key_prefix(mut self, prefix: &str) -> Self {
        self.cache_key_prefix = prefix.to_string();
        self
    }

    /// Set the cache entry lifetime
    pub fn cache_timeout(mut self, timeout: Duration) -> Self {
        self.cache_timeout = timeout;
        self
    }

    /// Parse from a JSON document; missing keys take their defaults.
    ///
    /// # Examples
    ///
    /// ```
    /// use runtime_models::DynamicModelsConfig;
    ///
    /// let config = DynamicModelsConfig::from_json(r#"{"cache_timeout": 60}"#).unwrap();
    /// assert_eq!(config.cache_timeout.as_secs(), 60);
    /// assert_eq!(config.namespace, "dynamic_models");
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            DbError::IoError(format!("Failed to read config '{}': {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.namespace.trim().is_empty() {
            return Err(DbError::ExecutionError("namespace must not be empty".to_string()));
        }
        if self.default_charfield_max_length == Some(0) {
            return Err(DbError::ExecutionError(
                "default_charfield_max_length must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn serialize_secs<S: Serializer>(value: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(value.as_secs())
}

fn deserialize_secs<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DynamicModelsConfig::default();
        assert!(config.default_fields.is_empty());
        assert_eq!(config.default_charfield_max_length, None);
        assert_eq!(config.cache_key_prefix, "dynamic_models_");
        assert_eq!(config.cache_timeout, Duration::from_secs(86_400));
    }

    #[test]
    fn test_builder() {
        let config = DynamicModelsConfig::new()
            .default_charfield_max_length(64)
            .cache_key_prefix("test")
            .cache_timeout(Duration::from_secs(1))
            .default_field(FieldDeclaration::new("created", "datetime"));
        assert_eq!(config.default_charfield_max_length, Some(64));
        assert_eq!(config.cache_key_prefix, "test");
        assert_eq!(config.cache_timeout.as_secs(), 1);
        assert_eq!(config.default_fields.len(), 1);
    }

    #[test]
    fn test_from_json() {
        let config = DynamicModelsConfig::from_json(
            r#"{
                "default_fields": [{"name": "created", "class_name": "datetime"}],
                "default_charfield_max_length": 32
            }"#,
        )
        .unwrap();
        assert_eq!(config.default_fields[0].name, "created");
        assert!(config.default_fields[0].options.null);
        assert_eq!(config.default_charfield_max_length, Some(32));
    }

    #[test]
    fn test_from_json_rejects_unknown_keys() {
        assert!(DynamicModelsConfig::from_json(r#"{"cache_ttl": 5}"#).is_err());
        assert!(DynamicModelsConfig::from_json(r#"{"namespace": " "}"#).is_err());
    }
}
