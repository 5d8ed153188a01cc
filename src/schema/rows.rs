use crate::core::naming;
use crate::fields::FieldOptions;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted model schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSchemaRow {
    pub id: u64,
    pub name: String,
    /// Bumped on every schema-affecting write, including field changes.
    pub modified: DateTime<Utc>,
    /// Optional target database identifier; not interpreted by the core.
    #[serde(default)]
    pub database: Option<String>,
}

impl ModelSchemaRow {
    pub fn type_name(&self) -> String {
        naming::type_name(&self.name)
    }

    pub fn table_name(&self, prefix: Option<&str>) -> String {
        naming::table_name(&self.name, prefix)
    }
}

/// Persisted field schema. `options` are stored verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchemaRow {
    pub id: u64,
    pub model_schema_id: u64,
    pub name: String,
    pub class_name: String,
    #[serde(default)]
    pub options: FieldOptions,
}

impl FieldSchemaRow {
    pub fn column_name(&self) -> String {
        naming::column_name(&self.name)
    }
}

#[derive(Debug, Clone)]
pub struct NewModelSchema {
    pub name: String,
    pub database: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewFieldSchema {
    pub model_schema_id: u64,
    pub name: String,
    pub class_name: String,
    pub options: FieldOptions,
}

/// A model schema together with its field schemas, as read at one point in
/// time. This is the input of type compilation.
#[derive(Debug, Clone)]
pub struct ModelSnapshot {
    pub model: ModelSchemaRow,
    pub fields: Vec<FieldSchemaRow>,
}
