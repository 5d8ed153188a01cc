use super::FieldOptions;
use crate::core::{Column, DataType, Result, Value};
use std::collections::BTreeMap;

/// Input handed to a field constructor.
///
/// `column` is always derived from the field name by the caller; options
/// cannot override it.
#[derive(Debug, Clone)]
pub struct FieldSpec<'a> {
    pub name: &'a str,
    pub column: String,
    pub class_name: &'a str,
    pub options: &'a FieldOptions,
}

/// A compiled field of a record type.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub column: String,
    pub class_name: String,
    pub data_type: DataType,
    pub null: bool,
    pub unique: bool,
    pub max_length: Option<u32>,
    pub db_index: bool,
    pub default: Value,
    pub references: Option<String>,
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Option keys that would let user input pick the physical column.
const COLUMN_OVERRIDES: [&str; 2] = ["db_column", "column"];

impl Field {
    /// Builds a field of `data_type` from `spec`, converting the JSON
    /// default into a typed value.
    pub fn from_spec(spec: &FieldSpec<'_>, data_type: DataType) -> Result<Self> {
        let options = spec.options;
        let default = match &options.default {
            Some(json) => Value::from_json(json, &data_type)?,
            None => Value::Null,
        };
        let extra = options
            .extra
            .iter()
            .filter(|(key, _)| !COLUMN_OVERRIDES.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(Self {
            name: spec.name.to_string(),
            column: spec.column.clone(),
            class_name: spec.class_name.to_string(),
            data_type,
            null: options.null,
            unique: options.unique,
            max_length: options.max_length,
            db_index: options.db_index,
            default,
            references: None,
            extra,
        })
    }

    pub fn references(mut self, target: impl Into<String>) -> Self {
        self.references = Some(target.into());
        self
    }

    /// The physical column this field maps to.
    pub fn column_definition(&self) -> Column {
        Column {
            name: self.column.clone(),
            data_type: self.data_type.clone(),
            nullable: self.null,
            unique: self.unique,
            primary_key: false,
            max_length: self.max_length,
            indexed: self.db_index,
            references: self.references.clone(),
            default: self.default.clone(),
        }
    }

    /// Structural comparison of the physical definitions.
    pub fn same_definition(&self, other: &Field) -> bool {
        self.column_definition() == other.column_definition()
    }
}
