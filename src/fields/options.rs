use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Options a field generator is invoked with.
///
/// The recognized options are typed. Anything else lands in `extra` and is
/// passed through to the generator untouched; relational targets (`to`,
/// `on_delete`) travel this way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldOptions {
    pub null: bool,
    pub unique: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    pub db_index: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for FieldOptions {
    fn default() -> Self {
        Self {
            null: true,
            unique: false,
            max_length: None,
            db_index: false,
            default: None,
            extra: BTreeMap::new(),
        }
    }
}

impl FieldOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn null(mut self, null: bool) -> Self {
        self.null = null;
        self
    }

    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    pub fn max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn db_index(mut self, db_index: bool) -> Self {
        self.db_index = db_index;
        self
    }

    pub fn default_value(mut self, value: serde_json::Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn get_extra(&self, key: &str) -> Option<&serde_json::Value> {
        self.extra.get(key)
    }

    /// Target model of a relational field.
    pub fn target(&self) -> Option<&str> {
        self.extra.get("to").and_then(|value| value.as_str())
    }
}

/// A field declared outside of any field schema, e.g. the configured
/// default fields merged into every generated type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDeclaration {
    pub name: String,
    pub class_name: String,
    #[serde(default)]
    pub options: FieldOptions,
}

impl FieldDeclaration {
    pub fn new(name: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class_name: class_name.into(),
            options: FieldOptions::default(),
        }
    }

    pub fn with_options(mut self, options: FieldOptions) -> Self {
        self.options = options;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_are_nullable() {
        let options: FieldOptions = serde_json::from_value(json!({})).unwrap();
        assert!(options.null);
        assert!(!options.unique);
        assert_eq!(options.max_length, None);
    }

    #[test]
    fn test_unknown_keys_pass_through() {
        let options: FieldOptions =
            serde_json::from_value(json!({"max_length": 10, "to": "Customer", "on_delete": "cascade"}))
                .unwrap();
        assert_eq!(options.max_length, Some(10));
        assert_eq!(options.target(), Some("Customer"));
        assert_eq!(options.get_extra("on_delete"), Some(&json!("cascade")));

        let stored = serde_json::to_value(&options).unwrap();
        assert_eq!(stored["to"], json!("Customer"));
    }
}
