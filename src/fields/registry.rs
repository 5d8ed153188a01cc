use super::{Field, FieldKind, FieldOptions, FieldSpec};
use crate::core::{DbError, Result};
use std::collections::HashMap;
use std::sync::Arc;

pub type FieldConstructor = fn(&FieldSpec<'_>) -> Result<Field>;

/// One resolvable field kind.
#[derive(Debug, Clone)]
pub struct FieldGenerator {
    pub class_name: String,
    pub bounded_length: bool,
    pub construct: FieldConstructor,
}

impl FieldGenerator {
    /// Stored options merged with derived defaults: a bounded kind without
    /// `max_length` picks up `default_max_length` when one is configured.
    pub fn effective_options(&self, options: &FieldOptions, default_max_length: Option<u32>) -> FieldOptions {
        let mut effective = options.clone();
        if self.bounded_length && effective.max_length.is_none() {
            effective.max_length = default_max_length;
        }
        effective
    }

    /// Checks the length option against the kind.
    pub fn validate_options(&self, field_name: &str, options: &FieldOptions) -> Result<()> {
        match (self.bounded_length, options.max_length) {
            (true, None) => Err(DbError::InvalidField {
                field: field_name.to_string(),
                reason: format!("max_length must be set for '{}' fields", self.class_name),
            }),
            (false, Some(_)) => Err(DbError::InvalidField {
                field: field_name.to_string(),
                reason: format!("'{}' fields do not accept max_length", self.class_name),
            }),
            _ => Ok(()),
        }
    }

    pub fn make_field(&self, spec: &FieldSpec<'_>) -> Result<Field> {
        (self.construct)(spec)
    }
}

/// Maps generator identifiers (the `class_name` stored on a field schema)
/// to constructors. Each identifier resolves to exactly one generator.
#[derive(Debug, Clone)]
pub struct FieldKindRegistry {
    generators: HashMap<String, Arc<FieldGenerator>>,
}

impl FieldKindRegistry {
    pub fn empty() -> Self {
        Self {
            generators: HashMap::new(),
        }
    }

    /// Registry with every [`FieldKind`] under its short and qualified name.
    pub fn with_builtin_kinds() -> Self {
        let mut registry = Self::empty();
        for kind in FieldKind::ALL {
            let generator = Arc::new(FieldGenerator {
                class_name: kind.short_name().to_string(),
                bounded_length: kind.is_bounded(),
                construct: kind.constructor(),
            });
            registry
                .generators
                .insert(kind.short_name().to_string(), generator.clone());
            registry.generators.insert(kind.qualified_name(), generator);
        }
        registry
    }

    /// Registers (or replaces) a generator under `identifier`.
    pub fn register(&mut self, identifier: impl Into<String>, bounded_length: bool, construct: FieldConstructor) {
        let identifier = identifier.into();
        self.generators.insert(
            identifier.clone(),
            Arc::new(FieldGenerator {
                class_name: identifier,
                bounded_length,
                construct,
            }),
        );
    }

    /// Makes `alias` resolve to the generator already registered as `identifier`.
    pub fn alias(&mut self, alias: impl Into<String>, identifier: &str) -> Result<()> {
        let generator = self.resolve(identifier)?;
        self.generators.insert(alias.into(), generator);
        Ok(())
    }

    pub fn resolve(&self, identifier: &str) -> Result<Arc<FieldGenerator>> {
        self.generators
            .get(identifier)
            .cloned()
            .ok_or_else(|| DbError::UnknownFieldKind(identifier.to_string()))
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.generators.contains_key(identifier)
    }

    pub fn identifiers(&self) -> Vec<&str> {
        let mut identifiers: Vec<&str> = self.generators.keys().map(String::as_str).collect();
        identifiers.sort_unstable();
        identifiers
    }
}

impl Default for FieldKindRegistry {
    fn default() -> Self {
        Self::with_builtin_kinds()
    }
}
