use super::RecordType;
use crate::config::DynamicModelsConfig;
use crate::core::{DbError, Result, clock, naming};
use crate::facade::{DynamicModels, ModelSchema};
use crate::fields::{Field, FieldDeclaration, FieldKindRegistry, FieldOptions, FieldSpec};
use crate::schema::{FieldSchemaRow, ModelSnapshot};
use log::debug;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// Turns field declarations into compiled [`Field`]s through the field-kind
/// resolver.
pub struct FieldFactory<'a> {
    kinds: &'a FieldKindRegistry,
    default_max_length: Option<u32>,
}

impl<'a> FieldFactory<'a> {
    pub fn new(kinds: &'a FieldKindRegistry, default_max_length: Option<u32>) -> Self {
        Self {
            kinds,
            default_max_length,
        }
    }

    pub fn for_config(kinds: &'a FieldKindRegistry, config: &DynamicModelsConfig) -> Self {
        Self::new(kinds, config.default_charfield_max_length)
    }

    /// Stored options merged with the derived defaults of `class_name`.
    pub fn effective_options(&self, class_name: &str, options: &FieldOptions) -> Result<FieldOptions> {
        let generator = self.kinds.resolve(class_name)?;
        Ok(generator.effective_options(options, self.default_max_length))
    }

    /// Resolves `class_name`, validates the options against it and invokes
    /// its constructor. The column is always derived from `name`.
    pub fn make_field(&self, name: &str, class_name: &str, options: &FieldOptions) -> Result<Field> {
        let generator = self.kinds.resolve(class_name)?;
        let options = generator.effective_options(options, self.default_max_length);
        generator.validate_options(name, &options)?;

        let spec = FieldSpec {
            name,
            column: naming::column_name(name),
            class_name,
            options: &options,
        };
        generator.make_field(&spec)
    }

    pub fn from_row(&self, row: &FieldSchemaRow) -> Result<Field> {
        self.make_field(&row.name, &row.class_name, &row.options)
    }

    pub fn from_declaration(&self, declaration: &FieldDeclaration) -> Result<Field> {
        self.make_field(&declaration.name, &declaration.class_name, &declaration.options)
    }
}

/// Builds record types from schema storage and publishes them to the
/// registry.
pub struct ModelFactory<'a> {
    models: &'a DynamicModels,
}

impl<'a> ModelFactory<'a> {
    pub fn new(models: &'a DynamicModels) -> Self {
        Self { models }
    }

    /// Compiles a snapshot into a record type. Touches no shared state
    /// apart from the clock.
    pub fn compile(
        snapshot: &ModelSnapshot,
        config: &DynamicModelsConfig,
        kinds: &FieldKindRegistry,
    ) -> Result<RecordType> {
        let factory = FieldFactory::for_config(kinds, config);
        let mut fields = Vec::with_capacity(config.default_fields.len() + snapshot.fields.len());
        let mut columns = HashSet::new();

        let defaults = config
            .default_fields
            .iter()
            .map(|declaration| factory.from_declaration(declaration));
        let declared = snapshot.fields.iter().map(|row| factory.from_row(row));

        for field in defaults.chain(declared) {
            let field = field?;
            if !columns.insert(field.column.clone()) {
                return Err(DbError::InvalidFieldName {
                    model: snapshot.model.name.clone(),
                    field: field.name,
                });
            }
            fields.push(field);
        }

        Ok(RecordType {
            id: Uuid::new_v4(),
            namespace: config.namespace.clone(),
            type_name: snapshot.model.type_name(),
            table_name: snapshot.model.table_name(config.table_prefix.as_deref()),
            verbose_name: snapshot.model.name.clone(),
            schema_id: snapshot.model.id,
            fields,
            declared: clock::now(),
        })
    }

    /// Compiles the persisted state of model schema `schema_id`.
    pub async fn build(&self, schema_id: u64) -> Result<RecordType> {
        let snapshot = self.models.store().snapshot(schema_id).await?;
        Self::compile(&snapshot, self.models.config(), self.models.field_kinds())
    }

    /// The registered type of `schema` if it is still current, a freshly
    /// built one otherwise.
    pub async fn get_model(&self, schema: &ModelSchema) -> Result<Arc<RecordType>> {
        let schema_id = schema
            .id()
            .ok_or_else(|| DbError::UnsavedSchema(schema.name().to_string()))?;
        let row = self.models.store().get_model(schema_id).await?;
        let type_name = row.type_name();

        if let Some(model) = self.models.registry().get(self.namespace(), &type_name)? {
            if model.schema_id() == schema_id
                && self
                    .models
                    .cache()
                    .is_current(&type_name, model.declared())
                    .await
            {
                return Ok(model);
            }
            debug!("record type '{}' is stale, rebuilding", type_name);
        }

        self.regenerate(schema_id, None).await
    }

    /// Unconditionally rebuilds and republishes the type of `schema`.
    pub async fn make_model(&self, schema: &ModelSchema) -> Result<Arc<RecordType>> {
        let schema_id = schema
            .id()
            .ok_or_else(|| DbError::UnsavedSchema(schema.name().to_string()))?;
        self.regenerate(schema_id, None).await
    }

    /// Rebuilds the type of `schema_id`, dropping any registration under its
    /// current name and under `previous_type_name`.
    pub async fn regenerate(
        &self,
        schema_id: u64,
        previous_type_name: Option<&str>,
    ) -> Result<Arc<RecordType>> {
        let model = self.build(schema_id).await?;
        self.publish(model, previous_type_name)
    }

    /// Replaces the registered type: unregister the new name (and the
    /// previous one on rename), then register `model`.
    pub fn publish(&self, model: RecordType, previous_type_name: Option<&str>) -> Result<Arc<RecordType>> {
        let model = Arc::new(model);
        self.destroy_model(model.type_name())?;
        if let Some(previous) = previous_type_name.filter(|p| *p != model.type_name()) {
            self.destroy_model(previous)?;
        }

        self.models.registry().register(self.namespace(), model.clone())?;
        debug!(
            "registered record type '{}' ({} fields, table '{}')",
            model.type_name(),
            model.fields().len(),
            model.table_name()
        );
        Ok(model)
    }

    /// Drops the registration of `type_name`, if any.
    pub fn destroy_model(&self, type_name: &str) -> Result<()> {
        match self.models.registry().unregister(self.namespace(), type_name) {
            Ok(_) | Err(DbError::NotRegistered { .. }) => Ok(()),
            Err(err) => Err(err),
        }
    }

    fn namespace(&self) -> &str {
        &self.models.config().namespace
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ModelSchemaRow;
    use serde_json::json;

    fn snapshot(fields: Vec<FieldSchemaRow>) -> ModelSnapshot {
        ModelSnapshot {
            model: ModelSchemaRow {
                id: 7,
                name: "sales invoice".into(),
                modified: clock::now(),
                database: None,
            },
            fields,
        }
    }

    fn field_row(id: u64, name: &str, class_name: &str, options: FieldOptions) -> FieldSchemaRow {
        FieldSchemaRow {
            id,
            model_schema_id: 7,
            name: name.into(),
            class_name: class_name.into(),
            options,
        }
    }

    #[test]
    fn test_compile_derives_names() {
        let kinds = FieldKindRegistry::default();
        let config = DynamicModelsConfig::default();
        let model = ModelFactory::compile(&snapshot(Vec::new()), &config, &kinds).unwrap();

        assert_eq!(model.type_name(), "SalesInvoice");
        assert_eq!(model.table_name(), "sales_invoice");
        assert_eq!(model.namespace(), "dynamic_models");
        assert_eq!(model.schema_id(), 7);
        assert_eq!(model.table_schema().schema().column_names(), vec!["id"]);
    }

    #[test]
    fn test_compile_merges_default_fields() {
        let kinds = FieldKindRegistry::default();
        let config = DynamicModelsConfig::default()
            .table_prefix("app")
            .default_field(FieldDeclaration::new("created", "datetime"));
        let fields = vec![field_row(1, "Total Amount", "integer", FieldOptions::new())];
        let model = ModelFactory::compile(&snapshot(fields), &config, &kinds).unwrap();

        assert_eq!(model.table_name(), "app_sales_invoice");
        assert_eq!(model.field_names(), vec!["created", "Total Amount"]);
        assert_eq!(model.field("total_amount").unwrap().name, "Total Amount");
    }

    #[test]
    fn test_compile_is_fresh_each_time() {
        let kinds = FieldKindRegistry::default();
        let config = DynamicModelsConfig::default();
        let first = ModelFactory::compile(&snapshot(Vec::new()), &config, &kinds).unwrap();
        let second = ModelFactory::compile(&snapshot(Vec::new()), &config, &kinds).unwrap();
        assert_ne!(first.id(), second.id());
        assert!(second.declared() > first.declared());
    }

    #[test]
    fn test_compile_rejects_unknown_kind() {
        let kinds = FieldKindRegistry::default();
        let config = DynamicModelsConfig::default();
        let fields = vec![field_row(1, "amount", "decimal", FieldOptions::new())];
        assert!(matches!(
            ModelFactory::compile(&snapshot(fields), &config, &kinds),
            Err(DbError::UnknownFieldKind(_))
        ));
    }

    #[test]
    fn test_field_factory_applies_default_length() {
        let kinds = FieldKindRegistry::default();
        let strict = FieldFactory::new(&kinds, None);
        assert!(strict.make_field("code", "character", &FieldOptions::new()).is_err());

        let lenient = FieldFactory::new(&kinds, Some(255));
        let field = lenient
            .make_field("code", "character", &FieldOptions::new())
            .unwrap();
        assert_eq!(field.max_length, Some(255));

        let options = FieldOptions::new().extra("to", json!("Customer"));
        let field = lenient.make_field("customer", "foreign_key", &options).unwrap();
        assert_eq!(field.column_definition().references.as_deref(), Some("Customer"));
    }
}
