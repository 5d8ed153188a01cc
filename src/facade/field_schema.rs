use super::{DynamicModels, ModelSchema};
use crate::core::{DbError, Result, naming};
use crate::fields::FieldOptions;
use crate::model::{FieldFactory, is_reserved_name};
use crate::schema::{FieldSchemaRow, ModelSchemaRow, NewFieldSchema};
use crate::sync::{FieldSchemaEditor, SyncAction};
use std::sync::Arc;

/// One user-declared field of a model schema.
pub struct FieldSchema {
    models: Arc<DynamicModels>,
    model_schema_id: u64,
    row: Option<FieldSchemaRow>,
    name: String,
    class_name: String,
    options: FieldOptions,
    editor: FieldSchemaEditor,
}

impl FieldSchema {
    /// An unsaved field of `model`, which must already be saved.
    pub fn new(
        model: &ModelSchema,
        name: impl Into<String>,
        class_name: impl Into<String>,
    ) -> Result<Self> {
        let model_schema_id = model
            .id()
            .ok_or_else(|| DbError::UnsavedSchema(model.name().to_string()))?;
        let models = model.models().clone();
        let editor = FieldSchemaEditor::new(models.engine().clone(), None);
        Ok(Self {
            models,
            model_schema_id,
            row: None,
            name: name.into(),
            class_name: class_name.into(),
            options: FieldOptions::default(),
            editor,
        })
    }

    pub(crate) fn from_row(models: Arc<DynamicModels>, row: FieldSchemaRow) -> Self {
        // The column the persisted row compiles to; a row whose kind no
        // longer resolves has no usable prior definition.
        let initial = FieldFactory::for_config(models.field_kinds(), models.config())
            .from_row(&row)
            .ok()
            .map(|field| field.column_definition());
        let editor = FieldSchemaEditor::new(models.engine().clone(), initial);
        Self {
            model_schema_id: row.model_schema_id,
            name: row.name.clone(),
            class_name: row.class_name.clone(),
            options: row.options.clone(),
            row: Some(row),
            editor,
            models,
        }
    }

    pub async fn load(models: &Arc<DynamicModels>, id: u64) -> Result<Self> {
        let row = models.store().get_field(id).await?;
        Ok(Self::from_row(models.clone(), row))
    }

    pub fn with_options(mut self, options: FieldOptions) -> Self {
        self.options = options;
        self
    }

    pub fn id(&self) -> Option<u64> {
        self.row.as_ref().map(|row| row.id)
    }

    pub fn model_schema_id(&self) -> u64 {
        self.model_schema_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn set_class_name(&mut self, class_name: impl Into<String>) {
        self.class_name = class_name.into();
    }

    /// Options as they will be stored.
    pub fn options(&self) -> &FieldOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut FieldOptions {
        &mut self.options
    }

    pub fn set_options(&mut self, options: FieldOptions) {
        self.options = options;
    }

    pub fn set_null(&mut self, null: bool) {
        self.options.null = null;
    }

    pub fn set_max_length(&mut self, max_length: Option<u32>) {
        self.options.max_length = max_length;
    }

    pub fn db_column(&self) -> String {
        naming::column_name(&self.name)
    }

    /// Stored options merged with derived defaults, such as the configured
    /// length of bounded text fields.
    pub fn get_options(&self) -> Result<FieldOptions> {
        FieldFactory::for_config(self.models.field_kinds(), self.models.config())
            .effective_options(&self.class_name, &self.options)
    }

    fn check_name(&self, model: &ModelSchemaRow) -> Result<()> {
        let column = self.db_column();
        let clashes_default = self
            .models
            .config()
            .default_fields
            .iter()
            .any(|field| naming::column_name(&field.name) == column);

        if is_reserved_name(&self.name) || clashes_default {
            return Err(DbError::InvalidFieldName {
                model: model.name.clone(),
                field: self.name.clone(),
            });
        }
        Ok(())
    }

    fn check_null_change(&self, model: &ModelSchemaRow, options: &FieldOptions) -> Result<()> {
        let was_nullable = self.row.as_ref().is_some_and(|row| row.options.null);
        if was_nullable && !options.null {
            return Err(DbError::NullFieldChanged {
                model: model.name.clone(),
                field: self.name.clone(),
            });
        }
        Ok(())
    }

    /// Validates and persists the field, invalidates the owning model's
    /// compiled type, syncs the column and recompiles the type.
    pub async fn save(&mut self) -> Result<SyncAction> {
        let store = self.models.store();
        let model = store.get_model(self.model_schema_id).await?;

        self.check_name(&model)?;
        let factory = FieldFactory::for_config(self.models.field_kinds(), self.models.config());
        let options = factory.effective_options(&self.class_name, &self.options)?;
        self.check_null_change(&model, &options)?;
        let field = factory.make_field(&self.name, &self.class_name, &self.options)?;

        let row = match &self.row {
            None => {
                store
                    .insert_field(NewFieldSchema {
                        model_schema_id: self.model_schema_id,
                        name: self.name.clone(),
                        class_name: self.class_name.clone(),
                        options: self.options.clone(),
                    })
                    .await?
            }
            Some(row) => {
                let mut updated = row.clone();
                updated.name = self.name.clone();
                updated.class_name = self.class_name.clone();
                updated.options = self.options.clone();
                store.update_field(&updated).await?
            }
        };
        self.row = Some(row);
        store.touch_model(self.model_schema_id).await?;

        self.models
            .cache()
            .update_last_modified(&model.type_name())
            .await?;

        let table = model.table_name(self.models.config().table_prefix.as_deref());
        let action = self.editor.update_column(&table, &field).await?;

        self.models
            .factory()
            .regenerate(self.model_schema_id, None)
            .await?;
        Ok(action)
    }

    /// Drops the column, invalidates the owning model's compiled type and
    /// removes the row. The type itself is rebuilt lazily.
    pub async fn delete(mut self) -> Result<SyncAction> {
        let row = self
            .row
            .clone()
            .ok_or_else(|| DbError::UnsavedSchema(self.name.clone()))?;
        let store = self.models.store();
        let model = store.get_model(self.model_schema_id).await?;
        let table = model.table_name(self.models.config().table_prefix.as_deref());

        let action = self.editor.drop_column(&table, &row.column_name()).await?;

        store.touch_model(self.model_schema_id).await?;
        self.models
            .cache()
            .update_last_modified(&model.type_name())
            .await?;

        store.delete_field(row.id).await?;
        Ok(action)
    }
}

impl std::fmt::Debug for FieldSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldSchema")
            .field("id", &self.id())
            .field("model_schema_id", &self.model_schema_id)
            .field("name", &self.name)
            .field("class_name", &self.class_name)
            .field("options", &self.options)
            .finish()
    }
}
