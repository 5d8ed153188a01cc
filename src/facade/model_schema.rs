use super::{DynamicModels, FieldSchema};
use crate::core::{DbError, Result, naming};
use crate::fields::FieldOptions;
use crate::model::{ModelFactory, RecordType};
use crate::schema::{ModelSchemaRow, NewModelSchema};
use crate::sync::{ModelSchemaEditor, SyncAction};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::sync::Arc;

/// A user-declared model.
///
/// Edits are local until [`save`](Self::save), which persists the row,
/// invalidates the compiled type, syncs the table and republishes the type,
/// in that order.
pub struct ModelSchema {
    models: Arc<DynamicModels>,
    row: Option<ModelSchemaRow>,
    name: String,
    database: Option<String>,
    editor: ModelSchemaEditor,
}

impl ModelSchema {
    /// An unsaved model schema called `name`.
    pub fn new(models: &Arc<DynamicModels>, name: impl Into<String>) -> Self {
        Self {
            models: models.clone(),
            row: None,
            name: name.into(),
            database: None,
            editor: ModelSchemaEditor::new(models.engine().clone(), None),
        }
    }

    pub(crate) fn from_row(models: Arc<DynamicModels>, row: ModelSchemaRow) -> Self {
        let table = row.table_name(models.config().table_prefix.as_deref());
        let editor = ModelSchemaEditor::new(models.engine().clone(), Some(table));
        Self {
            name: row.name.clone(),
            database: row.database.clone(),
            row: Some(row),
            editor,
            models,
        }
    }

    pub async fn load(models: &Arc<DynamicModels>, id: u64) -> Result<Self> {
        let row = models.store().get_model(id).await?;
        Ok(Self::from_row(models.clone(), row))
    }

    pub async fn get_by_name(models: &Arc<DynamicModels>, name: &str) -> Result<Option<Self>> {
        Ok(models
            .store()
            .find_model_by_name(name)
            .await?
            .map(|row| Self::from_row(models.clone(), row)))
    }

    /// Persisted identity; `None` until first saved.
    pub fn id(&self) -> Option<u64> {
        self.row.as_ref().map(|row| row.id)
    }

    pub fn is_saved(&self) -> bool {
        self.row.is_some()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    pub fn set_database(&mut self, database: Option<String>) {
        self.database = database;
    }

    /// Last persisted modification time.
    pub fn modified(&self) -> Option<DateTime<Utc>> {
        self.row.as_ref().map(|row| row.modified)
    }

    pub fn type_name(&self) -> String {
        naming::type_name(&self.name)
    }

    pub fn table_name(&self) -> String {
        naming::table_name(&self.name, self.models.config().table_prefix.as_deref())
    }

    pub fn models(&self) -> &Arc<DynamicModels> {
        &self.models
    }

    fn saved_id(&self) -> Result<u64> {
        self.id()
            .ok_or_else(|| DbError::UnsavedSchema(self.name.clone()))
    }

    /// Persists the schema and brings the table and the registered type in
    /// line with it. Creates the table on first save and renames it when
    /// the name changed.
    pub async fn save(&mut self) -> Result<SyncAction> {
        let store = self.models.store();

        let (row, previous) = match &self.row {
            None => {
                let row = store
                    .insert_model(NewModelSchema {
                        name: self.name.clone(),
                        database: self.database.clone(),
                    })
                    .await?;
                (row, None)
            }
            Some(row) => {
                // another handle may have renamed the schema since this one loaded
                let stored = store.get_model(row.id).await?;
                let mut updated = stored.clone();
                updated.name = self.name.clone();
                updated.database = self.database.clone();
                (store.update_model(&updated).await?, Some(stored))
            }
        };
        self.row = Some(row.clone());

        if let Some(stored) = &previous {
            let prefix = self.models.config().table_prefix.as_deref();
            self.editor.set_initial_table(Some(stored.table_name(prefix)));
        }

        let type_name = row.type_name();
        let previous_type_name = previous
            .map(|row| row.type_name())
            .filter(|previous| !previous.eq_ignore_ascii_case(&type_name));

        let cache = self.models.cache();
        // the old name stays stamped so types compiled under it read as stale
        if let Some(previous) = &previous_type_name {
            cache.update_last_modified(previous).await?;
        }
        cache.update_last_modified(&type_name).await?;

        let snapshot = store.snapshot(row.id).await?;
        let model = ModelFactory::compile(
            &snapshot,
            self.models.config(),
            self.models.field_kinds(),
        )?;
        let action = self.editor.update_table(&model).await?;
        self.models
            .factory()
            .publish(model, previous_type_name.as_deref())?;

        Ok(action)
    }

    /// Drops the table, unregisters the type, clears the invalidation entry
    /// and removes the schema together with its fields.
    pub async fn delete(mut self) -> Result<()> {
        let id = self.saved_id()?;
        // the persisted name owns the table, not a pending rename
        let row = self.models.store().get_model(id).await?;
        let type_name = row.type_name();
        let table = row.table_name(self.models.config().table_prefix.as_deref());

        self.editor.drop_table(&table).await?;

        let namespace = &self.models.config().namespace;
        match self.models.registry().unregister(namespace, &type_name) {
            Ok(_) => {}
            Err(DbError::NotRegistered { .. }) => {
                debug!("record type '{}' was not registered", type_name);
            }
            Err(err) => return Err(err),
        }

        if let Err(err) = self.models.cache().clear_last_modified(&type_name).await {
            warn!("failed to clear last-modified entry of '{}': {}", type_name, err);
        }

        self.models.store().delete_model(id).await
    }

    /// The current record type, rebuilt if the schema changed since it was
    /// compiled.
    pub async fn as_model(&self) -> Result<Arc<RecordType>> {
        self.models.factory().get_model(self).await
    }

    /// Whether `model` is the current compilation of this schema.
    pub async fn is_current_model(&self, model: &RecordType) -> bool {
        Some(model.schema_id()) == self.id() && self.models.ensure_current(model).await.is_ok()
    }

    /// Last invalidation recorded for this schema's type.
    pub async fn last_modified(&self) -> Result<Option<DateTime<Utc>>> {
        self.models.cache().get_last_modified(&self.type_name()).await
    }

    pub async fn fields(&self) -> Result<Vec<FieldSchema>> {
        let id = self.saved_id()?;
        let rows = self.models.store().fields_for_model(id).await?;
        Ok(rows
            .into_iter()
            .map(|row| FieldSchema::from_row(self.models.clone(), row))
            .collect())
    }

    pub async fn field(&self, name: &str) -> Result<Option<FieldSchema>> {
        Ok(self
            .fields()
            .await?
            .into_iter()
            .find(|field| field.name() == name))
    }

    /// Creates and saves a field on this schema.
    pub async fn add_field(
        &self,
        name: impl Into<String>,
        class_name: impl Into<String>,
        options: FieldOptions,
    ) -> Result<FieldSchema> {
        let mut field = FieldSchema::new(self, name, class_name)?.with_options(options);
        field.save().await?;
        Ok(field)
    }
}

impl std::fmt::Debug for ModelSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSchema")
            .field("id", &self.id())
            .field("name", &self.name)
            .field("database", &self.database)
            .finish()
    }
}
