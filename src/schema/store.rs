use super::{FieldSchemaRow, ModelSchemaRow, ModelSnapshot, NewFieldSchema, NewModelSchema};
use crate::core::{DbError, Result, clock, naming};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use tokio::sync::RwLock;

/// Persistence of model and field schemas.
///
/// Model names are unique (compared on their derived table and type names);
/// field names are unique per model (compared on their column names).
/// Deleting a model deletes its fields.
#[async_trait]
pub trait SchemaStore: Send + Sync {
    async fn insert_model(&self, new: NewModelSchema) -> Result<ModelSchemaRow>;

    /// Persists `row` as given and bumps its `modified` stamp.
    async fn update_model(&self, row: &ModelSchemaRow) -> Result<ModelSchemaRow>;

    /// Bumps `modified` without other changes.
    async fn touch_model(&self, id: u64) -> Result<DateTime<Utc>>;

    async fn get_model(&self, id: u64) -> Result<ModelSchemaRow>;

    async fn find_model_by_name(&self, name: &str) -> Result<Option<ModelSchemaRow>>;

    async fn list_models(&self) -> Result<Vec<ModelSchemaRow>>;

    /// Deletes the model row and all of its field rows.
    async fn delete_model(&self, id: u64) -> Result<()>;

    async fn insert_field(&self, new: NewFieldSchema) -> Result<FieldSchemaRow>;

    async fn update_field(&self, row: &FieldSchemaRow) -> Result<FieldSchemaRow>;

    async fn get_field(&self, id: u64) -> Result<FieldSchemaRow>;

    async fn fields_for_model(&self, model_schema_id: u64) -> Result<Vec<FieldSchemaRow>>;

    async fn delete_field(&self, id: u64) -> Result<()>;

    /// Model row plus its fields, read under one lock.
    async fn snapshot(&self, model_schema_id: u64) -> Result<ModelSnapshot> {
        let model = self.get_model(model_schema_id).await?;
        let fields = self.fields_for_model(model_schema_id).await?;
        Ok(ModelSnapshot { model, fields })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreState {
    next_model_id: u64,
    next_field_id: u64,
    models: BTreeMap<u64, ModelSchemaRow>,
    fields: BTreeMap<u64, FieldSchemaRow>,
}

impl StoreState {
    fn check_model_name(&self, name: &str, ignore_id: Option<u64>) -> Result<()> {
        let table = naming::table_name(name, None);
        let type_key = naming::type_name(name).to_lowercase();
        if table.is_empty() {
            return Err(DbError::InvalidField {
                field: "name".to_string(),
                reason: format!("model schema name '{}' yields an empty table name", name),
            });
        }
        let clash = self.models.values().any(|existing| {
            Some(existing.id) != ignore_id
                && (naming::table_name(&existing.name, None) == table
                    || existing.type_name().to_lowercase() == type_key)
        });
        if clash {
            return Err(DbError::DuplicateSchemaName(name.to_string()));
        }
        Ok(())
    }

    fn check_field_name(&self, model_schema_id: u64, name: &str, ignore_id: Option<u64>) -> Result<()> {
        let model = self
            .models
            .get(&model_schema_id)
            .ok_or_else(|| DbError::SchemaNotFound(format!("model schema #{}", model_schema_id)))?;
        let column = naming::column_name(name);
        if column.is_empty() {
            return Err(DbError::InvalidField {
                field: name.to_string(),
                reason: "field name yields an empty column name".to_string(),
            });
        }
        let clash = self.fields.values().any(|existing| {
            existing.model_schema_id == model_schema_id
                && Some(existing.id) != ignore_id
                && existing.column_name() == column
        });
        if clash {
            return Err(DbError::DuplicateFieldName {
                model: model.name.clone(),
                field: name.to_string(),
            });
        }
        Ok(())
    }
}

/// In-memory [`SchemaStore`] that can be saved to and restored from a JSON
/// snapshot file.
#[derive(Default)]
pub struct MemorySchemaStore {
    state: RwLock<StoreState>,
}

impl MemorySchemaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes the whole store to `path` atomically (temp file + rename).
    pub async fn save_snapshot(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = {
            let state = self.state.read().await;
            serde_json::to_vec_pretty(&*state)?
        };

        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent).map_err(|e| {
            DbError::IoError(format!(
                "Failed to create parent directory '{}': {}",
                parent.display(),
                e
            ))
        })?;

        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| {
            DbError::IoError(format!("Failed to persist snapshot '{}': {}", path.display(), e))
        })?;
        debug!("schema store snapshot written to '{}'", path.display());
        Ok(())
    }

    pub async fn load_snapshot(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read(path).map_err(|e| {
            DbError::IoError(format!("Failed to read snapshot '{}': {}", path.display(), e))
        })?;
        let state: StoreState = serde_json::from_slice(&raw)?;
        Ok(Self {
            state: RwLock::new(state),
        })
    }
}

#[async_trait]
impl SchemaStore for MemorySchemaStore {
    async fn insert_model(&self, new: NewModelSchema) -> Result<ModelSchemaRow> {
        let mut state = self.state.write().await;
        state.check_model_name(&new.name, None)?;

        state.next_model_id += 1;
        let row = ModelSchemaRow {
            id: state.next_model_id,
            name: new.name,
            modified: clock::now(),
            database: new.database,
        };
        state.models.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_model(&self, row: &ModelSchemaRow) -> Result<ModelSchemaRow> {
        let mut state = self.state.write().await;
        if !state.models.contains_key(&row.id) {
            return Err(DbError::SchemaNotFound(format!("model schema #{}", row.id)));
        }
        state.check_model_name(&row.name, Some(row.id))?;

        let mut updated = row.clone();
        updated.modified = clock::now();
        state.models.insert(updated.id, updated.clone());
        Ok(updated)
    }

    async fn touch_model(&self, id: u64) -> Result<DateTime<Utc>> {
        let mut state = self.state.write().await;
        let row = state
            .models
            .get_mut(&id)
            .ok_or_else(|| DbError::SchemaNotFound(format!("model schema #{}", id)))?;
        row.modified = clock::now();
        Ok(row.modified)
    }

    async fn get_model(&self, id: u64) -> Result<ModelSchemaRow> {
        self.state
            .read()
            .await
            .models
            .get(&id)
            .cloned()
            .ok_or_else(|| DbError::SchemaNotFound(format!("model schema #{}", id)))
    }

    async fn find_model_by_name(&self, name: &str) -> Result<Option<ModelSchemaRow>> {
        let state = self.state.read().await;
        Ok(state.models.values().find(|row| row.name == name).cloned())
    }

    async fn list_models(&self) -> Result<Vec<ModelSchemaRow>> {
        Ok(self.state.read().await.models.values().cloned().collect())
    }

    async fn delete_model(&self, id: u64) -> Result<()> {
        let mut state = self.state.write().await;
        if state.models.remove(&id).is_none() {
            return Err(DbError::SchemaNotFound(format!("model schema #{}", id)));
        }
        state.fields.retain(|_, field| field.model_schema_id != id);
        Ok(())
    }

    async fn insert_field(&self, new: NewFieldSchema) -> Result<FieldSchemaRow> {
        let mut state = self.state.write().await;
        state.check_field_name(new.model_schema_id, &new.name, None)?;

        state.next_field_id += 1;
        let row = FieldSchemaRow {
            id: state.next_field_id,
            model_schema_id: new.model_schema_id,
            name: new.name,
            class_name: new.class_name,
            options: new.options,
        };
        state.fields.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_field(&self, row: &FieldSchemaRow) -> Result<FieldSchemaRow> {
        let mut state = self.state.write().await;
        let existing = state
            .fields
            .get(&row.id)
            .ok_or_else(|| DbError::SchemaNotFound(format!("field schema #{}", row.id)))?;
        if existing.model_schema_id != row.model_schema_id {
            return Err(DbError::ConstraintViolation(format!(
                "field schema #{} cannot move to another model schema",
                row.id
            )));
        }
        state.check_field_name(row.model_schema_id, &row.name, Some(row.id))?;
        state.fields.insert(row.id, row.clone());
        Ok(row.clone())
    }

    async fn get_field(&self, id: u64) -> Result<FieldSchemaRow> {
        self.state
            .read()
            .await
            .fields
            .get(&id)
            .cloned()
            .ok_or_else(|| DbError::SchemaNotFound(format!("field schema #{}", id)))
    }

    async fn fields_for_model(&self, model_schema_id: u64) -> Result<Vec<FieldSchemaRow>> {
        let state = self.state.read().await;
        Ok(state
            .fields
            .values()
            .filter(|field| field.model_schema_id == model_schema_id)
            .cloned()
            .collect())
    }

    async fn delete_field(&self, id: u64) -> Result<()> {
        let mut state = self.state.write().await;
        if state.fields.remove(&id).is_none() {
            return Err(DbError::SchemaNotFound(format!("field schema #{}", id)));
        }
        Ok(())
    }

    async fn snapshot(&self, model_schema_id: u64) -> Result<ModelSnapshot> {
        let state = self.state.read().await;
        let model = state
            .models
            .get(&model_schema_id)
            .cloned()
            .ok_or_else(|| DbError::SchemaNotFound(format!("model schema #{}", model_schema_id)))?;
        let fields = state
            .fields
            .values()
            .filter(|field| field.model_schema_id == model_schema_id)
            .cloned()
            .collect();
        Ok(ModelSnapshot { model, fields })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldOptions;

    fn new_model(name: &str) -> NewModelSchema {
        NewModelSchema {
            name: name.to_string(),
            database: None,
        }
    }

    fn new_field(model_schema_id: u64, name: &str) -> NewFieldSchema {
        NewFieldSchema {
            model_schema_id,
            name: name.to_string(),
            class_name: "integer".to_string(),
            options: FieldOptions::default(),
        }
    }

    #[tokio::test]
    async fn test_model_names_are_unique() {
        let store = MemorySchemaStore::new();
        store.insert_model(new_model("simple model")).await.unwrap();
        assert!(matches!(
            store.insert_model(new_model("Simple-Model")).await,
            Err(DbError::DuplicateSchemaName(_))
        ));
    }

    #[tokio::test]
    async fn test_field_names_unique_per_model() {
        let store = MemorySchemaStore::new();
        let a = store.insert_model(new_model("a")).await.unwrap();
        let b = store.insert_model(new_model("b")).await.unwrap();
        store.insert_field(new_field(a.id, "amount")).await.unwrap();
        store.insert_field(new_field(b.id, "amount")).await.unwrap();
        assert!(matches!(
            store.insert_field(new_field(a.id, "Amount")).await,
            Err(DbError::DuplicateFieldName { .. })
        ));
        assert!(matches!(
            store.insert_field(new_field(99, "amount")).await,
            Err(DbError::SchemaNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_model_cascades() {
        let store = MemorySchemaStore::new();
        let model = store.insert_model(new_model("invoice")).await.unwrap();
        store.insert_field(new_field(model.id, "amount")).await.unwrap();
        store.insert_field(new_field(model.id, "total")).await.unwrap();

        store.delete_model(model.id).await.unwrap();
        assert!(store.fields_for_model(model.id).await.unwrap().is_empty());
        assert!(store.get_model(model.id).await.is_err());
    }

    #[tokio::test]
    async fn test_update_and_touch_bump_modified() {
        let store = MemorySchemaStore::new();
        let model = store.insert_model(new_model("invoice")).await.unwrap();
        let touched = store.touch_model(model.id).await.unwrap();
        assert!(touched > model.modified);

        let mut renamed = store.get_model(model.id).await.unwrap();
        renamed.name = "bill".into();
        let updated = store.update_model(&renamed).await.unwrap();
        assert!(updated.modified > touched);
        assert_eq!(store.get_model(model.id).await.unwrap().name, "bill");
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schemas.json");

        let store = MemorySchemaStore::new();
        let model = store.insert_model(new_model("invoice")).await.unwrap();
        store.insert_field(new_field(model.id, "amount")).await.unwrap();
        store.save_snapshot(&path).await.unwrap();

        let restored = MemorySchemaStore::load_snapshot(&path).await.unwrap();
        let snapshot = restored.snapshot(model.id).await.unwrap();
        assert_eq!(snapshot.model.name, "invoice");
        assert_eq!(snapshot.fields.len(), 1);

        let next = restored.insert_model(new_model("bill")).await.unwrap();
        assert!(next.id > model.id);
    }
}
