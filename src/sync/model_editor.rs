use super::SyncAction;
use crate::core::{DbError, Result};
use crate::model::RecordType;
use crate::storage::StorageEngine;
use log::{info, warn};
use std::sync::Arc;

/// Keeps the table of one model schema in step with its record type.
///
/// Remembers the table name seen at construction (or after the last
/// successful sync) and compares the next requested type against it.
pub struct ModelSchemaEditor {
    engine: Arc<dyn StorageEngine>,
    initial_table: Option<String>,
}

impl ModelSchemaEditor {
    pub fn new(engine: Arc<dyn StorageEngine>, initial_table: Option<String>) -> Self {
        Self {
            engine,
            initial_table,
        }
    }

    pub fn initial_table(&self) -> Option<&str> {
        self.initial_table.as_deref()
    }

    /// Replaces the remembered table name, e.g. with the one currently
    /// persisted when another handle renamed the schema meanwhile.
    pub fn set_initial_table(&mut self, table: Option<String>) {
        self.initial_table = table;
    }

    /// Creates the table if it does not exist yet, renames it if the type's
    /// table name changed, and does nothing otherwise.
    pub async fn update_table(&mut self, model: &RecordType) -> Result<SyncAction> {
        let new_table = model.table_name();

        let rename_from = match self.initial_table.clone() {
            Some(old) if old != new_table => self.engine.table_exists(&old).await.then_some(old),
            _ => None,
        };

        let action = if let Some(old) = rename_from {
            self.engine.rename_table(&old, new_table).await?;
            SyncAction::RenamedTable {
                from: old,
                to: new_table.to_string(),
            }
        } else if !self.engine.table_exists(new_table).await {
            self.create_table(model).await?
        } else {
            SyncAction::Unchanged
        };

        if !action.is_unchanged() {
            info!("sync '{}': {}", model.type_name(), action);
        }
        self.initial_table = Some(new_table.to_string());
        Ok(action)
    }

    async fn create_table(&self, model: &RecordType) -> Result<SyncAction> {
        let table = model.table_name();
        match self.engine.create_table(model.table_schema()).await {
            Ok(()) => Ok(SyncAction::CreatedTable {
                table: table.to_string(),
            }),
            Err(DbError::TableExists(name)) => {
                if !self.engine.table_exists(table).await {
                    return Err(DbError::TableExists(name));
                }
                warn!("sync '{}': table '{}' was created concurrently", model.type_name(), name);
                Ok(SyncAction::Unchanged)
            }
            Err(err) => Err(err),
        }
    }

    /// Drops `table`. A table that is already gone counts as dropped.
    pub async fn drop_table(&mut self, table: &str) -> Result<SyncAction> {
        let action = match self.engine.drop_table(table).await {
            Ok(()) => {
                let action = SyncAction::DroppedTable {
                    table: table.to_string(),
                };
                info!("sync: {}", action);
                action
            }
            Err(err @ DbError::TableNotFound(_)) => {
                warn!("sync: table '{}' already dropped: {}", table, err);
                SyncAction::Unchanged
            }
            Err(err) => return Err(err),
        };
        self.initial_table = None;
        Ok(action)
    }
}
