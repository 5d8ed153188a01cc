use super::SyncAction;
use crate::core::{Column, DbError, Result};
use crate::fields::Field;
use crate::storage::StorageEngine;
use log::{info, warn};
use std::sync::Arc;

/// Keeps one column in step with its field schema.
///
/// `initial` is the column definition the field had when it was loaded (or
/// after the last successful sync); `None` for a field never synced.
pub struct FieldSchemaEditor {
    engine: Arc<dyn StorageEngine>,
    initial: Option<Column>,
}

impl FieldSchemaEditor {
    pub fn new(engine: Arc<dyn StorageEngine>, initial: Option<Column>) -> Self {
        Self { engine, initial }
    }

    pub fn initial(&self) -> Option<&Column> {
        self.initial.as_ref()
    }

    /// The column currently backing this field: the initial column if it
    /// still exists, otherwise whatever physical column carries the new
    /// field's name.
    async fn prior_column(&self, table: &str, field: &Field) -> Result<Option<Column>> {
        if let Some(initial) = &self.initial {
            if self.engine.table_has_column(table, &initial.name).await {
                let schema = self.engine.get_schema(table).await?;
                return Ok(schema.column(&initial.name).cloned());
            }
        }
        if self.engine.table_has_column(table, &field.column).await {
            let schema = self.engine.get_schema(table).await?;
            return Ok(schema.column(&field.column).cloned());
        }
        Ok(None)
    }

    /// Adds the column if missing, alters it if its definition differs from
    /// `field`, and does nothing otherwise.
    pub async fn update_column(&mut self, table: &str, field: &Field) -> Result<SyncAction> {
        let new = field.column_definition();

        let action = match self.prior_column(table, field).await? {
            None => self.add_column(table, new.clone()).await?,
            Some(prior) if prior != new => {
                self.engine.alter_column(table, &prior, new.clone()).await?;
                SyncAction::AlteredColumn {
                    table: table.to_string(),
                    from: prior.name,
                    to: new.name.clone(),
                }
            }
            Some(_) => SyncAction::Unchanged,
        };

        if !action.is_unchanged() {
            info!("sync field '{}': {}", field.name, action);
        }
        self.initial = Some(new);
        Ok(action)
    }

    async fn add_column(&self, table: &str, column: Column) -> Result<SyncAction> {
        let name = column.name.clone();
        match self.engine.add_column(table, column).await {
            Ok(()) => Ok(SyncAction::AddedColumn {
                table: table.to_string(),
                column: name,
            }),
            Err(DbError::ColumnExists(column, owner)) => {
                if !self.engine.table_has_column(table, &name).await {
                    return Err(DbError::ColumnExists(column, owner));
                }
                warn!("sync: column '{}' of '{}' was added concurrently", name, table);
                Ok(SyncAction::Unchanged)
            }
            Err(err) => Err(err),
        }
    }

    /// Drops `column` from `table`. A column that is already gone counts as
    /// dropped.
    pub async fn drop_column(&mut self, table: &str, column: &str) -> Result<SyncAction> {
        let action = match self.engine.remove_column(table, column).await {
            Ok(()) => {
                let action = SyncAction::DroppedColumn {
                    table: table.to_string(),
                    column: column.to_string(),
                };
                info!("sync: {}", action);
                action
            }
            Err(err @ DbError::ColumnNotFound(..)) => {
                warn!("sync: column '{}' already dropped: {}", column, err);
                SyncAction::Unchanged
            }
            Err(err) => return Err(err),
        };
        self.initial = None;
        Ok(action)
    }
}
