use super::{StorageEngine, Table, TableSchema};
use crate::core::{Column, DbError, Result, Row, Value};
use async_trait::async_trait;
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory storage engine.
///
/// The table map sits behind one lock that is only held for metadata
/// operations; rows are guarded per table.
pub struct InMemoryStorage {
    tables: RwLock<HashMap<String, Arc<RwLock<Table>>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// Shared handle for concurrent row access
    async fn get_table(&self, name: &str) -> Result<Arc<RwLock<Table>>> {
        self.tables
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| DbError::TableNotFound(name.to_string()))
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageEngine for InMemoryStorage {
    async fn create_table(&self, schema: TableSchema) -> Result<()> {
        let name = schema.name().to_string();
        let mut tables = self.tables.write().await;

        if tables.contains_key(&name) {
            return Err(DbError::TableExists(name));
        }

        debug!("storage: create table '{}'", name);
        tables.insert(name, Arc::new(RwLock::new(Table::new(schema))));
        Ok(())
    }

    async fn drop_table(&self, name: &str) -> Result<()> {
        if self.tables.write().await.remove(name).is_none() {
            return Err(DbError::TableNotFound(name.to_string()));
        }
        debug!("storage: drop table '{}'", name);
        Ok(())
    }

    async fn rename_table(&self, old_name: &str, new_name: &str) -> Result<()> {
        let mut tables = self.tables.write().await;

        if tables.contains_key(new_name) {
            return Err(DbError::TableExists(new_name.to_string()));
        }
        let handle = tables
            .remove(old_name)
            .ok_or_else(|| DbError::TableNotFound(old_name.to_string()))?;

        handle.write().await.rename(new_name);
        tables.insert(new_name.to_string(), handle);
        debug!("storage: rename table '{}' -> '{}'", old_name, new_name);
        Ok(())
    }

    async fn add_column(&self, table: &str, column: Column) -> Result<()> {
        let handle = self.get_table(table).await?;
        let mut table = handle.write().await;
        table.add_column(column)
    }

    async fn remove_column(&self, table: &str, column_name: &str) -> Result<()> {
        let handle = self.get_table(table).await?;
        let mut table = handle.write().await;
        table.remove_column(column_name).map(|_| ())
    }

    async fn alter_column(&self, table: &str, old: &Column, new: Column) -> Result<()> {
        let handle = self.get_table(table).await?;
        let mut table = handle.write().await;
        table.alter_column(&old.name, new)
    }

    async fn table_exists(&self, name: &str) -> bool {
        self.tables.read().await.contains_key(name)
    }

    async fn table_has_column(&self, table: &str, column: &str) -> bool {
        match self.get_table(table).await {
            Ok(handle) => handle.read().await.schema().column(column).is_some(),
            Err(_) => false,
        }
    }

    async fn column_allows_null(&self, table: &str, column: &str) -> Result<bool> {
        let handle = self.get_table(table).await?;
        let table_guard = handle.read().await;
        table_guard
            .schema()
            .column(column)
            .map(|col| col.nullable)
            .ok_or_else(|| DbError::ColumnNotFound(column.to_string(), table.to_string()))
    }

    async fn get_schema(&self, table: &str) -> Result<TableSchema> {
        let handle = self.get_table(table).await?;
        let table = handle.read().await;
        Ok(table.schema().clone())
    }

    async fn insert_row(&self, table: &str, values: Vec<(String, Value)>) -> Result<Row> {
        let handle = self.get_table(table).await?;
        let mut table = handle.write().await;
        table.insert(values)
    }

    async fn scan_table(&self, table: &str) -> Result<Vec<Row>> {
        let handle = self.get_table(table).await?;
        let table = handle.read().await;
        Ok(table.scan())
    }

    async fn row_count(&self, table: &str) -> Result<usize> {
        let handle = self.get_table(table).await?;
        let table = handle.read().await;
        Ok(table.row_count())
    }

    async fn list_tables(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}
