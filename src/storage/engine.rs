use super::table::TableSchema;
use crate::core::{Column, Result, Row, Value};
use async_trait::async_trait;

/// Storage engine trait - the schema-mutation and row primitives the
/// dynamic model core drives. Implementations must serialize individual
/// operations; no multi-statement atomicity is expected.
#[async_trait]
pub trait StorageEngine: Send + Sync {
    /// Create a new table with the given schema
    async fn create_table(&self, schema: TableSchema) -> Result<()>;

    /// Drop a table and all of its rows
    async fn drop_table(&self, name: &str) -> Result<()>;

    /// Rename a table, keeping its rows
    async fn rename_table(&self, old_name: &str, new_name: &str) -> Result<()>;

    /// Append a column to an existing table
    async fn add_column(&self, table: &str, column: Column) -> Result<()>;

    /// Remove a column from an existing table
    async fn remove_column(&self, table: &str, column_name: &str) -> Result<()>;

    /// Replace `old` with `new`, including renames and constraint changes
    async fn alter_column(&self, table: &str, old: &Column, new: Column) -> Result<()>;

    /// Check if a table exists
    async fn table_exists(&self, name: &str) -> bool;

    /// Check if a table has a column; false when the table is missing
    async fn table_has_column(&self, table: &str, column: &str) -> bool;

    /// Whether a column accepts NULL
    async fn column_allows_null(&self, table: &str, column: &str) -> Result<bool>;

    /// Get the schema for a table
    async fn get_schema(&self, table: &str) -> Result<TableSchema>;

    /// Insert a row given as `(column, value)` pairs; returns the stored row
    async fn insert_row(&self, table: &str, values: Vec<(String, Value)>) -> Result<Row>;

    /// Scan all rows in a table
    async fn scan_table(&self, table: &str) -> Result<Vec<Row>>;

    /// Get table row count
    async fn row_count(&self, table: &str) -> Result<usize>;

    /// List all table names
    async fn list_tables(&self) -> Vec<String>;
}
