use super::{PRIMARY_KEY_COLUMN, RecordType};
use crate::core::{DbError, Result, Row, Value};
use crate::facade::DynamicModels;
use crate::storage::TableSchema;
use std::collections::BTreeMap;
use std::sync::Arc;

/// One stored record of a compiled type.
#[derive(Debug, Clone)]
pub struct Record {
    model: Arc<RecordType>,
    id: i64,
    values: BTreeMap<String, Value>,
}

impl Record {
    fn from_row(model: Arc<RecordType>, table: &TableSchema, row: Row) -> Result<Self> {
        let mut values: BTreeMap<String, Value> = table
            .schema()
            .column_names()
            .into_iter()
            .map(str::to_string)
            .zip(row)
            .collect();

        let id = values
            .remove(PRIMARY_KEY_COLUMN)
            .and_then(|value| value.as_i64())
            .ok_or_else(|| {
                DbError::ExecutionError(format!(
                    "Row of table '{}' has no primary key",
                    table.name()
                ))
            })?;

        Ok(Self { model, id, values })
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn model(&self) -> &Arc<RecordType> {
        &self.model
    }

    /// Value of a field, looked up by field name or column.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let column = self.model.field(name).map(|f| f.column.as_str()).unwrap_or(name);
        self.values.get(column)
    }

    /// Values keyed by column.
    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }
}

impl RecordType {
    /// Inserts a record through this type.
    ///
    /// Fails with [`DbError::OutdatedModel`] when the schema changed after
    /// this type was compiled; fetch the current type and retry.
    pub async fn create<K, V, I>(self: &Arc<Self>, models: &DynamicModels, values: I) -> Result<Record>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        models.ensure_current(self).await?;

        let mut row = Vec::new();
        for (name, value) in values {
            let name = name.as_ref();
            let field = self
                .field(name)
                .ok_or_else(|| DbError::ColumnNotFound(name.to_string(), self.table_name.clone()))?;
            row.push((field.column.clone(), value.into()));
        }

        let engine = models.engine();
        let stored = engine.insert_row(&self.table_name, row).await?;
        let table = engine.get_schema(&self.table_name).await?;
        Record::from_row(self.clone(), &table, stored)
    }

    /// Every record of this type's table.
    pub async fn all(self: &Arc<Self>, models: &DynamicModels) -> Result<Vec<Record>> {
        let engine = models.engine();
        let table = engine.get_schema(&self.table_name).await?;
        engine
            .scan_table(&self.table_name)
            .await?
            .into_iter()
            .map(|row| Record::from_row(self.clone(), &table, row))
            .collect()
    }

    pub async fn count(&self, models: &DynamicModels) -> Result<usize> {
        models.engine().row_count(&self.table_name).await
    }
}
