use crate::core::{Column, DbError, Result, Row, Schema, Value};
use std::collections::{BTreeMap, HashSet};

/// Rows of one physical table plus the structure they conform to.
#[derive(Debug, Clone)]
pub struct Table {
    schema: TableSchema,
    rows: BTreeMap<usize, Row>,
    next_row_id: usize,
}

impl Table {
    pub fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            rows: BTreeMap::new(),
            next_row_id: 1,
        }
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn scan(&self) -> Vec<Row> {
        self.rows.values().cloned().collect()
    }

    /// Inserts a row given as `(column, value)` pairs.
    ///
    /// Missing columns take their default; a missing integer primary key is
    /// assigned from the table's row counter. Returns the stored row in
    /// column order.
    pub fn insert(&mut self, values: Vec<(String, Value)>) -> Result<Row> {
        let columns = self.schema.schema().columns();
        let mut row: Vec<Option<Value>> = vec![None; columns.len()];

        for (name, value) in values {
            let idx = self
                .schema
                .schema()
                .find_column_index(&name)
                .ok_or_else(|| DbError::ColumnNotFound(name.clone(), self.schema.name.clone()))?;
            row[idx] = Some(value);
        }

        let id = self.next_row_id;
        let row: Row = columns
            .iter()
            .zip(row)
            .map(|(column, value)| match value {
                Some(value) => value,
                None if column.primary_key => Value::Integer(id as i64),
                None => column.default.clone(),
            })
            .collect();

        self.validate_row(&row)?;
        self.check_uniqueness(&row)?;

        self.next_row_id += 1;
        self.rows.insert(id, row.clone());
        Ok(row)
    }

    pub fn rename(&mut self, new_name: impl Into<String>) {
        self.schema.name = new_name.into();
    }

    /// Appends a column, backfilling existing rows with its default.
    pub fn add_column(&mut self, column: Column) -> Result<()> {
        if self.schema.schema().find_column_index(&column.name).is_some() {
            return Err(DbError::ColumnExists(column.name, self.schema.name.clone()));
        }

        if !self.rows.is_empty() {
            column.validate(&column.default).map_err(|_| {
                DbError::ConstraintViolation(format!(
                    "Cannot add NOT NULL column '{}' without a default to non-empty table '{}'",
                    column.name, self.schema.name
                ))
            })?;
            if column.unique && self.rows.len() > 1 && !column.default.is_null() {
                return Err(DbError::ConstraintViolation(format!(
                    "Cannot add UNIQUE column '{}' with a shared default to table '{}'",
                    column.name, self.schema.name
                )));
            }
        }

        for row in self.rows.values_mut() {
            row.push(column.default.clone());
        }
        self.schema.schema.push_column(column);
        Ok(())
    }

    pub fn remove_column(&mut self, column_name: &str) -> Result<Column> {
        let idx = self
            .schema
            .schema()
            .find_column_index(column_name)
            .ok_or_else(|| DbError::ColumnNotFound(column_name.to_string(), self.schema.name.clone()))?;

        if self.schema.schema().columns()[idx].primary_key {
            return Err(DbError::ConstraintViolation(format!(
                "Cannot drop primary key column '{}' of table '{}'",
                column_name, self.schema.name
            )));
        }

        for row in self.rows.values_mut() {
            row.remove(idx);
        }
        Ok(self.schema.schema.remove_column(idx))
    }

    /// Replaces the definition of `old_name` with `new`, converting stored
    /// values. Existing data is checked against the new constraints before
    /// anything is modified.
    pub fn alter_column(&mut self, old_name: &str, new: Column) -> Result<()> {
        let idx = self
            .schema
            .schema()
            .find_column_index(old_name)
            .ok_or_else(|| DbError::ColumnNotFound(old_name.to_string(), self.schema.name.clone()))?;

        if new.name != old_name && self.schema.schema().find_column_index(&new.name).is_some() {
            return Err(DbError::ColumnExists(new.name, self.schema.name.clone()));
        }

        let old = &self.schema.schema().columns()[idx];
        if !old.data_type.can_cast_to(&new.data_type) {
            return Err(DbError::TypeMismatch(format!(
                "Column '{}' cannot change from {} to {}",
                old.name, old.data_type, new.data_type
            )));
        }

        let mut converted = Vec::with_capacity(self.rows.len());
        let mut seen = HashSet::new();
        for (id, row) in &self.rows {
            let value = row[idx].cast_to(&new.data_type)?;
            new.validate(&value)?;
            if new.unique && !value.is_null() && !seen.insert(value.clone()) {
                return Err(DbError::ConstraintViolation(format!(
                    "Column '{}' contains duplicate value {}",
                    new.name, value
                )));
            }
            converted.push((*id, value));
        }

        for (id, value) in converted {
            if let Some(row) = self.rows.get_mut(&id) {
                row[idx] = value;
            }
        }
        self.schema.schema.replace_column(idx, new);
        Ok(())
    }

    fn validate_row(&self, row: &Row) -> Result<()> {
        let columns = self.schema.schema().columns();
        if row.len() != columns.len() {
            return Err(DbError::ExecutionError(format!(
                "Expected {} columns, got {}",
                columns.len(),
                row.len()
            )));
        }
        for (column, value) in columns.iter().zip(row.iter()) {
            column.validate(value)?;
        }
        Ok(())
    }

    fn check_uniqueness(&self, row: &Row) -> Result<()> {
        for (col_idx, column) in self.schema.schema().columns().iter().enumerate() {
            if !(column.primary_key || column.unique) {
                continue;
            }
            let value = &row[col_idx];
            if value.is_null() {
                continue;
            }
            if self.rows.values().any(|existing| &existing[col_idx] == value) {
                return Err(DbError::ConstraintViolation(format!(
                    "Unique constraint violation: Column '{}' already contains value {}",
                    column.name, value
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct TableSchema {
    name: String,
    schema: Schema,
}

impl TableSchema {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            schema: Schema::new(columns),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.schema.get_column(name)
    }
}
