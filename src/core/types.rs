use super::{DbError, Result, DataType, Value};

pub type Row = Vec<Value>;

/// Physical column definition.
///
/// Two columns are the same definition when every attribute compares equal;
/// the synchronizer relies on this to decide whether an ALTER is needed.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
    pub unique: bool,
    pub primary_key: bool,
    pub max_length: Option<u32>,
    pub indexed: bool,
    pub references: Option<String>,
    pub default: Value,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
            unique: false,
            primary_key: false,
            max_length: None,
            indexed: false,
            references: None,
            default: Value::Null,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self.unique = true;
        self
    }

    pub fn max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn references(mut self, target: impl Into<String>) -> Self {
        self.references = Some(target.into());
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = value;
        self
    }

    pub fn validate(&self, value: &Value) -> Result<()> {
        if matches!(value, Value::Null) {
            if !self.nullable {
                return Err(DbError::ConstraintViolation(format!(
                    "Column '{}' cannot be NULL",
                    self.name
                )));
            }
            return Ok(());
        }

        if !self.data_type.is_compatible(value) {
            return Err(DbError::TypeMismatch(format!(
                "Column '{}' expects type {}, got {}",
                self.name,
                self.data_type,
                value.type_name()
            )));
        }

        if let (Some(max_length), Value::Text(text)) = (self.max_length, value)
            && text.chars().count() > max_length as usize
        {
            return Err(DbError::ConstraintViolation(format!(
                "Column '{}' is limited to {} characters, got {}",
                self.name,
                max_length,
                text.chars().count()
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn find_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|col| col.name == name)
    }

    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.find_column_index(name).map(|idx| &self.columns[idx])
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|col| col.name.as_str()).collect()
    }

    pub fn primary_key_index(&self) -> Option<usize> {
        self.columns.iter().position(|col| col.primary_key)
    }

    pub(crate) fn push_column(&mut self, column: Column) {
        self.columns.push(column);
    }

    pub(crate) fn remove_column(&mut self, idx: usize) -> Column {
        self.columns.remove(idx)
    }

    pub(crate) fn replace_column(&mut self, idx: usize, column: Column) {
        self.columns[idx] = column;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_length_limit() {
        let column = Column::new("code", DataType::Text).max_length(3);
        assert!(column.validate(&Value::Text("abc".into())).is_ok());
        assert!(matches!(
            column.validate(&Value::Text("abcd".into())),
            Err(DbError::ConstraintViolation(_))
        ));
    }

    #[test]
    fn test_not_null_rejects_null() {
        let column = Column::new("amount", DataType::Integer).not_null();
        assert!(column.validate(&Value::Null).is_err());
        assert!(column.validate(&Value::Integer(1)).is_ok());
    }

    #[test]
    fn test_definitions_compare_structurally() {
        let a = Column::new("amount", DataType::Integer);
        let b = Column::new("amount", DataType::Integer);
        assert_eq!(a, b);
        assert_ne!(a, b.clone().unique());
    }
}
