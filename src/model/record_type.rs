use crate::core::{Column, DataType, naming};
use crate::fields::Field;
use crate::storage::TableSchema;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Implicit primary-key column of every generated table.
pub const PRIMARY_KEY_COLUMN: &str = "id";

/// Attribute names a generated type reserves for itself. Field schemas may
/// not use them, nor anything that maps to the same column.
pub const RESERVED_ATTRIBUTES: [&str; 7] = [
    PRIMARY_KEY_COLUMN,
    "pk",
    "objects",
    "_declared",
    "_schema",
    "_meta",
    "__module__",
];

/// A compiled record type.
///
/// Immutable once built. A schema change never mutates a `RecordType`; it
/// produces a new one (with a new `id`) that replaces this one in the
/// registry.
#[derive(Debug, Clone)]
pub struct RecordType {
    pub(crate) id: Uuid,
    pub(crate) namespace: String,
    pub(crate) type_name: String,
    pub(crate) table_name: String,
    pub(crate) verbose_name: String,
    pub(crate) schema_id: u64,
    pub(crate) fields: Vec<Field>,
    pub(crate) declared: DateTime<Utc>,
}

impl RecordType {
    /// Identity of this compilation; two compilations of the same schema
    /// never share it.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// The model schema name as the user wrote it.
    pub fn verbose_name(&self) -> &str {
        &self.verbose_name
    }

    pub fn schema_id(&self) -> u64 {
        self.schema_id
    }

    /// When this type was compiled.
    pub fn declared(&self) -> DateTime<Utc> {
        self.declared
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Looks a field up by its name or its column.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .or_else(|| self.fields.iter().find(|f| f.column == name))
    }

    /// Physical table this type maps to: the implicit primary key followed
    /// by one column per field.
    pub fn table_schema(&self) -> TableSchema {
        let mut columns = Vec::with_capacity(self.fields.len() + 1);
        columns.push(Column::new(PRIMARY_KEY_COLUMN, DataType::Integer).primary_key());
        columns.extend(self.fields.iter().map(Field::column_definition));
        TableSchema::new(self.table_name.clone(), columns)
    }
}

/// Whether `name` clashes with an attribute every generated type reserves.
pub fn is_reserved_name(name: &str) -> bool {
    let column = naming::column_name(name);
    RESERVED_ATTRIBUTES
        .iter()
        .any(|reserved| *reserved == name || *reserved == column)
}
