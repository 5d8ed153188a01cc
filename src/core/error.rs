use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    // ------------------------------------------------------------------
    // Storage engine
    // ------------------------------------------------------------------
    #[error("Table '{0}' already exists")]
    TableExists(String),

    #[error("Table '{0}' not found")]
    TableNotFound(String),

    #[error("Column '{0}' already exists in table '{1}'")]
    ColumnExists(String, String),

    #[error("Column '{0}' not found in table '{1}'")]
    ColumnNotFound(String, String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Execution error: {0}")]
    ExecutionError(String),

    #[error("Lock error: {0}")]
    LockError(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // ------------------------------------------------------------------
    // Schema validation
    // ------------------------------------------------------------------
    #[error("Field name '{field}' is reserved and cannot be used on model '{model}'")]
    InvalidFieldName { model: String, field: String },

    #[error("Field '{field}' on model '{model}' cannot be changed from NULL to NOT NULL")]
    NullFieldChanged { model: String, field: String },

    #[error("Invalid field '{field}': {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Model schema '{0}' already exists")]
    DuplicateSchemaName(String),

    #[error("Field '{field}' already exists on model schema '{model}'")]
    DuplicateFieldName { model: String, field: String },

    // ------------------------------------------------------------------
    // Compilation and lookup
    // ------------------------------------------------------------------
    #[error("Unknown field kind '{0}'")]
    UnknownFieldKind(String),

    #[error("Model schema '{0}' has not been saved")]
    UnsavedSchema(String),

    #[error("Model '{type_name}' is not registered in namespace '{namespace}'")]
    NotRegistered { namespace: String, type_name: String },

    #[error("Schema not found: {0}")]
    SchemaNotFound(String),

    // ------------------------------------------------------------------
    // Staleness and cache
    // ------------------------------------------------------------------
    #[error("Model '{0}' has changed since it was compiled")]
    OutdatedModel(String),

    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),
}

impl DbError {
    /// Input errors the caller can fix and resubmit.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidFieldName { .. }
                | Self::NullFieldChanged { .. }
                | Self::InvalidField { .. }
                | Self::DuplicateSchemaName(_)
                | Self::DuplicateFieldName { .. }
                | Self::UnknownFieldKind(_)
        )
    }

    /// Errors produced when another writer already applied the same
    /// structural change. Only create/drop outcomes qualify.
    pub fn is_benign_ddl_race(&self) -> bool {
        matches!(
            self,
            Self::TableExists(_)
                | Self::TableNotFound(_)
                | Self::ColumnExists(..)
                | Self::ColumnNotFound(..)
        )
    }
}

pub type Result<T> = std::result::Result<T, DbError>;

impl<T> From<std::sync::PoisonError<T>> for DbError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for DbError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}
