//! Everything an application usually needs in one import.
//!
//! `collaborators` additionally exposes the pluggable backends for hosts
//! that bring their own storage engine, schema store or cache.

pub use crate::{
    DataType, DbError, DynamicModels, DynamicModelsConfig, FieldDeclaration, FieldOptions,
    FieldSchema, ModelSchema, Record, RecordType, Result, SyncAction, Value,
};

pub mod collaborators {
    //! Traits and in-memory implementations of the external collaborators.
    pub use crate::cache::{InMemoryCache, KeyValueCache, LastModifiedCache};
    pub use crate::model::ModelRegistry;
    pub use crate::schema::{MemorySchemaStore, SchemaStore};
    pub use crate::storage::{InMemoryStorage, StorageEngine};
}
