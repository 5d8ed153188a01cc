// ============================================================================
// Runtime Models Library
// ============================================================================
//
// Model schemas and field schemas declared at runtime as ordinary rows,
// compiled into live record types backed by automatically managed tables.

pub mod cache;
pub mod config;
pub mod core;
pub mod facade;
pub mod fields;
pub mod model;
pub mod prelude;
pub mod schema;
pub mod storage;
pub mod sync;

// Re-export main types for convenience
pub use config::DynamicModelsConfig;
pub use core::{DataType, DbError, Result, Value};
pub use facade::{DynamicModels, DynamicModelsBuilder, FieldSchema, ModelSchema};
pub use fields::{FieldDeclaration, FieldKind, FieldKindRegistry, FieldOptions};
pub use model::{ModelRegistry, Record, RecordType};
pub use sync::SyncAction;
