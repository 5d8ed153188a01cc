//! Schema storage: the persisted model/field schema rows.

pub mod rows;
pub mod store;

pub use rows::{FieldSchemaRow, ModelSchemaRow, ModelSnapshot, NewFieldSchema, NewModelSchema};
pub use store::{MemorySchemaStore, SchemaStore};
