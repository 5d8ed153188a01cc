//! Public entry points: the [`DynamicModels`] context and the schema
//! entities whose lifecycle drives persistence, invalidation,
//! synchronization and type compilation.

pub mod context;
pub mod field_schema;
pub mod model_schema;

pub use context::{DynamicModels, DynamicModelsBuilder};
pub use field_schema::FieldSchema;
pub use model_schema::ModelSchema;
