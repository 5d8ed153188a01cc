//! Compiled record types, the process-wide type registry and the factory
//! that builds one from the other.

pub mod factory;
pub mod record;
pub mod record_type;
pub mod registry;

pub use factory::{FieldFactory, ModelFactory};
pub use record::Record;
pub use record_type::{PRIMARY_KEY_COLUMN, RESERVED_ATTRIBUTES, RecordType, is_reserved_name};
pub use registry::ModelRegistry;
