//! Field kinds, options and the compiled field descriptor.

pub mod field;
pub mod kind;
pub mod options;
pub mod registry;

pub use field::{Field, FieldSpec};
pub use kind::FieldKind;
pub use options::{FieldDeclaration, FieldOptions};
pub use registry::{FieldConstructor, FieldGenerator, FieldKindRegistry};
