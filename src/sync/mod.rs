//! Schema synchronization: converges physical tables and columns with the
//! compiled record types using the smallest structural command.

pub mod field_editor;
pub mod model_editor;

pub use field_editor::FieldSchemaEditor;
pub use model_editor::ModelSchemaEditor;

use std::fmt;

/// Structural command issued by one synchronizer call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    CreatedTable { table: String },
    RenamedTable { from: String, to: String },
    DroppedTable { table: String },
    AddedColumn { table: String, column: String },
    AlteredColumn { table: String, from: String, to: String },
    DroppedColumn { table: String, column: String },
    Unchanged,
}

impl SyncAction {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreatedTable { table } => write!(f, "CREATE TABLE {}", table),
            Self::RenamedTable { from, to } => write!(f, "ALTER TABLE {} RENAME TO {}", from, to),
            Self::DroppedTable { table } => write!(f, "DROP TABLE {}", table),
            Self::AddedColumn { table, column } => {
                write!(f, "ALTER TABLE {} ADD COLUMN {}", table, column)
            }
            Self::AlteredColumn { table, from, to } if from == to => {
                write!(f, "ALTER TABLE {} ALTER COLUMN {}", table, to)
            }
            Self::AlteredColumn { table, from, to } => {
                write!(f, "ALTER TABLE {} RENAME COLUMN {} TO {}", table, from, to)
            }
            Self::DroppedColumn { table, column } => {
                write!(f, "ALTER TABLE {} DROP COLUMN {}", table, column)
            }
            Self::Unchanged => write!(f, "no-op"),
        }
    }
}
