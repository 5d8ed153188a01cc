use super::{Field, FieldSpec};
use crate::core::{DataType, DbError, Result};

/// Built-in field kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Integer,
    Float,
    Boolean,
    Character,
    Text,
    Date,
    DateTime,
    ForeignKey,
}

impl FieldKind {
    pub const ALL: [FieldKind; 8] = [
        FieldKind::Integer,
        FieldKind::Float,
        FieldKind::Boolean,
        FieldKind::Character,
        FieldKind::Text,
        FieldKind::Date,
        FieldKind::DateTime,
        FieldKind::ForeignKey,
    ];

    pub fn short_name(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Character => "character",
            Self::Text => "text",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::ForeignKey => "foreign_key",
        }
    }

    /// e.g. `runtime_models.fields.CharacterField`
    pub fn qualified_name(&self) -> String {
        let class = match self {
            Self::Integer => "Integer",
            Self::Float => "Float",
            Self::Boolean => "Boolean",
            Self::Character => "Character",
            Self::Text => "Text",
            Self::Date => "Date",
            Self::DateTime => "DateTime",
            Self::ForeignKey => "ForeignKey",
        };
        format!("runtime_models.fields.{}Field", class)
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Self::Integer | Self::ForeignKey => DataType::Integer,
            Self::Float => DataType::Float,
            Self::Boolean => DataType::Boolean,
            Self::Character | Self::Text => DataType::Text,
            Self::Date => DataType::Date,
            Self::DateTime => DataType::Timestamp,
        }
    }

    /// Kinds whose column length is bounded and must carry `max_length`.
    pub fn is_bounded(&self) -> bool {
        matches!(self, Self::Character)
    }

    pub fn constructor(&self) -> fn(&FieldSpec<'_>) -> Result<Field> {
        match self {
            Self::Integer => integer_field,
            Self::Float => float_field,
            Self::Boolean => boolean_field,
            Self::Character => character_field,
            Self::Text => text_field,
            Self::Date => date_field,
            Self::DateTime => datetime_field,
            Self::ForeignKey => foreign_key_field,
        }
    }
}

fn integer_field(spec: &FieldSpec<'_>) -> Result<Field> {
    Field::from_spec(spec, DataType::Integer)
}

fn float_field(spec: &FieldSpec<'_>) -> Result<Field> {
    Field::from_spec(spec, DataType::Float)
}

fn boolean_field(spec: &FieldSpec<'_>) -> Result<Field> {
    Field::from_spec(spec, DataType::Boolean)
}

fn character_field(spec: &FieldSpec<'_>) -> Result<Field> {
    if spec.options.max_length.is_none() {
        return Err(DbError::InvalidField {
            field: spec.name.to_string(),
            reason: "max_length must be set for character fields".to_string(),
        });
    }
    Field::from_spec(spec, DataType::Text)
}

fn text_field(spec: &FieldSpec<'_>) -> Result<Field> {
    Field::from_spec(spec, DataType::Text)
}

fn date_field(spec: &FieldSpec<'_>) -> Result<Field> {
    Field::from_spec(spec, DataType::Date)
}

fn datetime_field(spec: &FieldSpec<'_>) -> Result<Field> {
    Field::from_spec(spec, DataType::Timestamp)
}

fn foreign_key_field(spec: &FieldSpec<'_>) -> Result<Field> {
    let target = spec.options.target().ok_or_else(|| DbError::InvalidField {
        field: spec.name.to_string(),
        reason: "foreign key fields require a 'to' option naming the target model".to_string(),
    })?;
    let target = target.to_string();
    Ok(Field::from_spec(spec, DataType::Integer)?.references(target))
}
