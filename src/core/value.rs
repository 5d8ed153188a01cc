use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;
use std::hash::{Hash, Hasher};
use crate::core::{DbError, Result};

#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Integer(_) => "INTEGER",
            Self::Float(_) => "FLOAT",
            Self::Text(_) => "TEXT",
            Self::Boolean(_) => "BOOLEAN",
            Self::Date(_) => "DATE",
            Self::Timestamp(_) => "TIMESTAMP",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Converts a stored value into `target` when a column changes type.
    ///
    /// Only widening conversions are allowed (see [`DataType::can_cast_to`]).
    pub fn cast_to(&self, target: &DataType) -> Result<Value> {
        match (self, target) {
            (Self::Null, _) => Ok(Self::Null),
            (value, target) if target.is_compatible(value) => match (value, target) {
                (Self::Integer(i), DataType::Float) => Ok(Self::Float(*i as f64)),
                _ => Ok(value.clone()),
            },
            (Self::Integer(i), DataType::Text) => Ok(Self::Text(i.to_string())),
            (Self::Float(f), DataType::Text) => Ok(Self::Text(f.to_string())),
            (Self::Boolean(b), DataType::Text) => Ok(Self::Text(b.to_string())),
            (Self::Date(d), DataType::Text) => Ok(Self::Text(d.to_string())),
            (Self::Date(d), DataType::Timestamp) => Ok(Self::Timestamp(
                d.and_hms_opt(0, 0, 0)
                    .map(|naive| naive.and_utc())
                    .ok_or_else(|| DbError::TypeMismatch(format!("Invalid date {}", d)))?,
            )),
            (Self::Timestamp(ts), DataType::Text) => Ok(Self::Text(ts.to_rfc3339())),
            (value, target) => Err(DbError::TypeMismatch(format!(
                "Cannot convert {} to {}",
                value.type_name(),
                target
            ))),
        }
    }

    /// Builds a value of type `data_type` from a JSON scalar, as found in
    /// stored field options (e.g. `"default": 0`).
    pub fn from_json(json: &serde_json::Value, data_type: &DataType) -> Result<Value> {
        use serde_json::Value as Json;

        let value = match (json, data_type) {
            (Json::Null, _) => Value::Null,
            (Json::Bool(b), DataType::Boolean) => Value::Boolean(*b),
            (Json::Number(n), DataType::Integer) => n
                .as_i64()
                .map(Value::Integer)
                .ok_or_else(|| DbError::TypeMismatch(format!("{} is not an integer", n)))?,
            (Json::Number(n), DataType::Float) => n
                .as_f64()
                .map(Value::Float)
                .ok_or_else(|| DbError::TypeMismatch(format!("{} is not a float", n)))?,
            (Json::String(s), DataType::Text) => Value::Text(s.clone()),
            (Json::String(s), DataType::Date) => s
                .parse::<NaiveDate>()
                .map(Value::Date)
                .map_err(|e| DbError::TypeMismatch(format!("Invalid date '{}': {}", s, e)))?,
            (Json::String(s), DataType::Timestamp) => DateTime::parse_from_rfc3339(s)
                .map(|ts| Value::Timestamp(ts.with_timezone(&Utc)))
                .map_err(|e| DbError::TypeMismatch(format!("Invalid timestamp '{}': {}", s, e)))?,
            (other, data_type) => {
                return Err(DbError::TypeMismatch(format!(
                    "JSON value {} cannot be used as {}",
                    other, data_type
                )));
            }
        };
        Ok(value)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => {
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    (a - b).abs() < f64::EPSILON
                }
            }
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::Timestamp(a), Self::Timestamp(b)) => a == b,
            (Self::Integer(i), Self::Float(f)) | (Self::Float(f), Self::Integer(i)) => {
                (*i as f64 - f).abs() < f64::EPSILON
            }
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Self::Null => 0u8.hash(state),
            Self::Integer(i) => {
                1u8.hash(state);
                i.hash(state);
            }
            Self::Float(f) => {
                2u8.hash(state);
                f.to_bits().hash(state);
            }
            Self::Text(s) => {
                3u8.hash(state);
                s.hash(state);
            }
            Self::Boolean(b) => {
                4u8.hash(state);
                b.hash(state);
            }
            Self::Date(d) => {
                5u8.hash(state);
                d.hash(state);
            }
            Self::Timestamp(ts) => {
                6u8.hash(state);
                ts.hash(state);
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(fl) => write!(f, "{}", fl),
            Self::Text(s) => write!(f, "{}", s),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Date(d) => write!(f, "{}", d),
            Self::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(ts: DateTime<Utc>) -> Self {
        Self::Timestamp(ts)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    Integer,
    Float,
    Text,
    Boolean,
    Date,
    Timestamp,
}

impl DataType {
    pub fn is_compatible(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (Self::Integer, Value::Integer(_)) => true,
            (Self::Float, Value::Float(_)) => true,
            (Self::Float, Value::Integer(_)) => true,
            (Self::Text, Value::Text(_)) => true,
            (Self::Boolean, Value::Boolean(_)) => true,
            (Self::Date, Value::Date(_)) => true,
            (Self::Timestamp, Value::Timestamp(_)) => true,
            _ => false,
        }
    }

    pub fn can_cast_to(&self, other: &DataType) -> bool {
        match (self, other) {
            (a, b) if a == b => true,
            (Self::Integer, Self::Float) => true,
            (Self::Date, Self::Timestamp) => true,
            (_, Self::Text) => true,
            _ => false,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => write!(f, "INTEGER"),
            Self::Float => write!(f, "FLOAT"),
            Self::Text => write!(f, "TEXT"),
            Self::Boolean => write!(f, "BOOLEAN"),
            Self::Date => write!(f, "DATE"),
            Self::Timestamp => write!(f, "TIMESTAMP"),
        }
    }
}
