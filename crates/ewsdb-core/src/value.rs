//! Keyed data map
//!
//! A [`DataMap`] is the boundary between a model value and a stored row:
//! field key name → [`Value`]. Each model converts to and from it exactly
//! once, which is the only place type erasure happens. The engine turns a
//! map into bound SQL parameters and a result row back into a map.
//!
//! ## Storage encoding
//!
//! | DataType   | Value              | Column  |
//! |------------|--------------------|---------|
//! | text       | `Text(String)`     | TEXT    |
//! | numeric    | `Numeric(f64)`     | NUMERIC |
//! | integer    | `Integer(i64)`     | INTEGER |
//! | recordID   | `RecordId(..)`     | INTEGER |
//! | real       | `Real(f64)`        | REAL    |
//! | blob       | `Blob(Vec<u8>)`    | BLOB    |
//! | dateTime   | `DateTime(..)`     | TEXT, RFC 3339 with nanoseconds, UTC |
//! | bool       | `Bool(bool)`       | INTEGER 0/1 |

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::descriptor::DataType;
use crate::error::BindingError;
use crate::record_id::RecordId;
use crate::store::SqlValue;

/// Dynamically typed field value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Numeric(f64),
    Integer(i64),
    RecordId(RecordId),
    Real(f64),
    Blob(Vec<u8>),
    DateTime(DateTime<Utc>),
    Bool(bool),
}

impl Value {
    /// Data type this value carries, `None` for null
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Text(_) => Some(DataType::Text),
            Value::Numeric(_) => Some(DataType::Numeric),
            Value::Integer(_) => Some(DataType::Integer),
            Value::RecordId(_) => Some(DataType::RecordId),
            Value::Real(_) => Some(DataType::Real),
            Value::Blob(_) => Some(DataType::Blob),
            Value::DateTime(_) => Some(DataType::DateTime),
            Value::Bool(_) => Some(DataType::Bool),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.data_type().map_or("null", DataType::as_str)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether this value may be stored in a column of `data_type`.
    /// Null fits every type; numeric and real are interchangeable.
    pub fn fits(&self, data_type: DataType) -> bool {
        match (self.data_type(), data_type) {
            (None, _) => true,
            (Some(DataType::Numeric | DataType::Real), DataType::Numeric | DataType::Real) => true,
            (Some(own), declared) => own == declared,
        }
    }

    /// Encode for binding as a statement parameter
    pub fn to_sql_value(&self) -> SqlValue {
        match self {
            Value::Null => SqlValue::Null,
            Value::Text(s) => SqlValue::Text(s.clone()),
            Value::Numeric(f) | Value::Real(f) => SqlValue::Real(*f),
            Value::Integer(i) => SqlValue::Integer(*i),
            Value::RecordId(id) => SqlValue::Integer(id.get()),
            Value::Blob(b) => SqlValue::Blob(b.clone()),
            Value::DateTime(dt) => SqlValue::Text(dt.to_rfc3339_opts(SecondsFormat::Nanos, true)),
            Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        }
    }

    /// Decode a stored column value according to the declared data type
    pub fn decode(
        column: &str,
        data_type: DataType,
        stored: &SqlValue,
    ) -> Result<Value, BindingError> {
        let mismatch = || BindingError::Decode {
            column: column.to_string(),
            details: format!("{} column holds {}", data_type, stored.type_name()),
        };

        if stored.is_null() {
            return Ok(Value::Null);
        }

        let value = match data_type {
            DataType::Text => Value::Text(stored.as_text().ok_or_else(mismatch)?.to_string()),
            DataType::Integer => Value::Integer(stored.as_integer().ok_or_else(mismatch)?),
            DataType::RecordId => {
                Value::RecordId(RecordId::new(stored.as_integer().ok_or_else(mismatch)?))
            }
            DataType::Numeric => Value::Numeric(stored.as_real().ok_or_else(mismatch)?),
            DataType::Real => Value::Real(stored.as_real().ok_or_else(mismatch)?),
            DataType::Blob => Value::Blob(stored.as_blob().ok_or_else(mismatch)?.to_vec()),
            DataType::Bool => match stored.as_integer().ok_or_else(mismatch)? {
                0 => Value::Bool(false),
                1 => Value::Bool(true),
                other => {
                    return Err(BindingError::Decode {
                        column: column.to_string(),
                        details: format!("bool column holds {}", other),
                    })
                }
            },
            DataType::DateTime => Value::DateTime(decode_date_time(column, stored)?),
        };

        Ok(value)
    }
}

fn decode_date_time(column: &str, stored: &SqlValue) -> Result<DateTime<Utc>, BindingError> {
    match stored {
        SqlValue::Text(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| BindingError::Decode {
                column: column.to_string(),
                details: format!("invalid timestamp '{}': {}", s, e),
            }),
        // Millisecond timestamps written by other tools
        SqlValue::Integer(ms) => {
            DateTime::from_timestamp_millis(*ms).ok_or_else(|| BindingError::Decode {
                column: column.to_string(),
                details: format!("timestamp {} out of range", ms),
            })
        }
        other => Err(BindingError::Decode {
            column: column.to_string(),
            details: format!("dateTime column holds {}", other.type_name()),
        }),
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl From<RecordId> for Value {
    fn from(v: RecordId) -> Self {
        Value::RecordId(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::DateTime(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Extraction of a concrete Rust type from a [`Value`]
pub trait FromValue: Sized {
    fn from_value(key: &str, value: &Value) -> Result<Self, BindingError>;
}

fn mismatch(key: &str, expected: &'static str, value: &Value) -> BindingError {
    BindingError::TypeMismatch {
        key: key.to_string(),
        expected,
        found: value.type_name(),
    }
}

impl FromValue for String {
    fn from_value(key: &str, value: &Value) -> Result<Self, BindingError> {
        match value {
            Value::Text(s) => Ok(s.clone()),
            other => Err(mismatch(key, "text", other)),
        }
    }
}

impl FromValue for i64 {
    fn from_value(key: &str, value: &Value) -> Result<Self, BindingError> {
        match value {
            Value::Integer(i) => Ok(*i),
            other => Err(mismatch(key, "integer", other)),
        }
    }
}

impl FromValue for i32 {
    fn from_value(key: &str, value: &Value) -> Result<Self, BindingError> {
        let wide = i64::from_value(key, value)?;
        i32::try_from(wide).map_err(|_| BindingError::OutOfRange {
            key: key.to_string(),
            value: wide.to_string(),
            target: "i32",
        })
    }
}

impl FromValue for f64 {
    fn from_value(key: &str, value: &Value) -> Result<Self, BindingError> {
        match value {
            Value::Real(f) | Value::Numeric(f) => Ok(*f),
            other => Err(mismatch(key, "real", other)),
        }
    }
}

impl FromValue for bool {
    fn from_value(key: &str, value: &Value) -> Result<Self, BindingError> {
        match value {
            Value::Bool(b) => Ok(*b),
            other => Err(mismatch(key, "bool", other)),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(key: &str, value: &Value) -> Result<Self, BindingError> {
        match value {
            Value::Blob(b) => Ok(b.clone()),
            other => Err(mismatch(key, "blob", other)),
        }
    }
}

impl FromValue for RecordId {
    fn from_value(key: &str, value: &Value) -> Result<Self, BindingError> {
        match value {
            Value::RecordId(id) => Ok(*id),
            other => Err(mismatch(key, "recordID", other)),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(key: &str, value: &Value) -> Result<Self, BindingError> {
        match value {
            Value::DateTime(dt) => Ok(*dt),
            other => Err(mismatch(key, "dateTime", other)),
        }
    }
}

/// Field key name → value, ordered by key
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataMap {
    values: BTreeMap<String, Value>,
}

impl DataMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Extract a required value; absent or null keys are an error
    pub fn require<T: FromValue>(&self, key: &str) -> Result<T, BindingError> {
        match self.values.get(key) {
            None | Some(Value::Null) => Err(BindingError::MissingField {
                key: key.to_string(),
            }),
            Some(value) => T::from_value(key, value),
        }
    }

    /// Extract an optional value; absent or null keys yield `None`
    pub fn optional<T: FromValue>(&self, key: &str) -> Result<Option<T>, BindingError> {
        match self.values.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => T::from_value(key, value).map(Some),
        }
    }
}
