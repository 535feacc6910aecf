//! Dynamic SQLite values and row mappings.

use indexmap::IndexMap;
use rusqlite::types::{Value as BindValue, ValueRef};
use serde::{Serialize, Serializer};

/// A single column value, tagged by SQLite's storage class.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl From<ValueRef<'_>> for SqlValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => SqlValue::Null,
            ValueRef::Integer(i) => SqlValue::Integer(i),
            ValueRef::Real(f) => SqlValue::Real(f),
            ValueRef::Text(t) => SqlValue::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => SqlValue::Blob(b.to_vec()),
        }
    }
}

// Blobs go out as lowercase hex so the payload stays plain JSON text.
impl Serialize for SqlValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SqlValue::Null => serializer.serialize_none(),
            SqlValue::Integer(i) => serializer.serialize_i64(*i),
            SqlValue::Real(f) => serializer.serialize_f64(*f),
            SqlValue::Text(s) => serializer.serialize_str(s),
            SqlValue::Blob(b) => serializer.serialize_str(&hex::encode(b)),
        }
    }
}

/// One result row: column name to value, in the order the engine returned the columns.
pub type Row = IndexMap<String, SqlValue>;

/// Convert a JSON query parameter into a value SQLite can bind.
///
/// Booleans bind as 0/1, arrays and objects bind as their JSON text.
pub fn bind_value(value: &serde_json::Value) -> BindValue {
    match value {
        serde_json::Value::Null => BindValue::Null,
        serde_json::Value::Bool(b) => BindValue::Integer(i64::from(*b)),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => BindValue::Integer(i),
            None => BindValue::Real(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => BindValue::Text(s.clone()),
        other => BindValue::Text(other.to_string()),
    }
}
