//! # Values and Rows
//!
//! Dynamically typed cell values and the rows the generic table returns.
//!
//! A [`Row`] is positionally aligned to the columns of the query that
//! produced it. Lookup by column name is provided for derivations, which
//! should not depend on column positions.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Value
// =============================================================================

/// A single cell value.
///
/// ## Mapping to SQLite
/// ```text
/// Value::Integer  ──► INTEGER
/// Value::Real     ──► REAL
/// Value::Text     ──► TEXT
/// Value::Boolean  ──► INTEGER 0/1
/// Value::Date     ──► TEXT 'YYYY-MM-DD'
/// Value::Null     ──► NULL
/// ```
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Boolean(bool),
    Date(NaiveDate),
}

impl Value {
    /// Lowercase type name, matches [`crate::ColumnType::label`].
    pub const fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Real(_) => "real",
            Value::Text(_) => "text",
            Value::Boolean(_) => "boolean",
            Value::Date(_) => "date",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Real(v) => Some(*v),
            Value::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Real(v) => write!(f, "{}", v),
            Value::Text(v) => write!(f, "{}", v),
            Value::Boolean(v) => write!(f, "{}", v),
            Value::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
        }
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
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

// =============================================================================
// Row
// =============================================================================

/// One fetched row: shared column names plus values in the same order.
///
/// Serializes as a JSON object keyed by column name, in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    /// Creates a row. `values` must be aligned with `columns`.
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len(), "row values misaligned with columns");
        Row { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of the named column, if the row has it.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
    }

    /// Values of every column except `column`, in order.
    ///
    /// Used to compare a fetched row with an insert value list, which never
    /// carries the generated key.
    pub fn values_without(&self, column: &str) -> Vec<Value> {
        self.columns
            .iter()
            .zip(&self.values)
            .filter(|(c, _)| c.as_str() != column)
            .map(|(_, v)| v.clone())
            .collect()
    }

    fn field(&self, column: &str) -> CoreResult<&Value> {
        self.get(column)
            .ok_or_else(|| CoreError::MissingField(column.to_string()))
    }

    /// Integer value of a column; `None` when the cell is NULL.
    pub fn integer(&self, column: &str) -> CoreResult<Option<i64>> {
        match self.field(column)? {
            Value::Null => Ok(None),
            Value::Integer(v) => Ok(Some(*v)),
            other => Err(type_mismatch(column, "integer", other)),
        }
    }

    /// Integer value of a column that must not be NULL.
    pub fn require_integer(&self, column: &str) -> CoreResult<i64> {
        match self.field(column)? {
            Value::Integer(v) => Ok(*v),
            other => Err(type_mismatch(column, "integer", other)),
        }
    }

    /// Date value of a column; `None` when the cell is NULL.
    pub fn date(&self, column: &str) -> CoreResult<Option<NaiveDate>> {
        match self.field(column)? {
            Value::Null => Ok(None),
            Value::Date(v) => Ok(Some(*v)),
            other => Err(type_mismatch(column, "date", other)),
        }
    }
}

fn type_mismatch(column: &str, expected: &'static str, found: &Value) -> CoreError {
    CoreError::FieldType {
        column: column.to_string(),
        expected,
        found: found.type_name(),
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (column, value) in self.columns.iter().zip(&self.values) {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
