//! Query result types.
//!
//! Defines the tabular shape every query produces and every renderer consumes.

use crate::error::{ReportError, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Display format used for timestamps in tables and chart labels.
pub const TIMESTAMP_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Represents the result of executing a SQL query.
///
/// Every row holds exactly one value per column, in column order. The fields
/// are private so that the shape can only be built through [`TabularResult::new`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TabularResult {
    columns: Vec<ColumnInfo>,
    rows: Vec<Row>,
}

impl TabularResult {
    /// Creates a result from column names and rows, inferring each column's type.
    ///
    /// Fails if any row's width differs from the number of columns.
    pub fn new<S: Into<String>>(names: Vec<S>, rows: Vec<Row>) -> Result<Self> {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();

        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != names.len())
        {
            return Err(ReportError::internal(format!(
                "row {index} has {} values but the result has {} columns",
                row.len(),
                names.len()
            )));
        }

        let columns = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| {
                let kind = ColumnType::infer(rows.iter().map(|row| &row[i]));
                ColumnInfo::new(name, kind)
            })
            .collect();

        Ok(Self { columns, rows })
    }

    /// Creates an empty result with no columns.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Column metadata, in SELECT order.
    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    /// Column names, in SELECT order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Rows of data.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the result set has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the index of the named column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Returns the values of the named column, failing with a render error if it is absent.
    pub fn column(&self, name: &str) -> Result<Vec<&Value>> {
        let index = self.column_index(name).ok_or_else(|| {
            ReportError::render(format!(
                "column '{name}' not found (available: {})",
                self.column_names().join(", ")
            ))
        })?;
        Ok(self.rows.iter().map(|row| &row[index]).collect())
    }

    /// Returns a new result with `values` appended as a column named `name`.
    ///
    /// If a column with that name already exists it is replaced in place in the
    /// returned copy; `self` is never modified.
    pub fn with_column(&self, name: &str, values: Vec<Value>) -> Result<Self> {
        if values.len() != self.rows.len() {
            return Err(ReportError::internal(format!(
                "derived column '{name}' has {} values for {} rows",
                values.len(),
                self.rows.len()
            )));
        }

        let mut names: Vec<String> = self.columns.iter().map(|c| c.name.clone()).collect();
        let mut rows = self.rows.clone();

        match self.column_index(name) {
            Some(index) => {
                for (row, value) in rows.iter_mut().zip(values) {
                    row[index] = value;
                }
            }
            None => {
                names.push(name.to_string());
                for (row, value) in rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }

        Self::new(names, rows)
    }

    /// Returns a copy whose rows are reordered according to `order` (row indices).
    pub fn reordered(&self, order: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: order.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }
}

/// Metadata about a column in a result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,

    /// Semantic type inferred from the column's values.
    pub kind: ColumnType,
}

impl ColumnInfo {
    /// Creates a new column info with the given name and type.
    pub fn new(name: impl Into<String>, kind: ColumnType) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Semantic type of a whole column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Every value is NULL (or the column is empty).
    #[default]
    Null,
    Boolean,
    Integer,
    Float,
    Text,
    Timestamp,
}

impl ColumnType {
    /// Infers the narrowest type that holds every non-null value.
    ///
    /// Numeric columns are `Integer` when every value is integral (including
    /// floats with no fractional part) and `Float` otherwise. Any mix outside
    /// the numeric family falls back to `Text`.
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a Value>) -> Self {
        let mut kind = ColumnType::Null;

        for value in values {
            let value_kind = match value {
                Value::Null => continue,
                Value::Bool(_) => ColumnType::Boolean,
                Value::Int(_) => ColumnType::Integer,
                Value::Float(f) if is_integral(*f) => ColumnType::Integer,
                Value::Float(_) => ColumnType::Float,
                Value::Text(_) => ColumnType::Text,
                Value::Timestamp(_) => ColumnType::Timestamp,
            };

            kind = match (kind, value_kind) {
                (ColumnType::Null, k) => k,
                (a, b) if a == b => a,
                (ColumnType::Integer, ColumnType::Float) | (ColumnType::Float, ColumnType::Integer) => {
                    ColumnType::Float
                }
                _ => return ColumnType::Text,
            };
        }

        kind
    }

    /// Returns true for integer and float columns.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }

    /// Returns the type as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Null => "null",
            ColumnType::Boolean => "boolean",
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Text => "text",
            ColumnType::Timestamp => "timestamp",
        }
    }
}

/// Returns true if `f` is a whole number that converts to `i64` without loss.
pub(crate) fn is_integral(f: f64) -> bool {
    f.is_finite() && f.fract() == 0.0 && f.abs() < MAX_EXACT_INTEGER
}

/// Largest magnitude at which every whole f64 is exactly representable.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// A row of data from a query result.
pub type Row = Vec<Value>;

/// Represents a single value from a database query.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub enum Value {
    /// NULL value.
    #[default]
    Null,

    /// Boolean value.
    Bool(bool),

    /// Signed integer (up to i64).
    Int(i64),

    /// Floating point number.
    Float(f64),

    /// Text value.
    Text(String),

    /// Timestamp without time zone (timestamptz values are stored as UTC).
    Timestamp(NaiveDateTime),
}

impl Value {
    /// Returns true if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true for integer and float values.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// Numeric view of the value.
    ///
    /// Integers, finite floats and text that parses as a number are numeric;
    /// everything else is `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) if f.is_finite() => Some(*f),
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            _ => None,
        }
    }

    /// Returns the timestamp, if this value is one.
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    /// Converts the value to its display representation.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => s.clone(),
            Value::Timestamp(ts) => ts.format(TIMESTAMP_DISPLAY_FORMAT).to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

// Conversion implementations for common types
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
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

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}
