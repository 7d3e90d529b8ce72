//! Column type normalization.
//!
//! Turns the loosely typed values decoded from the database into columns of a
//! single semantic type each, so that numeric detection downstream (percentile
//! capping, spreadsheet colour scales) sees consistent values.

use crate::db::{is_integral, ColumnType, Row, TabularResult, Value};
use crate::error::Result;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashSet;
use tracing::warn;

/// Datetime formats accepted when a text column is declared as a date column.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M:%S%.f%#z",
];

/// Normalizes every column of `result`.
///
/// Columns named in `date_columns` are coerced to timestamps; every other
/// column is converted to the best type inferred from its values.
pub fn normalize(result: TabularResult, date_columns: &HashSet<String>) -> Result<TabularResult> {
    let names: Vec<String> = result
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();

    let targets: Vec<ColumnType> = result
        .columns()
        .iter()
        .map(|col| {
            if date_columns.contains(&col.name) {
                ColumnType::Timestamp
            } else {
                col.kind
            }
        })
        .collect();

    for missing in date_columns.iter().filter(|c| !names.contains(*c)) {
        warn!("Date column '{missing}' is not part of the result");
    }

    let rows: Vec<Row> = result
        .rows()
        .iter()
        .map(|row| {
            row.iter()
                .zip(&targets)
                .zip(&names)
                .map(|((value, target), name)| coerce_value(value, *target, name))
                .collect()
        })
        .collect();

    TabularResult::new(names, rows)
}

/// Converts one value to the column's target type.
pub fn coerce_value(value: &Value, target: ColumnType, column: &str) -> Value {
    if value.is_null() {
        return Value::Null;
    }

    match target {
        ColumnType::Null => Value::Null,
        ColumnType::Boolean => value.clone(),
        ColumnType::Integer => match value {
            Value::Float(f) if is_integral(*f) => Value::Int(*f as i64),
            other => other.clone(),
        },
        ColumnType::Float => match value {
            Value::Int(i) => Value::Float(*i as f64),
            other => other.clone(),
        },
        ColumnType::Text => match value {
            Value::Text(_) => value.clone(),
            other => Value::Text(other.to_display_string()),
        },
        ColumnType::Timestamp => match parse_timestamp(value) {
            Some(ts) => Value::Timestamp(ts),
            None => {
                warn!("Column '{column}': cannot read {value:?} as a timestamp, using NULL");
                Value::Null
            }
        },
    }
}

/// Reads a timestamp from a timestamp value or an ISO-formatted text value.
pub fn parse_timestamp(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::Timestamp(ts) => Some(*ts),
        Value::Text(s) => {
            let s = s.trim();
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| {
                    chrono::DateTime::parse_from_str(s, fmt)
                        .map(|dt| dt.naive_utc())
                        .or_else(|_| NaiveDateTime::parse_from_str(s, fmt))
                        .ok()
                })
                .or_else(|| {
                    NaiveDate::parse_from_str(s, "%Y-%m-%d")
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                })
        }
        _ => None,
    }
}
