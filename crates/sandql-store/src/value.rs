//! Conversions between SQLite values and JSON.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sandql_core::result::Row as JsonRow;
use serde_json::{Number, Value};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};

/// Column names of a result row, in select-list order.
pub(crate) fn column_names(row: &SqliteRow) -> Vec<String> {
    row.columns().iter().map(|c| c.name().to_string()).collect()
}

/// Convert a row into a JSON object keyed by column name.
///
/// Values are decoded by their runtime storage class, not the declared
/// column type: SQLite lets any column hold any class.
pub(crate) fn row_to_json(row: &SqliteRow) -> JsonRow {
    let mut obj = JsonRow::new();
    for (idx, col) in row.columns().iter().enumerate() {
        obj.insert(col.name().to_string(), cell_to_json(row, idx));
    }
    obj
}

fn cell_to_json(row: &SqliteRow, idx: usize) -> Value {
    let class = match row.try_get_raw(idx) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(raw) => raw.type_info().name().to_string(),
        Err(_) => return Value::Null,
    };

    match class.as_str() {
        "INTEGER" | "BIGINT" | "BOOLEAN" => row
            .try_get::<i64, _>(idx)
            .map(Value::from)
            .unwrap_or(Value::Null),
        "REAL" => row
            .try_get::<f64, _>(idx)
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        "BLOB" => row
            .try_get::<Vec<u8>, _>(idx)
            .map(|bytes| Value::String(STANDARD.encode(bytes)))
            .unwrap_or(Value::Null),
        _ => row
            .try_get::<String, _>(idx)
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}

/// Bind a JSON value as a statement parameter.
///
/// Nested arrays and objects are stored as their JSON text.
pub(crate) fn bind_json<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &Value,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => query.bind(i),
            None => query.bind(n.as_f64()),
        },
        Value::String(s) => query.bind(s.clone()),
        other => query.bind(other.to_string()),
    }
}
