use chrono::DateTime;
use rusqlite::types::Value as SqliteValue;
use rusqlite::{Statement, ToSql};

use crate::error::AdapterError;
use crate::options::AdapterOptions;
use crate::results::ResultSet;
use crate::types::{ColumnType, Value};

use super::column_types::{ResolvedColumn, resolve_columns};
use super::errors::translate;
use super::params::format_iso8601;

/// Largest integer the protocol's numbers carry without precision loss (2^53 - 1).
pub const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

/// Upper bound of the "plausible timestamp" window, 2200-01-01T00:00:00Z in epoch ms.
pub const MAX_PLAUSIBLE_TIMESTAMP_MS: i64 = 7_258_118_400_000;

/// Convert one engine row to protocol values using the resolved column types.
#[must_use]
pub fn decode_row(
    row: Vec<SqliteValue>,
    columns: &[ResolvedColumn],
    options: &AdapterOptions,
) -> Vec<Value> {
    row.into_iter()
        .zip(columns)
        .map(|(value, column)| decode_value(value, column, options))
        .collect()
}

/// Convert a single engine value.
#[must_use]
pub fn decode_value(
    value: SqliteValue,
    column: &ResolvedColumn,
    options: &AdapterOptions,
) -> Value {
    match (column.column_type, value) {
        (_, SqliteValue::Null) => Value::Null,
        (_, SqliteValue::Blob(bytes)) => Value::Bytes(bytes),

        (ColumnType::DateTime, SqliteValue::Integer(ms)) => epoch_ms_to_iso(ms),
        (ColumnType::DateTime, SqliteValue::Real(ms)) => epoch_ms_to_iso(ms.trunc() as i64),

        (ColumnType::Int32 | ColumnType::Int64, SqliteValue::Real(f)) => {
            decode_integer(f.trunc() as i64, column, options)
        }
        (ColumnType::Boolean, SqliteValue::Integer(i)) => Value::Boolean(i != 0),

        (_, SqliteValue::Integer(i)) => decode_integer(i, column, options),
        (_, SqliteValue::Real(f)) => Value::Float(f),
        (_, SqliteValue::Text(s)) => Value::Text(s),
    }
}

/// Integers beyond the protocol's safe range (or every integer, when the engine is
/// read with wide integers) travel as decimal strings unless a coercion flag says
/// otherwise.
fn decode_integer(i: i64, column: &ResolvedColumn, options: &AdapterOptions) -> Value {
    let wide = options.use_wide_integers || !(-MAX_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(&i);
    if !wide {
        return Value::Int(i);
    }
    if options.allow_wide_integer_numeric_coercion
        && (0..=MAX_PLAUSIBLE_TIMESTAMP_MS).contains(&i)
    {
        return Value::Int(i);
    }
    if options.allow_unsafe_aggregate_on_wide_timestamp && column.is_undeclared() {
        return Value::Int(i);
    }
    Value::Text(i.to_string())
}

fn epoch_ms_to_iso(ms: i64) -> Value {
    match DateTime::from_timestamp_millis(ms) {
        Some(dt) => Value::Text(format_iso8601(&dt)),
        None => Value::Text(ms.to_string()),
    }
}

/// Run a prepared statement and materialize a normalized [`ResultSet`].
///
/// Column types are resolved from the whole fetched result before any row is
/// decoded, so a result with zero rows still reports names and types.
///
/// # Errors
/// Returns the translated engine error if stepping the statement fails.
pub fn build_result_set(
    stmt: &mut Statement<'_>,
    params: &[SqliteValue],
    options: &AdapterOptions,
) -> Result<ResultSet, AdapterError> {
    let param_refs: Vec<&dyn ToSql> = params.iter().map(|v| v as &dyn ToSql).collect();
    let column_names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();
    let declared: Vec<Option<String>> = stmt
        .columns()
        .iter()
        .map(|c| c.decl_type().map(str::to_owned))
        .collect();
    let col_count = column_names.len();

    let mut raw_rows: Vec<Vec<SqliteValue>> = Vec::new();
    let mut rows_iter = stmt.query(&param_refs[..]).map_err(translate)?;
    while let Some(row) = rows_iter.next().map_err(translate)? {
        let mut values = Vec::with_capacity(col_count);
        for i in 0..col_count {
            values.push(row.get::<_, SqliteValue>(i).map_err(translate)?);
        }
        raw_rows.push(values);
    }

    let columns = resolve_columns(&declared, &raw_rows);
    let mut result_set = ResultSet::with_columns(
        column_names,
        columns.iter().map(|c| c.column_type).collect(),
    );
    result_set.rows = raw_rows
        .into_iter()
        .map(|row| decode_row(row, &columns, options))
        .collect();
    Ok(result_set)
}
