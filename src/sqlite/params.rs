use base64::prelude::*;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Value as SqliteValue;

use crate::error::AdapterError;
use crate::options::{AdapterOptions, TimestampFormat};
use crate::types::{ArgType, Arity, Query, ScalarType, Value};

/// Convert a single protocol argument to a rusqlite `Value`.
///
/// # Errors
/// Returns `AdapterError::ParameterError` when a string argument cannot be parsed
/// as the numeric, datetime or byte type its descriptor announces.
pub fn encode_arg(
    value: &Value,
    arg_type: ArgType,
    options: &AdapterOptions,
) -> Result<SqliteValue, AdapterError> {
    if value.is_null() {
        return Ok(SqliteValue::Null);
    }
    if arg_type.arity == Arity::List {
        return encode_list(value, arg_type.scalar_type, options);
    }

    match (arg_type.scalar_type, value) {
        (_, Value::Boolean(b)) => Ok(SqliteValue::Integer(i64::from(*b))),
        (ScalarType::Boolean, Value::Text(s)) => parse_bool(s),

        (ScalarType::Int, Value::Text(s)) => parse_int(s, "int"),
        (ScalarType::BigInt, Value::Text(s)) => parse_int(s, "bigint"),
        (ScalarType::Float | ScalarType::Decimal, Value::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map(SqliteValue::Real)
            .map_err(|e| param_error(s, "float", &e)),
        (ScalarType::Int | ScalarType::BigInt, Value::Float(f)) => integral_float(*f),

        (_, Value::DateTime(dt)) => Ok(encode_datetime(dt, options.timestamp_format)),
        (ScalarType::DateTime, Value::Text(s)) => {
            let dt = DateTime::parse_from_rfc3339(s)
                .map_err(|e| param_error(s, "datetime", &e))?
                .with_timezone(&Utc);
            Ok(encode_datetime(&dt, options.timestamp_format))
        }

        (ScalarType::Bytes, Value::Text(s)) => BASE64_STANDARD
            .decode(s)
            .map(SqliteValue::Blob)
            .map_err(|e| param_error(s, "base64 bytes", &e)),
        (ScalarType::Bytes, Value::List(items)) => bytes_from_list(items).map(SqliteValue::Blob),

        (_, Value::Int(i)) => Ok(SqliteValue::Integer(*i)),
        (_, Value::Float(f)) => Ok(SqliteValue::Real(*f)),
        (_, Value::Text(s)) => Ok(SqliteValue::Text(s.clone())),
        (_, Value::Bytes(bytes)) => Ok(SqliteValue::Blob(bytes.clone())),
        (_, Value::Json(json)) => Ok(SqliteValue::Text(json.to_string())),
        (scalar, Value::List(_)) => encode_list(value, scalar, options),
        (_, Value::Null) => Ok(SqliteValue::Null),
    }
}

/// Encode every argument of a query in placeholder order.
///
/// # Errors
/// Returns `AdapterError::ParameterError` if any argument fails to convert.
pub fn encode_args(
    query: &Query,
    options: &AdapterOptions,
) -> Result<Vec<SqliteValue>, AdapterError> {
    query
        .args()
        .iter()
        .enumerate()
        .map(|(idx, arg)| encode_arg(arg, query.arg_type(idx), options))
        .collect()
}

/// ISO-8601 with millisecond precision and an explicit `+00:00` offset.
#[must_use]
pub fn format_iso8601(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, false)
}

fn encode_datetime(dt: &DateTime<Utc>, format: TimestampFormat) -> SqliteValue {
    match format {
        TimestampFormat::Iso8601 => SqliteValue::Text(format_iso8601(dt)),
        TimestampFormat::EpochMs => SqliteValue::Integer(dt.timestamp_millis()),
    }
}

/// Lists have no native storage; they are bound as JSON array text.
fn encode_list(
    value: &Value,
    scalar: ScalarType,
    options: &AdapterOptions,
) -> Result<SqliteValue, AdapterError> {
    let Value::List(items) = value else {
        return encode_arg(value, ArgType::scalar(scalar), options);
    };
    let mut encoded = Vec::with_capacity(items.len());
    for item in items {
        let json = match encode_arg(item, ArgType::scalar(scalar), options)? {
            SqliteValue::Null => serde_json::Value::Null,
            SqliteValue::Integer(i) => serde_json::Value::from(i),
            SqliteValue::Real(f) => serde_json::Value::from(f),
            SqliteValue::Text(s) => serde_json::Value::String(s),
            SqliteValue::Blob(b) => serde_json::Value::String(BASE64_STANDARD.encode(b)),
        };
        encoded.push(json);
    }
    Ok(SqliteValue::Text(serde_json::Value::Array(encoded).to_string()))
}

fn parse_int(s: &str, kind: &str) -> Result<SqliteValue, AdapterError> {
    s.trim()
        .parse::<i64>()
        .map(SqliteValue::Integer)
        .map_err(|e| param_error(s, kind, &e))
}

/// An integer-typed argument sent as a float is accepted only when no
/// information is lost.
fn integral_float(f: f64) -> Result<SqliteValue, AdapterError> {
    // `i64::MAX as f64` rounds up to 2^63, hence the strict upper bound.
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Ok(SqliteValue::Integer(f as i64))
    } else {
        Err(AdapterError::ParameterError(format!(
            "cannot convert {f} to an integer without losing precision"
        )))
    }
}

fn parse_bool(s: &str) -> Result<SqliteValue, AdapterError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(SqliteValue::Integer(1)),
        "false" | "0" => Ok(SqliteValue::Integer(0)),
        _ => Err(AdapterError::ParameterError(format!(
            "cannot convert {s:?} to boolean"
        ))),
    }
}

fn bytes_from_list(items: &[Value]) -> Result<Vec<u8>, AdapterError> {
    items
        .iter()
        .map(|item| match item {
            Value::Int(i) => u8::try_from(*i).map_err(|e| {
                AdapterError::ParameterError(format!("byte value {i} out of range: {e}"))
            }),
            other => Err(AdapterError::ParameterError(format!(
                "expected byte value, got {other:?}"
            ))),
        })
        .collect()
}

fn param_error(raw: &str, kind: &str, err: &dyn std::fmt::Display) -> AdapterError {
    AdapterError::ParameterError(format!("cannot convert {raw:?} to {kind}: {err}"))
}
