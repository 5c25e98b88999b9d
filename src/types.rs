use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Values exchanged with the client protocol, both as query arguments and as
/// decoded result cells.
///
/// ```rust
/// use sqlite_driver_adapter::prelude::*;
///
/// let args = vec![
///     Value::Int(1),
///     Value::Text("alice".into()),
///     Value::Boolean(true),
/// ];
/// # let _ = args;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Boolean(bool),
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text value; also carries wide integers as decimal strings
    Text(String),
    /// Binary data as a plain sequence of byte values
    Bytes(Vec<u8>),
    DateTime(DateTime<Utc>),
    Json(JsonValue),
    List(Vec<Value>),
}

impl Value {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        if let Value::Int(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let Value::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(value) => Some(*value),
            Value::Int(1) => Some(true),
            Value::Int(0) => Some(false),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        if let Value::Float(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        if let Value::Bytes(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }

    /// Decimal rendering of an integral value, whether it travelled as a
    /// number or as a wide-integer string.
    #[must_use]
    pub fn to_decimal_string(&self) -> Option<String> {
        match self {
            Value::Int(i) => Some(i.to_string()),
            Value::Text(s) if s.parse::<i64>().is_ok() => Some(s.clone()),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Scalar kind the protocol attaches to each argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Int,
    BigInt,
    Float,
    Decimal,
    Boolean,
    String,
    Enum,
    Uuid,
    Json,
    DateTime,
    Bytes,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arity {
    #[default]
    Scalar,
    List,
}

/// Type descriptor for one positional argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArgType {
    pub scalar_type: ScalarType,
    #[serde(default)]
    pub arity: Arity,
}

impl ArgType {
    #[must_use]
    pub fn scalar(scalar_type: ScalarType) -> Self {
        Self {
            scalar_type,
            arity: Arity::Scalar,
        }
    }

    #[must_use]
    pub fn list(scalar_type: ScalarType) -> Self {
        Self {
            scalar_type,
            arity: Arity::List,
        }
    }
}

/// A statement and its positional arguments.
///
/// `args` and `arg_types` align 1:1 with the `?` placeholders in `sql`. An
/// argument without a matching type descriptor is encoded as
/// [`ScalarType::Unknown`].
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    sql: String,
    args: Vec<Value>,
    arg_types: Vec<ArgType>,
}

impl Query {
    pub fn new(sql: impl Into<String>, args: Vec<Value>, arg_types: Vec<ArgType>) -> Self {
        Self {
            sql: sql.into(),
            args,
            arg_types,
        }
    }

    /// A query without arguments.
    pub fn new_without_args(sql: impl Into<String>) -> Self {
        Self::new(sql, Vec::new(), Vec::new())
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    #[must_use]
    pub fn arg_types(&self) -> &[ArgType] {
        &self.arg_types
    }

    #[must_use]
    pub fn arg_type(&self, idx: usize) -> ArgType {
        self.arg_types
            .get(idx)
            .copied()
            .unwrap_or(ArgType::scalar(ScalarType::Unknown))
    }
}

/// Column type reported to the protocol for every column of a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    Int32,
    Int64,
    Float,
    Double,
    Numeric,
    Text,
    Bytes,
    Boolean,
    Date,
    Time,
    DateTime,
    Json,
    /// A numeric column whose integer-vs-float nature could not be decided.
    UnknownNumber,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_arg_type_defaults_to_unknown() {
        let q = Query::new(
            "SELECT ?, ?",
            vec![Value::Int(1), Value::Int(2)],
            vec![ArgType::scalar(ScalarType::Int)],
        );
        assert_eq!(q.arg_type(0).scalar_type, ScalarType::Int);
        assert_eq!(q.arg_type(1).scalar_type, ScalarType::Unknown);
    }

    #[test]
    fn values_serialize_untagged() {
        let row = vec![
            Value::Int(7),
            Value::Text("9223372036854775807".into()),
            Value::Bytes(vec![1, 2]),
            Value::Null,
        ];
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"[7,"9223372036854775807",[1,2],null]"#);
    }

    #[test]
    fn arg_types_deserialize_from_protocol_json() {
        let ty: ArgType = serde_json::from_str(r#"{"scalar_type":"bigint"}"#).unwrap();
        assert_eq!(ty, ArgType::scalar(ScalarType::BigInt));
        let ty: ArgType =
            serde_json::from_str(r#"{"scalar_type":"int","arity":"list"}"#).unwrap();
        assert_eq!(ty.arity, Arity::List);
    }
}
