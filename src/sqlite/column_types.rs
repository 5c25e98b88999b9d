//! Column type resolution.
//!
//! SQLite is dynamically typed at the storage level, so a column's protocol type is
//! resolved from three sources in order: the declared type from the schema, the
//! storage class of the column's first-row value, and finally inspection of later
//! values. Columns with no usable information fall back to [`ColumnType::Int32`].

use std::collections::HashMap;
use std::sync::LazyLock;

use rusqlite::types::{Type, Value};

use crate::types::ColumnType;

static DECLARED_TYPES: LazyLock<HashMap<&'static str, ColumnType>> = LazyLock::new(|| {
    HashMap::from([
        ("TINYINT", ColumnType::Int32),
        ("SMALLINT", ColumnType::Int32),
        ("MEDIUMINT", ColumnType::Int32),
        ("INT", ColumnType::Int32),
        ("INTEGER", ColumnType::Int32),
        ("SERIAL", ColumnType::Int32),
        ("INT2", ColumnType::Int32),
        ("BIGINT", ColumnType::Int64),
        ("UNSIGNED BIG INT", ColumnType::Int64),
        ("INT8", ColumnType::Int64),
        ("DATETIME", ColumnType::DateTime),
        ("TIMESTAMP", ColumnType::DateTime),
        ("TIME", ColumnType::Time),
        ("DATE", ColumnType::Date),
        ("FLOAT", ColumnType::Float),
        ("DOUBLE", ColumnType::Double),
        ("DOUBLE PRECISION", ColumnType::Double),
        ("REAL", ColumnType::Double),
        ("DECIMAL", ColumnType::Numeric),
        ("NUMERIC", ColumnType::Numeric),
        ("TEXT", ColumnType::Text),
        ("CHAR", ColumnType::Text),
        ("VARCHAR", ColumnType::Text),
        ("CHARACTER", ColumnType::Text),
        ("VARYING CHARACTER", ColumnType::Text),
        ("NCHAR", ColumnType::Text),
        ("NATIVE CHARACTER", ColumnType::Text),
        ("NVARCHAR", ColumnType::Text),
        ("CLOB", ColumnType::Text),
        ("STRING", ColumnType::Text),
        ("BLOB", ColumnType::Bytes),
        ("BINARY", ColumnType::Bytes),
        ("VARBINARY", ColumnType::Bytes),
        ("BOOLEAN", ColumnType::Boolean),
        ("BOOL", ColumnType::Boolean),
        ("JSON", ColumnType::Json),
        ("JSONB", ColumnType::Json),
    ])
});

static RUNTIME_TYPES: LazyLock<HashMap<&'static str, ColumnType>> = LazyLock::new(|| {
    HashMap::from([
        ("INTEGER", ColumnType::Int64),
        ("REAL", ColumnType::Double),
        ("TEXT", ColumnType::Text),
        ("BLOB", ColumnType::Bytes),
    ])
});

/// Modifiers that never change the mapped type.
const IGNORED_MODIFIERS: &[&str] = &["UNSIGNED", "SIGNED"];

/// Which resolution tier produced a column's type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeSource {
    Declared,
    Runtime,
    Inferred,
    Default,
}

/// A column's resolved protocol type and where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedColumn {
    pub column_type: ColumnType,
    pub source: TypeSource,
}

impl ResolvedColumn {
    /// True when the schema said nothing about this column (expressions, aggregates).
    #[must_use]
    pub fn is_undeclared(&self) -> bool {
        self.source != TypeSource::Declared
    }
}

/// Map a schema-declared type such as `VARCHAR(255)` or `INTEGER UNSIGNED`.
#[must_use]
pub fn resolve_declared_type(raw: &str) -> Option<ColumnType> {
    let upper = raw.to_ascii_uppercase();
    let base = match upper.find('(') {
        Some(idx) => &upper[..idx],
        None => upper.as_str(),
    };
    let words: Vec<&str> = base.split_whitespace().collect();
    if words.is_empty() {
        return None;
    }
    if let Some(ty) = DECLARED_TYPES.get(words.join(" ").as_str()) {
        return Some(*ty);
    }
    let stripped: Vec<&str> = words
        .into_iter()
        .filter(|w| !IGNORED_MODIFIERS.contains(w))
        .collect();
    DECLARED_TYPES.get(stripped.join(" ").as_str()).copied()
}

/// Map an engine storage-class tag (`INTEGER`, `REAL`, `TEXT`, `BLOB`).
#[must_use]
pub fn resolve_runtime_type(tag: Option<&str>) -> Option<ColumnType> {
    let tag = tag?.trim().to_ascii_uppercase();
    RUNTIME_TYPES.get(tag.as_str()).copied()
}

/// Storage-class tag of an engine value, `None` for NULL.
#[must_use]
pub fn runtime_tag(value: &Value) -> Option<&'static str> {
    match value.data_type() {
        Type::Null => None,
        Type::Integer => Some("INTEGER"),
        Type::Real => Some("REAL"),
        Type::Text => Some("TEXT"),
        Type::Blob => Some("BLOB"),
    }
}

/// Last-resort inference from a value.
///
/// An integral float is ambiguous (it may be an integer that went through float
/// arithmetic) and yields [`ColumnType::UnknownNumber`] instead of a guess.
#[must_use]
pub fn infer_from_value(value: &Value) -> Option<ColumnType> {
    match value {
        Value::Null => None,
        Value::Integer(_) => Some(ColumnType::Int64),
        Value::Real(f) if f.is_finite() && f.fract() == 0.0 => Some(ColumnType::UnknownNumber),
        Value::Real(_) => Some(ColumnType::Double),
        Value::Text(_) => Some(ColumnType::Text),
        Value::Blob(_) => Some(ColumnType::Bytes),
    }
}

/// Resolve one column: declared → runtime (first row) → value inference → Int32.
#[must_use]
pub fn resolve_column(
    declared: Option<&str>,
    idx: usize,
    rows: &[Vec<Value>],
) -> ResolvedColumn {
    if let Some(column_type) = declared.and_then(resolve_declared_type) {
        return ResolvedColumn {
            column_type,
            source: TypeSource::Declared,
        };
    }
    let first_tag = rows.first().and_then(|r| r.get(idx)).and_then(runtime_tag);
    if let Some(column_type) = resolve_runtime_type(first_tag) {
        return ResolvedColumn {
            column_type,
            source: TypeSource::Runtime,
        };
    }
    if let Some(column_type) = rows
        .iter()
        .filter_map(|r| r.get(idx))
        .find_map(infer_from_value)
    {
        return ResolvedColumn {
            column_type,
            source: TypeSource::Inferred,
        };
    }
    ResolvedColumn {
        column_type: ColumnType::Int32,
        source: TypeSource::Default,
    }
}

/// Resolve every column of a result before any row is decoded.
#[must_use]
pub fn resolve_columns(declared: &[Option<String>], rows: &[Vec<Value>]) -> Vec<ResolvedColumn> {
    declared
        .iter()
        .enumerate()
        .map(|(idx, decl)| resolve_column(decl.as_deref(), idx, rows))
        .collect()
}
