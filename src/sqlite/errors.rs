//! Classification of engine failures into [`DriverError`]s.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::driver_error::{DriverError, DriverErrorKind};
use crate::error::AdapterError;

/// Result codes the translator recognizes, keyed by extended code first and
/// primary code second.
static RESULT_CODES: LazyLock<HashMap<i32, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        (1, "SQLITE_ERROR"),
        (2, "SQLITE_INTERNAL"),
        (3, "SQLITE_PERM"),
        (4, "SQLITE_ABORT"),
        (5, "SQLITE_BUSY"),
        (6, "SQLITE_LOCKED"),
        (7, "SQLITE_NOMEM"),
        (8, "SQLITE_READONLY"),
        (9, "SQLITE_INTERRUPT"),
        (10, "SQLITE_IOERR"),
        (11, "SQLITE_CORRUPT"),
        (12, "SQLITE_NOTFOUND"),
        (13, "SQLITE_FULL"),
        (14, "SQLITE_CANTOPEN"),
        (15, "SQLITE_PROTOCOL"),
        (16, "SQLITE_EMPTY"),
        (17, "SQLITE_SCHEMA"),
        (18, "SQLITE_TOOBIG"),
        (19, "SQLITE_CONSTRAINT"),
        (20, "SQLITE_MISMATCH"),
        (21, "SQLITE_MISUSE"),
        (22, "SQLITE_NOLFS"),
        (23, "SQLITE_AUTH"),
        (24, "SQLITE_FORMAT"),
        (25, "SQLITE_RANGE"),
        (26, "SQLITE_NOTADB"),
        (27, "SQLITE_NOTICE"),
        (28, "SQLITE_WARNING"),
        (261, "SQLITE_BUSY_RECOVERY"),
        (517, "SQLITE_BUSY_SNAPSHOT"),
        (262, "SQLITE_LOCKED_SHAREDCACHE"),
        (275, "SQLITE_CONSTRAINT_CHECK"),
        (531, "SQLITE_CONSTRAINT_COMMITHOOK"),
        (787, "SQLITE_CONSTRAINT_FOREIGNKEY"),
        (1043, "SQLITE_CONSTRAINT_FUNCTION"),
        (1299, "SQLITE_CONSTRAINT_NOTNULL"),
        (1555, "SQLITE_CONSTRAINT_PRIMARYKEY"),
        (1811, "SQLITE_CONSTRAINT_TRIGGER"),
        (2067, "SQLITE_CONSTRAINT_UNIQUE"),
        (2323, "SQLITE_CONSTRAINT_VTAB"),
        (2579, "SQLITE_CONSTRAINT_ROWID"),
    ])
});

static CONSTRAINT_FIELDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"constraint failed: (.+)$").expect("valid constraint regex"));

static NAMED_OBJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:no such (?:table|column)|has no column named):?\s+(\S+)")
        .expect("valid object-name regex")
});

/// Symbolic name for an engine result code, if it is in the code table.
#[must_use]
pub fn symbolic_code(extended_code: i32) -> Option<&'static str> {
    RESULT_CODES
        .get(&extended_code)
        .or_else(|| RESULT_CODES.get(&(extended_code & 0xff)))
        .copied()
}

/// Classify an engine error.
///
/// Failures carrying a tabled result code become `AdapterError::Driver`; everything
/// else (type conversion errors, misuse of the rusqlite API, ...) is returned as
/// `AdapterError::SqliteError` so it is never misreported as a database condition.
#[must_use]
pub fn translate(err: rusqlite::Error) -> AdapterError {
    // Prepare-time failures that carry a byte offset arrive as `SqlInputError`.
    let (ffi_err, message) = match &err {
        rusqlite::Error::SqliteFailure(ffi_err, message) => (ffi_err, message.clone()),
        rusqlite::Error::SqlInputError { error, msg, .. } => (error, Some(msg.clone())),
        _ => return AdapterError::SqliteError(err),
    };
    let Some(code) = symbolic_code(ffi_err.extended_code) else {
        return AdapterError::SqliteError(err);
    };
    let message = message.unwrap_or_else(|| ffi_err.to_string());
    let kind = classify(code, &message);
    debug!(code, kind = kind.name(), "classified sqlite error");
    AdapterError::Driver(DriverError::new(kind, Some(code.to_owned()), Some(message)))
}

/// Map a symbolic code plus message to a protocol error kind.
#[must_use]
pub fn classify(code: &str, message: &str) -> DriverErrorKind {
    match code {
        c if c.starts_with("SQLITE_BUSY") || c.starts_with("SQLITE_LOCKED") => {
            DriverErrorKind::SocketTimeout
        }
        "SQLITE_CONSTRAINT_UNIQUE" | "SQLITE_CONSTRAINT_PRIMARYKEY" => {
            DriverErrorKind::UniqueConstraintViolation {
                fields: constraint_fields(message),
            }
        }
        "SQLITE_CONSTRAINT_NOTNULL" => DriverErrorKind::NullConstraintViolation {
            fields: constraint_fields(message),
        },
        "SQLITE_CONSTRAINT_FOREIGNKEY" | "SQLITE_CONSTRAINT_TRIGGER" => {
            DriverErrorKind::ForeignKeyConstraintViolation {
                constraint: constraint_fields(message).into_iter().next(),
            }
        }
        _ if message.starts_with("no such table") => DriverErrorKind::TableDoesNotExist {
            table: named_object(message),
        },
        _ if message.starts_with("no such column") || message.contains("has no column named") => {
            DriverErrorKind::ColumnNotFound {
                column: named_object(message),
            }
        }
        _ => DriverErrorKind::Generic,
    }
}

/// Column names from a `... constraint failed: t.a, t.b` message, table prefix dropped.
fn constraint_fields(message: &str) -> Vec<String> {
    CONSTRAINT_FIELDS
        .captures(message)
        .and_then(|caps| caps.get(1))
        .map(|m| {
            m.as_str()
                .split(", ")
                .map(|field| field.rsplit('.').next().unwrap_or(field).trim().to_owned())
                .filter(|field| !field.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn named_object(message: &str) -> Option<String> {
    NAMED_OBJECT
        .captures(message)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
}
