//! Protocol-level error taxonomy.
//!
//! A [`DriverError`] is produced once, where the engine raises the failure, and is
//! never re-interpreted afterwards. Every value keeps the engine's original code and
//! message so tooling can fall back to raw diagnostics.

use std::fmt;

use thiserror::Error;

/// Normalized error kinds understood by the client protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverErrorKind {
    /// A UNIQUE or PRIMARY KEY constraint rejected the write.
    UniqueConstraintViolation { fields: Vec<String> },
    /// A FOREIGN KEY (or trigger-enforced) constraint rejected the write.
    ForeignKeyConstraintViolation { constraint: Option<String> },
    /// A NOT NULL constraint rejected the write.
    NullConstraintViolation { fields: Vec<String> },
    /// The engine could not take its file lock within the busy timeout.
    SocketTimeout,
    TableDoesNotExist { table: Option<String> },
    ColumnNotFound { column: Option<String> },
    /// An operation was attempted on a committed or rolled back transaction.
    TransactionAlreadyClosed { cause: String },
    InvalidIsolationLevel { level: String },
    /// Recognized engine failure with no more specific kind.
    Generic,
}

impl DriverErrorKind {
    /// Stable name of the kind, used in logs and display output.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            DriverErrorKind::UniqueConstraintViolation { .. } => "UniqueConstraintViolation",
            DriverErrorKind::ForeignKeyConstraintViolation { .. } => {
                "ForeignKeyConstraintViolation"
            }
            DriverErrorKind::NullConstraintViolation { .. } => "NullConstraintViolation",
            DriverErrorKind::SocketTimeout => "SocketTimeout",
            DriverErrorKind::TableDoesNotExist { .. } => "TableDoesNotExist",
            DriverErrorKind::ColumnNotFound { .. } => "ColumnNotFound",
            DriverErrorKind::TransactionAlreadyClosed { .. } => "TransactionAlreadyClosed",
            DriverErrorKind::InvalidIsolationLevel { .. } => "InvalidIsolationLevel",
            DriverErrorKind::Generic => "Generic",
        }
    }
}

impl fmt::Display for DriverErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A classified engine failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {}", .original_message.as_deref().unwrap_or("no message"))]
pub struct DriverError {
    pub kind: DriverErrorKind,
    /// Symbolic engine code, e.g. `SQLITE_CONSTRAINT_UNIQUE`.
    pub original_code: Option<String>,
    pub original_message: Option<String>,
}

impl DriverError {
    #[must_use]
    pub fn new(
        kind: DriverErrorKind,
        original_code: Option<String>,
        original_message: Option<String>,
    ) -> Self {
        Self {
            kind,
            original_code,
            original_message,
        }
    }

    /// Error for an operation attempted after commit or rollback.
    #[must_use]
    pub fn transaction_already_closed(cause: impl Into<String>) -> Self {
        let cause = cause.into();
        Self {
            original_message: Some(cause.clone()),
            kind: DriverErrorKind::TransactionAlreadyClosed { cause },
            original_code: None,
        }
    }

    #[must_use]
    pub fn invalid_isolation_level(level: impl Into<String>) -> Self {
        let level = level.into();
        Self {
            original_message: Some(format!("unsupported isolation level: {level}")),
            kind: DriverErrorKind::InvalidIsolationLevel { level },
            original_code: None,
        }
    }
}
