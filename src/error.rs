use thiserror::Error;

use crate::driver_error::DriverError;

#[derive(Debug, Error)]
pub enum AdapterError {
    /// An engine failure that was classified into the protocol taxonomy.
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// An engine failure without a recognizable result code, passed through untouched.
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parameter conversion error: {0}")]
    ParameterError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),
}

impl AdapterError {
    /// Borrow the classified driver error, if this failure was classified.
    #[must_use]
    pub fn as_driver_error(&self) -> Option<&DriverError> {
        match self {
            AdapterError::Driver(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for AdapterError {
    fn from(err: serde_json::Error) -> Self {
        AdapterError::ConfigError(format!("invalid adapter configuration: {err}"))
    }
}
