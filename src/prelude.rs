//! Convenient imports for common functionality.
//!
//! This module re-exports the types most callers need to open an adapter, run
//! queries and manage transactions.

pub use crate::driver_error::{DriverError, DriverErrorKind};
pub use crate::error::AdapterError;
pub use crate::options::{AdapterOptions, TimestampFormat};
pub use crate::queryable::{IsolationLevel, Queryable};
pub use crate::results::ResultSet;
pub use crate::sqlite::{
    AdapterConfig, SqliteAdapter, SqliteAdapterFactory, SqliteTransaction, TransactionState,
    WalSetting,
};
pub use crate::types::{ArgType, ColumnType, Query, ScalarType, Value};
