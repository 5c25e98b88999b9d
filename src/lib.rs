//! Driver adapter that lets an async relational-client protocol drive SQLite.
//!
//! The adapter converts values between the protocol's type system and SQLite's
//! storage classes, resolves column types, classifies engine errors, and admits
//! transactions on its single connection in arrival order.
//!
//! ```no_run
//! use sqlite_driver_adapter::prelude::*;
//!
//! # async fn demo() -> Result<(), AdapterError> {
//! let factory = AdapterConfig::builder("file:dev.db")
//!     .wal(WalSetting::Enabled(true))
//!     .build()?;
//! let adapter = factory.connect().await?;
//!
//! let mut tx = adapter.start_transaction(None).await?;
//! tx.execute_raw(&Query::new(
//!     "INSERT INTO users (name) VALUES (?)",
//!     vec![Value::from("alice")],
//!     vec![ArgType::scalar(ScalarType::String)],
//! ))
//! .await?;
//! tx.commit().await?;
//!
//! let rs = adapter
//!     .query_raw(&Query::new_without_args("SELECT id, name FROM users"))
//!     .await?;
//! println!("{} rows", rs.len());
//! # Ok(())
//! # }
//! ```

pub mod driver_error;
pub mod error;
pub mod options;
pub mod prelude;
pub mod queryable;
pub mod results;
pub mod sqlite;
pub mod types;

pub use driver_error::{DriverError, DriverErrorKind};
pub use error::AdapterError;
pub use options::{AdapterOptions, AdapterOptionsBuilder, TimestampFormat};
pub use queryable::{ConnectionInfo, IsolationLevel, Queryable, TransactionOptions};
pub use results::ResultSet;
pub use sqlite::{
    AdapterConfig, AdapterConfigBuilder, SqliteAdapter, SqliteAdapterFactory, SqliteTransaction,
    TransactionState, WalSetting,
};
pub use types::{ArgType, Arity, ColumnType, Query, ScalarType, Value};
