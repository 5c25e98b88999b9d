// SQLite adapter built on a single `rusqlite` connection.
//
// - column_types: declared/runtime/inferred column type resolution
// - params / query: value codec for arguments and result rows
// - errors: engine error classification
// - gate / transaction: FIFO transaction admission and lifecycle
// - config: pragmas, factory configuration and connection setup

pub mod column_types;
pub mod config;
pub mod connection;
pub mod errors;
pub mod executor;
pub mod gate;
pub mod params;
pub mod query;
pub mod transaction;

pub use column_types::{ResolvedColumn, TypeSource};
pub use config::{
    AdapterConfig, AdapterConfigBuilder, SqliteAdapterFactory, Synchronous, WalConfiguration,
    WalOptions, WalSetting,
};
pub use connection::{MAX_BIND_VALUES, SharedSqliteConnection, SqliteAdapter};
pub use errors::translate as translate_error;
pub use gate::{GateLease, TransactionGate};
pub use query::build_result_set;
pub use transaction::{SqliteTransaction, TransactionState};
