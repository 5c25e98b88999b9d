mod core;
mod dml;
mod tx;

pub(crate) use self::core::run_blocking;
pub(crate) use self::tx::rollback_with_busy_retries;
pub use self::core::{MAX_BIND_VALUES, SharedSqliteConnection, SqliteAdapter};
