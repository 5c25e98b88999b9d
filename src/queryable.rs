use async_trait::async_trait;
use serde::Serialize;

use crate::error::AdapterError;
use crate::results::ResultSet;
use crate::types::Query;

pub const PROVIDER: &str = "sqlite";
pub const ADAPTER_NAME: &str = "sqlite-driver-adapter";

/// Statement execution shared by the adapter and its transactions.
#[async_trait]
pub trait Queryable: Send + Sync {
    /// Execute a statement expected to produce rows.
    ///
    /// Zero matching rows still yield the column names and resolved types.
    async fn query_raw(&self, query: &Query) -> Result<ResultSet, AdapterError>;

    /// Execute a statement and return the number of affected rows.
    async fn execute_raw(&self, query: &Query) -> Result<u64, AdapterError>;

    fn provider(&self) -> &'static str {
        PROVIDER
    }

    fn adapter_name(&self) -> &'static str {
        ADAPTER_NAME
    }
}

/// Isolation levels a client may request when starting a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Snapshot,
    Serializable,
}

impl IsolationLevel {
    #[must_use]
    pub fn as_sql(&self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted => "READ UNCOMMITTED",
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Snapshot => "SNAPSHOT",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }
}

/// How the protocol should drive BEGIN/COMMIT/ROLLBACK for a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransactionOptions {
    /// When false the adapter issues the statements itself and the protocol
    /// must not synthesize phantom ones.
    pub use_phantom_query: bool,
}

/// Capabilities the protocol queries once per connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConnectionInfo {
    /// Maximum number of `?` parameters per statement.
    pub max_bind_values: usize,
    pub supports_relation_joins: bool,
}
