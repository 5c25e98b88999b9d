use async_trait::async_trait;
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::driver_error::DriverError;
use crate::error::AdapterError;
use crate::options::AdapterOptions;
use crate::queryable::{Queryable, TransactionOptions};
use crate::results::ResultSet;
use crate::types::Query;

use super::connection::{SharedSqliteConnection, rollback_with_busy_retries, run_blocking};
use super::errors::translate;
use super::executor::{execute_dml, execute_query};
use super::gate::GateLease;

/// Lifecycle of a transaction. `Committed` and `RolledBack` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Active,
    Committed,
    RolledBack,
}

/// Transaction handle that owns the shared connection until completion.
///
/// Dropping an active transaction rolls it back before the connection is handed
/// to the next waiter.
pub struct SqliteTransaction {
    conn: SharedSqliteConnection,
    options: AdapterOptions,
    state: TransactionState,
    lease: Option<GateLease>,
}

impl SqliteTransaction {
    pub(crate) fn new(conn: SharedSqliteConnection, options: AdapterOptions, lease: GateLease) -> Self {
        Self {
            conn,
            options,
            state: TransactionState::Active,
            lease: Some(lease),
        }
    }

    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// The adapter issues BEGIN/COMMIT/ROLLBACK itself.
    #[must_use]
    pub fn options(&self) -> TransactionOptions {
        TransactionOptions {
            use_phantom_query: false,
        }
    }

    fn ensure_active(&self, operation: &str) -> Result<(), AdapterError> {
        match self.state {
            TransactionState::Active => Ok(()),
            TransactionState::Committed => Err(DriverError::transaction_already_closed(format!(
                "transaction already committed; cannot {operation}"
            ))
            .into()),
            TransactionState::RolledBack => Err(DriverError::transaction_already_closed(format!(
                "transaction already rolled back; cannot {operation}"
            ))
            .into()),
        }
    }

    /// Commit and hand the connection to the next waiter.
    ///
    /// A failed COMMIT is followed by a best-effort ROLLBACK; the transaction is
    /// then closed either way.
    ///
    /// # Errors
    /// Returns `TransactionAlreadyClosed` outside the active state, or the
    /// translated engine error if COMMIT fails.
    pub async fn commit(&mut self) -> Result<(), AdapterError> {
        self.ensure_active("commit")?;
        let result = run_blocking(self.conn.clone(), |conn| {
            conn.execute_batch("COMMIT").map_err(translate)
        })
        .await;

        match result {
            Ok(()) => {
                self.state = TransactionState::Committed;
                debug!("sqlite transaction committed");
            }
            Err(ref err) => {
                warn!(error = %err, "sqlite COMMIT failed; rolling back");
                let _ = run_blocking(self.conn.clone(), |conn| {
                    if conn.is_autocommit() {
                        Ok(())
                    } else {
                        rollback_with_busy_retries(conn)
                    }
                })
                .await;
                self.state = TransactionState::RolledBack;
            }
        }
        self.release();
        result
    }

    /// Roll back and hand the connection to the next waiter.
    ///
    /// # Errors
    /// Returns `TransactionAlreadyClosed` outside the active state, or the
    /// translated engine error if ROLLBACK keeps failing.
    pub async fn rollback(&mut self) -> Result<(), AdapterError> {
        self.ensure_active("rollback")?;
        let result = run_blocking(self.conn.clone(), |conn| rollback_with_busy_retries(conn)).await;
        self.state = TransactionState::RolledBack;
        self.release();
        debug!(ok = result.is_ok(), "sqlite transaction rolled back");
        result
    }

    fn release(&mut self) {
        if let Some(lease) = self.lease.take() {
            lease.release();
        }
    }
}

#[async_trait]
impl Queryable for SqliteTransaction {
    async fn query_raw(&self, query: &Query) -> Result<ResultSet, AdapterError> {
        self.ensure_active("query")?;
        execute_query(self.conn.clone(), query, self.options).await
    }

    async fn execute_raw(&self, query: &Query) -> Result<u64, AdapterError> {
        self.ensure_active("execute")?;
        execute_dml(self.conn.clone(), query, self.options).await
    }
}

impl std::fmt::Debug for SqliteTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteTransaction")
            .field("state", &self.state)
            .finish()
    }
}

impl Drop for SqliteTransaction {
    fn drop(&mut self) {
        if self.state != TransactionState::Active {
            return;
        }
        self.state = TransactionState::RolledBack;
        let Some(lease) = self.lease.take() else {
            return;
        };
        let conn = self.conn.clone();
        warn!("sqlite transaction dropped while active; rolling back");
        // The lease moves along with the rollback so the next waiter only sees a
        // clean connection.
        if let Ok(handle) = Handle::try_current() {
            handle.spawn(async move {
                let _ = run_blocking(conn, |guard| rollback_with_busy_retries(guard)).await;
                drop(lease);
            });
        } else {
            let mut guard = conn.blocking_lock();
            if let Some(handle) = guard.as_mut() {
                let _ = rollback_with_busy_retries(handle);
            }
            drop(guard);
            drop(lease);
        }
    }
}
