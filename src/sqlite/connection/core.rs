use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::error::AdapterError;
use crate::options::AdapterOptions;
use crate::queryable::ConnectionInfo;
use crate::sqlite::errors::translate;
use crate::sqlite::gate::TransactionGate;

/// The single engine handle; `None` once the adapter has been disposed.
pub type SharedSqliteConnection = Arc<tokio::sync::Mutex<Option<rusqlite::Connection>>>;

/// Highest parameter count the adapter advertises per statement.
pub const MAX_BIND_VALUES: usize = 999;

pub(crate) struct AdapterInner {
    pub(crate) conn: SharedSqliteConnection,
    pub(crate) gate: Arc<TransactionGate>,
    pub(crate) options: AdapterOptions,
    disposed: AtomicBool,
}

/// Driver adapter over one `rusqlite` connection.
///
/// Cloning is cheap and every clone drives the same connection. Statements and
/// transactions are serialized through a FIFO gate: a statement issued on the
/// adapter waits for any open transaction to finish, so a task must not run
/// adapter-level statements while it holds a [`SqliteTransaction`](crate::sqlite::SqliteTransaction).
#[derive(Clone)]
pub struct SqliteAdapter {
    pub(crate) inner: Arc<AdapterInner>,
}

impl SqliteAdapter {
    pub(crate) fn new(conn: rusqlite::Connection, options: AdapterOptions) -> Self {
        Self {
            inner: Arc::new(AdapterInner {
                conn: Arc::new(tokio::sync::Mutex::new(Some(conn))),
                gate: TransactionGate::new(),
                options,
                disposed: AtomicBool::new(false),
            }),
        }
    }

    #[must_use]
    pub fn options(&self) -> &AdapterOptions {
        &self.inner.options
    }

    #[must_use]
    pub fn connection_info(&self) -> ConnectionInfo {
        ConnectionInfo {
            max_bind_values: MAX_BIND_VALUES,
            supports_relation_joins: false,
        }
    }

    /// Close the engine handle once any in-flight transaction has finished.
    ///
    /// Calling it again is a no-op.
    ///
    /// # Errors
    /// Returns `AdapterError` if the engine refuses to close the handle.
    pub async fn dispose(&self) -> Result<(), AdapterError> {
        if self.inner.disposed.swap(true, Ordering::AcqRel) {
            debug!("sqlite adapter already disposed");
            return Ok(());
        }
        let lease = self.inner.gate.acquire().await;
        let conn = self.conn_handle();
        let result = tokio::task::spawn_blocking(move || {
            let mut guard = conn.blocking_lock();
            match guard.take() {
                Some(handle) => handle.close().map_err(|(_, err)| translate(err)),
                None => Ok(()),
            }
        })
        .await
        .map_err(|e| {
            AdapterError::ExecutionError(format!("sqlite spawn_blocking join error: {e}"))
        })?;
        lease.release();
        debug!("sqlite adapter disposed");
        result
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }

    pub(crate) fn conn_handle(&self) -> SharedSqliteConnection {
        Arc::clone(&self.inner.conn)
    }
}

impl fmt::Debug for SqliteAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteAdapter")
            .field("options", &self.inner.options)
            .field("disposed", &self.is_disposed())
            .field("transaction_open", &self.inner.gate.is_locked())
            .finish()
    }
}

/// Run synchronous `rusqlite` logic on the blocking pool while holding the
/// connection's mutex.
pub(crate) async fn run_blocking<F, R>(
    conn: SharedSqliteConnection,
    func: F,
) -> Result<R, AdapterError>
where
    F: FnOnce(&mut rusqlite::Connection) -> Result<R, AdapterError> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut guard = conn.blocking_lock();
        let handle = guard.as_mut().ok_or_else(|| {
            AdapterError::ConnectionError("sqlite connection already disposed".into())
        })?;
        func(handle)
    })
    .await
    .map_err(|e| AdapterError::ExecutionError(format!("sqlite spawn_blocking join error: {e}")))?
}
