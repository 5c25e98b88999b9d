use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::driver_error::DriverError;
use crate::error::AdapterError;
use crate::queryable::IsolationLevel;
use crate::sqlite::errors::translate;
use crate::sqlite::transaction::SqliteTransaction;

use super::{SqliteAdapter, run_blocking};

const ROLLBACK_BUSY_RETRIES: &[Duration] =
    &[Duration::from_millis(10), Duration::from_millis(25), Duration::from_millis(50)];

fn is_busy(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::DatabaseBusy
                || e.code == rusqlite::ErrorCode::DatabaseLocked
    )
}

/// Issue `ROLLBACK`, retrying briefly while the engine reports the database busy.
pub(crate) fn rollback_with_busy_retries(
    conn: &rusqlite::Connection,
) -> Result<(), AdapterError> {
    retry_while_busy(ROLLBACK_BUSY_RETRIES, || conn.execute_batch("ROLLBACK")).map_err(translate)
}

// One attempt up front, then one more after each delay.
fn retry_while_busy<F>(delays: &[Duration], mut op: F) -> Result<(), rusqlite::Error>
where
    F: FnMut() -> Result<(), rusqlite::Error>,
{
    let mut delays = delays.iter().copied();
    loop {
        match op() {
            Ok(()) => return Ok(()),
            Err(err) if is_busy(&err) => match delays.next() {
                Some(delay) => {
                    debug!(?delay, "sqlite busy during rollback, retrying");
                    thread::sleep(delay);
                }
                None => return Err(err),
            },
            Err(err) => return Err(err),
        }
    }
}

impl SqliteAdapter {
    /// Begin a write transaction once every earlier transaction has finished.
    ///
    /// Only SQLite's native `SERIALIZABLE` level is accepted. The returned
    /// transaction holds the connection until it is committed, rolled back or
    /// dropped.
    ///
    /// # Errors
    /// Returns `InvalidIsolationLevel` for any other level, or the translated
    /// engine error if `BEGIN` fails; in that case the gate is released first.
    pub async fn start_transaction(
        &self,
        isolation_level: Option<IsolationLevel>,
    ) -> Result<SqliteTransaction, AdapterError> {
        if let Some(level) = isolation_level
            && level != IsolationLevel::Serializable
        {
            return Err(DriverError::invalid_isolation_level(level.as_sql()).into());
        }

        let lease = self.inner.gate.acquire().await;
        let begin = run_blocking(self.conn_handle(), |conn| {
            if !conn.is_autocommit() {
                warn!("sqlite connection still inside a transaction; rolling back before BEGIN");
                rollback_with_busy_retries(conn)?;
            }
            conn.execute_batch("BEGIN").map_err(translate)
        })
        .await;

        if let Err(err) = begin {
            lease.release();
            return Err(err);
        }
        debug!("sqlite transaction started");
        Ok(SqliteTransaction::new(
            self.conn_handle(),
            self.inner.options,
            lease,
        ))
    }
}
