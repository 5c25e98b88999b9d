use rusqlite::ToSql;
use rusqlite::types::Value as SqliteValue;
use tracing::debug;

use crate::error::AdapterError;
use crate::options::AdapterOptions;
use crate::results::ResultSet;
use crate::types::Query;

use super::connection::{SharedSqliteConnection, run_blocking};
use super::errors::translate;
use super::params::encode_args;
use super::query::build_result_set;

/// Run a statement and materialize its rows.
///
/// Statements that produce no columns are executed for their side effects. Any
/// statement that writes reports the connection's last insert rowid.
///
/// # Errors
/// Returns the translated engine error if preparing or stepping fails.
pub fn query_raw_blocking(
    conn: &rusqlite::Connection,
    sql: &str,
    args: &[SqliteValue],
    options: &AdapterOptions,
) -> Result<ResultSet, AdapterError> {
    let mut stmt = conn.prepare_cached(sql).map_err(translate)?;
    if stmt.column_count() == 0 {
        let refs: Vec<&dyn ToSql> = args.iter().map(|v| v as &dyn ToSql).collect();
        stmt.execute(&refs[..]).map_err(translate)?;
        return Ok(ResultSet::without_columns(Some(
            conn.last_insert_rowid().to_string(),
        )));
    }
    let writes = !stmt.readonly();
    let mut result_set = build_result_set(&mut stmt, args, options)?;
    // `INSERT ... RETURNING` produces rows and a rowid; plain reads report none.
    if writes {
        result_set.last_insert_id = Some(conn.last_insert_rowid().to_string());
    }
    Ok(result_set)
}

/// Run a statement and return the number of rows it changed.
///
/// # Errors
/// Returns the translated engine error if preparing or stepping fails.
pub fn execute_raw_blocking(
    conn: &rusqlite::Connection,
    sql: &str,
    args: &[SqliteValue],
) -> Result<u64, AdapterError> {
    let mut stmt = conn.prepare_cached(sql).map_err(translate)?;
    let refs: Vec<&dyn ToSql> = args.iter().map(|v| v as &dyn ToSql).collect();
    if stmt.column_count() == 0 {
        let affected = stmt.execute(&refs[..]).map_err(translate)?;
        return u64::try_from(affected).map_err(|e| {
            AdapterError::ExecutionError(format!("sqlite affected rows conversion error: {e}"))
        });
    }
    // `INSERT ... RETURNING` and friends: drain the rows, then read the change count.
    {
        let mut rows = stmt.query(&refs[..]).map_err(translate)?;
        while rows.next().map_err(translate)?.is_some() {}
    }
    u64::try_from(conn.changes()).map_err(|e| {
        AdapterError::ExecutionError(format!("sqlite affected rows conversion error: {e}"))
    })
}

/// Run a multi-statement script as-is; the script controls its own transactions.
///
/// # Errors
/// Returns the translated engine error of the first failing statement.
pub fn execute_script_blocking(conn: &rusqlite::Connection, script: &str) -> Result<(), AdapterError> {
    conn.execute_batch(script).map_err(translate)
}

/// Encode the query's arguments and run it as a row-producing statement.
///
/// # Errors
/// Returns `AdapterError` if argument encoding or execution fails.
pub async fn execute_query(
    conn: SharedSqliteConnection,
    query: &Query,
    options: AdapterOptions,
) -> Result<ResultSet, AdapterError> {
    let args = encode_args(query, &options)?;
    let sql = query.sql().to_owned();
    debug!(sql = %sql, args = args.len(), "sqlite query_raw");
    run_blocking(conn, move |guard| query_raw_blocking(guard, &sql, &args, &options)).await
}

/// Encode the query's arguments and run it for its affected-row count.
///
/// # Errors
/// Returns `AdapterError` if argument encoding or execution fails.
pub async fn execute_dml(
    conn: SharedSqliteConnection,
    query: &Query,
    options: AdapterOptions,
) -> Result<u64, AdapterError> {
    let args = encode_args(query, &options)?;
    let sql = query.sql().to_owned();
    debug!(sql = %sql, args = args.len(), "sqlite execute_raw");
    run_blocking(conn, move |guard| execute_raw_blocking(guard, &sql, &args)).await
}

/// Run a script on the shared connection.
///
/// # Errors
/// Returns `AdapterError` if any statement of the script fails.
pub async fn execute_script(conn: SharedSqliteConnection, script: &str) -> Result<(), AdapterError> {
    let script = script.to_owned();
    debug!(bytes = script.len(), "sqlite execute_script");
    run_blocking(conn, move |guard| execute_script_blocking(guard, &script)).await
}
