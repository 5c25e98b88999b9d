use async_trait::async_trait;

use crate::error::AdapterError;
use crate::queryable::Queryable;
use crate::results::ResultSet;
use crate::sqlite::executor::{execute_dml, execute_query, execute_script};
use crate::types::Query;

use super::SqliteAdapter;

impl SqliteAdapter {
    /// Execute a multi-statement script (DDL, migrations).
    ///
    /// # Errors
    /// Returns the translated engine error of the first failing statement.
    pub async fn execute_script(&self, script: &str) -> Result<(), AdapterError> {
        let _lease = self.inner.gate.acquire().await;
        execute_script(self.conn_handle(), script).await
    }
}

#[async_trait]
impl Queryable for SqliteAdapter {
    async fn query_raw(&self, query: &Query) -> Result<ResultSet, AdapterError> {
        let _lease = self.inner.gate.acquire().await;
        execute_query(self.conn_handle(), query, self.inner.options).await
    }

    async fn execute_raw(&self, query: &Query) -> Result<u64, AdapterError> {
        let _lease = self.inner.gate.acquire().await;
        execute_dml(self.conn_handle(), query, self.inner.options).await
    }
}
