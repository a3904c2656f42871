//! Query execution over the export connection.
//!
//! [`Executor`] is the seam between catalog queries and the driver. The only
//! production implementation wraps a `postgres::Client`; everything above it
//! sees rows or a [`QueryError`].

use postgres::types::ToSql;
use postgres::{Client, Error as PostgresError, Row};
use std::time::Instant;
use thiserror::Error;

/// Query execution error type
#[derive(Debug, Error)]
pub enum QueryError {
    /// `PostgreSQL` error from the driver
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] PostgresError),
    /// A row could not be mapped into a descriptor
    #[error("Parse error: {0}")]
    Parse(String),
    /// Other execution errors
    #[error("Execution error: {0}")]
    Other(String),
}

/// Trait for executing read-only catalog queries.
pub trait Executor {
    /// Execute a query and return all rows.
    ///
    /// # Errors
    ///
    /// Returns `QueryError` if the query execution fails.
    fn query_all(&mut self, query: &str, params: &[&(dyn ToSql + Sync)])
        -> Result<Vec<Row>, QueryError>;
}

/// `Executor` backed by a single blocking `postgres::Client`.
pub struct PostgresExecutor {
    client: Client,
}

impl PostgresExecutor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Close the connection, reporting any error from the terminate handshake.
    pub fn close(self) -> Result<(), QueryError> {
        self.client.close().map_err(QueryError::from)
    }
}

impl Executor for PostgresExecutor {
    fn query_all(
        &mut self,
        query: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, QueryError> {
        log::debug!("query: {}", squash_whitespace(query));

        let start = Instant::now();
        let result = self.client.query(query, params).map_err(QueryError::from);

        match &result {
            Ok(rows) => log::debug!("{} row(s) in {:?}", rows.len(), start.elapsed()),
            Err(e) => log::debug!("query failed after {:?}: {}", start.elapsed(), e),
        }
        result
    }
}

/// Collapse runs of whitespace so multi-line SQL fits on one log line.
fn squash_whitespace(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}
