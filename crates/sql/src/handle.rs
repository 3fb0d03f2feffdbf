use std::fmt::Debug;

use anyhow::bail;
use futures::FutureExt;
use futures::future::BoxFuture;

use crate::types::{DataType, Row};

/// Result type for asynchronous operations.
pub type FutureResult<T> = BoxFuture<'static, anyhow::Result<T>>;

/// SQL providers implement [`SqlHandle`] to execute parameterized statements
/// against a backend (`SQLite`, Postgres, etc).
///
/// Implementations must be safe to share between threads; any connection
/// pooling, timeouts or retries happen behind this trait. Statements use
/// positional `?` placeholders bound from `params` in order.
pub trait SqlHandle: Debug + Send + Sync + 'static {
    /// Execute a query and return every resulting row.
    fn query_for_list(&self, sql: String, params: Vec<DataType>) -> FutureResult<Vec<Row>>;

    /// Execute a statement that does not return rows (e.g., an `INSERT`,
    /// `UPDATE`, or `DELETE`) and return the number of rows affected.
    fn update(&self, sql: String, params: Vec<DataType>) -> FutureResult<u64>;

    /// Execute a query that must return exactly one row.
    fn query_for_map(&self, sql: String, params: Vec<DataType>) -> FutureResult<Row> {
        self.query_for_list(sql, params)
            .map(|result| {
                let mut rows = result?;
                if rows.len() != 1 {
                    bail!("expected exactly one row, query returned {}", rows.len());
                }
                Ok(rows.remove(0))
            })
            .boxed()
    }
}
