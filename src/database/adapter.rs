//! Database adapter trait
//!
//! A narrow async interface over one connection pool: run a statement, read
//! back a scalar, check connectivity. The query builder hands it finished
//! `(sql, args)` pairs.

use crate::database::{DialectProvider, SqlValue};
use crate::error::Result;
use async_trait::async_trait;

/// Result type for database query operations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    /// Number of rows affected by the query
    pub rows_affected: u64,
    /// Last inserted ID (if applicable)
    pub last_insert_id: Option<i64>,
}

/// Unified database adapter trait
///
/// Implemented for PostgreSQL, MySQL and SQLite pools. The SQL passed in
/// must already use the adapter's placeholder style, which is what a
/// [`Builder`](crate::query_builder::Builder) for the same
/// [`dialect`](DialectProvider::dialect) produces.
#[async_trait]
pub trait DatabaseAdapter: DialectProvider + Send + Sync {
    /// Get the name of this database connection
    fn name(&self) -> &str;

    /// Execute a statement that modifies data (INSERT, UPDATE, DELETE)
    async fn execute(&self, sql: &str, params: Vec<SqlValue>) -> Result<QueryResult>;

    /// Run a query and return the first column of the last row
    ///
    /// Returns `SqlValue::Null` when the query yields no rows.
    async fn fetch_scalar(&self, sql: &str, params: Vec<SqlValue>) -> Result<SqlValue>;

    /// Test database connectivity
    async fn ping(&self) -> Result<bool>;

    /// Get the adapter as Any for downcasting to the concrete pool type
    fn as_any(&self) -> &dyn std::any::Any;

    /// Clone the adapter into a boxed trait object
    fn clone_box(&self) -> Box<dyn DatabaseAdapter>;
}

impl Clone for Box<dyn DatabaseAdapter> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
