//! Values, connection configuration and execution adapters
//!
//! Statement generation never needs anything from here beyond [`SqlValue`]
//! and [`DialectProvider`]. The adapters exist so aggregate queries can be
//! run against MySQL, PostgreSQL or SQLite through one trait.

pub mod adapter;
pub mod adapters;
pub mod config;
pub mod value;

pub use adapter::{DatabaseAdapter, QueryResult};
pub use adapters::{connect, MySqlAdapter, PostgresAdapter, SqliteAdapter};
pub use config::{DatabaseConnectionConfig, DatabaseConnectionConfigBuilder, DatabasesConfig};
pub use value::SqlValue;

use crate::query_builder::Dialect;

/// Anything that knows which SQL dialect it speaks
///
/// Used by [`Builder::from_db`](crate::query_builder::Builder::from_db) to
/// pick the builder for a connection.
pub trait DialectProvider {
    fn dialect(&self) -> Dialect;
}

impl DialectProvider for Dialect {
    fn dialect(&self) -> Dialect {
        *self
    }
}
