//! kite-qb - dialect-aware SQL statement builder
//!
//! Builds parameterized SELECT, INSERT, UPDATE, DELETE and upsert
//! statements for MySQL, PostgreSQL and SQLite from map-shaped
//! specifications:
//! - `"field op"` keys (`"age >"`, `"name like"`, `"id in"`) for conditions
//! - reserved directives (`_orderby`, `_groupby`, `_having`, `_limit`,
//!   `_lockMode`, `_or`, `_custom_*`) for clauses
//! - named `{{param}}` templates and MySQL JSON helpers
//!
//! ```
//! use kite_qb::query_builder::{Builder, Dialect};
//! use kite_qb::where_spec;
//!
//! let builder = Builder::from_dialect(Dialect::Postgres);
//! let spec = where_spec! {
//!     "name" => "kite",
//!     "age >=" => 18,
//!     "_orderby" => "age desc",
//! };
//! let (sql, args) = builder.build_select("users", &spec, &["id", "name"]).unwrap();
//! assert_eq!(
//!     sql,
//!     "SELECT id,name FROM users WHERE (name=$1 AND age>=$2) ORDER BY age DESC"
//! );
//! assert_eq!(args.len(), 2);
//! ```

// Enforce error handling best practices
#![cfg_attr(
    not(test),
    warn(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
    )
)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used,))]

pub mod database;
pub mod error;
pub mod query_builder;

pub use database::{DatabaseAdapter, DialectProvider, QueryResult, SqlValue};
pub use error::{ErrorKind, QueryError, Result};
pub use query_builder::{Builder, Condition, Dialect, Raw, Row, UpdateSpec, WhereSpec};

/// Build a [`WhereSpec`] from `key => value` pairs
///
/// Values go through `Into<SpecValue>`, so scalars, arrays, nested specs,
/// [`Raw`] and [`Condition`] all work.
#[macro_export]
macro_rules! where_spec {
    () => {
        $crate::query_builder::WhereSpec::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut spec = $crate::query_builder::WhereSpec::new();
        $(
            spec.insert($key, $value);
        )+
        spec
    }};
}

/// Build an [`UpdateSpec`] from `column => value` pairs
#[macro_export]
macro_rules! update_spec {
    () => {
        $crate::query_builder::UpdateSpec::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut update = $crate::query_builder::UpdateSpec::new();
        $(
            update.insert($key, $value);
        )+
        update
    }};
}

/// Build an insert [`Row`] from `column => value` pairs
///
/// ```
/// use kite_qb::{row, SqlValue};
///
/// let row = row! { "id" => 1, "name" => "kite" };
/// assert_eq!(row.get("id"), Some(&SqlValue::Int(1)));
/// ```
#[macro_export]
macro_rules! row {
    () => {
        $crate::query_builder::Row::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut row = $crate::query_builder::Row::new();
        $(
            row.insert(
                ::std::string::String::from($key),
                $crate::database::SqlValue::from($value),
            );
        )+
        row
    }};
}
