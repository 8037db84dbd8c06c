//! Dialect-aware SQL statement builder
//!
//! Statements are described with map-shaped specs ([`WhereSpec`],
//! [`UpdateSpec`], [`Row`]) and rendered into `(sql, args)` pairs for MySQL,
//! PostgreSQL or SQLite. Rendering is pure; only [`aggregate_query`] talks to
//! a database.
//!
//! The free functions here use [`DEFAULT_BUILDER`] (MySQL). The
//! `*_with_dialect` variants take a dialect name such as `"postgres"` or
//! `"sqlite3"`.

pub mod aggregate;
pub mod condition;
pub mod core;
pub mod dialects;
pub mod json;
pub mod named;
pub mod update;
pub mod upsert;
pub mod where_spec;

pub use aggregate::{Aggregate, AggregateSymbol, ResultResolver};
pub use condition::{where_connector, CompareOp, Condition, NullCheck, Operand, Raw};
pub use self::core::{Builder, DEFAULT_BUILDER};
pub use dialects::{create_dialect, Dialect, LockMode, SqlDialect};
pub use dialects::{MySqlDialect, PostgresDialect, SqliteDialect};
pub use json::{
    json_array_append, json_array_insert, json_contains, json_remove, json_set, json_value_expr,
};
pub use named::NamedArgs;
pub use update::{Row, UpdateSpec, UpdateValue};
pub use where_spec::{
    FieldCondition, Operator, QuerySpec, SelectLimit, SpecEntry, SpecValue, WhereSpec,
};

pub use crate::database::SqlValue;

use crate::database::DatabaseAdapter;
use crate::error::Result;

pub fn build_select(
    table: &str,
    where_spec: &WhereSpec,
    fields: &[&str],
) -> Result<(String, Vec<SqlValue>)> {
    DEFAULT_BUILDER.build_select(table, where_spec, fields)
}

pub fn build_update(
    table: &str,
    where_spec: &WhereSpec,
    update: &UpdateSpec,
) -> Result<(String, Vec<SqlValue>)> {
    DEFAULT_BUILDER.build_update(table, where_spec, update)
}

pub fn build_delete(table: &str, where_spec: &WhereSpec) -> Result<(String, Vec<SqlValue>)> {
    DEFAULT_BUILDER.build_delete(table, where_spec)
}

pub fn build_insert(table: &str, rows: &[Row]) -> Result<(String, Vec<SqlValue>)> {
    DEFAULT_BUILDER.build_insert(table, rows)
}

pub fn build_insert_ignore(table: &str, rows: &[Row]) -> Result<(String, Vec<SqlValue>)> {
    DEFAULT_BUILDER.build_insert_ignore(table, rows)
}

pub fn build_replace_insert(table: &str, rows: &[Row]) -> Result<(String, Vec<SqlValue>)> {
    DEFAULT_BUILDER.build_replace_insert(table, rows)
}

pub fn build_insert_on_duplicate(
    table: &str,
    rows: &[Row],
    update: &UpdateSpec,
) -> Result<(String, Vec<SqlValue>)> {
    DEFAULT_BUILDER.build_insert_on_duplicate(table, rows, update)
}

pub fn build_upsert(
    table: &str,
    rows: &[Row],
    conflict_columns: &[&str],
    update: Option<&UpdateSpec>,
) -> Result<(String, Vec<SqlValue>)> {
    DEFAULT_BUILDER.build_upsert(table, rows, conflict_columns, update)
}

pub fn named_query(template: &str, values: &NamedArgs) -> Result<(String, Vec<SqlValue>)> {
    DEFAULT_BUILDER.named_query(template, values)
}

pub async fn aggregate_query(
    db: &dyn DatabaseAdapter,
    table: &str,
    where_spec: &WhereSpec,
    aggregate: &dyn AggregateSymbol,
) -> Result<ResultResolver> {
    DEFAULT_BUILDER
        .aggregate_query(db, table, where_spec, aggregate)
        .await
}

// Dialect-named variants

pub fn build_select_with_dialect(
    dialect: &str,
    table: &str,
    where_spec: &WhereSpec,
    fields: &[&str],
) -> Result<(String, Vec<SqlValue>)> {
    Builder::new(dialect)?.build_select(table, where_spec, fields)
}

pub fn build_update_with_dialect(
    dialect: &str,
    table: &str,
    where_spec: &WhereSpec,
    update: &UpdateSpec,
) -> Result<(String, Vec<SqlValue>)> {
    Builder::new(dialect)?.build_update(table, where_spec, update)
}

pub fn build_delete_with_dialect(
    dialect: &str,
    table: &str,
    where_spec: &WhereSpec,
) -> Result<(String, Vec<SqlValue>)> {
    Builder::new(dialect)?.build_delete(table, where_spec)
}

pub fn build_insert_with_dialect(
    dialect: &str,
    table: &str,
    rows: &[Row],
) -> Result<(String, Vec<SqlValue>)> {
    Builder::new(dialect)?.build_insert(table, rows)
}

pub fn build_insert_ignore_with_dialect(
    dialect: &str,
    table: &str,
    rows: &[Row],
) -> Result<(String, Vec<SqlValue>)> {
    Builder::new(dialect)?.build_insert_ignore(table, rows)
}

pub fn build_replace_insert_with_dialect(
    dialect: &str,
    table: &str,
    rows: &[Row],
) -> Result<(String, Vec<SqlValue>)> {
    Builder::new(dialect)?.build_replace_insert(table, rows)
}

pub fn build_insert_on_duplicate_with_dialect(
    dialect: &str,
    table: &str,
    rows: &[Row],
    update: &UpdateSpec,
) -> Result<(String, Vec<SqlValue>)> {
    Builder::new(dialect)?.build_insert_on_duplicate(table, rows, update)
}

pub fn build_upsert_with_dialect(
    dialect: &str,
    table: &str,
    rows: &[Row],
    conflict_columns: &[&str],
    update: Option<&UpdateSpec>,
) -> Result<(String, Vec<SqlValue>)> {
    Builder::new(dialect)?.build_upsert(table, rows, conflict_columns, update)
}

pub fn named_query_with_dialect(
    dialect: &str,
    template: &str,
    values: &NamedArgs,
) -> Result<(String, Vec<SqlValue>)> {
    Builder::new(dialect)?.named_query(template, values)
}

pub async fn aggregate_query_with_dialect(
    dialect: &str,
    db: &dyn DatabaseAdapter,
    table: &str,
    where_spec: &WhereSpec,
    aggregate: &dyn AggregateSymbol,
) -> Result<ResultResolver> {
    Builder::new(dialect)?
        .aggregate_query(db, table, where_spec, aggregate)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;

    #[test]
    fn test_free_functions_default_to_mysql() {
        let spec = WhereSpec::new().with("id", 1).with("_limit", [0, 1]);
        let (sql, _) = build_select("users", &spec, &["name"]).unwrap();
        assert_eq!(sql, "SELECT name FROM users WHERE (id=?) LIMIT ?,?");
    }

    #[test]
    fn test_with_dialect_variants() {
        let spec = WhereSpec::new().with("id", 1);
        let (sql, _) = build_delete_with_dialect("postgresql", "users", &spec).unwrap();
        assert_eq!(sql, "DELETE FROM users WHERE (id=$1)");

        let err = build_delete_with_dialect("mssql", "users", &spec).unwrap_err();
        assert!(matches!(err, QueryError::UnsupportedDialect(ref d) if d == "mssql"));
    }
}
