//! SQLite dialect implementation
//!
//! SQLite keeps plain `?` placeholders like MySQL but follows PostgreSQL's
//! ON CONFLICT upsert grammar. It has no row locking.

use super::limit_arg;
use super::postgres::{on_conflict_do_nothing, on_conflict_do_update};
use super::{Dialect, LockMode, SqlDialect};
use crate::database::SqlValue;
use crate::error::{QueryError, Result};

/// SQLite dialect
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl SqlDialect for SqliteDialect {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn placeholder(&self, _position: usize) -> String {
        "?".to_string()
    }

    fn rebind(&self, query: &str) -> String {
        query.to_string()
    }

    fn limit_syntax(&self, offset: u64, count: u64) -> (&'static str, Vec<SqlValue>) {
        (" LIMIT ? OFFSET ?", vec![limit_arg(count), limit_arg(offset)])
    }

    fn row_identifier(&self) -> Option<&'static str> {
        Some("rowid")
    }

    fn lock_clause(&self, _mode: LockMode) -> Result<&'static str> {
        Err(QueryError::unsupported_feature(Dialect::Sqlite, "lock mode"))
    }

    fn replace_command(&self) -> Result<&'static str> {
        Ok("REPLACE INTO")
    }

    fn on_duplicate_clause(&self) -> Result<&'static str> {
        Err(QueryError::unsupported_feature(
            Dialect::Sqlite,
            "BuildInsertOnDuplicate",
        ))
    }

    fn upsert_do_nothing_syntax(&self, conflict_target: Option<&str>) -> (&'static str, String) {
        on_conflict_do_nothing(conflict_target)
    }

    fn upsert_update_clause(&self, conflict_target: Option<&str>) -> Result<String> {
        on_conflict_do_update(conflict_target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_locking() {
        let err = SqliteDialect.lock_clause(LockMode::Exclusive).unwrap_err();
        assert!(matches!(
            err,
            QueryError::UnsupportedFeature {
                dialect: Dialect::Sqlite,
                ..
            }
        ));
    }

    #[test]
    fn test_replace_and_ignore() {
        assert_eq!(SqliteDialect.replace_command().unwrap(), "REPLACE INTO");
        assert_eq!(
            SqliteDialect.upsert_do_nothing_syntax(Some("(email)")),
            ("INSERT INTO", " ON CONFLICT (email) DO NOTHING".to_string())
        );
    }
}
