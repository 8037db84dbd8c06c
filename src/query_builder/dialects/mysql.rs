//! MySQL/MariaDB dialect implementation
//!
//! MySQL supports LIMIT directly on UPDATE/DELETE, has its own INSERT IGNORE
//! and ON DUPLICATE KEY UPDATE forms, and keys upserts on schema constraints
//! rather than on a caller-supplied conflict target.

use super::{limit_arg, Dialect, LockMode, SqlDialect};
use crate::database::SqlValue;
use crate::error::Result;

/// MySQL/MariaDB dialect
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl SqlDialect for MySqlDialect {
    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    fn placeholder(&self, _position: usize) -> String {
        "?".to_string()
    }

    fn rebind(&self, query: &str) -> String {
        query.to_string()
    }

    fn limit_syntax(&self, offset: u64, count: u64) -> (&'static str, Vec<SqlValue>) {
        (" LIMIT ?,?", vec![limit_arg(offset), limit_arg(count)])
    }

    fn row_identifier(&self) -> Option<&'static str> {
        None
    }

    fn lock_clause(&self, mode: LockMode) -> Result<&'static str> {
        Ok(match mode {
            LockMode::Share => " LOCK IN SHARE MODE",
            LockMode::Exclusive => " FOR UPDATE",
        })
    }

    fn replace_command(&self) -> Result<&'static str> {
        Ok("REPLACE INTO")
    }

    fn on_duplicate_clause(&self) -> Result<&'static str> {
        Ok(" ON DUPLICATE KEY UPDATE ")
    }

    fn uses_conflict_target(&self) -> bool {
        false
    }

    fn upsert_do_nothing_syntax(&self, _conflict_target: Option<&str>) -> (&'static str, String) {
        ("INSERT IGNORE INTO", String::new())
    }

    fn upsert_update_clause(&self, _conflict_target: Option<&str>) -> Result<String> {
        // ON DUPLICATE KEY is driven by the table's unique keys
        Ok(" ON DUPLICATE KEY UPDATE ".to_string())
    }
}
