//! PostgreSQL dialect implementation

use super::{limit_arg, Dialect, LockMode, SqlDialect};
use crate::database::SqlValue;
use crate::error::{QueryError, Result};

/// PostgreSQL dialect (also used for Supabase and CockroachDB)
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl SqlDialect for PostgresDialect {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn placeholder(&self, position: usize) -> String {
        format!("${}", position)
    }

    fn limit_syntax(&self, offset: u64, count: u64) -> (&'static str, Vec<SqlValue>) {
        (" LIMIT ? OFFSET ?", vec![limit_arg(count), limit_arg(offset)])
    }

    fn row_identifier(&self) -> Option<&'static str> {
        Some("ctid")
    }

    fn lock_clause(&self, mode: LockMode) -> Result<&'static str> {
        Ok(match mode {
            LockMode::Share => " FOR SHARE",
            LockMode::Exclusive => " FOR UPDATE",
        })
    }

    fn replace_command(&self) -> Result<&'static str> {
        Err(QueryError::unsupported_feature(
            Dialect::Postgres,
            "BuildReplaceInsert",
        ))
    }

    fn on_duplicate_clause(&self) -> Result<&'static str> {
        Err(QueryError::unsupported_feature(
            Dialect::Postgres,
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

pub(crate) fn on_conflict_do_nothing(conflict_target: Option<&str>) -> (&'static str, String) {
    let suffix = match conflict_target {
        Some(target) => format!(" ON CONFLICT {} DO NOTHING", target),
        None => " ON CONFLICT DO NOTHING".to_string(),
    };
    ("INSERT INTO", suffix)
}

pub(crate) fn on_conflict_do_update(conflict_target: Option<&str>) -> Result<String> {
    match conflict_target {
        Some(target) => Ok(format!(" ON CONFLICT {} DO UPDATE SET ", target)),
        None => Err(QueryError::EmptyConflictColumns),
    }
}
