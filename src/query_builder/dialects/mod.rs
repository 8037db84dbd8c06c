//! Database dialect implementations for the query builder
//!
//! This module contains database-specific SQL generation logic, separated
//! by database type. Statement builders never branch on the dialect
//! themselves; they ask the [`SqlDialect`] strategy.

use crate::database::SqlValue;
use crate::error::{QueryError, Result};
use std::fmt;
use std::str::FromStr;

pub mod mysql;
pub mod postgres;
pub mod sqlite;

pub use mysql::MySqlDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

/// SQL dialects the builder can generate statements for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    MySql,
    Postgres,
    Sqlite,
}

impl Dialect {
    /// Canonical lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::MySql => "mysql",
            Dialect::Postgres => "postgres",
            Dialect::Sqlite => "sqlite",
        }
    }

    /// The strategy object implementing this dialect
    pub fn sql_dialect(self) -> &'static dyn SqlDialect {
        create_dialect(self)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = QueryError;

    /// Supported values (case-insensitive, surrounding whitespace ignored):
    /// - mysql, mariadb, or an empty string
    /// - postgres, postgresql, supabase, cockroachdb
    /// - sqlite, sqlite3
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "mysql" | "mariadb" => Ok(Dialect::MySql),
            "postgres" | "postgresql" | "supabase" | "cockroachdb" => Ok(Dialect::Postgres),
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            _ => Err(QueryError::UnsupportedDialect(s.to_string())),
        }
    }
}

/// Row lock requested through the `_lockMode` directive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Share,
    Exclusive,
}

impl FromStr for LockMode {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "share" => Ok(LockMode::Share),
            "exclusive" => Ok(LockMode::Exclusive),
            other => Err(QueryError::NotAllowedLockMode(other.to_string())),
        }
    }
}

/// Trait for database-specific SQL generation
pub trait SqlDialect: Send + Sync {
    /// The dialect this strategy implements
    fn dialect(&self) -> Dialect;

    /// Generate a parameter placeholder for the given 1-based position
    fn placeholder(&self, position: usize) -> String;

    /// Rewrite every generic `?` in a finished statement into this dialect's
    /// native placeholder, numbering left to right
    fn rebind(&self, query: &str) -> String {
        let mut out = String::with_capacity(query.len() + 8);
        let mut position = 0;
        for ch in query.chars() {
            if ch == '?' {
                position += 1;
                out.push_str(&self.placeholder(position));
            } else {
                out.push(ch);
            }
        }
        out
    }

    /// LIMIT syntax for SELECT together with its arguments in bind order
    fn limit_syntax(&self, offset: u64, count: u64) -> (&'static str, Vec<SqlValue>);

    /// Pseudo-column used to emulate LIMIT on UPDATE/DELETE
    ///
    /// `None` means the dialect supports a trailing `LIMIT ?` natively.
    fn row_identifier(&self) -> Option<&'static str>;

    /// Locking clause appended to a SELECT, including its leading space
    fn lock_clause(&self, mode: LockMode) -> Result<&'static str>;

    /// INSERT command and trailing clause that skip conflicting rows
    fn insert_ignore_syntax(&self) -> (&'static str, String) {
        self.upsert_do_nothing_syntax(None)
    }

    /// Command for REPLACE-style inserts
    fn replace_command(&self) -> Result<&'static str>;

    /// Clause introducing the update list of INSERT ... ON DUPLICATE KEY UPDATE
    fn on_duplicate_clause(&self) -> Result<&'static str>;

    /// Whether upserts honour caller-supplied conflict columns
    fn uses_conflict_target(&self) -> bool {
        true
    }

    /// INSERT command and trailing clause for an upsert without an update set
    fn upsert_do_nothing_syntax(&self, conflict_target: Option<&str>) -> (&'static str, String);

    /// Clause introducing the update list of an upsert
    fn upsert_update_clause(&self, conflict_target: Option<&str>) -> Result<String>;
}

/// LIMIT/OFFSET argument, saturating at the BIGINT maximum
pub(crate) fn limit_arg(n: u64) -> SqlValue {
    SqlValue::BigInt(i64::try_from(n).unwrap_or(i64::MAX))
}

static MYSQL: MySqlDialect = MySqlDialect;
static POSTGRES: PostgresDialect = PostgresDialect;
static SQLITE: SqliteDialect = SqliteDialect;

/// Factory function returning the strategy for a dialect
pub fn create_dialect(dialect: Dialect) -> &'static dyn SqlDialect {
    match dialect {
        Dialect::MySql => &MYSQL,
        Dialect::Postgres => &POSTGRES,
        Dialect::Sqlite => &SQLITE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_aliases() {
        for alias in ["mysql", "MariaDB", " mysql ", ""] {
            assert_eq!(alias.parse::<Dialect>().unwrap(), Dialect::MySql);
        }
        for alias in ["postgres", "postgresql", "supabase", "CockroachDB"] {
            assert_eq!(alias.parse::<Dialect>().unwrap(), Dialect::Postgres);
        }
        for alias in ["sqlite", "sqlite3"] {
            assert_eq!(alias.parse::<Dialect>().unwrap(), Dialect::Sqlite);
        }
    }

    #[test]
    fn test_unknown_dialect() {
        let err = "oracle".parse::<Dialect>().unwrap_err();
        assert!(matches!(err, QueryError::UnsupportedDialect(ref d) if d == "oracle"));
        assert!(err.is_dialect_capability());
    }

    #[test]
    fn test_rebind() {
        let sql = "SELECT * FROM t WHERE (a=? AND b IN (?,?)) LIMIT ?";
        assert_eq!(create_dialect(Dialect::MySql).rebind(sql), sql);
        assert_eq!(create_dialect(Dialect::Sqlite).rebind(sql), sql);
        assert_eq!(
            create_dialect(Dialect::Postgres).rebind(sql),
            "SELECT * FROM t WHERE (a=$1 AND b IN ($2,$3)) LIMIT $4"
        );
    }

    #[test]
    fn test_lock_mode_parse() {
        assert_eq!(" share ".parse::<LockMode>().unwrap(), LockMode::Share);
        assert_eq!("exclusive".parse::<LockMode>().unwrap(), LockMode::Exclusive);
        assert!(matches!(
            "update".parse::<LockMode>(),
            Err(QueryError::NotAllowedLockMode(_))
        ));
    }

    #[test]
    fn test_lock_clauses() {
        let mysql = create_dialect(Dialect::MySql);
        assert_eq!(mysql.lock_clause(LockMode::Share).unwrap(), " LOCK IN SHARE MODE");
        assert_eq!(mysql.lock_clause(LockMode::Exclusive).unwrap(), " FOR UPDATE");

        let postgres = create_dialect(Dialect::Postgres);
        assert_eq!(postgres.lock_clause(LockMode::Share).unwrap(), " FOR SHARE");
        assert_eq!(postgres.lock_clause(LockMode::Exclusive).unwrap(), " FOR UPDATE");

        let err = create_dialect(Dialect::Sqlite)
            .lock_clause(LockMode::Share)
            .unwrap_err();
        assert!(err.is_dialect_capability());
    }

    #[test]
    fn test_row_identifiers() {
        assert_eq!(create_dialect(Dialect::MySql).row_identifier(), None);
        assert_eq!(create_dialect(Dialect::Postgres).row_identifier(), Some("ctid"));
        assert_eq!(create_dialect(Dialect::Sqlite).row_identifier(), Some("rowid"));
    }

    #[test]
    fn test_limit_arg_never_goes_negative() {
        assert_eq!(limit_arg(20), SqlValue::BigInt(20));
        assert_eq!(limit_arg(u64::MAX), SqlValue::BigInt(i64::MAX));
    }

    #[test]
    fn test_conflict_target_support() {
        assert!(!create_dialect(Dialect::MySql).uses_conflict_target());
        assert!(create_dialect(Dialect::Postgres).uses_conflict_target());
        assert!(create_dialect(Dialect::Sqlite).uses_conflict_target());
    }
}
