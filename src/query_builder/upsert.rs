//! Upsert statements

use super::core::Builder;
use super::update::{Row, UpdateSpec};
use crate::database::SqlValue;
use crate::error::{QueryError, Result};

impl Builder {
    /// Build an insert-or-update statement
    ///
    /// Without an update set (`None` or empty) conflicting rows are skipped:
    /// `INSERT IGNORE` on MySQL, `ON CONFLICT [(cols)] DO NOTHING` elsewhere.
    ///
    /// With an update set MySQL renders `ON DUPLICATE KEY UPDATE` and ignores
    /// `conflict_columns`. PostgreSQL and SQLite render
    /// `ON CONFLICT (cols) DO UPDATE SET ...` and fail with
    /// [`QueryError::EmptyConflictColumns`] when no columns are given.
    ///
    /// ```
    /// use kite_qb::query_builder::{Builder, Dialect, UpdateSpec};
    /// use kite_qb::row;
    ///
    /// let builder = Builder::from_dialect(Dialect::Postgres);
    /// let rows = vec![row! { "id" => 1, "name" => "kite" }];
    /// let update = UpdateSpec::new().with("name", "updated");
    /// let (sql, args) = builder
    ///     .build_upsert("users", &rows, &["id"], Some(&update))
    ///     .unwrap();
    /// assert_eq!(
    ///     sql,
    ///     "INSERT INTO users (id,name) VALUES ($1,$2) ON CONFLICT (id) DO UPDATE SET name=$3"
    /// );
    /// assert_eq!(args.len(), 3);
    /// ```
    pub fn build_upsert(
        &self,
        table: &str,
        rows: &[Row],
        conflict_columns: &[&str],
        update: Option<&UpdateSpec>,
    ) -> Result<(String, Vec<SqlValue>)> {
        let dialect = self.sql_dialect();
        let target = if dialect.uses_conflict_target() {
            conflict_target(conflict_columns)?
        } else {
            None
        };

        match update.filter(|u| !u.is_empty()) {
            None => {
                let (command, suffix) = dialect.upsert_do_nothing_syntax(target.as_deref());
                let (sql, args) = self.render_insert(command, table, rows, &suffix)?;
                self.finalize(sql, args)
            }
            Some(update) => {
                let clause = dialect.upsert_update_clause(target.as_deref())?;
                let (mut sql, mut args) = self.render_insert("INSERT INTO", table, rows, "")?;
                let (sets, update_args) = update.render()?;
                sql.push_str(&clause);
                sql.push_str(&sets);
                args.extend(update_args);
                self.finalize(sql, args)
            }
        }
    }
}

/// `(a,b)` for the given columns, `None` when there are none
///
/// A blank column name is rejected.
fn conflict_target(columns: &[&str]) -> Result<Option<String>> {
    if columns.is_empty() {
        return Ok(None);
    }
    let mut trimmed = Vec::with_capacity(columns.len());
    for column in columns {
        let column = column.trim();
        if column.is_empty() {
            return Err(QueryError::EmptyConflictColumns);
        }
        trimmed.push(column);
    }
    Ok(Some(format!("({})", trimmed.join(","))))
}
