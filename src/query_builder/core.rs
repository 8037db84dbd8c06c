//! Dialect-scoped statement builders
//!
//! A [`Builder`] carries nothing but its [`Dialect`]. Every statement is
//! assembled with generic `?` placeholders and passes through
//! [`Builder::finalize`], which applies the dialect's placeholder rebind.

use super::condition::where_connector;
use super::dialects::{create_dialect, limit_arg, Dialect, SqlDialect};
use super::update::{render_rows, Row, UpdateSpec};
use super::where_spec::{QuerySpec, WhereSpec};
use crate::database::{DialectProvider, SqlValue};
use crate::error::Result;

/// Builder used by the dialect-less entry points
pub static DEFAULT_BUILDER: Builder = Builder::from_dialect(Dialect::MySql);

/// Statement builder bound to one SQL dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Builder {
    dialect: Dialect,
}

impl Default for Builder {
    fn default() -> Self {
        DEFAULT_BUILDER
    }
}

/// INSERT flavours sharing one row renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InsertKind {
    Plain,
    Ignore,
    Replace,
}

impl Builder {
    /// Create a builder from a dialect name or alias
    ///
    /// ```
    /// use kite_qb::query_builder::{Builder, Dialect};
    ///
    /// let builder = Builder::new("supabase").unwrap();
    /// assert_eq!(builder.dialect(), Dialect::Postgres);
    /// assert!(Builder::new("oracle").is_err());
    /// ```
    pub fn new(dialect: &str) -> Result<Self> {
        Ok(Self::from_dialect(dialect.parse()?))
    }

    pub const fn from_dialect(dialect: Dialect) -> Self {
        Self { dialect }
    }

    /// Create a builder matching a connection's dialect
    pub fn from_db(db: &dyn DialectProvider) -> Self {
        Self::from_dialect(db.dialect())
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub(crate) fn sql_dialect(&self) -> &'static dyn SqlDialect {
        create_dialect(self.dialect)
    }

    /// Apply the placeholder rebind to a finished statement
    pub(crate) fn finalize(
        &self,
        sql: String,
        args: Vec<SqlValue>,
    ) -> Result<(String, Vec<SqlValue>)> {
        let sql = self.sql_dialect().rebind(&sql);

        #[cfg(debug_assertions)]
        {
            log::debug!("qb[{}] SQL: {}", self.dialect, sql);
            log::trace!("  Parameters to bind: {:?}", args);
        }

        Ok((sql, args))
    }

    /// Build a SELECT
    ///
    /// An empty field list selects `*`. Fields keep caller order.
    pub fn build_select(
        &self,
        table: &str,
        where_spec: &WhereSpec,
        fields: &[&str],
    ) -> Result<(String, Vec<SqlValue>)> {
        let query = QuerySpec::compile(where_spec)?;
        let dialect = self.sql_dialect();

        let lock_clause = match query.lock_mode {
            Some(mode) => dialect.lock_clause(mode)?,
            None => "",
        };

        let columns = if fields.is_empty() {
            "*".to_string()
        } else {
            fields.join(",")
        };

        let mut sql = format!("SELECT {} FROM {}", columns, table);
        let (where_sql, mut args) = where_connector(&query.conditions, "AND");
        if !where_sql.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
        }
        if let Some(group_by) = &query.group_by {
            sql.push_str(" GROUP BY ");
            sql.push_str(group_by);
        }
        let (having_sql, having_args) = where_connector(&query.having, "AND");
        if !having_sql.is_empty() {
            sql.push_str(" HAVING ");
            sql.push_str(&having_sql);
            args.extend(having_args);
        }
        if let Some(order_by) = &query.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order_by);
        }
        if let Some(limit) = query.limit {
            let (limit_sql, limit_args) = dialect.limit_syntax(limit.offset, limit.count);
            sql.push_str(limit_sql);
            args.extend(limit_args);
        }
        sql.push_str(lock_clause);

        self.finalize(sql, args)
    }

    /// Build an UPDATE
    ///
    /// With a `_limit`, MySQL appends `LIMIT ?`; other dialects restrict the
    /// update to rows selected by their row identifier.
    pub fn build_update(
        &self,
        table: &str,
        where_spec: &WhereSpec,
        update: &UpdateSpec,
    ) -> Result<(String, Vec<SqlValue>)> {
        let query = QuerySpec::compile_mutation(where_spec)?;
        let limit = query.mutation_limit()?;

        let (sets, mut args) = update.render()?;
        let statement = format!("UPDATE {} SET {}", table, sets);
        let (where_sql, where_args) = where_connector(&query.conditions, "AND");
        args.extend(where_args);

        let sql = self.limited_mutation(statement, table, &where_sql, limit, &mut args);
        self.finalize(sql, args)
    }

    /// Build a DELETE
    pub fn build_delete(
        &self,
        table: &str,
        where_spec: &WhereSpec,
    ) -> Result<(String, Vec<SqlValue>)> {
        let query = QuerySpec::compile_mutation(where_spec)?;
        let limit = query.mutation_limit()?;

        let statement = format!("DELETE FROM {}", table);
        let (where_sql, mut args) = where_connector(&query.conditions, "AND");

        let sql = self.limited_mutation(statement, table, &where_sql, limit, &mut args);
        self.finalize(sql, args)
    }

    /// Append WHERE and the row cap to an UPDATE/DELETE head
    fn limited_mutation(
        &self,
        mut statement: String,
        table: &str,
        where_sql: &str,
        limit: Option<u64>,
        args: &mut Vec<SqlValue>,
    ) -> String {
        let Some(limit) = limit else {
            if !where_sql.is_empty() {
                statement.push_str(" WHERE ");
                statement.push_str(where_sql);
            }
            return statement;
        };

        args.push(limit_arg(limit));
        match self.sql_dialect().row_identifier() {
            None => {
                if !where_sql.is_empty() {
                    statement.push_str(" WHERE ");
                    statement.push_str(where_sql);
                }
                statement.push_str(" LIMIT ?");
                statement
            }
            Some(row_id) => {
                let mut subquery = format!("SELECT {} FROM {}", row_id, table);
                if !where_sql.is_empty() {
                    subquery.push_str(" WHERE ");
                    subquery.push_str(where_sql);
                }
                subquery.push_str(" LIMIT ?");
                format!("{} WHERE {} IN ({})", statement, row_id, subquery)
            }
        }
    }

    fn insert_statement(
        &self,
        table: &str,
        rows: &[Row],
        kind: InsertKind,
    ) -> Result<(String, Vec<SqlValue>)> {
        let dialect = self.sql_dialect();
        let (command, suffix) = match kind {
            InsertKind::Plain => ("INSERT INTO", String::new()),
            InsertKind::Ignore => dialect.insert_ignore_syntax(),
            InsertKind::Replace => (dialect.replace_command()?, String::new()),
        };
        self.render_insert(command, table, rows, &suffix)
    }

    pub(crate) fn render_insert(
        &self,
        command: &str,
        table: &str,
        rows: &[Row],
        suffix: &str,
    ) -> Result<(String, Vec<SqlValue>)> {
        let (columns, groups, args) = render_rows(rows)?;
        let sql = format!(
            "{} {} ({}) VALUES {}{}",
            command, table, columns, groups, suffix
        );
        Ok((sql, args))
    }

    /// Build a multi-row INSERT
    pub fn build_insert(&self, table: &str, rows: &[Row]) -> Result<(String, Vec<SqlValue>)> {
        let (sql, args) = self.insert_statement(table, rows, InsertKind::Plain)?;
        self.finalize(sql, args)
    }

    /// Build an INSERT that skips conflicting rows
    ///
    /// MySQL uses `INSERT IGNORE`; PostgreSQL and SQLite append
    /// `ON CONFLICT DO NOTHING`.
    pub fn build_insert_ignore(
        &self,
        table: &str,
        rows: &[Row],
    ) -> Result<(String, Vec<SqlValue>)> {
        let (sql, args) = self.insert_statement(table, rows, InsertKind::Ignore)?;
        self.finalize(sql, args)
    }

    /// Build a `REPLACE INTO` (MySQL and SQLite)
    pub fn build_replace_insert(
        &self,
        table: &str,
        rows: &[Row],
    ) -> Result<(String, Vec<SqlValue>)> {
        let (sql, args) = self.insert_statement(table, rows, InsertKind::Replace)?;
        self.finalize(sql, args)
    }

    /// Build `INSERT ... ON DUPLICATE KEY UPDATE` (MySQL only)
    pub fn build_insert_on_duplicate(
        &self,
        table: &str,
        rows: &[Row],
        update: &UpdateSpec,
    ) -> Result<(String, Vec<SqlValue>)> {
        let clause = self.sql_dialect().on_duplicate_clause()?;
        let (mut sql, mut args) = self.insert_statement(table, rows, InsertKind::Plain)?;
        let (sets, update_args) = update.render()?;
        sql.push_str(clause);
        sql.push_str(&sets);
        args.extend(update_args);
        self.finalize(sql, args)
    }
}
