//! Aggregate queries
//!
//! The only part of the query builder that touches a database. The aggregate
//! expression is selected as a single column and the scalar that comes back
//! is wrapped in a [`ResultResolver`].

use super::core::Builder;
use super::where_spec::WhereSpec;
use crate::database::{DatabaseAdapter, SqlValue};
use crate::error::{QueryError, Result};
use rust_decimal::prelude::ToPrimitive;
use std::fmt;

/// Anything that can name the expression of `SELECT <symbol> FROM ...`
pub trait AggregateSymbol {
    fn symbol(&self) -> String;
}

/// Built-in aggregate functions over one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Aggregate {
    Count(String),
    Sum(String),
    Avg(String),
    Max(String),
    Min(String),
}

impl Aggregate {
    pub fn count(column: impl Into<String>) -> Self {
        Aggregate::Count(column.into())
    }

    pub fn sum(column: impl Into<String>) -> Self {
        Aggregate::Sum(column.into())
    }

    pub fn avg(column: impl Into<String>) -> Self {
        Aggregate::Avg(column.into())
    }

    pub fn max(column: impl Into<String>) -> Self {
        Aggregate::Max(column.into())
    }

    pub fn min(column: impl Into<String>) -> Self {
        Aggregate::Min(column.into())
    }

    fn parts(&self) -> (&'static str, &str) {
        match self {
            Aggregate::Count(c) => ("count", c),
            Aggregate::Sum(c) => ("sum", c),
            Aggregate::Avg(c) => ("avg", c),
            Aggregate::Max(c) => ("max", c),
            Aggregate::Min(c) => ("min", c),
        }
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (function, column) = self.parts();
        write!(f, "{}({})", function, column)
    }
}

impl AggregateSymbol for Aggregate {
    fn symbol(&self) -> String {
        self.to_string()
    }
}

impl AggregateSymbol for &str {
    fn symbol(&self) -> String {
        (*self).to_string()
    }
}

impl AggregateSymbol for String {
    fn symbol(&self) -> String {
        self.clone()
    }
}

fn resolve_symbol(aggregate: &dyn AggregateSymbol) -> Result<String> {
    let symbol = aggregate.symbol();
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(QueryError::InvalidAggregate);
    }
    Ok(symbol.to_string())
}

/// Numeric view over the scalar returned by an aggregate query
///
/// Drivers disagree on how they hand back aggregates: counts may be
/// integers of any width, `AVG` a decimal, and some return text. The
/// accessors coerce whatever arrived and fall back to zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultResolver {
    value: SqlValue,
}

impl ResultResolver {
    pub fn new(value: SqlValue) -> Self {
        Self { value }
    }

    /// The raw scalar, `SqlValue::Null` when no row came back
    pub fn value(&self) -> &SqlValue {
        &self.value
    }

    pub fn into_value(self) -> SqlValue {
        self.value
    }

    /// Integer view; floats truncate and unparsable text goes through
    /// [`as_f64`](Self::as_f64)
    pub fn as_i64(&self) -> i64 {
        match &self.value {
            SqlValue::Float(f) => *f as i64,
            SqlValue::Double(f) => *f as i64,
            SqlValue::Decimal(d) => d.trunc().to_i64().unwrap_or_default(),
            SqlValue::String(s) => s
                .trim()
                .parse::<i64>()
                .unwrap_or_else(|_| self.as_f64() as i64),
            SqlValue::Bytes(b) => std::str::from_utf8(b)
                .ok()
                .and_then(|s| s.trim().parse::<i64>().ok())
                .unwrap_or_else(|| self.as_f64() as i64),
            other => other.as_i64().unwrap_or_default(),
        }
    }

    pub fn as_f64(&self) -> f64 {
        match &self.value {
            SqlValue::String(s) => s.trim().parse().unwrap_or_default(),
            SqlValue::Bytes(b) => std::str::from_utf8(b)
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or_default(),
            SqlValue::UnsignedBigInt(u) => *u as f64,
            other => other.as_f64().unwrap_or_default(),
        }
    }
}

impl Builder {
    /// Run `SELECT <aggregate> FROM table WHERE ...` and resolve the scalar
    ///
    /// The statement goes through [`Builder::build_select`], so every
    /// directive a select accepts is honored. With several result rows (a
    /// `_groupby`, say) the last one wins.
    pub async fn aggregate_query(
        &self,
        db: &dyn DatabaseAdapter,
        table: &str,
        where_spec: &WhereSpec,
        aggregate: &dyn AggregateSymbol,
    ) -> Result<ResultResolver> {
        let symbol = resolve_symbol(aggregate)?;
        let (sql, args) = self.build_select(table, where_spec, &[symbol.as_str()])?;
        let value = db.fetch_scalar(&sql, args).await?;
        Ok(ResultResolver::new(value))
    }
}
