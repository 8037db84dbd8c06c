//! Condition model for WHERE and HAVING clauses
//!
//! A [`Condition`] is one node of a boolean predicate tree. Rendering a node
//! yields SQL fragments with generic `?` placeholders plus the values bound to
//! them, always in the same order. Multi-field variants are keyed by
//! `BTreeMap`, so fields render in lexicographic order and identical input
//! produces byte-identical SQL.

use crate::database::SqlValue;
use crate::error::{QueryError, Result};
use std::collections::BTreeMap;
use std::fmt;

/// SQL text inserted verbatim, never bound as an argument
///
/// Only use `Raw` with trusted, hard-coded expressions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Raw(pub String);

impl Raw {
    pub fn new(sql: impl Into<String>) -> Self {
        Raw(sql.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Raw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// NULL test marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullCheck {
    IsNull,
    IsNotNull,
}

impl NullCheck {
    pub fn as_sql(&self) -> &'static str {
        match self {
            NullCheck::IsNull => "IS NULL",
            NullCheck::IsNotNull => "IS NOT NULL",
        }
    }
}

/// Right-hand side of a comparison
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Value(SqlValue),
    Raw(Raw),
}

impl From<Raw> for Operand {
    fn from(raw: Raw) -> Self {
        Operand::Raw(raw)
    }
}

macro_rules! impl_operand_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Operand {
                fn from(v: $ty) -> Self {
                    Operand::Value(SqlValue::from(v))
                }
            }
        )*
    };
}

impl_operand_from!(
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    u64,
    f32,
    f64,
    String,
    &str,
    &String,
    rust_decimal::Decimal,
    uuid::Uuid,
    chrono::NaiveDate,
    chrono::NaiveDateTime,
    chrono::DateTime<chrono::Utc>,
);

impl From<SqlValue> for Operand {
    fn from(v: SqlValue) -> Self {
        Operand::Value(v)
    }
}

/// Binary comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    NotLike,
}

impl CompareOp {
    /// Operator text exactly as it is glued between field and placeholder
    pub fn as_sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Like => " LIKE ",
            CompareOp::NotLike => " NOT LIKE ",
        }
    }
}

/// A renderable predicate node
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(BTreeMap<String, Operand>),
    Ne(BTreeMap<String, Operand>),
    Gt(BTreeMap<String, Operand>),
    Gte(BTreeMap<String, Operand>),
    Lt(BTreeMap<String, Operand>),
    Lte(BTreeMap<String, Operand>),
    Like(BTreeMap<String, Operand>),
    NotLike(BTreeMap<String, Operand>),
    In(BTreeMap<String, Vec<SqlValue>>),
    NotIn(BTreeMap<String, Vec<SqlValue>>),
    Between(BTreeMap<String, Vec<SqlValue>>),
    NotBetween(BTreeMap<String, Vec<SqlValue>>),
    NullCheck(BTreeMap<String, NullCheck>),
    /// Caller-supplied SQL fragment with its own arguments
    RawCustom { sql: String, args: Vec<SqlValue> },
    NestedAnd(Vec<Condition>),
    NestedOr(Vec<Condition>),
}

impl Condition {
    /// Single-field comparison
    pub fn compare(op: CompareOp, field: impl Into<String>, value: impl Into<Operand>) -> Self {
        let mut map = BTreeMap::new();
        map.insert(field.into(), value.into());
        Self::from_compare_map(op, map)
    }

    pub(crate) fn from_compare_map(op: CompareOp, map: BTreeMap<String, Operand>) -> Self {
        match op {
            CompareOp::Eq => Condition::Eq(map),
            CompareOp::Ne => Condition::Ne(map),
            CompareOp::Gt => Condition::Gt(map),
            CompareOp::Gte => Condition::Gte(map),
            CompareOp::Lt => Condition::Lt(map),
            CompareOp::Lte => Condition::Lte(map),
            CompareOp::Like => Condition::Like(map),
            CompareOp::NotLike => Condition::NotLike(map),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Operand>) -> Self {
        Self::compare(CompareOp::Eq, field, value)
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Operand>) -> Self {
        Self::compare(CompareOp::Ne, field, value)
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Operand>) -> Self {
        Self::compare(CompareOp::Gt, field, value)
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Operand>) -> Self {
        Self::compare(CompareOp::Lt, field, value)
    }

    pub fn like(field: impl Into<String>, value: impl Into<Operand>) -> Self {
        Self::compare(CompareOp::Like, field, value)
    }

    pub fn in_list<I, T>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<SqlValue>,
    {
        Condition::In(single(field, values))
    }

    pub fn not_in_list<I, T>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<SqlValue>,
    {
        Condition::NotIn(single(field, values))
    }

    pub fn between(
        field: impl Into<String>,
        low: impl Into<SqlValue>,
        high: impl Into<SqlValue>,
    ) -> Self {
        Condition::Between(single(field, [low.into(), high.into()]))
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        let mut map = BTreeMap::new();
        map.insert(field.into(), NullCheck::IsNull);
        Condition::NullCheck(map)
    }

    pub fn is_not_null(field: impl Into<String>) -> Self {
        let mut map = BTreeMap::new();
        map.insert(field.into(), NullCheck::IsNotNull);
        Condition::NullCheck(map)
    }

    /// Raw SQL fragment with positional arguments
    ///
    /// ```
    /// use kite_qb::query_builder::Condition;
    ///
    /// let cond = Condition::custom("score > ? * 2", vec![10.into()]);
    /// let (fragments, args) = cond.render();
    /// assert_eq!(fragments, vec!["score > ? * 2".to_string()]);
    /// assert_eq!(args.len(), 1);
    /// ```
    pub fn custom(sql: impl Into<String>, args: Vec<SqlValue>) -> Self {
        Condition::RawCustom {
            sql: sql.into(),
            args,
        }
    }

    pub fn and(children: Vec<Condition>) -> Self {
        Condition::NestedAnd(children)
    }

    pub fn or(children: Vec<Condition>) -> Self {
        Condition::NestedOr(children)
    }

    /// Reject shapes that cannot render into valid SQL
    ///
    /// BETWEEN arity is deliberately not checked here: a malformed bound
    /// list renders the always-false `(1=0)` instead.
    pub fn validate(&self) -> Result<()> {
        match self {
            Condition::In(map) => check_non_empty(map, "in"),
            Condition::NotIn(map) => check_non_empty(map, "not in"),
            Condition::NestedAnd(children) | Condition::NestedOr(children) => {
                children.iter().try_for_each(Condition::validate)
            }
            _ => Ok(()),
        }
    }

    /// Render into SQL fragments and their arguments
    ///
    /// An empty node renders no fragments.
    pub fn render(&self) -> (Vec<String>, Vec<SqlValue>) {
        match self {
            Condition::Eq(map) => render_compare(map, CompareOp::Eq),
            Condition::Ne(map) => render_compare(map, CompareOp::Ne),
            Condition::Gt(map) => render_compare(map, CompareOp::Gt),
            Condition::Gte(map) => render_compare(map, CompareOp::Gte),
            Condition::Lt(map) => render_compare(map, CompareOp::Lt),
            Condition::Lte(map) => render_compare(map, CompareOp::Lte),
            Condition::Like(map) => render_compare(map, CompareOp::Like),
            Condition::NotLike(map) => render_compare(map, CompareOp::NotLike),
            Condition::In(map) => render_in(map, "IN"),
            Condition::NotIn(map) => render_in(map, "NOT IN"),
            Condition::Between(map) => render_between(map, "BETWEEN"),
            Condition::NotBetween(map) => render_between(map, "NOT BETWEEN"),
            Condition::NullCheck(map) => (
                map.iter()
                    .map(|(field, check)| format!("{} {}", field, check.as_sql()))
                    .collect(),
                Vec::new(),
            ),
            Condition::RawCustom { sql, args } => (vec![sql.clone()], args.clone()),
            Condition::NestedAnd(children) => render_group(children, "AND"),
            Condition::NestedOr(children) => render_group(children, "OR"),
        }
    }
}

fn single<I, T>(field: impl Into<String>, values: I) -> BTreeMap<String, Vec<SqlValue>>
where
    I: IntoIterator<Item = T>,
    T: Into<SqlValue>,
{
    let mut map = BTreeMap::new();
    map.insert(field.into(), values.into_iter().map(Into::into).collect());
    map
}

fn check_non_empty(map: &BTreeMap<String, Vec<SqlValue>>, operator: &str) -> Result<()> {
    if map.values().any(Vec::is_empty) {
        return Err(QueryError::EmptyList {
            operator: operator.to_string(),
        });
    }
    Ok(())
}

fn render_compare(map: &BTreeMap<String, Operand>, op: CompareOp) -> (Vec<String>, Vec<SqlValue>) {
    let mut fragments = Vec::with_capacity(map.len());
    let mut args = Vec::with_capacity(map.len());
    for (field, operand) in map {
        match operand {
            Operand::Raw(raw) => fragments.push(format!("{}{}{}", field, op.as_sql(), raw)),
            Operand::Value(value) => {
                fragments.push(format!("{}{}?", field, op.as_sql()));
                args.push(value.clone());
            }
        }
    }
    (fragments, args)
}

fn render_in(map: &BTreeMap<String, Vec<SqlValue>>, keyword: &str) -> (Vec<String>, Vec<SqlValue>) {
    let mut fragments = Vec::with_capacity(map.len());
    let mut args = Vec::new();
    for (field, values) in map {
        fragments.push(format!(
            "{} {} ({})",
            field,
            keyword,
            placeholders(values.len())
        ));
        args.extend(values.iter().cloned());
    }
    (fragments, args)
}

// A bound list that is not exactly two values renders `(1=0)` with no args.
fn render_between(
    map: &BTreeMap<String, Vec<SqlValue>>,
    keyword: &str,
) -> (Vec<String>, Vec<SqlValue>) {
    let mut fragments = Vec::with_capacity(map.len());
    let mut args = Vec::new();
    for (field, values) in map {
        if values.len() != 2 {
            fragments.push("(1=0)".to_string());
            continue;
        }
        fragments.push(format!("({} {} ? AND ?)", field, keyword));
        args.extend(values.iter().cloned());
    }
    (fragments, args)
}

fn render_group(children: &[Condition], connector: &str) -> (Vec<String>, Vec<SqlValue>) {
    let (sql, args) = where_connector(children, connector);
    if sql.is_empty() {
        return (Vec::new(), Vec::new());
    }
    (vec![sql], args)
}

/// Join the fragments of several conditions into one parenthesized group
///
/// Returns an empty string when no condition contributes a fragment.
pub fn where_connector(conditions: &[Condition], connector: &str) -> (String, Vec<SqlValue>) {
    let mut fragments = Vec::new();
    let mut args = Vec::new();
    for condition in conditions {
        let (sql, values) = condition.render();
        fragments.extend(sql);
        args.extend(values);
    }
    if fragments.is_empty() {
        return (String::new(), Vec::new());
    }
    let separator = format!(" {} ", connector);
    (format!("({})", fragments.join(&separator)), args)
}

/// `?,?,?` for `n` values
pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(",")
}
