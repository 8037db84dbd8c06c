//! Where-clause compiler
//!
//! A [`WhereSpec`] is the caller's map-shaped description of a query. Keys are
//! either a field with an optional operator suffix (`"age >="`, `"name"`) or a
//! reserved directive (`_orderby`, `_groupby`, `_having`, `_limit`,
//! `_lockMode`, `_or*`, `_custom_*`).
//!
//! Compilation is two passes. [`parse_entries`] turns every key into a typed
//! [`SpecEntry`], validating directive shapes and operator tokens. Then
//! [`QuerySpec::compile`] groups field conditions by operator into
//! [`Condition`] nodes and collects the directives.

use super::condition::{CompareOp, Condition, NullCheck, Operand, Raw};
use super::dialects::LockMode;
use crate::database::SqlValue;
use crate::error::{QueryError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

const FIELD_PATTERN: &str = r"(?:[A-Za-z_][A-Za-z0-9_]*|`[^`]+`)";

static ORDER_BY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)^{f}(?:\.{f})*(?:\s+(asc|desc))?$",
        f = FIELD_PATTERN
    ))
    .expect("qb: invalid ORDER BY pattern")
});

static GROUP_BY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^{f}(?:\.{f})*$", f = FIELD_PATTERN))
        .expect("qb: invalid GROUP BY pattern")
});

const ORDER_BY_KEY: &str = "_orderby";
const GROUP_BY_KEY: &str = "_groupby";
const HAVING_KEY: &str = "_having";
const LIMIT_KEY: &str = "_limit";
const LOCK_MODE_KEY: &str = "_lockMode";
const OR_PREFIX: &str = "_or";
const CUSTOM_PREFIX: &str = "_custom_";

/// Directives only a SELECT can use
fn is_select_directive(key: &str) -> bool {
    matches!(key, ORDER_BY_KEY | GROUP_BY_KEY | HAVING_KEY | LOCK_MODE_KEY)
}

/// Directives that only shape a statement and never produce a condition
fn is_clause_directive(key: &str) -> bool {
    matches!(
        key,
        ORDER_BY_KEY | GROUP_BY_KEY | HAVING_KEY | LIMIT_KEY | LOCK_MODE_KEY
    )
}

/// Value side of a [`WhereSpec`] entry
#[derive(Debug, Clone, PartialEq)]
pub enum SpecValue {
    Value(SqlValue),
    List(Vec<SqlValue>),
    Null(NullCheck),
    Raw(Raw),
    /// Nested spec, used by `_having`
    Spec(WhereSpec),
    /// Alternatives, used by `_or`
    Specs(Vec<WhereSpec>),
    /// Pre-built condition, used by `_custom_*`
    Custom(Condition),
}

impl SpecValue {
    pub fn specs(specs: Vec<WhereSpec>) -> Self {
        SpecValue::Specs(specs)
    }

    /// Borrow the elements of a sequence value
    pub fn as_list(&self) -> Option<&[SqlValue]> {
        match self {
            SpecValue::List(values) => Some(values),
            SpecValue::Value(SqlValue::Array(values)) => Some(values),
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        self.as_list().is_some()
    }

    /// Zero values are NULL, `false`, numeric zero and empty strings,
    /// sequences and specs
    pub fn is_zero(&self) -> bool {
        match self {
            SpecValue::Value(value) => value.is_zero(),
            SpecValue::List(values) => values.is_empty(),
            SpecValue::Null(_) => false,
            SpecValue::Raw(raw) => raw.as_str().is_empty(),
            SpecValue::Spec(spec) => spec.is_empty(),
            SpecValue::Specs(specs) => specs.is_empty(),
            SpecValue::Custom(_) => false,
        }
    }
}

macro_rules! impl_spec_value_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for SpecValue {
                fn from(v: $ty) -> Self {
                    SpecValue::Value(SqlValue::from(v))
                }
            }
        )*
    };
}

impl_spec_value_from!(
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

impl From<SqlValue> for SpecValue {
    fn from(v: SqlValue) -> Self {
        match v {
            SqlValue::Array(values) => SpecValue::List(values),
            other => SpecValue::Value(other),
        }
    }
}

impl<T: Into<SqlValue>> From<Vec<T>> for SpecValue {
    fn from(v: Vec<T>) -> Self {
        SpecValue::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<SqlValue>, const N: usize> From<[T; N]> for SpecValue {
    fn from(v: [T; N]) -> Self {
        SpecValue::List(v.into_iter().map(Into::into).collect())
    }
}

impl From<NullCheck> for SpecValue {
    fn from(v: NullCheck) -> Self {
        SpecValue::Null(v)
    }
}

impl From<Raw> for SpecValue {
    fn from(v: Raw) -> Self {
        SpecValue::Raw(v)
    }
}

impl From<WhereSpec> for SpecValue {
    fn from(v: WhereSpec) -> Self {
        SpecValue::Spec(v)
    }
}

impl From<Condition> for SpecValue {
    fn from(v: Condition) -> Self {
        SpecValue::Custom(v)
    }
}

/// Map-shaped query specification
///
/// ```
/// use kite_qb::query_builder::WhereSpec;
///
/// let spec = WhereSpec::new()
///     .with("status", "active")
///     .with("age >=", 18)
///     .with("_orderby", "created_at desc")
///     .with("_limit", [0, 20]);
/// assert_eq!(spec.len(), 4);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereSpec {
    entries: BTreeMap<String, SpecValue>,
}

impl WhereSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<SpecValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Add an `_or` style group: the spec matches when any alternative does
    pub fn any_of(self, key: impl Into<String>, alternatives: Vec<WhereSpec>) -> Self {
        self.with(key, SpecValue::Specs(alternatives))
    }

    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<SpecValue>,
    ) -> Option<SpecValue> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&SpecValue> {
        self.entries.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<SpecValue> {
        self.entries.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &SpecValue)> {
        self.entries.iter()
    }

    /// Copy of this spec with zero-valued entries for `keys` removed
    ///
    /// Handy for optional filters coming from a search form: an empty string
    /// or a zero id should mean "no filter", not "match empty".
    pub fn omit_empty<S: AsRef<str>>(&self, keys: &[S]) -> WhereSpec {
        let mut copied = self.clone();
        for key in keys {
            let key = key.as_ref();
            if copied.get(key).is_some_and(SpecValue::is_zero) {
                copied.remove(key);
            }
        }
        copied
    }
}

impl<K, V> FromIterator<(K, V)> for WhereSpec
where
    K: Into<String>,
    V: Into<SpecValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut spec = WhereSpec::new();
        for (key, value) in iter {
            spec.insert(key, value);
        }
        spec
    }
}

/// Operators accepted in field keys
///
/// Variant order is the order in which grouped conditions are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operator {
    Eq,
    In,
    Ne,
    NotIn,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    NotLike,
    Between,
    NotBetween,
    /// Assigned to fields whose value is a [`NullCheck`] marker
    Null,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::In => "in",
            Operator::Ne => "!=",
            Operator::NotIn => "not in",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Like => "like",
            Operator::NotLike => "not like",
            Operator::Between => "between",
            Operator::NotBetween => "not between",
            Operator::Null => "null",
        }
    }

    /// Plain comparisons, the only operators HAVING accepts
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Operator::Eq | Operator::Ne | Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte
        )
    }

    fn compare_op(&self) -> Option<CompareOp> {
        match self {
            Operator::Eq => Some(CompareOp::Eq),
            Operator::Ne => Some(CompareOp::Ne),
            Operator::Gt => Some(CompareOp::Gt),
            Operator::Gte => Some(CompareOp::Gte),
            Operator::Lt => Some(CompareOp::Lt),
            Operator::Lte => Some(CompareOp::Lte),
            Operator::Like => Some(CompareOp::Like),
            Operator::NotLike => Some(CompareOp::NotLike),
            _ => None,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = QueryError;

    /// Parses an already normalized (lowercase, single-spaced) token
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "=" => Ok(Operator::Eq),
            "!=" | "<>" => Ok(Operator::Ne),
            ">" => Ok(Operator::Gt),
            ">=" => Ok(Operator::Gte),
            "<" => Ok(Operator::Lt),
            "<=" => Ok(Operator::Lte),
            "like" => Ok(Operator::Like),
            "not like" => Ok(Operator::NotLike),
            "in" => Ok(Operator::In),
            "not in" => Ok(Operator::NotIn),
            "between" => Ok(Operator::Between),
            "not between" => Ok(Operator::NotBetween),
            other => Err(QueryError::UnsupportedOperator(other.to_string())),
        }
    }
}

/// Split a `"field operator"` key
///
/// Without an operator the field compares with `=`, or with `in` when the
/// value is a sequence. The operator token is case-folded and runs of inner
/// whitespace collapse to one space, so `"name  NOT   LIKE"` reads as
/// `not like`.
pub fn split_key(key: &str, value: &SpecValue) -> Result<(String, Operator)> {
    let key = key.trim();
    if key.is_empty() {
        return Err(QueryError::EmptyKey);
    }
    match key.split_once(char::is_whitespace) {
        None => {
            let operator = if value.is_list() {
                Operator::In
            } else {
                Operator::Eq
            };
            Ok((key.to_string(), operator))
        }
        Some((field, token)) => {
            let token = token
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .to_lowercase();
            Ok((field.to_string(), token.parse()?))
        }
    }
}

/// One field predicate parsed from a spec key
#[derive(Debug, Clone, PartialEq)]
pub struct FieldCondition {
    pub field: String,
    /// Operator named by the key
    pub operator: Operator,
    pub value: SpecValue,
}

impl FieldCondition {
    /// Operator group this predicate is emitted under
    ///
    /// A NULL marker value overrides whatever operator the key named.
    pub fn group(&self) -> Operator {
        match self.value {
            SpecValue::Null(_) => Operator::Null,
            _ => self.operator,
        }
    }
}

/// Row window requested by `_limit`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectLimit {
    pub offset: u64,
    pub count: u64,
}

/// Reserved key parsed into its typed form
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// Normalized ORDER BY list; empty means no clause
    OrderBy(String),
    /// Normalized GROUP BY list; empty means no clause
    GroupBy(String),
    Having(WhereSpec),
    Limit(SelectLimit),
    LockMode(LockMode),
    Or(Vec<WhereSpec>),
    Custom(Condition),
}

/// Typed form of one spec entry
#[derive(Debug, Clone, PartialEq)]
pub enum SpecEntry {
    Field(FieldCondition),
    Directive(Directive),
}

/// Parse every key of a spec, in key order
pub fn parse_entries(spec: &WhereSpec) -> Result<Vec<SpecEntry>> {
    spec.iter()
        .map(|(key, value)| parse_entry(key, value))
        .collect()
}

fn parse_entry(key: &str, value: &SpecValue) -> Result<SpecEntry> {
    let directive = match key {
        ORDER_BY_KEY => Directive::OrderBy(parse_order_by(value)?),
        GROUP_BY_KEY => Directive::GroupBy(parse_group_by(value)?),
        HAVING_KEY => match value {
            SpecValue::Spec(spec) => Directive::Having(spec.clone()),
            _ => return Err(QueryError::HavingValueType),
        },
        LIMIT_KEY => Directive::Limit(parse_select_limit(value)?),
        LOCK_MODE_KEY => match value {
            SpecValue::Value(SqlValue::String(mode)) => Directive::LockMode(mode.parse()?),
            _ => return Err(QueryError::LockModeValueType),
        },
        _ if key.starts_with(OR_PREFIX) => match value {
            SpecValue::Specs(specs) => Directive::Or(specs.clone()),
            _ => return Err(QueryError::OrValueType),
        },
        _ if key.starts_with(CUSTOM_PREFIX) => match value {
            SpecValue::Custom(condition) => {
                condition.validate()?;
                Directive::Custom(condition.clone())
            }
            _ => return Err(QueryError::CustomValueType(key.to_string())),
        },
        _ => {
            let (field, operator) = split_key(key, value)?;
            return Ok(SpecEntry::Field(FieldCondition {
                field,
                operator,
                value: value.clone(),
            }));
        }
    };
    Ok(SpecEntry::Directive(directive))
}

fn parse_order_by(value: &SpecValue) -> Result<String> {
    match value {
        SpecValue::Raw(raw) => Ok(raw.as_str().trim().to_string()),
        SpecValue::Value(SqlValue::String(s)) => normalize_order_by(s),
        _ => Err(QueryError::OrderByValueType),
    }
}

fn parse_group_by(value: &SpecValue) -> Result<String> {
    match value {
        SpecValue::Raw(raw) => Ok(raw.as_str().trim().to_string()),
        SpecValue::Value(SqlValue::String(s)) => normalize_group_by(s),
        _ => Err(QueryError::GroupByValueType),
    }
}

/// Validate and normalize a comma-separated ORDER BY list
///
/// Each term is a possibly dotted or backtick-quoted identifier with an
/// optional direction. Whitespace is collapsed and the direction uppercased.
pub fn normalize_order_by(order_by: &str) -> Result<String> {
    let order_by = order_by.trim();
    if order_by.is_empty() {
        return Ok(String::new());
    }
    let mut terms = Vec::new();
    for term in order_by.split(',') {
        let joined = term.split_whitespace().collect::<Vec<_>>().join(" ");
        let captures = ORDER_BY_PATTERN
            .captures(&joined)
            .ok_or_else(|| QueryError::OrderByValueInvalid(term.trim().to_string()))?;
        match captures.get(1) {
            Some(direction) => terms.push(format!(
                "{}{}",
                &joined[..direction.start()],
                direction.as_str().to_uppercase()
            )),
            None => terms.push(joined.clone()),
        }
    }
    Ok(terms.join(","))
}

/// Validate and normalize a comma-separated GROUP BY list
pub fn normalize_group_by(group_by: &str) -> Result<String> {
    let group_by = group_by.trim();
    if group_by.is_empty() {
        return Ok(String::new());
    }
    let mut terms = Vec::new();
    for term in group_by.split(',') {
        let term = term.trim();
        if term.is_empty() || !GROUP_BY_PATTERN.is_match(term) {
            return Err(QueryError::GroupByValueInvalid(term.to_string()));
        }
        terms.push(term);
    }
    Ok(terms.join(","))
}

fn limit_element(value: &SqlValue) -> Result<u64> {
    if !value.is_integer() {
        return Err(QueryError::LimitValueType);
    }
    // bound as a signed BIGINT, where a negative count means no limit
    value
        .as_u64()
        .filter(|n| i64::try_from(*n).is_ok())
        .ok_or(QueryError::LimitValueType)
}

/// `n` means the first `n` rows; `[offset, count]` a window
fn parse_select_limit(value: &SpecValue) -> Result<SelectLimit> {
    if let Some(values) = value.as_list() {
        return match values {
            [count] => Ok(SelectLimit {
                offset: 0,
                count: limit_element(count)?,
            }),
            [offset, count] => Ok(SelectLimit {
                offset: limit_element(offset)?,
                count: limit_element(count)?,
            }),
            _ => Err(QueryError::LimitValueLength),
        };
    }
    match value {
        SpecValue::Value(count) => Ok(SelectLimit {
            offset: 0,
            count: limit_element(count)?,
        }),
        _ => Err(QueryError::LimitValueType),
    }
}

/// Compiled form of a [`WhereSpec`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySpec {
    /// WHERE conditions: directive conditions first, then field groups
    pub conditions: Vec<Condition>,
    pub group_by: Option<String>,
    pub having: Vec<Condition>,
    pub order_by: Option<String>,
    pub limit: Option<SelectLimit>,
    pub lock_mode: Option<LockMode>,
}

impl QuerySpec {
    /// Compile a where spec
    ///
    /// `_having` requires a non-empty `_groupby` and accepts only plain
    /// comparisons.
    pub fn compile(spec: &WhereSpec) -> Result<Self> {
        Self::compile_entries(parse_entries(spec)?)
    }

    /// Compile a where spec for UPDATE or DELETE
    ///
    /// `_orderby`, `_groupby`, `_having` and `_lockMode` are skipped before
    /// parsing, so their values are never validated.
    pub fn compile_mutation(spec: &WhereSpec) -> Result<Self> {
        let mut entries = Vec::with_capacity(spec.len());
        for (key, value) in spec.iter() {
            if is_select_directive(key) {
                log::debug!("qb: {} has no effect outside SELECT, skipped", key);
                continue;
            }
            entries.push(parse_entry(key, value)?);
        }
        Self::compile_entries(entries)
    }

    fn compile_entries(entries: Vec<SpecEntry>) -> Result<Self> {
        let mut query = QuerySpec::default();
        let mut having = None;
        let mut fields = Vec::new();

        for entry in entries {
            match entry {
                SpecEntry::Field(field) => fields.push(field),
                SpecEntry::Directive(directive) => match directive {
                    Directive::OrderBy(order_by) => query.order_by = non_empty(order_by),
                    Directive::GroupBy(group_by) => query.group_by = non_empty(group_by),
                    Directive::Having(spec) => having = Some(spec),
                    Directive::Limit(limit) => query.limit = Some(limit),
                    Directive::LockMode(mode) => query.lock_mode = Some(mode),
                    Directive::Or(alternatives) => query.conditions.push(or_group(&alternatives)?),
                    Directive::Custom(condition) => query.conditions.push(condition),
                },
            }
        }
        query.conditions.extend(group_fields(fields)?);

        if let Some(having) = having {
            if query.group_by.is_none() {
                return Err(QueryError::HavingWithoutGroupBy);
            }
            query.having = having_conditions(&having)?;
        }

        Ok(query)
    }

    /// Row cap for UPDATE/DELETE
    ///
    /// A window with a non-zero offset cannot be expressed; a count of zero
    /// means unlimited.
    pub fn mutation_limit(&self) -> Result<Option<u64>> {
        match self.limit {
            Some(SelectLimit { offset, .. }) if offset != 0 => {
                Err(QueryError::LimitOffsetNotSupported)
            }
            Some(SelectLimit { count, .. }) if count > 0 => Ok(Some(count)),
            _ => Ok(None),
        }
    }

}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Conditions of a nested spec, where clause directives make no sense
fn nested_conditions(spec: &WhereSpec, allow_groups: bool) -> Result<Vec<Condition>> {
    let mut conditions = Vec::new();
    let mut fields = Vec::new();
    for (key, value) in spec.iter() {
        let grouping = key.starts_with(OR_PREFIX) || key.starts_with(CUSTOM_PREFIX);
        if is_clause_directive(key) || (grouping && !allow_groups) {
            return Err(QueryError::InvalidKey(key.clone()));
        }
        match parse_entry(key, value)? {
            SpecEntry::Field(field) => fields.push(field),
            SpecEntry::Directive(Directive::Or(alternatives)) => {
                conditions.push(or_group(&alternatives)?)
            }
            SpecEntry::Directive(Directive::Custom(condition)) => conditions.push(condition),
            SpecEntry::Directive(_) => return Err(QueryError::InvalidKey(key.clone())),
        }
    }
    conditions.extend(group_fields(fields)?);
    Ok(conditions)
}

/// OR of the alternatives, each AND-ed internally
///
/// A branch without conditions would match every row, and an empty list
/// none, so both are rejected rather than rendered as nothing.
fn or_group(alternatives: &[WhereSpec]) -> Result<Condition> {
    if alternatives.is_empty() {
        return Err(QueryError::EmptyList {
            operator: OR_PREFIX.to_string(),
        });
    }
    let mut branches = Vec::with_capacity(alternatives.len());
    for alternative in alternatives {
        let branch = Condition::NestedAnd(nested_conditions(alternative, true)?);
        if branch.render().0.is_empty() {
            return Err(QueryError::EmptyOrAlternative);
        }
        branches.push(branch);
    }
    Ok(Condition::NestedOr(branches))
}

fn having_conditions(spec: &WhereSpec) -> Result<Vec<Condition>> {
    for (key, value) in spec.iter() {
        if key.starts_with('_') {
            continue;
        }
        let (_, operator) = split_key(key, value)?;
        if !operator.is_comparison() {
            return Err(QueryError::HavingUnsupportedOperator(
                operator.as_str().to_string(),
            ));
        }
    }
    nested_conditions(spec, false)
}

fn group_fields(fields: Vec<FieldCondition>) -> Result<Vec<Condition>> {
    let mut groups: BTreeMap<Operator, Vec<FieldCondition>> = BTreeMap::new();
    for field in fields {
        groups.entry(field.group()).or_default().push(field);
    }
    groups
        .into_iter()
        .map(|(operator, fields)| build_group(operator, fields))
        .collect()
}

fn build_group(operator: Operator, fields: Vec<FieldCondition>) -> Result<Condition> {
    if let Some(op) = operator.compare_op() {
        let mut map = BTreeMap::new();
        for FieldCondition { field, value, .. } in fields {
            let operand = match value {
                SpecValue::Value(SqlValue::Array(_)) => {
                    return Err(scalar_error(operator));
                }
                SpecValue::Value(value) => Operand::Value(value),
                SpecValue::Raw(raw) => Operand::Raw(raw),
                _ => return Err(scalar_error(operator)),
            };
            map.insert(field, operand);
        }
        return Ok(Condition::from_compare_map(op, map));
    }

    if operator == Operator::Null {
        let mut map = BTreeMap::new();
        for FieldCondition { field, value, .. } in fields {
            if let SpecValue::Null(check) = value {
                map.insert(field, check);
            }
        }
        return Ok(Condition::NullCheck(map));
    }

    let mut map = BTreeMap::new();
    for FieldCondition { field, value, .. } in fields {
        let values = value.as_list().ok_or_else(|| QueryError::ListValueType {
            operator: operator.as_str().to_string(),
        })?;
        if values.is_empty() && matches!(operator, Operator::In | Operator::NotIn) {
            return Err(QueryError::EmptyList {
                operator: operator.as_str().to_string(),
            });
        }
        map.insert(field, values.to_vec());
    }
    Ok(match operator {
        Operator::In => Condition::In(map),
        Operator::NotIn => Condition::NotIn(map),
        Operator::Between => Condition::Between(map),
        _ => Condition::NotBetween(map),
    })
}

fn scalar_error(operator: Operator) -> QueryError {
    QueryError::ScalarValueType {
        operator: operator.as_str().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_key_defaults() {
        let scalar = SpecValue::from(1);
        let list = SpecValue::from(vec![1, 2]);
        assert_eq!(
            split_key("name", &scalar).unwrap(),
            ("name".to_string(), Operator::Eq)
        );
        assert_eq!(
            split_key("  id  ", &list).unwrap(),
            ("id".to_string(), Operator::In)
        );
    }

    #[test]
    fn test_split_key_normalizes_operator() {
        let value = SpecValue::from("x%");
        assert_eq!(
            split_key("name  NOT   LIKE ", &value).unwrap(),
            ("name".to_string(), Operator::NotLike)
        );
        assert_eq!(split_key("a <>", &value).unwrap().1, Operator::Ne);
        assert_eq!(split_key("a Between", &value).unwrap().1, Operator::Between);
    }

    #[test]
    fn test_split_key_errors() {
        let value = SpecValue::from(1);
        assert!(matches!(split_key("   ", &value), Err(QueryError::EmptyKey)));
        assert!(matches!(
            split_key("age ~", &value),
            Err(QueryError::UnsupportedOperator(ref op)) if op == "~"
        ));
    }

    #[test]
    fn test_parse_entries_types() {
        let spec = WhereSpec::new()
            .with("name", "kite")
            .with("_orderby", "id desc")
            .with("_limit", 5);
        let entries = parse_entries(&spec).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(
            entries[0],
            SpecEntry::Directive(Directive::Limit(SelectLimit {
                offset: 0,
                count: 5
            }))
        );
        assert_eq!(
            entries[1],
            SpecEntry::Directive(Directive::OrderBy("id DESC".to_string()))
        );
        assert!(matches!(entries[2], SpecEntry::Field(ref f) if f.field == "name"));
    }

    #[test]
    fn test_order_by_normalization() {
        assert_eq!(
            normalize_order_by(" a.b  asc ,c,`weird col` Desc").unwrap(),
            "a.b ASC,c,`weird col` DESC"
        );
        assert_eq!(normalize_order_by("   ").unwrap(), "");
        assert!(matches!(
            normalize_order_by("id; DROP TABLE users"),
            Err(QueryError::OrderByValueInvalid(_))
        ));
        assert!(normalize_order_by("a,,b").is_err());
        assert!(normalize_order_by("a sideways").is_err());
    }

    #[test]
    fn test_group_by_normalization() {
        assert_eq!(normalize_group_by(" dept , t.role ").unwrap(), "dept,t.role");
        assert!(matches!(
            normalize_group_by("dept desc"),
            Err(QueryError::GroupByValueInvalid(_))
        ));
    }

    #[test]
    fn test_raw_bypasses_validation() {
        let spec = WhereSpec::new()
            .with("_orderby", Raw::new(" FIELD(id, 3, 1, 2) "))
            .with("_groupby", Raw::new("DATE(created_at)"));
        let query = QuerySpec::compile(&spec).unwrap();
        assert_eq!(query.order_by.as_deref(), Some("FIELD(id, 3, 1, 2)"));
        assert_eq!(query.group_by.as_deref(), Some("DATE(created_at)"));
    }

    #[test]
    fn test_limit_shapes() {
        let limit = |v: SpecValue| QuerySpec::compile(&WhereSpec::new().with("_limit", v));

        assert_eq!(
            limit(10.into()).unwrap().limit,
            Some(SelectLimit {
                offset: 0,
                count: 10
            })
        );
        assert_eq!(
            limit([5u64, 10].into()).unwrap().limit,
            Some(SelectLimit {
                offset: 5,
                count: 10
            })
        );
        assert!(matches!(limit((-1).into()), Err(QueryError::LimitValueType)));
        assert!(matches!(limit("10".into()), Err(QueryError::LimitValueType)));
        assert!(matches!(
            limit(vec![1, 2, 3].into()),
            Err(QueryError::LimitValueLength)
        ));
        assert!(matches!(
            limit(Vec::<i32>::new().into()),
            Err(QueryError::LimitValueLength)
        ));
    }

    #[test]
    fn test_limit_must_fit_bigint() {
        let limit = |v: SpecValue| QuerySpec::compile(&WhereSpec::new().with("_limit", v));

        assert_eq!(
            limit((i64::MAX as u64).into()).unwrap().limit,
            Some(SelectLimit {
                offset: 0,
                count: i64::MAX as u64
            })
        );
        assert!(matches!(limit(u64::MAX.into()), Err(QueryError::LimitValueType)));
        assert!(matches!(
            limit([u64::MAX, 1].into()),
            Err(QueryError::LimitValueType)
        ));
    }

    #[test]
    fn test_mutation_skips_select_directives() {
        let spec = WhereSpec::new()
            .with("id", 1)
            .with("_having", WhereSpec::new().with("x >", 1))
            .with("_lockMode", "nowait")
            .with("_orderby", "not a valid; order")
            .with("_groupby", 5);
        assert!(QuerySpec::compile(&spec).is_err());

        let query = QuerySpec::compile_mutation(&spec).unwrap();
        assert_eq!(query.conditions.len(), 1);
        assert!(query.having.is_empty());
        assert_eq!(query.order_by, None);
        assert_eq!(query.lock_mode, None);

        // the row cap still applies
        let spec = WhereSpec::new().with("id", 1).with("_limit", u64::MAX);
        assert!(matches!(
            QuerySpec::compile_mutation(&spec),
            Err(QueryError::LimitValueType)
        ));
    }

    #[test]
    fn test_mutation_limit() {
        let compile = |v: SpecValue| QuerySpec::compile(&WhereSpec::new().with("_limit", v));
        assert_eq!(compile(5.into()).unwrap().mutation_limit().unwrap(), Some(5));
        assert_eq!(compile([0, 5].into()).unwrap().mutation_limit().unwrap(), Some(5));
        assert_eq!(compile(0.into()).unwrap().mutation_limit().unwrap(), None);
        assert!(matches!(
            compile([1, 5].into()).unwrap().mutation_limit(),
            Err(QueryError::LimitOffsetNotSupported)
        ));
    }

    #[test]
    fn test_lock_mode_directive() {
        let query =
            QuerySpec::compile(&WhereSpec::new().with("_lockMode", " exclusive ")).unwrap();
        assert_eq!(query.lock_mode, Some(LockMode::Exclusive));

        assert!(matches!(
            QuerySpec::compile(&WhereSpec::new().with("_lockMode", "nowait")),
            Err(QueryError::NotAllowedLockMode(_))
        ));
        assert!(matches!(
            QuerySpec::compile(&WhereSpec::new().with("_lockMode", 1)),
            Err(QueryError::LockModeValueType)
        ));
    }

    #[test]
    fn test_operator_group_order() {
        let spec = WhereSpec::new()
            .with("z", 1)
            .with("a >", 2)
            .with("m", vec!["x", "y"])
            .with("b !=", 3)
            .with("c <>", 4)
            .with("deleted_at", NullCheck::IsNull)
            .with("name like", "k%");
        let query = QuerySpec::compile(&spec).unwrap();
        let rendered: Vec<String> = query
            .conditions
            .iter()
            .flat_map(|c| c.render().0)
            .collect();
        assert_eq!(
            rendered,
            vec![
                "z=?",
                "m IN (?,?)",
                "b!=?",
                "c!=?",
                "a>?",
                "name LIKE ?",
                "deleted_at IS NULL"
            ]
        );
    }

    #[test]
    fn test_null_marker_overrides_operator() {
        let spec = WhereSpec::new().with("email !=", NullCheck::IsNotNull);
        let query = QuerySpec::compile(&spec).unwrap();
        assert_eq!(query.conditions, vec![Condition::is_not_null("email")]);
    }

    #[test]
    fn test_list_operator_errors() {
        assert!(matches!(
            QuerySpec::compile(&WhereSpec::new().with("id in", 1)),
            Err(QueryError::ListValueType { ref operator }) if operator == "in"
        ));
        assert!(matches!(
            QuerySpec::compile(&WhereSpec::new().with("id not in", Vec::<i32>::new())),
            Err(QueryError::EmptyList { ref operator }) if operator == "not in"
        ));
        assert!(matches!(
            QuerySpec::compile(&WhereSpec::new().with("id >", vec![1, 2])),
            Err(QueryError::ScalarValueType { .. })
        ));
    }

    #[test]
    fn test_or_group() {
        let spec = WhereSpec::new().with("status", 1).any_of(
            "_or",
            vec![
                WhereSpec::new().with("a", 1).with("b", 2),
                WhereSpec::new().with("c >", 3),
            ],
        );
        let query = QuerySpec::compile(&spec).unwrap();
        assert_eq!(query.conditions.len(), 2);
        assert_eq!(
            query.conditions[0].render().0,
            vec!["((a=? AND b=?) OR (c>?))"]
        );
        assert_eq!(query.conditions[1].render().0, vec!["status=?"]);
    }

    #[test]
    fn test_or_rejects_empty_alternatives() {
        let spec = WhereSpec::new().any_of(
            "_or",
            vec![WhereSpec::new(), WhereSpec::new().with("a", 1)],
        );
        assert!(matches!(
            QuerySpec::compile(&spec),
            Err(QueryError::EmptyOrAlternative)
        ));

        let nested = WhereSpec::new().any_of("_or", vec![WhereSpec::new().any_of("_or2", vec![])]);
        assert!(matches!(
            QuerySpec::compile(&nested),
            Err(QueryError::EmptyList { ref operator }) if operator == "_or"
        ));

        assert!(matches!(
            QuerySpec::compile(&WhereSpec::new().any_of("_or", vec![])),
            Err(QueryError::EmptyList { .. })
        ));
    }

    #[test]
    fn test_or_rejects_clause_directives() {
        let spec = WhereSpec::new().any_of("_or", vec![WhereSpec::new().with("_limit", 1)]);
        assert!(matches!(
            QuerySpec::compile(&spec),
            Err(QueryError::InvalidKey(ref k)) if k == "_limit"
        ));
        assert!(matches!(
            QuerySpec::compile(&WhereSpec::new().with("_or", 1)),
            Err(QueryError::OrValueType)
        ));
    }

    #[test]
    fn test_custom_directive() {
        let spec = WhereSpec::new()
            .with("_custom_score", Condition::custom("score > ?", vec![10.into()]))
            .with("name", "kite");
        let query = QuerySpec::compile(&spec).unwrap();
        assert_eq!(query.conditions[0].render().0, vec!["score > ?"]);

        assert!(matches!(
            QuerySpec::compile(&WhereSpec::new().with("_custom_x", "nope")),
            Err(QueryError::CustomValueType(ref k)) if k == "_custom_x"
        ));
    }

    #[test]
    fn test_having_rules() {
        let having = WhereSpec::new().with("total >", 10);

        assert!(matches!(
            QuerySpec::compile(&WhereSpec::new().with("_having", having.clone())),
            Err(QueryError::HavingWithoutGroupBy)
        ));

        let query = QuerySpec::compile(
            &WhereSpec::new()
                .with("_groupby", "dept")
                .with("_having", having),
        )
        .unwrap();
        assert_eq!(query.having.len(), 1);

        let bad = WhereSpec::new()
            .with("_groupby", "dept")
            .with("_having", WhereSpec::new().with("name like", "a%"));
        assert!(matches!(
            QuerySpec::compile(&bad),
            Err(QueryError::HavingUnsupportedOperator(ref op)) if op == "like"
        ));

        let bad = WhereSpec::new()
            .with("_groupby", "dept")
            .with("_having", WhereSpec::new().with("_limit", 1));
        assert!(matches!(QuerySpec::compile(&bad), Err(QueryError::InvalidKey(_))));
    }

    #[test]
    fn test_omit_empty() {
        let spec = WhereSpec::new()
            .with("name", "")
            .with("age", 0)
            .with("city", "Oslo")
            .with("tags", Vec::<String>::new());
        let trimmed = spec.omit_empty(&["name", "age", "city", "tags", "missing"]);
        assert_eq!(trimmed.len(), 1);
        assert!(trimmed.contains_key("city"));
        // source is untouched
        assert_eq!(spec.len(), 4);
    }
}
