//! Update sets and insert rows

use super::condition::{Condition, Raw};
use crate::database::SqlValue;
use crate::error::{QueryError, Result};
use std::collections::BTreeMap;

/// One row of an INSERT, keyed by column
///
/// Columns render in key order.
pub type Row = BTreeMap<String, SqlValue>;

const CUSTOM_PREFIX: &str = "_custom_";

/// Right-hand side of a `SET` assignment
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateValue {
    Value(SqlValue),
    Raw(Raw),
    /// Condition whose fragments are spliced into the SET list, keyed `_custom_*`
    Custom(Condition),
}

macro_rules! impl_update_value_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for UpdateValue {
                fn from(v: $ty) -> Self {
                    UpdateValue::Value(SqlValue::from(v))
                }
            }
        )*
    };
}

impl_update_value_from!(
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
    Vec<u8>,
    SqlValue,
    serde_json::Value,
    rust_decimal::Decimal,
    uuid::Uuid,
    chrono::NaiveDate,
    chrono::NaiveTime,
    chrono::NaiveDateTime,
    chrono::DateTime<chrono::Utc>,
);

impl From<Raw> for UpdateValue {
    fn from(v: Raw) -> Self {
        UpdateValue::Raw(v)
    }
}

impl From<Condition> for UpdateValue {
    fn from(v: Condition) -> Self {
        UpdateValue::Custom(v)
    }
}

/// Column assignments of an UPDATE or upsert
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateSpec {
    entries: BTreeMap<String, UpdateValue>,
}

impl UpdateSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<UpdateValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<UpdateValue>,
    ) -> Option<UpdateValue> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &UpdateValue)> {
        self.entries.iter()
    }

    /// Render `a=?,b=raw,<custom fragments>` in key order
    pub fn render(&self) -> Result<(String, Vec<SqlValue>)> {
        if self.entries.is_empty() {
            return Err(QueryError::EmptyUpdate);
        }
        let mut sets = Vec::with_capacity(self.entries.len());
        let mut args = Vec::new();
        for (key, value) in &self.entries {
            if key.starts_with(CUSTOM_PREFIX) {
                let UpdateValue::Custom(condition) = value else {
                    return Err(QueryError::CustomValueType(key.clone()));
                };
                condition.validate()?;
                let (fragments, values) = condition.render();
                sets.extend(fragments);
                args.extend(values);
                continue;
            }
            match value {
                UpdateValue::Raw(raw) => sets.push(format!("{}={}", key, raw)),
                UpdateValue::Value(SqlValue::Array(_)) | UpdateValue::Custom(_) => {
                    return Err(QueryError::UpdateValueType(key.clone()));
                }
                UpdateValue::Value(value) => {
                    sets.push(format!("{}=?", key));
                    args.push(value.clone());
                }
            }
        }
        Ok((sets.join(","), args))
    }
}

impl<K, V> FromIterator<(K, V)> for UpdateSpec
where
    K: Into<String>,
    V: Into<UpdateValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut spec = UpdateSpec::new();
        for (key, value) in iter {
            spec.insert(key, value);
        }
        spec
    }
}

/// Column list and placeholder groups for a multi-row INSERT
///
/// Every row must carry exactly the first row's columns.
pub(crate) fn render_rows(rows: &[Row]) -> Result<(String, String, Vec<SqlValue>)> {
    let first = match rows.first() {
        Some(first) if !first.is_empty() => first,
        _ => return Err(QueryError::InsertNullData),
    };
    let fields: Vec<&String> = first.keys().collect();
    let group = format!("({})", super::condition::placeholders(fields.len()));

    let mut groups = Vec::with_capacity(rows.len());
    let mut args = Vec::with_capacity(rows.len() * fields.len());
    for (index, row) in rows.iter().enumerate() {
        for field in &fields {
            match row.get(*field) {
                Some(value) => args.push(value.clone()),
                None => {
                    return Err(QueryError::InsertDataMismatch {
                        row: index,
                        field: (*field).clone(),
                    })
                }
            }
        }
        if let Some(extra) = row.keys().find(|k| !first.contains_key(*k)) {
            return Err(QueryError::InsertDataMismatch {
                row: index,
                field: extra.clone(),
            });
        }
        groups.push(group.clone());
    }

    let columns = fields
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(",");
    Ok((columns, groups.join(","), args))
}
