//! Named-parameter expansion
//!
//! `{{name}}` tokens in a hand-written template become `?` for a scalar value
//! or `(?,?,...)` for an [`SqlValue::Array`], with values appended in scan
//! order.

use super::core::Builder;
use crate::database::SqlValue;
use crate::error::{QueryError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

static NAMED_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{(\S+?)\}\}").expect("qb: invalid named parameter pattern"));

/// Values for a named query, keyed by parameter name
pub type NamedArgs = BTreeMap<String, SqlValue>;

impl Builder {
    /// Expand `{{name}}` tokens and rebind for this dialect
    ///
    /// A token without a value, or bound to an empty array, is an error.
    pub fn named_query(&self, template: &str, values: &NamedArgs) -> Result<(String, Vec<SqlValue>)> {
        let (sql, args) = expand(template, values)?;
        self.finalize(sql, args)
    }
}

fn expand(template: &str, values: &NamedArgs) -> Result<(String, Vec<SqlValue>)> {
    let mut sql = String::with_capacity(template.len());
    let mut args = Vec::new();
    let mut last = 0;

    for captures in NAMED_PARAM.captures_iter(template) {
        let (Some(token), Some(name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let name = name.as_str();
        sql.push_str(&template[last..token.start()]);
        last = token.end();

        match values.get(name) {
            None => return Err(QueryError::MissingNamedParameter(name.to_string())),
            Some(SqlValue::Array(items)) => {
                if items.is_empty() {
                    return Err(QueryError::NamedParameterValue(name.to_string()));
                }
                sql.push('(');
                sql.push_str(&super::condition::placeholders(items.len()));
                sql.push(')');
                args.extend(items.iter().cloned());
            }
            Some(value) => {
                sql.push('?');
                args.push(value.clone());
            }
        }
    }
    sql.push_str(&template[last..]);

    Ok((sql, args))
}
