//! MySQL JSON expression helpers
//!
//! These build [`Condition`] values for use under `_custom_*` keys, in a
//! [`WhereSpec`](super::WhereSpec) or an [`UpdateSpec`](super::UpdateSpec).
//! They only produce MySQL syntax. Paths are bound as arguments but the field
//! names are inserted verbatim, so both must come from code, never from user
//! input.

use super::condition::Condition;
use crate::database::SqlValue;
use crate::error::{QueryError, Result};
use serde_json::Value as JsonValue;

/// Serialize a JSON value into a MySQL expression plus its arguments
///
/// Arrays become `JSON_ARRAY(...)` and objects `JSON_OBJECT(?,v,...)` with
/// keys sorted. Strings and numbers are bound; `null`, `true` and `false`
/// are literals.
///
/// ```
/// use kite_qb::query_builder::json_value_expr;
/// use serde_json::json;
///
/// let (sql, args) = json_value_expr(&json!({"b": [1, true], "a": null}));
/// assert_eq!(sql, "JSON_OBJECT(?,null,?,JSON_ARRAY(?,true))");
/// assert_eq!(args.len(), 3);
/// ```
pub fn json_value_expr(value: &JsonValue) -> (String, Vec<SqlValue>) {
    let mut sql = String::new();
    let mut args = Vec::new();
    write_json(value, &mut sql, &mut args);
    (sql, args)
}

fn write_json(value: &JsonValue, sql: &mut String, args: &mut Vec<SqlValue>) {
    match value {
        JsonValue::Null => sql.push_str("null"),
        JsonValue::Bool(true) => sql.push_str("true"),
        JsonValue::Bool(false) => sql.push_str("false"),
        JsonValue::Number(n) => {
            sql.push('?');
            args.push(if let Some(i) = n.as_i64() {
                SqlValue::BigInt(i)
            } else if let Some(u) = n.as_u64() {
                SqlValue::UnsignedBigInt(u)
            } else {
                SqlValue::Double(n.as_f64().unwrap_or_default())
            });
        }
        JsonValue::String(s) => {
            sql.push('?');
            args.push(SqlValue::String(s.clone()));
        }
        JsonValue::Array(items) => {
            sql.push_str("JSON_ARRAY(");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    sql.push(',');
                }
                write_json(item, sql, args);
            }
            sql.push(')');
        }
        JsonValue::Object(map) => {
            // key order must not depend on serde_json's `preserve_order` feature
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            sql.push_str("JSON_OBJECT(");
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    sql.push(',');
                }
                sql.push_str("?,");
                args.push(SqlValue::String(key.clone()));
                if let Some(item) = map.get(key) {
                    write_json(item, sql, args);
                }
            }
            sql.push(')');
        }
    }
}

/// `JSON_CONTAINS` / `MEMBER OF` test against the document at `path`
///
/// Scalars use `MEMBER OF`, arrays and objects `JSON_CONTAINS`. `null` is
/// matched with `JSON_CONTAINS(path,'null')` since `MEMBER OF` cannot see
/// JSON nulls.
pub fn json_contains(path: &str, value: &JsonValue) -> Condition {
    let (expr, args) = json_value_expr(value);
    let sql = match value {
        JsonValue::Null => format!("JSON_CONTAINS({},'null')", path),
        JsonValue::Array(_) | JsonValue::Object(_) => format!("JSON_CONTAINS({},{})", path, expr),
        _ => format!("({} MEMBER OF({}))", expr, path),
    };
    Condition::custom(sql, args)
}

/// `field=JSON_SET(field,path,value,...)`
///
/// ```
/// use kite_qb::query_builder::json_set;
/// use serde_json::json;
///
/// let cond = json_set("meta", &[("$.code", json!(1))]).unwrap();
/// let (fragments, args) = cond.render();
/// assert_eq!(fragments, vec!["meta=JSON_SET(meta,?,?)".to_string()]);
/// assert_eq!(args.len(), 2);
/// ```
pub fn json_set(field: &str, pairs: &[(&str, JsonValue)]) -> Result<Condition> {
    json_update_call("JSON_SET", field, pairs)
}

/// `field=JSON_ARRAY_APPEND(field,path,value,...)`
pub fn json_array_append(field: &str, pairs: &[(&str, JsonValue)]) -> Result<Condition> {
    json_update_call("JSON_ARRAY_APPEND", field, pairs)
}

/// `field=JSON_ARRAY_INSERT(field,path,value,...)`
pub fn json_array_insert(field: &str, pairs: &[(&str, JsonValue)]) -> Result<Condition> {
    json_update_call("JSON_ARRAY_INSERT", field, pairs)
}

/// `field=JSON_REMOVE(field,path,...)`
///
/// Paths are removed in order, so an earlier removal can shift the array
/// positions a later path refers to. No paths renders the no-op
/// `field=field`.
pub fn json_remove(field: &str, paths: &[&str]) -> Result<Condition> {
    if paths.is_empty() {
        return Ok(noop(field));
    }
    let mut args = Vec::with_capacity(paths.len());
    for path in paths {
        args.push(SqlValue::String(checked_path(path)?));
    }
    let sql = format!(
        "{}=JSON_REMOVE({},{})",
        field,
        field,
        super::condition::placeholders(args.len())
    );
    Ok(Condition::custom(sql, args))
}

fn json_update_call(function: &str, field: &str, pairs: &[(&str, JsonValue)]) -> Result<Condition> {
    if pairs.is_empty() {
        return Ok(noop(field));
    }
    let mut sql = format!("{}={}({}", field, function, field);
    let mut args = Vec::new();
    for (path, value) in pairs {
        args.push(SqlValue::String(checked_path(path)?));
        sql.push_str(",?,");
        write_json(value, &mut sql, &mut args);
    }
    sql.push(')');
    Ok(Condition::custom(sql, args))
}

fn checked_path(path: &str) -> Result<String> {
    let path = path.trim();
    if path.is_empty() {
        return Err(QueryError::InvalidJsonPath);
    }
    Ok(path.to_string())
}

fn noop(field: &str) -> Condition {
    Condition::custom(format!("{}={}", field, field), Vec::new())
}
