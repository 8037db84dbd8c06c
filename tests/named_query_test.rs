use kite_qb::query_builder::{named_query, named_query_with_dialect, NamedArgs};
use kite_qb::{QueryError, SqlValue};

fn values(pairs: Vec<(&str, SqlValue)>) -> NamedArgs {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

#[test]
fn test_named_query_postgres() {
    let args = values(vec![
        ("id", SqlValue::Int(7)),
        ("statuses", SqlValue::array(["active", "pending"])),
    ]);
    let (sql, bound) = named_query_with_dialect(
        "postgres",
        "SELECT * FROM users WHERE id={{id}} AND status IN {{statuses}}",
        &args,
    )
    .unwrap();
    assert_eq!(sql, "SELECT * FROM users WHERE id=$1 AND status IN ($2,$3)");
    assert_eq!(
        bound,
        vec![
            SqlValue::Int(7),
            SqlValue::from("active"),
            SqlValue::from("pending")
        ]
    );
}

#[test]
fn test_named_query_default_keeps_question_marks() {
    let args = values(vec![("name", SqlValue::from("kite"))]);
    let (sql, bound) = named_query("SELECT id FROM t WHERE name = {{name}}", &args).unwrap();
    assert_eq!(sql, "SELECT id FROM t WHERE name = ?");
    assert_eq!(bound.len(), 1);
}

#[test]
fn test_named_query_errors() {
    let args = values(vec![("ids", SqlValue::Array(vec![]))]);
    assert!(matches!(
        named_query("SELECT 1 WHERE a={{missing}}", &args),
        Err(QueryError::MissingNamedParameter(ref name)) if name == "missing"
    ));
    assert!(matches!(
        named_query("SELECT 1 WHERE id IN {{ids}}", &args),
        Err(QueryError::NamedParameterValue(_))
    ));
    assert!(matches!(
        named_query_with_dialect("oracle", "SELECT 1", &args),
        Err(QueryError::UnsupportedDialect(_))
    ));
}

#[test]
fn test_tokens_with_whitespace_are_left_alone() {
    let (sql, bound) = named_query("SELECT '{{ not a token }}'", &NamedArgs::new()).unwrap();
    assert_eq!(sql, "SELECT '{{ not a token }}'");
    assert!(bound.is_empty());
}
