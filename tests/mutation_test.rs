use kite_qb::query_builder::{
    build_delete_with_dialect, build_insert, build_insert_on_duplicate,
    build_insert_on_duplicate_with_dialect, build_replace_insert_with_dialect, build_update,
    build_update_with_dialect, json_set, Builder, Dialect, Raw, UpdateSpec,
};
use kite_qb::{row, update_spec, where_spec, QueryError, SqlValue};
use serde_json::json;

#[test]
fn test_delete_postgres_with_limit() {
    let spec = where_spec! { "status" => "active", "_limit" => 5 };
    let (sql, args) = build_delete_with_dialect("postgres", "users", &spec).unwrap();
    assert_eq!(
        sql,
        "DELETE FROM users WHERE ctid IN (SELECT ctid FROM users WHERE (status=$1) LIMIT $2)"
    );
    assert_eq!(args, vec![SqlValue::from("active"), SqlValue::BigInt(5)]);
}

#[test]
fn test_delete_limit_pair_with_zero_offset() {
    let spec = where_spec! { "id >" => 10, "_limit" => [0, 2] };
    let (sql, args) = build_delete_with_dialect("mysql", "logs", &spec).unwrap();
    assert_eq!(sql, "DELETE FROM logs WHERE (id>?) LIMIT ?");
    assert_eq!(args, vec![SqlValue::Int(10), SqlValue::BigInt(2)]);
}

#[test]
fn test_mutations_reject_offset() {
    let spec = where_spec! { "_limit" => [3, 2] };
    for dialect in ["mysql", "postgres", "sqlite"] {
        assert!(matches!(
            build_delete_with_dialect(dialect, "t", &spec),
            Err(QueryError::LimitOffsetNotSupported)
        ));
        assert!(matches!(
            build_update_with_dialect(dialect, "t", &spec, &update_spec! { "a" => 1 }),
            Err(QueryError::LimitOffsetNotSupported)
        ));
    }
}

#[test]
fn test_update_ignores_select_only_clauses() {
    let spec = where_spec! { "id" => 1, "_orderby" => "id desc", "_lockMode" => "exclusive" };
    let (sql, args) = build_update("users", &spec, &update_spec! { "name" => "kite" }).unwrap();
    assert_eq!(sql, "UPDATE users SET name=? WHERE (id=?)");
    assert_eq!(args, vec![SqlValue::from("kite"), SqlValue::Int(1)]);
}

#[test]
fn test_update_raw_and_json_sets() {
    let update = UpdateSpec::new()
        .with("visits", Raw::new("visits+1"))
        .with(
            "_custom_meta",
            json_set("meta", &[("$.seen", json!(true))]).unwrap(),
        );
    let (sql, args) = build_update("pages", &where_spec! { "slug" => "home" }, &update).unwrap();
    assert_eq!(
        sql,
        "UPDATE pages SET meta=JSON_SET(meta,?,true),visits=visits+1 WHERE (slug=?)"
    );
    assert_eq!(args, vec![SqlValue::from("$.seen"), SqlValue::from("home")]);
}

#[test]
fn test_update_sqlite_limit_argument_order() {
    let spec = where_spec! { "flag" => 0, "_limit" => 50 };
    let (sql, args) =
        build_update_with_dialect("sqlite", "jobs", &spec, &update_spec! { "flag" => 1 }).unwrap();
    assert_eq!(
        sql,
        "UPDATE jobs SET flag=? WHERE rowid IN (SELECT rowid FROM jobs WHERE (flag=?) LIMIT ?)"
    );
    assert_eq!(
        args,
        vec![SqlValue::Int(1), SqlValue::Int(0), SqlValue::BigInt(50)]
    );
}

#[test]
fn test_update_empty_set_rejected() {
    assert!(matches!(
        build_update("t", &where_spec! { "id" => 1 }, &UpdateSpec::new()),
        Err(QueryError::EmptyUpdate)
    ));
}

#[test]
fn test_insert_multi_row() {
    let rows = vec![
        row! { "name" => "a", "age" => 1 },
        row! { "age" => 2, "name" => "b" },
    ];
    let (sql, args) = build_insert("people", &rows).unwrap();
    assert_eq!(sql, "INSERT INTO people (age,name) VALUES (?,?),(?,?)");
    assert_eq!(
        args,
        vec![
            SqlValue::Int(1),
            SqlValue::from("a"),
            SqlValue::Int(2),
            SqlValue::from("b")
        ]
    );

    let (sql, _) = Builder::from_dialect(Dialect::Postgres)
        .build_insert("people", &rows)
        .unwrap();
    assert_eq!(sql, "INSERT INTO people (age,name) VALUES ($1,$2),($3,$4)");
}

#[test]
fn test_insert_field_set_mismatch() {
    let rows = vec![row! { "id" => 1, "name" => "a" }, row! { "id" => 2 }];
    assert!(matches!(
        build_insert("t", &rows),
        Err(QueryError::InsertDataMismatch { row: 1, .. })
    ));
    assert!(matches!(build_insert("t", &[]), Err(QueryError::InsertNullData)));
    assert!(matches!(
        build_insert("t", &[row! {}]),
        Err(QueryError::InsertNullData)
    ));
}

#[test]
fn test_insert_null_values_bind() {
    let rows = vec![row! { "id" => 1, "note" => SqlValue::Null }];
    let (_, args) = build_insert("t", &rows).unwrap();
    assert_eq!(args, vec![SqlValue::Int(1), SqlValue::Null]);
}

#[test]
fn test_on_duplicate_mysql_only() {
    let rows = vec![row! { "id" => 1, "hits" => 1 }];
    let update = update_spec! { "hits" => Raw::new("hits+1") };
    let (sql, args) = build_insert_on_duplicate("counters", &rows, &update).unwrap();
    assert_eq!(
        sql,
        "INSERT INTO counters (hits,id) VALUES (?,?) ON DUPLICATE KEY UPDATE hits=hits+1"
    );
    assert_eq!(args.len(), 2);

    for dialect in ["postgres", "sqlite"] {
        let err = build_insert_on_duplicate_with_dialect(dialect, "counters", &rows, &update)
            .unwrap_err();
        assert!(err.is_dialect_capability());
    }
}

#[test]
fn test_replace_insert_support() {
    let rows = vec![row! { "id" => 1 }];
    let (sql, _) = build_replace_insert_with_dialect("mysql", "t", &rows).unwrap();
    assert_eq!(sql, "REPLACE INTO t (id) VALUES (?)");

    let err = build_replace_insert_with_dialect("postgres", "t", &rows).unwrap_err();
    assert!(matches!(
        err,
        QueryError::UnsupportedFeature {
            dialect: Dialect::Postgres,
            feature: "BuildReplaceInsert"
        }
    ));
}

#[test]
fn test_oversized_limit_keeps_row_cap() {
    let spec = where_spec! { "status" => "x", "_limit" => u64::MAX };
    for dialect in ["mysql", "postgres", "sqlite"] {
        assert!(matches!(
            build_delete_with_dialect(dialect, "t", &spec),
            Err(QueryError::LimitValueType)
        ));
        assert!(matches!(
            build_update_with_dialect(dialect, "t", &spec, &update_spec! { "a" => 1 }),
            Err(QueryError::LimitValueType)
        ));
    }

    let spec = where_spec! { "status" => "x", "_limit" => i64::MAX };
    let (sql, args) = build_delete_with_dialect("sqlite", "t", &spec).unwrap();
    assert_eq!(
        sql,
        "DELETE FROM t WHERE rowid IN (SELECT rowid FROM t WHERE (status=?) LIMIT ?)"
    );
    assert_eq!(args[1], SqlValue::BigInt(i64::MAX));
}

#[test]
fn test_mutations_skip_select_only_directives() {
    let spec = where_spec! {
        "id" => 1,
        "_having" => where_spec! { "x >" => 1 },
        "_lockMode" => "nowait",
    };
    let (sql, args) = build_update("t", &spec, &update_spec! { "a" => 1 }).unwrap();
    assert_eq!(sql, "UPDATE t SET a=? WHERE (id=?)");
    assert_eq!(args, vec![SqlValue::Int(1), SqlValue::Int(1)]);

    let (sql, _) = build_delete_with_dialect("sqlite", "t", &spec).unwrap();
    assert_eq!(sql, "DELETE FROM t WHERE (id=?)");
}
