use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kite_qb::query_builder::{Builder, Dialect, NamedArgs, Row, WhereSpec};
use kite_qb::{row, update_spec, where_spec, SqlValue};

fn select_spec() -> WhereSpec {
    where_spec! {
        "status" => "active",
        "age >=" => 18,
        "role in" => ["admin", "editor", "viewer"],
        "created_at between" => ["2024-01-01", "2024-12-31"],
        "_orderby" => "created_at desc, id",
        "_limit" => [100, 50],
    }
}

fn bench_select(c: &mut Criterion) {
    let spec = select_spec();
    for dialect in [Dialect::MySql, Dialect::Postgres] {
        let builder = Builder::from_dialect(dialect);
        c.bench_function(&format!("build_select/{}", dialect), |b| {
            b.iter(|| builder.build_select(black_box("users"), black_box(&spec), &["id", "name"]))
        });
    }
}

fn bench_insert(c: &mut Criterion) {
    let rows: Vec<Row> = (0..100)
        .map(|i| row! { "id" => i, "name" => format!("user{}", i), "score" => i as f64 * 1.5 })
        .collect();
    let builder = Builder::from_dialect(Dialect::Postgres);
    let update = update_spec! { "score" => 0.0 };

    c.bench_function("build_insert/100_rows", |b| {
        b.iter(|| builder.build_insert(black_box("users"), black_box(&rows)))
    });
    c.bench_function("build_upsert/100_rows", |b| {
        b.iter(|| builder.build_upsert(black_box("users"), black_box(&rows), &["id"], Some(&update)))
    });
}

fn bench_named_query(c: &mut Criterion) {
    let mut values = NamedArgs::new();
    values.insert("id".to_string(), SqlValue::Int(7));
    values.insert(
        "statuses".to_string(),
        SqlValue::array(["active", "pending", "locked"]),
    );
    let builder = Builder::from_dialect(Dialect::Postgres);

    c.bench_function("named_query", |b| {
        b.iter(|| {
            builder.named_query(
                black_box("SELECT * FROM users WHERE id={{id}} AND status IN {{statuses}}"),
                black_box(&values),
            )
        })
    });
}

criterion_group!(benches, bench_select, bench_insert, bench_named_query);
criterion_main!(benches);
