use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use tokio::runtime::Runtime;
use websql_middleware::prelude::*;
use websql_middleware::statement::plan;

fn insert_params(i: i64) -> Vec<RowValues> {
    vec![
        RowValues::Int(i),
        RowValues::Text(format!("text-{i}")),
        RowValues::Float(i as f64 / 3.0),
        RowValues::Bool(i % 2 == 0),
    ]
}

fn benchmark_planning(c: &mut Criterion) {
    let mut group = c.benchmark_group("statement_planning");
    let statements = [
        ("insert", "INSERT INTO test (a, b, c, d) VALUES (?, ?, ?, ?)"),
        ("update", "UPDATE test SET a = ?, b = ?, c = ?, d = ? WHERE id = ?"),
        ("select", "SELECT * FROM test WHERE a > 10"),
        ("delete", "DELETE FROM test WHERE id = ?"),
    ];
    let mut params = insert_params(7);
    params.push(RowValues::Int(1));

    for (name, sql) in statements {
        group.bench_function(BenchmarkId::new("plan", name), |b| {
            b.iter(|| plan(black_box(sql), black_box(&params), CollectionMode::PerStatement));
        });
    }
    group.finish();
}

fn benchmark_memory_inserts(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("memory_inserts");

    for rows in [100_i64, 1_000] {
        group.bench_function(BenchmarkId::new("transaction", rows), |b| {
            b.to_async(&rt).iter(|| async move {
                let engine: Arc<dyn StorageEngine> = Arc::new(MemoryEngine::new().unwrap());
                let db = DatabaseHandle::builder("bench").version("1").open(engine);
                db.run_transaction(
                    move |tx| {
                        for i in 0..rows {
                            tx.execute_sql(
                                "INSERT INTO test (a, b, c, d) VALUES (?, ?, ?, ?)",
                                &insert_params(i),
                                StatementCallbacks::new(),
                            );
                        }
                    },
                    TransactionCallbacks::new(),
                )
                .await
                .unwrap();
            });
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_planning, benchmark_memory_inserts);
criterion_main!(benches);
