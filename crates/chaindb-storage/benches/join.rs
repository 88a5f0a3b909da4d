//! Join engine benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use chaindb_common::types::{ColumnType, Value};
use chaindb_storage::file::MemoryFile;
use chaindb_storage::{Database, JoinedTable, Table, TableSchema};

/// Builds `parents(id)` with `n` rows and `children(parent_id, seq)` with
/// `fanout` rows per parent.
fn build(n: u64, fanout: u64) -> (Database<MemoryFile>, Table, Table) {
    let mut db = Database::in_memory().unwrap();
    let parents = db
        .add_table(TableSchema::new("parents").column("id", ColumnType::Uint))
        .unwrap();
    let children = db
        .add_table(
            TableSchema::new("children")
                .column("parent_id", ColumnType::Uint)
                .column("seq", ColumnType::Uint),
        )
        .unwrap();

    for id in 0..n {
        db.insert_row(&parents, &[Some(Value::Uint(id))]).unwrap();
        for seq in 0..fanout {
            db.insert_row(&children, &[Some(Value::Uint(id)), Some(Value::Uint(seq))])
                .unwrap();
        }
    }
    (db, parents, children)
}

fn scan_benchmark(c: &mut Criterion) {
    let (db, parents, _) = build(1000, 0);

    c.bench_function("scan_1000", |b| {
        b.iter(|| black_box(db.rows(&parents).count()))
    });
}

fn two_way_join_benchmark(c: &mut Criterion) {
    let (db, parents, children) = build(100, 4);
    let joined = JoinedTable::wrap(parents).join(children, 0, 0).unwrap();

    c.bench_function("join_100x400", |b| {
        b.iter(|| black_box(joined.tuples(&db).count()))
    });
}

fn sparse_join_benchmark(c: &mut Criterion) {
    let (mut db, parents, children) = build(200, 1);
    let lookup = db
        .add_table(TableSchema::new("lookup").column("seq", ColumnType::Uint))
        .unwrap();
    db.insert_row(&lookup, &[Some(Value::Uint(0))]).unwrap();

    let joined = JoinedTable::wrap(parents)
        .join(children, 0, 0)
        .unwrap()
        .join(lookup, 0, 2)
        .unwrap();

    c.bench_function("join_sparse_three_way", |b| {
        b.iter(|| black_box(joined.tuples(&db).count()))
    });
}

criterion_group!(
    benches,
    scan_benchmark,
    two_way_join_benchmark,
    sparse_join_benchmark
);
criterion_main!(benches);
