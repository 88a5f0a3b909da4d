//! Integration tests against real database files.

use chaindb_common::config::DatabaseConfig;
use chaindb_common::types::{ColumnType, Value};
use chaindb_common::ChainError;
use chaindb_storage::file::{OpenOptions, StandardFile};
use chaindb_storage::{Database, JoinedTable, TableSchema};
use tempfile::tempdir;

fn uint(v: u64) -> Option<Value> {
    Some(Value::Uint(v))
}

fn text(s: &str) -> Option<Value> {
    Some(Value::str(s))
}

fn populate(db: &mut Database) {
    let a = db
        .add_table(TableSchema::new("a").column("id", ColumnType::Uint))
        .unwrap();
    let b = db
        .add_table(
            TableSchema::new("b")
                .column("a_id", ColumnType::Uint)
                .column("tag", ColumnType::Str),
        )
        .unwrap();

    for id in [1, 2, 3] {
        db.insert_row(&a, &[uint(id)]).unwrap();
    }
    for (a_id, tag) in [(1, "x"), (1, "y"), (3, "z")] {
        db.insert_row(&b, &[uint(a_id), text(tag)]).unwrap();
    }
}

#[test]
fn test_join_after_reopen() {
    let dir = tempdir().unwrap();
    let config = DatabaseConfig::with_path(dir.path().join("join.chaindb"));

    {
        let mut db = Database::open_with_config(&config).unwrap();
        populate(&mut db);
        db.sync().unwrap();
    }

    let db = Database::open_with_config(&config).unwrap();
    let joined = JoinedTable::wrap(db.table("a").unwrap())
        .join_on(db.table("b").unwrap(), "a_id", "id")
        .unwrap();

    let mut tuples: Vec<_> = joined.tuples(&db).map(Result::unwrap).collect();
    tuples.sort_by_key(|t| t[2].as_ref().map(ToString::to_string));
    assert_eq!(
        tuples,
        vec![
            vec![uint(1), uint(1), text("x")],
            vec![uint(1), uint(1), text("y")],
            vec![uint(3), uint(3), text("z")],
        ]
    );
}

#[test]
fn test_removals_persist_without_shrinking() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("unlink.chaindb");
    let config = DatabaseConfig::for_testing(&path);

    {
        let mut db = Database::open_with_config(&config).unwrap();
        populate(&mut db);

        let b = db.table("b").unwrap();
        let doomed = db
            .rows(&b)
            .map(Result::unwrap)
            .find(|row| db.get_value(row, 1).unwrap() == text("y"))
            .unwrap();
        db.remove_row(&doomed).unwrap();

        let a = db.table("a").unwrap();
        db.remove_table(a).unwrap();
    }

    let size = std::fs::metadata(&path).unwrap().len();
    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.windows(3).any(|w| w == [1, 0, b'y']));

    let db = Database::open_with_config(&DatabaseConfig::with_path(&path)).unwrap();
    assert_eq!(db.size(), size);
    assert!(db.find_table("a").unwrap().is_none());

    let b = db.table("b").unwrap();
    let tags: Vec<_> = db
        .rows(&b)
        .map(|row| db.get_value(&row.unwrap(), 1).unwrap())
        .collect();
    assert_eq!(tags, vec![text("z"), text("x")]);
}

#[test]
fn test_truncate_existing_starts_over() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("reset.chaindb");

    {
        let mut db = Database::open_with_config(&DatabaseConfig::with_path(&path)).unwrap();
        populate(&mut db);
    }

    let config = DatabaseConfig {
        truncate_existing: true,
        ..DatabaseConfig::with_path(&path)
    };
    let db = Database::open_with_config(&config).unwrap();
    assert!(db.tables().unwrap().is_empty());
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 12);
}

#[test]
fn test_open_raw_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("raw.chaindb");

    let file = StandardFile::open(&path, &OpenOptions::for_database()).unwrap();
    let mut db = Database::init(file).unwrap();
    db.add_table(TableSchema::new("t").column("n", ColumnType::Num))
        .unwrap();
    drop(db);

    let file = StandardFile::open(&path, &OpenOptions::for_read()).unwrap();
    let db = Database::open(file).unwrap();
    let table = db.table("t").unwrap();
    assert_eq!(table.columns()[0].column_type, ColumnType::Num);
}

#[test]
fn test_corrupt_file_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("corrupt.chaindb");

    {
        let mut db = Database::open_with_config(&DatabaseConfig::with_path(&path)).unwrap();
        populate(&mut db);
    }

    // Point the root past the end of the file.
    let mut bytes = std::fs::read(&path).unwrap();
    let past_end = (bytes.len() as u64 + 100).to_le_bytes();
    bytes[4..12].copy_from_slice(&past_end);
    std::fs::write(&path, &bytes).unwrap();

    let err = Database::open_with_config(&DatabaseConfig::with_path(&path)).unwrap_err();
    assert!(matches!(err, ChainError::Format { .. }));
}
