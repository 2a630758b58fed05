// crates/csvdata-store-sqlite/tests/sqlite_store_unit.rs
// ============================================================================
// Module: SQLite Store Unit Tests
// Description: Targeted tests for the SQLite csv data store.
// Purpose: Validate path safety, schema idempotence, transactional inserts,
//          filters, and id allocation.
// ============================================================================

//! ## Overview
//! Unit-level tests for `SQLite` store invariants:
//! - Path safety checks (empty/component/directory rejection)
//! - Idempotent table creation that preserves rows
//! - All-or-nothing inserts with row-numbered errors
//! - Bound filters and limits, including metacharacter values
//! - Ids never reused after out-of-band deletes

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_docs_in_private_items,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use csvdata_core::CellValue;
use csvdata_core::CsvDataStore;
use csvdata_core::EnrollmentRecord;
use csvdata_core::IngestError;
use csvdata_core::IngestOptions;
use csvdata_core::IngestService;
use csvdata_core::RecordFilter;
use csvdata_core::SharedCsvDataStore;
use csvdata_core::StoreError;
use csvdata_store_sqlite::SqliteCsvDataStore;
use csvdata_store_sqlite::SqliteStoreConfig;
use csvdata_store_sqlite::SqliteStoreError;
use csvdata_store_sqlite::SqliteStoreMode;
use csvdata_store_sqlite::SqliteSyncMode;
use rusqlite::Connection;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

const fn config_for_path(path: PathBuf) -> SqliteStoreConfig {
    SqliteStoreConfig {
        path,
        busy_timeout_ms: 1_000,
        journal_mode: SqliteStoreMode::Wal,
        sync_mode: SqliteSyncMode::Full,
    }
}

fn store_for(path: &Path) -> SqliteCsvDataStore {
    SqliteCsvDataStore::new(config_for_path(path.to_path_buf())).expect("store init")
}

fn record(ac_year: &str, state_name: &str, age: Option<i64>) -> EnrollmentRecord {
    EnrollmentRecord {
        ac_year: Some(ac_year.to_string()),
        state_name: Some(state_name.to_string()),
        age,
        ..EnrollmentRecord::default()
    }
}

fn ids(store: &SqliteCsvDataStore) -> Vec<CellValue> {
    let result = store.query(&RecordFilter::default()).unwrap();
    (0 .. result.len()).filter_map(|row| result.value(row, "id").cloned()).collect()
}

// ============================================================================
// SECTION: Path Safety
// ============================================================================

#[test]
fn sqlite_store_rejects_directory_path() {
    let temp = TempDir::new().unwrap();
    let result = SqliteCsvDataStore::new(config_for_path(temp.path().to_path_buf()));
    assert!(matches!(result, Err(SqliteStoreError::Invalid(_))));
}

#[test]
fn sqlite_store_rejects_empty_path() {
    let result = SqliteCsvDataStore::new(config_for_path(PathBuf::new()));
    assert!(matches!(result, Err(SqliteStoreError::Invalid(_))));
}

#[test]
fn sqlite_store_rejects_overlong_component() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("a".repeat(300)).join("store.db");
    let result = SqliteCsvDataStore::new(config_for_path(path));
    assert!(matches!(result, Err(SqliteStoreError::Invalid(_))));
}

#[test]
fn sqlite_store_creates_parent_directories() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("deeper").join("store.db");
    let store = store_for(&path);
    assert!(path.parent().unwrap().is_dir());
    assert_eq!(store.config().path, path);
    assert!(store.readiness().is_ok());
}

// ============================================================================
// SECTION: Schema
// ============================================================================

#[test]
fn table_is_absent_until_ensured() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("store.db"));
    assert_eq!(store.count().unwrap(), 0);
    let err = store.query(&RecordFilter::default()).unwrap_err();
    assert!(err.to_string().contains("no such table"), "{err}");
}

#[test]
fn ensure_table_is_idempotent_and_preserves_rows() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("store.db"));
    store.ensure_table().unwrap();
    store.insert_records(&[record("2023-24", "Goa", Some(6))]).unwrap();
    store.ensure_table().unwrap();
    store.ensure_table().unwrap();
    assert_eq!(store.count().unwrap(), 1);

    let result = store.query(&RecordFilter::default()).unwrap();
    assert_eq!(result.columns.len(), 31);
    assert_eq!(result.columns[0], "id");
    assert_eq!(result.columns[30], "class_12_girls");
    assert_eq!(result.value(0, "age"), Some(&CellValue::Integer(6)));
    assert_eq!(result.value(0, "district_cd"), Some(&CellValue::Null));
}

#[test]
fn rows_survive_reopen() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("store.db");
    {
        let store = store_for(&path);
        store.ensure_table().unwrap();
        store.insert_records(&[record("2023-24", "Goa", None)]).unwrap();
    }
    let store = store_for(&path);
    assert_eq!(store.count().unwrap(), 1);
}

// ============================================================================
// SECTION: Inserts
// ============================================================================

#[test]
fn check_violation_rolls_back_whole_batch() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("store.db"));
    store.ensure_table().unwrap();
    let batch = vec![
        record("2023-24", "Goa", Some(1)),
        record("2023-24", "Kerala", Some(2)),
        record("2023-2024-extra", "Punjab", Some(3)),
    ];
    let err = store.insert_records(&batch).unwrap_err();
    match err {
        StoreError::RowInsert {
            row,
            message,
        } => {
            assert_eq!(row, 3);
            assert!(message.contains("CHECK"), "{message}");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn insert_without_table_fails() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("store.db"));
    let err = store.insert_records(&[record("2023-24", "Goa", None)]).unwrap_err();
    assert!(matches!(err, StoreError::Db(_)), "{err}");
}

#[test]
fn ids_are_never_reused_after_out_of_band_delete() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("store.db");
    let store = store_for(&path);
    store.ensure_table().unwrap();
    store
        .insert_records(&[record("a", "x", None), record("b", "y", None), record("c", "z", None)])
        .unwrap();

    let connection = Connection::open(&path).unwrap();
    connection.execute("DELETE FROM csvdata WHERE id = 3", []).unwrap();
    drop(connection);

    store.insert_records(&[record("d", "w", None)]).unwrap();
    assert_eq!(ids(&store), vec![CellValue::Integer(1), CellValue::Integer(2), CellValue::Integer(4)]);
}

#[test]
fn concurrent_batches_are_serialized() {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(store_for(&temp.path().join("store.db")));
    store.ensure_table().unwrap();
    let handles: Vec<_> = (0 .. 4)
        .map(|worker| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let batch: Vec<_> =
                    (0 .. 25).map(|n| record(&format!("w{worker}"), "Goa", Some(n))).collect();
                store.insert_records(&batch).unwrap()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 25);
    }
    assert_eq!(store.count().unwrap(), 100);
}

// ============================================================================
// SECTION: Queries
// ============================================================================

fn seeded_store(temp: &TempDir) -> SqliteCsvDataStore {
    let store = store_for(&temp.path().join("store.db"));
    store.ensure_table().unwrap();
    let batch: Vec<_> = (0 .. 10)
        .map(|n| {
            let year = if n < 4 { "2023-24" } else { "2022-23" };
            let state = if n % 2 == 0 { "Goa" } else { "Kerala" };
            record(year, state, Some(n))
        })
        .collect();
    store.insert_records(&batch).unwrap();
    store
}

#[test]
fn filters_and_limit_apply() {
    let temp = TempDir::new().unwrap();
    let store = seeded_store(&temp);

    let all = store.query(&RecordFilter::default()).unwrap();
    assert_eq!(all.len(), 10);

    let by_year = store
        .query(&RecordFilter {
            ac_year: Some("2023-24".to_string()),
            ..RecordFilter::default()
        })
        .unwrap();
    assert_eq!(by_year.len(), 4);

    let both = store
        .query(&RecordFilter {
            ac_year: Some("2023-24".to_string()),
            state_name: Some("Goa".to_string()),
            limit: None,
        })
        .unwrap();
    assert_eq!(both.len(), 2);

    let limited = store
        .query(&RecordFilter {
            limit: Some(3),
            ..RecordFilter::default()
        })
        .unwrap();
    assert_eq!(limited.len(), 3);
}

#[test]
fn metacharacter_values_are_bound_not_interpreted() {
    let temp = TempDir::new().unwrap();
    let store = seeded_store(&temp);
    let result = store
        .query(&RecordFilter {
            state_name: Some("Goa' OR '1'='1".to_string()),
            ..RecordFilter::default()
        })
        .unwrap();
    assert!(result.is_empty());
    assert_eq!(store.count().unwrap(), 10);
}

#[test]
fn ingestion_over_sqlite_reports_failing_row() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("store.db"));
    let service =
        IngestService::new(SharedCsvDataStore::from_store(store.clone()), IngestOptions::default());
    let body = "state_cd,age\n29,6\n290000000001,7\n";
    let err = service.ingest("upload.csv", body.as_bytes()).unwrap_err();
    assert!(matches!(
        err,
        IngestError::RowInsert {
            row: 2,
            ..
        }
    ));
    assert_eq!(store.count().unwrap(), 0);

    let report = service.ingest("upload.csv", b"state_cd,age\n29,6\n").unwrap();
    assert_eq!(report.rows_inserted, 1);
    assert_eq!(ids(&store), vec![CellValue::Integer(1)]);
}
