// crates/csvdata-core/tests/ingest_service.rs
// ============================================================================
// Module: Ingestion Service Tests
// Description: End-to-end ingestion against the in-memory store.
// ============================================================================
//! ## Overview
//! Covers file-name and encoding checks, header handling, row parsing, and
//! all-or-nothing insertion.

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
    reason = "Test-only output and panic-based assertions are permitted."
)]

use csvdata_core::CellValue;
use csvdata_core::CsvDataStore;
use csvdata_core::InMemoryCsvDataStore;
use csvdata_core::IngestError;
use csvdata_core::IngestOptions;
use csvdata_core::IngestService;
use csvdata_core::RecordFilter;
use csvdata_core::SharedCsvDataStore;
use csvdata_core::UnknownColumnPolicy;
use csvdata_core::table_columns;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn full_header() -> String {
    table_columns().into_iter().skip(1).collect::<Vec<_>>().join(",")
}

fn full_row(ac_year: &str, state_name: &str, base: i64) -> String {
    let mut cells = vec![
        ac_year.to_string(),
        "6".to_string(),
        "29".to_string(),
        state_name.to_string(),
        "2901".to_string(),
        "Bagalkot".to_string(),
    ];
    cells.extend((0 .. 24).map(|offset| (base + offset).to_string()));
    cells.join(",")
}

fn service(policy: UnknownColumnPolicy) -> (InMemoryCsvDataStore, IngestService) {
    let store = InMemoryCsvDataStore::new();
    let shared = SharedCsvDataStore::from_store(store.clone());
    let options = IngestOptions {
        unknown_columns: policy,
        max_rows: None,
    };
    (store, IngestService::new(shared, options))
}

// ============================================================================
// SECTION: File Checks
// ============================================================================

#[test]
fn non_csv_name_is_rejected_before_store_access() {
    let (store, service) = service(UnknownColumnPolicy::Reject);
    let body = format!("{}\n{}\n", full_header(), full_row("2023-24", "Karnataka", 1));
    let err = service.ingest("data.txt", body.as_bytes()).unwrap_err();
    assert_eq!(err, IngestError::InvalidFileType);
    assert_eq!(err.to_string(), "File is not CSV");
    assert!(store.query(&RecordFilter::default()).is_err(), "table must not be created");
}

#[test]
fn suffix_check_is_case_sensitive() {
    let (_, service) = service(UnknownColumnPolicy::Reject);
    let err = service.ingest("DATA.CSV", b"ac_year\n2023\n").unwrap_err();
    assert_eq!(err, IngestError::InvalidFileType);
}

#[test]
fn invalid_utf8_is_a_decode_error() {
    let (store, service) = service(UnknownColumnPolicy::Reject);
    let err = service.ingest("data.csv", b"ac_year\n\xff\xfe\n").unwrap_err();
    assert!(matches!(err, IngestError::Decode(_)));
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn byte_order_mark_is_stripped() {
    let (store, service) = service(UnknownColumnPolicy::Reject);
    let report = service.ingest("data.csv", "\u{feff}ac_year,age\n2023-24,7\n".as_bytes()).unwrap();
    assert_eq!(report.rows_inserted, 1);
    let result = store.query(&RecordFilter::default()).unwrap();
    assert_eq!(result.value(0, "ac_year"), Some(&CellValue::Text("2023-24".to_string())));
}

// ============================================================================
// SECTION: Rows
// ============================================================================

#[test]
fn well_formed_rows_are_inserted_and_reuploads_append() {
    let (store, service) = service(UnknownColumnPolicy::Reject);
    let body = format!(
        "{}\n{}\n{}\n{}\n",
        full_header(),
        full_row("2023-24", "Karnataka", 10),
        full_row("2023-24", "Kerala", 20),
        full_row("2022-23", "Karnataka", 30),
    );

    let report = service.ingest("enrollment.csv", body.as_bytes()).unwrap();
    assert_eq!(report.table_name, "csvdata");
    assert_eq!(report.rows_inserted, 3);

    let report = service.ingest("enrollment.csv", body.as_bytes()).unwrap();
    assert_eq!(report.rows_inserted, 3);
    assert_eq!(store.count().unwrap(), 6);

    let result = store.query(&RecordFilter::default()).unwrap();
    assert_eq!(result.columns.len(), 31);
    assert_eq!(result.value(1, "state_name"), Some(&CellValue::Text("Kerala".to_string())));
    assert_eq!(result.value(1, "class_1_boys"), Some(&CellValue::Integer(20)));
    assert_eq!(result.value(1, "class_12_girls"), Some(&CellValue::Integer(43)));
    let ids: Vec<_> = (0 .. result.len()).filter_map(|row| result.value(row, "id").cloned()).collect();
    assert_eq!(ids, (1 ..= 6).map(CellValue::Integer).collect::<Vec<_>>());
}

#[test]
fn one_malformed_row_commits_nothing() {
    let (store, service) = service(UnknownColumnPolicy::Reject);
    let body = "ac_year,age,state_name\n2023-24,6,Goa\n2023-24,six,Goa\n2023-24,8,Goa\n";
    let err = service.ingest("data.csv", body.as_bytes()).unwrap_err();
    match err {
        IngestError::RowInsert {
            row,
            message,
        } => {
            assert_eq!(row, 2);
            assert!(message.contains("age"), "{message}");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(store.count().unwrap(), 0);
    assert!(store.query(&RecordFilter::default()).unwrap().is_empty(), "schema stays created");
}

#[test]
fn store_rejection_rolls_back_and_reports_row() {
    let (store, service) = service(UnknownColumnPolicy::Reject);
    let long_code = "X".repeat(11);
    let body = format!("state_cd,state_name\n29,Karnataka\n{long_code},Goa\n");
    let err = service.ingest("data.csv", body.as_bytes()).unwrap_err();
    assert!(matches!(
        err,
        IngestError::RowInsert {
            row: 2,
            ..
        }
    ));
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn missing_columns_are_null_and_short_rows_pad() {
    let (store, service) = service(UnknownColumnPolicy::Reject);
    let body = "state_name,age,class_3_girls\nGoa,  9 ,\nPunjab\n";
    service.ingest("data.csv", body.as_bytes()).unwrap();
    let result = store.query(&RecordFilter::default()).unwrap();
    assert_eq!(result.value(0, "age"), Some(&CellValue::Integer(9)));
    assert_eq!(result.value(0, "class_3_girls"), Some(&CellValue::Null));
    assert_eq!(result.value(0, "ac_year"), Some(&CellValue::Null));
    assert_eq!(result.value(1, "state_name"), Some(&CellValue::Text("Punjab".to_string())));
    assert_eq!(result.value(1, "age"), Some(&CellValue::Null));
}

#[test]
fn long_row_is_malformed() {
    let (store, service) = service(UnknownColumnPolicy::Reject);
    let err = service.ingest("data.csv", b"ac_year,age\n2023,6,extra\n").unwrap_err();
    assert!(matches!(
        err,
        IngestError::RowInsert {
            row: 1,
            ..
        }
    ));
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn header_only_file_inserts_nothing() {
    let (store, service) = service(UnknownColumnPolicy::Reject);
    let report = service.ingest("empty.csv", full_header().as_bytes()).unwrap();
    assert_eq!(report.rows_inserted, 0);
    assert_eq!(store.count().unwrap(), 0);
}

// ============================================================================
// SECTION: Headers and Limits
// ============================================================================

#[test]
fn unknown_header_follows_policy() {
    let body = "ac_year,region\n2023-24,south\n";

    let (store, reject_service) = service(UnknownColumnPolicy::Reject);
    let err = reject_service.ingest("data.csv", body.as_bytes()).unwrap_err();
    assert!(matches!(err, IngestError::InvalidHeader(_)));
    assert_eq!(store.count().unwrap(), 0);

    let (store, service) = service(UnknownColumnPolicy::Ignore);
    let report = service.ingest("data.csv", body.as_bytes()).unwrap();
    assert_eq!(report.rows_inserted, 1);
    assert_eq!(store.count().unwrap(), 1);
}

#[test]
fn trailing_comma_header_is_accepted_by_default() {
    let (store, service) = service(UnknownColumnPolicy::Reject);
    let report = service.ingest("data.csv", b"ac_year,age,\r\n2023-24,6,\r\n2022-23,7,\r\n").unwrap();
    assert_eq!(report.rows_inserted, 2);
    let result = store.query(&RecordFilter::default()).unwrap();
    assert_eq!(result.value(1, "age"), Some(&CellValue::Integer(7)));
}

#[test]
fn id_header_is_never_taken_from_input() {
    let (store, service) = service(UnknownColumnPolicy::Ignore);
    service.ingest("data.csv", b"id,ac_year\n999,2023\n").unwrap();
    let result = store.query(&RecordFilter::default()).unwrap();
    assert_eq!(result.value(0, "id"), Some(&CellValue::Integer(1)));
}

#[test]
fn header_match_is_case_sensitive() {
    let (_, service) = service(UnknownColumnPolicy::Reject);
    let err = service.ingest("data.csv", b"AC_YEAR\n2023\n").unwrap_err();
    assert!(matches!(err, IngestError::InvalidHeader(_)));
}

#[test]
fn row_limit_fails_before_insert() {
    let store = InMemoryCsvDataStore::new();
    let options = IngestOptions {
        unknown_columns: UnknownColumnPolicy::Reject,
        max_rows: Some(2),
    };
    let service = IngestService::new(SharedCsvDataStore::from_store(store.clone()), options);
    let err = service.ingest("data.csv", b"age\n1\n2\n3\n").unwrap_err();
    assert_eq!(
        err,
        IngestError::TooManyRows {
            max: 2,
        }
    );
    assert_eq!(store.count().unwrap(), 0);
    assert_eq!(service.ingest("data.csv", b"age\n1\n2\n").unwrap().rows_inserted, 2);
}

#[test]
fn quoted_fields_keep_commas_and_whitespace() {
    let (store, service) = service(UnknownColumnPolicy::Reject);
    service.ingest("data.csv", b"district_name,state_name\n\"Leh, Ladakh\",\" Ladakh \"\n").unwrap();
    let result = store.query(&RecordFilter::default()).unwrap();
    assert_eq!(result.value(0, "district_name"), Some(&CellValue::Text("Leh, Ladakh".to_string())));
    assert_eq!(result.value(0, "state_name"), Some(&CellValue::Text(" Ladakh ".to_string())));
}

#[test]
fn report_serializes_table_and_count() {
    let (_, service) = service(UnknownColumnPolicy::Reject);
    let report = service.ingest("data.csv", b"age\n1\n2\n").unwrap();
    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value, serde_json::json!({"table_name": "csvdata", "rows_inserted": 2}));
}
