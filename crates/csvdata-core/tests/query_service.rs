// crates/csvdata-core/tests/query_service.rs
// ============================================================================
// Module: Query Service Tests
// Description: Filtered reads and HTML rendering over the in-memory store.
// ============================================================================
//! ## Overview
//! Validates filter semantics, limit parsing, and execution errors.

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

use csvdata_core::FilterParams;
use csvdata_core::HtmlDocument;
use csvdata_core::InMemoryCsvDataStore;
use csvdata_core::IngestOptions;
use csvdata_core::IngestService;
use csvdata_core::QueryError;
use csvdata_core::QueryService;
use csvdata_core::SharedCsvDataStore;

fn seeded(rows: usize) -> QueryService {
    let store = SharedCsvDataStore::from_store(InMemoryCsvDataStore::new());
    let mut body = String::from("ac_year,state_name,age\n");
    for index in 0 .. rows {
        let year = if index % 2 == 0 { "2023-24" } else { "2022-23" };
        let state = if index % 3 == 0 { "Goa" } else { "Kerala" };
        body.push_str(&format!("{year},{state},{index}\n"));
    }
    IngestService::new(store.clone(), IngestOptions::default())
        .ingest("seed.csv", body.as_bytes())
        .unwrap();
    QueryService::new(store)
}

fn params(ac_year: Option<&str>, state_name: Option<&str>, limit: Option<&str>) -> FilterParams {
    FilterParams {
        ac_year: ac_year.map(str::to_string),
        state_name: state_name.map(str::to_string),
        limit: limit.map(str::to_string),
    }
}

#[test]
fn no_filter_returns_every_row() {
    let doc = seeded(10).query_filtered(&FilterParams::default()).unwrap();
    assert_eq!(doc.rows(), 10);
    assert!(doc.as_str().contains("<h2>Filtered Data</h2>"));
    assert_eq!(HtmlDocument::CONTENT_TYPE, "text/html; charset=utf-8");
}

#[test]
fn ac_year_filter_matches_exactly() {
    let service = seeded(10);
    let doc = service.query_filtered(&params(Some("2023-24"), None, None)).unwrap();
    assert_eq!(doc.rows(), 5);
    assert!(!doc.as_str().contains("2022-23"));
}

#[test]
fn filters_combine_with_and() {
    let doc = seeded(10).query_filtered(&params(Some("2023-24"), Some("Goa"), None)).unwrap();
    // indices 0 and 6 are even and divisible by three
    assert_eq!(doc.rows(), 2);
}

#[test]
fn limit_caps_rows_and_empty_limit_is_absent() {
    let service = seeded(10);
    assert_eq!(service.query_filtered(&params(None, None, Some("3"))).unwrap().rows(), 3);
    assert_eq!(service.query_filtered(&params(None, None, Some("0"))).unwrap().rows(), 0);
    assert_eq!(service.query_filtered(&params(Some(""), None, Some(""))).unwrap().rows(), 10);
}

#[test]
fn malformed_limit_is_invalid_parameter() {
    let service = seeded(1);
    for raw in ["abc", "-1", "1.5"] {
        let err = service.query_filtered(&params(None, None, Some(raw))).unwrap_err();
        assert!(
            matches!(err, QueryError::InvalidParameter { name: "limit", .. }),
            "limit {raw}: {err}"
        );
    }
}

#[test]
fn metacharacters_are_matched_literally() {
    let service = seeded(4);
    let doc = service.query_filtered(&params(None, Some("Goa' OR '1'='1"), None)).unwrap();
    assert_eq!(doc.rows(), 0);
}

#[test]
fn missing_table_is_execution_error() {
    let service = QueryService::new(SharedCsvDataStore::from_store(InMemoryCsvDataStore::new()));
    let err = service.query_filtered(&FilterParams::default()).unwrap_err();
    match err {
        QueryError::Execution(message) => assert!(message.contains("no such table"), "{message}"),
        other => panic!("unexpected error: {other}"),
    }
}
