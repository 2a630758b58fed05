// crates/csvdata-core/src/lib.rs
// ============================================================================
// Module: CSV Data Core Library
// Description: Public API surface for the csvdata core.
// Purpose: Expose core types, the store interface, and runtime services.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! csvdata core ingests enrollment CSV files into the fixed `csvdata` table
//! and serves filtered reads of that table as HTML. It is transport-agnostic
//! and reaches storage only through [`CsvDataStore`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::CsvDataStore;
pub use interfaces::StoreError;
pub use runtime::CSV_SUFFIX;
pub use runtime::HtmlDocument;
pub use runtime::InMemoryCsvDataStore;
pub use runtime::IngestError;
pub use runtime::IngestOptions;
pub use runtime::IngestReport;
pub use runtime::IngestService;
pub use runtime::QueryError;
pub use runtime::QueryService;
pub use runtime::SharedCsvDataStore;
pub use runtime::render_html_table;
