// crates/csvdata-core/src/runtime/mod.rs
// ============================================================================
// Module: CSV Data Runtime
// Description: Ingestion and query services plus the in-memory store.
// Purpose: Execute uploads and filtered reads against a shared store.
// Dependencies: crate::{core, interfaces}, csv
// ============================================================================

//! ## Overview
//! Runtime modules hold the service logic. Transports (HTTP, CLI) call into
//! these services so every entry point shares one behavior.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod ingest;
pub mod query;
pub mod render;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use ingest::CSV_SUFFIX;
pub use ingest::IngestError;
pub use ingest::IngestOptions;
pub use ingest::IngestReport;
pub use ingest::IngestService;
pub use query::HtmlDocument;
pub use query::QueryError;
pub use query::QueryService;
pub use render::render_html_table;
pub use store::InMemoryCsvDataStore;
pub use store::SharedCsvDataStore;
