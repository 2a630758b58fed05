// crates/csvdata-server/src/lib.rs
// ============================================================================
// Module: CSV Data Server
// Description: HTTP surface for CSV ingestion and filtered queries.
// Purpose: Bind the ingestion and query services to axum routes.
// Dependencies: csvdata-core, csvdata-config, csvdata-store-sqlite, axum, tokio
// ============================================================================

//! ## Overview
//! `csvdata-server` builds the store from configuration, serves the upload
//! and query routes, and emits one JSON audit event per request.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod config;
pub mod server;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditOutcome;
pub use audit::AuditRoute;
pub use audit::AuditSink;
pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::RequestAuditEvent;
pub use audit::StartupAuditEvent;
pub use audit::StderrAuditSink;
pub use config::CsvDataConfig;
pub use server::CsvDataServer;
pub use server::ServerError;
pub use server::UPLOAD_FIELD;
pub use server::UPLOAD_SUCCESS_MESSAGE;
pub use server::build_store;
