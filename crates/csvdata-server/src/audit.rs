// crates/csvdata-server/src/audit.rs
// ============================================================================
// Module: Server Audit Logging
// Description: Structured audit events for HTTP request handling.
// Purpose: Emit redacted JSON-lines audit logs without hard dependencies.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Audit events describe each HTTP request at the metadata level: route,
//! outcome, status, sizes, and latency. Row contents and filter values are
//! never recorded. Sinks write one JSON object per line so deployments can
//! route them to any log pipeline.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// HTTP routes exposed by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditRoute {
    /// `POST /upload_csv/`.
    UploadCsv,
    /// `GET /get_filtered_data/`.
    GetFilteredData,
    /// `GET /health`.
    Health,
    /// `GET /ready`.
    Ready,
}

/// Request outcome classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// Request succeeded.
    Ok,
    /// Request failed.
    Error,
}

/// Per-request audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct RequestAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Route that served the request.
    pub route: AuditRoute,
    /// Request outcome.
    pub outcome: AuditOutcome,
    /// HTTP status code returned.
    pub status: u16,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// Rows inserted or returned when known.
    pub rows: Option<u64>,
    /// Request body size in bytes.
    pub request_bytes: usize,
    /// Handler latency in milliseconds.
    pub latency_ms: u128,
}

/// Inputs for constructing a [`RequestAuditEvent`].
#[derive(Debug, Clone, Copy)]
pub struct RequestAuditEventParams {
    /// Route that served the request.
    pub route: AuditRoute,
    /// HTTP status code returned.
    pub status: u16,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// Rows inserted or returned when known.
    pub rows: Option<u64>,
    /// Request body size in bytes.
    pub request_bytes: usize,
    /// Handler latency.
    pub latency: Duration,
}

impl RequestAuditEvent {
    /// Creates a new request audit event.
    #[must_use]
    pub fn new(params: RequestAuditEventParams) -> Self {
        let outcome =
            if params.error_kind.is_some() { AuditOutcome::Error } else { AuditOutcome::Ok };
        Self {
            event: "http_request",
            timestamp_ms: now_ms(),
            route: params.route,
            outcome,
            status: params.status,
            error_kind: params.error_kind,
            rows: params.rows,
            request_bytes: params.request_bytes,
            latency_ms: params.latency.as_millis(),
        }
    }
}

/// Server startup audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct StartupAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Bound socket address.
    pub bind: String,
    /// Configured store backend.
    pub store_type: &'static str,
}

impl StartupAuditEvent {
    /// Creates a new startup audit event.
    #[must_use]
    pub fn new(bind: String, store_type: &'static str) -> Self {
        Self {
            event: "server_started",
            timestamp_ms: now_ms(),
            bind,
            store_type,
        }
    }
}

/// Returns the current wall-clock time in milliseconds since the epoch.
fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink for server events.
pub trait AuditSink: Send + Sync {
    /// Records a per-request audit event.
    fn record(&self, event: &RequestAuditEvent);

    /// Records a startup audit event.
    fn record_startup(&self, event: &StartupAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, event: &RequestAuditEvent) {
        write_stderr_json(event);
    }

    fn record_startup(&self, event: &StartupAuditEvent) {
        write_stderr_json(event);
    }
}

/// Writes a serialized event to stderr as one line.
fn write_stderr_json(event: &impl Serialize) {
    if let Ok(payload) = serde_json::to_string(event) {
        let _ = writeln!(std::io::stderr(), "{payload}");
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Appends a serialized event and flushes.
    fn append(&self, event: &impl Serialize) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, event: &RequestAuditEvent) {
        self.append(event);
    }

    fn record_startup(&self, event: &StartupAuditEvent) {
        self.append(event);
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &RequestAuditEvent) {}

    fn record_startup(&self, _event: &StartupAuditEvent) {}
}

// ============================================================================
// SECTION: Tests
// ============================================================================
