// crates/csvdata-server/src/server.rs
// ============================================================================
// Module: HTTP Server
// Description: Axum router for CSV ingestion and filtered queries.
// Purpose: Expose the ingestion and query services over HTTP.
// Dependencies: csvdata-core, csvdata-config, csvdata-store-sqlite, axum, tokio
// ============================================================================

//! ## Overview
//! The server owns one [`SharedCsvDataStore`] built at startup and routes
//! `POST /upload_csv/` to [`IngestService`] and `GET /get_filtered_data/` to
//! [`QueryService`]. Store calls are blocking and run inside
//! `block_in_place` on the multi-threaded runtime. Every request emits one
//! audit event. Failures surface as `400 {"error": ...}`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::extract::Multipart;
use axum::extract::Query;
use axum::extract::State;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use csvdata_core::CsvDataStore;
use csvdata_core::FilterParams;
use csvdata_core::HtmlDocument;
use csvdata_core::InMemoryCsvDataStore;
use csvdata_core::IngestOptions;
use csvdata_core::IngestReport;
use csvdata_core::IngestService;
use csvdata_core::QueryService;
use csvdata_core::SharedCsvDataStore;
use csvdata_store_sqlite::SqliteCsvDataStore;
use serde::Serialize;
use tokio::net::TcpListener;

use crate::audit::AuditRoute;
use crate::audit::AuditSink;
use crate::audit::FileAuditSink;
use crate::audit::NoopAuditSink;
use crate::audit::RequestAuditEvent;
use crate::audit::RequestAuditEventParams;
use crate::audit::StartupAuditEvent;
use crate::audit::StderrAuditSink;
use crate::config::CsvDataConfig;
use crate::config::ServerAuditConfig;
use crate::config::StoreType;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Multipart field carrying the uploaded file.
pub const UPLOAD_FIELD: &str = "file";

/// Success message for completed uploads.
pub const UPLOAD_SUCCESS_MESSAGE: &str = "CSV data uploaded successfully";

// ============================================================================
// SECTION: Server
// ============================================================================

/// HTTP server instance.
pub struct CsvDataServer {
    /// Server configuration.
    config: CsvDataConfig,
    /// Shared handler state.
    state: Arc<ServerState>,
}

impl CsvDataServer {
    /// Builds a new server from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when validation or store/audit setup fails.
    pub fn from_config(config: CsvDataConfig) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        let store = build_store(&config)?;
        let audit = build_audit_sink(&config.server.audit)?;
        let state = build_server_state(store, config.ingest.options(), audit);
        Ok(Self {
            config,
            state,
        })
    }

    /// Returns the store shared by all handlers.
    #[must_use]
    pub fn store(&self) -> SharedCsvDataStore {
        self.state.store.clone()
    }

    /// Binds the configured address and serves requests.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        let addr =
            self.config.server.bind_addr().map_err(|err| ServerError::Config(err.to_string()))?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|_| ServerError::Transport("http bind failed".to_string()))?;
        self.serve_listener(listener).await
    }

    /// Serves requests on an already bound listener.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when serving fails.
    pub async fn serve_listener(self, listener: TcpListener) -> Result<(), ServerError> {
        let local: SocketAddr = listener
            .local_addr()
            .map_err(|_| ServerError::Transport("http bind failed".to_string()))?;
        self.state.audit.record_startup(&StartupAuditEvent::new(
            local.to_string(),
            self.config.store.store_type.as_str(),
        ));
        let app = build_router(Arc::clone(&self.state), self.config.server.max_body_bytes);
        axum::serve(listener, app)
            .await
            .map_err(|_| ServerError::Transport("http server failed".to_string()))
    }
}

/// Builds the shared store from configuration.
///
/// # Errors
///
/// Returns [`ServerError`] when the configured store cannot be opened.
pub fn build_store(config: &CsvDataConfig) -> Result<SharedCsvDataStore, ServerError> {
    let store = match config.store.store_type {
        StoreType::Memory => SharedCsvDataStore::from_store(InMemoryCsvDataStore::new()),
        StoreType::Sqlite => {
            let sqlite_config = config
                .store
                .sqlite_config()
                .ok_or_else(|| ServerError::Config("sqlite store requires path".to_string()))?;
            let store = SqliteCsvDataStore::new(sqlite_config)
                .map_err(|err| ServerError::Init(err.to_string()))?;
            SharedCsvDataStore::from_store(store)
        }
    };
    Ok(store)
}

/// Builds the audit sink from configuration.
fn build_audit_sink(config: &ServerAuditConfig) -> Result<Arc<dyn AuditSink>, ServerError> {
    if !config.enabled {
        return Ok(Arc::new(NoopAuditSink));
    }
    match config.path.as_deref() {
        Some(path) => {
            let sink = FileAuditSink::new(Path::new(path))
                .map_err(|err| ServerError::Init(format!("audit log open failed: {err}")))?;
            Ok(Arc::new(sink))
        }
        None => Ok(Arc::new(StderrAuditSink)),
    }
}

/// Assembles handler state over a store.
fn build_server_state(
    store: SharedCsvDataStore,
    options: IngestOptions,
    audit: Arc<dyn AuditSink>,
) -> Arc<ServerState> {
    Arc::new(ServerState {
        ingest: IngestService::new(store.clone(), options),
        query: QueryService::new(store.clone()),
        store,
        audit,
    })
}

/// Builds the HTTP router.
fn build_router(state: Arc<ServerState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/upload_csv/", post(handle_upload_csv))
        .route("/get_filtered_data/", get(handle_get_filtered_data))
        .route("/health", get(handle_health))
        .route("/ready", get(handle_ready))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

/// Shared server state for HTTP handlers.
struct ServerState {
    /// Ingestion service.
    ingest: IngestService,
    /// Query service.
    query: QueryService,
    /// Store used for readiness probes.
    store: SharedCsvDataStore,
    /// Audit sink for request logging.
    audit: Arc<dyn AuditSink>,
}

impl ServerState {
    /// Records one request audit event.
    fn record(&self, route: AuditRoute, summary: &RequestSummary, started: Instant) {
        self.audit.record(&RequestAuditEvent::new(RequestAuditEventParams {
            route,
            status: summary.status.as_u16(),
            error_kind: summary.error_kind,
            rows: summary.rows,
            request_bytes: summary.request_bytes,
            latency: started.elapsed(),
        }));
    }
}

/// Audit-relevant facts about a handled request.
struct RequestSummary {
    /// Response status.
    status: StatusCode,
    /// Error label when the request failed.
    error_kind: Option<&'static str>,
    /// Rows inserted or returned.
    rows: Option<u64>,
    /// Uploaded payload size.
    request_bytes: usize,
}

impl RequestSummary {
    /// Summary for a failed request.
    const fn failed(error: &HandlerError, request_bytes: usize) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error_kind: Some(error.kind),
            rows: None,
            request_bytes,
        }
    }
}

// ============================================================================
// SECTION: Payloads
// ============================================================================

/// Successful upload response body.
#[derive(Debug, Serialize)]
struct UploadResponse {
    /// Human-readable status.
    message: &'static str,
    /// Target table.
    table_name: &'static str,
    /// Rows committed by the upload.
    rows_inserted: u64,
}

impl From<IngestReport> for UploadResponse {
    fn from(report: IngestReport) -> Self {
        Self {
            message: UPLOAD_SUCCESS_MESSAGE,
            table_name: report.table_name,
            rows_inserted: report.rows_inserted,
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Failure description.
    error: String,
}

/// Probe response body.
#[derive(Debug, Serialize)]
struct StatusResponse {
    /// Probe status label.
    status: &'static str,
    /// Failure description when not ready.
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Handler failure with an audit label.
#[derive(Debug)]
struct HandlerError {
    /// Stable error label.
    kind: &'static str,
    /// Client-visible message.
    message: String,
}

impl HandlerError {
    /// Creates a handler error.
    const fn new(kind: &'static str, message: String) -> Self {
        Self {
            kind,
            message,
        }
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

/// Uploaded file extracted from a multipart body.
struct UploadedFile {
    /// Client-supplied file name.
    file_name: String,
    /// Raw file bytes.
    content: Bytes,
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Handles `POST /upload_csv/`.
async fn handle_upload_csv(
    State(state): State<Arc<ServerState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let started = Instant::now();
    let upload = match multipart {
        Ok(multipart) => read_upload(multipart).await,
        Err(rejection) => Err(HandlerError::new("multipart", rejection.body_text())),
    };
    let upload = match upload {
        Ok(upload) => upload,
        Err(error) => {
            state.record(AuditRoute::UploadCsv, &RequestSummary::failed(&error, 0), started);
            return error.into_response();
        }
    };
    let request_bytes = upload.content.len();
    let result = run_blocking(|| state.ingest.ingest(&upload.file_name, &upload.content))
        .map_err(|err| HandlerError::new(err.kind(), err.to_string()));
    match result {
        Ok(report) => {
            let summary = RequestSummary {
                status: StatusCode::CREATED,
                error_kind: None,
                rows: Some(report.rows_inserted),
                request_bytes,
            };
            state.record(AuditRoute::UploadCsv, &summary, started);
            (StatusCode::CREATED, Json(UploadResponse::from(report))).into_response()
        }
        Err(error) => {
            state.record(
                AuditRoute::UploadCsv,
                &RequestSummary::failed(&error, request_bytes),
                started,
            );
            error.into_response()
        }
    }
}

/// Reads the `file` field from a multipart body.
async fn read_upload(mut multipart: Multipart) -> Result<UploadedFile, HandlerError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| HandlerError::new("multipart", err.body_text()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content =
            field.bytes().await.map_err(|err| HandlerError::new("multipart", err.body_text()))?;
        return Ok(UploadedFile {
            file_name,
            content,
        });
    }
    Err(HandlerError::new("missing_file", format!("missing multipart field: {UPLOAD_FIELD}")))
}

/// Handles `GET /get_filtered_data/`.
async fn handle_get_filtered_data(
    State(state): State<Arc<ServerState>>,
    pairs: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Response {
    let started = Instant::now();
    let result = match pairs {
        Ok(Query(pairs)) => {
            let params = FilterParams::from_pairs(pairs);
            run_blocking(|| state.query.query_filtered(&params))
                .map_err(|err| HandlerError::new(err.kind(), err.to_string()))
        }
        Err(rejection) => Err(HandlerError::new("invalid_parameter", rejection.body_text())),
    };
    match result {
        Ok(document) => {
            let summary = RequestSummary {
                status: StatusCode::OK,
                error_kind: None,
                rows: u64::try_from(document.rows()).ok(),
                request_bytes: 0,
            };
            state.record(AuditRoute::GetFilteredData, &summary, started);
            (StatusCode::OK, [(CONTENT_TYPE, HtmlDocument::CONTENT_TYPE)], document.into_string())
                .into_response()
        }
        Err(error) => {
            state.record(AuditRoute::GetFilteredData, &RequestSummary::failed(&error, 0), started);
            error.into_response()
        }
    }
}

/// Handles `GET /health`.
async fn handle_health(State(state): State<Arc<ServerState>>) -> Response {
    let started = Instant::now();
    let summary = RequestSummary {
        status: StatusCode::OK,
        error_kind: None,
        rows: None,
        request_bytes: 0,
    };
    state.record(AuditRoute::Health, &summary, started);
    (
        StatusCode::OK,
        Json(StatusResponse {
            status: "ok",
            error: None,
        }),
    )
        .into_response()
}

/// Handles `GET /ready`.
async fn handle_ready(State(state): State<Arc<ServerState>>) -> Response {
    let started = Instant::now();
    let (status, body, error_kind) = match run_blocking(|| state.store.readiness()) {
        Ok(()) => (
            StatusCode::OK,
            StatusResponse {
                status: "ready",
                error: None,
            },
            None,
        ),
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            StatusResponse {
                status: "not_ready",
                error: Some(err.to_string()),
            },
            Some("not_ready"),
        ),
    };
    let summary = RequestSummary {
        status,
        error_kind,
        rows: None,
        request_bytes: 0,
    };
    state.record(AuditRoute::Ready, &summary, started);
    (status, Json(body)).into_response()
}

/// Runs a blocking store call, shifting to a blocking context when available.
fn run_blocking<T>(call: impl FnOnce() -> T) -> T {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == tokio::runtime::RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(call)
        }
        _ => call(),
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Tests
// ============================================================================
