// crates/csvdata-core/src/runtime/ingest.rs
// ============================================================================
// Module: CSV Ingestion
// Description: Parses an uploaded CSV file and stores its rows atomically.
// Purpose: Implement the upload path independent of any transport.
// Dependencies: crate::{core, interfaces, runtime::store}, csv, serde, thiserror
// ============================================================================

//! ## Overview
//! [`IngestService::ingest`] runs the upload pipeline:
//!
//! 1. reject names without the literal `.csv` suffix before touching the store
//! 2. decode the bytes as UTF-8 and drop a leading byte-order mark
//! 3. create the table when absent
//! 4. map the header row and parse every data row into a typed record
//! 5. insert all records in one transaction
//!
//! A failure after step 3 leaves the table in place with no rows from the
//! failed file.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use thiserror::Error;

use crate::core::EnrollmentRecord;
use crate::core::HeaderMapping;
use crate::core::TABLE_NAME;
use crate::core::UnknownColumnPolicy;
use crate::interfaces::CsvDataStore;
use crate::interfaces::StoreError;
use crate::runtime::store::SharedCsvDataStore;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Required file name suffix for uploads.
pub const CSV_SUFFIX: &str = ".csv";

/// UTF-8 byte-order mark.
const BOM: char = '\u{feff}';

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Ingestion failures.
///
/// # Invariants
/// - `InvalidFileType` and `Decode` are raised before the store is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    /// File name does not end with `.csv`.
    #[error("File is not CSV")]
    InvalidFileType,
    /// File content is not valid UTF-8.
    #[error("file is not valid utf-8: {0}")]
    Decode(String),
    /// Header row is unusable.
    #[error("invalid csv header: {0}")]
    InvalidHeader(String),
    /// A data row failed to parse or insert; nothing was committed.
    #[error("row {row} failed: {message}")]
    RowInsert {
        /// 1-based data row number.
        row: usize,
        /// Failure description.
        message: String,
    },
    /// File holds more data rows than allowed.
    #[error("csv file exceeds row limit of {max}")]
    TooManyRows {
        /// Configured maximum.
        max: usize,
    },
    /// Table creation failed.
    #[error("schema creation failed: {0}")]
    Schema(String),
    /// Store failed outside a specific row.
    #[error("{0}")]
    Store(String),
}

impl From<StoreError> for IngestError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::RowInsert {
                row,
                message,
            } => Self::RowInsert {
                row,
                message,
            },
            other => Self::Store(other.to_string()),
        }
    }
}

impl IngestError {
    /// Returns a stable label for audit records.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidFileType => "invalid_file_type",
            Self::Decode(_) => "decode",
            Self::InvalidHeader(_) => "invalid_header",
            Self::RowInsert {
                ..
            } => "row_insert",
            Self::TooManyRows {
                ..
            } => "too_many_rows",
            Self::Schema(_) => "schema",
            Self::Store(_) => "store",
        }
    }
}

// ============================================================================
// SECTION: Options and Reports
// ============================================================================

/// Ingestion options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestOptions {
    /// Handling for header columns outside the schema.
    pub unknown_columns: UnknownColumnPolicy,
    /// Maximum number of data rows per file.
    pub max_rows: Option<usize>,
}

/// Successful ingestion summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Target table.
    pub table_name: &'static str,
    /// Rows committed by this call.
    pub rows_inserted: u64,
}

// ============================================================================
// SECTION: Service
// ============================================================================

/// CSV ingestion service.
#[derive(Clone)]
pub struct IngestService {
    /// Target store.
    store: SharedCsvDataStore,
    /// Parsing options.
    options: IngestOptions,
}

impl IngestService {
    /// Creates an ingestion service over `store`.
    #[must_use]
    pub const fn new(store: SharedCsvDataStore, options: IngestOptions) -> Self {
        Self {
            store,
            options,
        }
    }

    /// Returns the configured options.
    #[must_use]
    pub const fn options(&self) -> IngestOptions {
        self.options
    }

    /// Ingests one CSV file.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError`] when validation, parsing, or the store fails.
    /// No rows from this file are committed on error.
    pub fn ingest(&self, file_name: &str, content: &[u8]) -> Result<IngestReport, IngestError> {
        validate_file_name(file_name)?;
        let text = decode_text(content)?;
        self.store.ensure_table().map_err(|err| IngestError::Schema(err.to_string()))?;
        let records = parse_records(text, self.options)?;
        let rows_inserted = self.store.insert_records(&records)?;
        Ok(IngestReport {
            table_name: TABLE_NAME,
            rows_inserted,
        })
    }
}

// ============================================================================
// SECTION: Pipeline Steps
// ============================================================================

/// Checks the upload file name.
///
/// # Errors
///
/// Returns [`IngestError::InvalidFileType`] unless the name ends with `.csv`.
pub fn validate_file_name(file_name: &str) -> Result<(), IngestError> {
    if file_name.ends_with(CSV_SUFFIX) { Ok(()) } else { Err(IngestError::InvalidFileType) }
}

/// Decodes content as UTF-8 and strips a leading byte-order mark.
///
/// # Errors
///
/// Returns [`IngestError::Decode`] for invalid UTF-8.
pub fn decode_text(content: &[u8]) -> Result<&str, IngestError> {
    let text = std::str::from_utf8(content).map_err(|err| IngestError::Decode(err.to_string()))?;
    Ok(text.strip_prefix(BOM).unwrap_or(text))
}

/// Parses CSV text into typed records in file order.
///
/// # Errors
///
/// Returns [`IngestError::InvalidHeader`] for an unusable header,
/// [`IngestError::RowInsert`] for a malformed row, and
/// [`IngestError::TooManyRows`] when `max_rows` is exceeded.
pub fn parse_records(
    text: &str,
    options: IngestOptions,
) -> Result<Vec<EnrollmentRecord>, IngestError> {
    let mut reader =
        csv::ReaderBuilder::new().has_headers(true).flexible(true).from_reader(text.as_bytes());
    let headers =
        reader.headers().map_err(|err| IngestError::InvalidHeader(err.to_string()))?.clone();
    let mapping = HeaderMapping::from_headers(headers.iter(), options.unknown_columns)
        .map_err(|err| IngestError::InvalidHeader(err.to_string()))?;

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row_number = index + 1;
        if let Some(max) = options.max_rows
            && records.len() >= max
        {
            return Err(IngestError::TooManyRows {
                max,
            });
        }
        let row = row.map_err(|err| IngestError::RowInsert {
            row: row_number,
            message: err.to_string(),
        })?;
        let record = mapping.build_record(row.iter()).map_err(|err| IngestError::RowInsert {
            row: row_number,
            message: err.to_string(),
        })?;
        records.push(record);
    }
    Ok(records)
}
