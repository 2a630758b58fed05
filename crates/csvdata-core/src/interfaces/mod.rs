// crates/csvdata-core/src/interfaces/mod.rs
// ============================================================================
// Module: CSV Data Interfaces
// Description: Backend-agnostic storage interface for the `csvdata` table.
// Purpose: Define the contract the ingestion and query services run against.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! [`CsvDataStore`] is the single seam between the services and a relational
//! backend. Implementations own SQL text and transactions; callers pass only
//! typed records and validated filters.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::EnrollmentRecord;
use crate::core::RecordFilter;
use crate::core::ResultSet;

// ============================================================================
// SECTION: Store
// ============================================================================

/// Store errors for the `csvdata` table.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("csv data store io error: {0}")]
    Io(String),
    /// Database engine error.
    #[error("csv data store db error: {0}")]
    Db(String),
    /// A row failed to insert; the batch was rolled back.
    #[error("row {row}: {message}")]
    RowInsert {
        /// 1-based data row number.
        row: usize,
        /// Store message for the failure.
        message: String,
    },
    /// Store input or configuration is invalid.
    #[error("csv data store invalid data: {0}")]
    Invalid(String),
    /// Store reported an error.
    #[error("csv data store error: {0}")]
    Store(String),
}

/// Relational store holding the `csvdata` table.
pub trait CsvDataStore {
    /// Creates the table when absent. Existing rows are never altered.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the schema statement fails.
    fn ensure_table(&self) -> Result<(), StoreError>;

    /// Inserts records in order inside one transaction and returns the count.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RowInsert`] for the first failing row, in which
    /// case nothing is committed. Other variants report transaction failures.
    fn insert_records(&self, records: &[EnrollmentRecord]) -> Result<u64, StoreError>;

    /// Returns rows matching `filter`, including the `id` column.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails, including when the table
    /// does not exist yet.
    fn query(&self, filter: &RecordFilter) -> Result<ResultSet, StoreError>;

    /// Returns the number of rows, or zero when the table is absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when counting fails.
    fn count(&self) -> Result<u64, StoreError>;

    /// Reports store readiness for liveness/readiness probes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store is unavailable.
    fn readiness(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
