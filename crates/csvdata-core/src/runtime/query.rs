// crates/csvdata-core/src/runtime/query.rs
// ============================================================================
// Module: Filtered Query
// Description: Validates filter parameters, queries the store, renders HTML.
// Purpose: Implement the read path independent of any transport.
// Dependencies: crate::{core, interfaces, runtime}, thiserror
// ============================================================================

//! ## Overview
//! [`QueryService::query_filtered`] parses raw parameters, runs a read-only
//! store query, and renders the rows as HTML. Parameter errors are raised
//! before the store is touched. The query path never creates the table.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::FilterParams;
use crate::core::ParameterError;
use crate::core::RecordFilter;
use crate::core::ResultSet;
use crate::interfaces::CsvDataStore;
use crate::runtime::render::render_html_table;
use crate::runtime::store::SharedCsvDataStore;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Query failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// A filter parameter is malformed.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Failure description.
        message: String,
    },
    /// The store failed to execute the query.
    #[error("query failed: {0}")]
    Execution(String),
}

impl From<ParameterError> for QueryError {
    fn from(err: ParameterError) -> Self {
        Self::InvalidParameter {
            name: err.name,
            message: err.message,
        }
    }
}

impl QueryError {
    /// Returns a stable label for audit records.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidParameter {
                ..
            } => "invalid_parameter",
            Self::Execution(_) => "execution",
        }
    }
}

// ============================================================================
// SECTION: HTML Document
// ============================================================================

/// Rendered HTML page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlDocument {
    /// Document body.
    body: String,
    /// Number of data rows rendered.
    rows: usize,
}

impl HtmlDocument {
    /// Content type for HTML responses.
    pub const CONTENT_TYPE: &'static str = "text/html; charset=utf-8";

    /// Renders a result set.
    #[must_use]
    pub fn from_result(result: &ResultSet) -> Self {
        Self {
            body: render_html_table(result),
            rows: result.len(),
        }
    }

    /// Returns the document text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.body
    }

    /// Returns the number of data rows.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Consumes the document and returns its text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.body
    }
}

// ============================================================================
// SECTION: Service
// ============================================================================

/// Filtered read service.
#[derive(Clone)]
pub struct QueryService {
    /// Source store.
    store: SharedCsvDataStore,
}

impl QueryService {
    /// Creates a query service over `store`.
    #[must_use]
    pub const fn new(store: SharedCsvDataStore) -> Self {
        Self {
            store,
        }
    }

    /// Runs a filtered query and renders the result.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidParameter`] for malformed parameters and
    /// [`QueryError::Execution`] when the store query fails.
    pub fn query_filtered(&self, params: &FilterParams) -> Result<HtmlDocument, QueryError> {
        let filter = params.parse()?;
        let result = self.query(&filter)?;
        Ok(HtmlDocument::from_result(&result))
    }

    /// Runs a validated filter and returns raw rows.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Execution`] when the store query fails.
    pub fn query(&self, filter: &RecordFilter) -> Result<ResultSet, QueryError> {
        self.store.query(filter).map_err(|err| QueryError::Execution(err.to_string()))
    }
}
