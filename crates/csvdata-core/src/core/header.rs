// crates/csvdata-core/src/core/header.rs
// ============================================================================
// Module: Header Mapping
// Description: Maps CSV header columns onto record fields.
// Purpose: Resolve header names once and build typed records per row.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! A [`HeaderMapping`] is built from the CSV header row. Each header position
//! resolves to a [`RecordField`] by exact, case-sensitive name or to nothing
//! when the column is ignored. Unknown names are handled by
//! [`UnknownColumnPolicy`]. Duplicate schema columns are always rejected.
//! Blank header names, such as the one a trailing comma produces, are
//! ignored under either policy.
//!
//! # Invariants
//! - A record field is mapped from at most one header position.
//! - `id` is never mapped; it is treated as an unknown column.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::record::EnrollmentRecord;
use crate::core::record::FieldError;
use crate::core::schema::RecordField;

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Handling for header columns outside the fixed schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownColumnPolicy {
    /// Fail the upload.
    #[default]
    Reject,
    /// Drop the column's values.
    Ignore,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Header row errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    /// Header names a column outside the schema.
    #[error("unknown column in header: '{0}'")]
    UnknownColumn(String),
    /// Header names the same schema column more than once.
    #[error("duplicate column in header: '{0}'")]
    DuplicateColumn(String),
}

/// Errors building a record from a data row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    /// Row has more fields than the header.
    #[error("row has {actual} fields but the header has {expected}")]
    TooManyFields {
        /// Header width.
        expected: usize,
        /// Row width.
        actual: usize,
    },
    /// A field value failed to convert.
    #[error(transparent)]
    Field(#[from] FieldError),
}

// ============================================================================
// SECTION: Mapping
// ============================================================================

/// Resolved header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMapping {
    /// Field per header position; `None` for ignored columns.
    slots: Vec<Option<RecordField>>,
}

impl HeaderMapping {
    /// Resolves header names against the schema.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::DuplicateColumn`] when a schema column repeats,
    /// and [`HeaderError::UnknownColumn`] for an unknown non-blank name under
    /// [`UnknownColumnPolicy::Reject`].
    pub fn from_headers<'a>(
        headers: impl IntoIterator<Item = &'a str>,
        policy: UnknownColumnPolicy,
    ) -> Result<Self, HeaderError> {
        let mut slots: Vec<Option<RecordField>> = Vec::new();
        for name in headers {
            if name.trim().is_empty() {
                slots.push(None);
                continue;
            }
            match RecordField::from_column_name(name) {
                Some(field) => {
                    if slots.contains(&Some(field)) {
                        return Err(HeaderError::DuplicateColumn(name.to_string()));
                    }
                    slots.push(Some(field));
                }
                None => match policy {
                    UnknownColumnPolicy::Reject => {
                        return Err(HeaderError::UnknownColumn(name.to_string()));
                    }
                    UnknownColumnPolicy::Ignore => slots.push(None),
                },
            }
        }
        Ok(Self {
            slots,
        })
    }

    /// Returns the header width.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.slots.len()
    }

    /// Returns the mapped fields in header order.
    pub fn mapped_fields(&self) -> impl Iterator<Item = RecordField> + '_ {
        self.slots.iter().flatten().copied()
    }

    /// Builds a record from one data row.
    ///
    /// Missing trailing values leave their fields null.
    ///
    /// # Errors
    ///
    /// Returns [`RowError`] when the row is wider than the header or a value
    /// fails to convert.
    pub fn build_record<'a>(
        &self,
        values: impl IntoIterator<Item = &'a str>,
    ) -> Result<EnrollmentRecord, RowError> {
        let values: Vec<&str> = values.into_iter().collect();
        if values.len() > self.slots.len() {
            return Err(RowError::TooManyFields {
                expected: self.slots.len(),
                actual: values.len(),
            });
        }
        let mut record = EnrollmentRecord::default();
        for (slot, raw) in self.slots.iter().zip(values) {
            if let Some(field) = slot {
                record.assign(*field, raw)?;
            }
        }
        Ok(record)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
