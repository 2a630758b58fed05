// crates/csvdata-core/src/core/filter.rs
// ============================================================================
// Module: Record Filters
// Description: Optional query filters for the filtered read path.
// Purpose: Turn raw request parameters into a validated filter.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! [`FilterParams`] carries raw query-string values. An empty value is the
//! same as an absent one, and a repeated key keeps its last value.
//! [`FilterParams::parse`] produces a [`RecordFilter`]
//! whose `limit` is a validated non-negative integer.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Invalid filter parameter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid parameter {name}: {message}")]
pub struct ParameterError {
    /// Parameter name.
    pub name: &'static str,
    /// Failure description.
    pub message: String,
}

// ============================================================================
// SECTION: Types
// ============================================================================

/// Raw filter parameters as received from a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterParams {
    /// Exact `ac_year` match.
    #[serde(default)]
    pub ac_year: Option<String>,
    /// Exact `state_name` match.
    #[serde(default)]
    pub state_name: Option<String>,
    /// Maximum number of rows, as text.
    #[serde(default)]
    pub limit: Option<String>,
}

/// Validated filter applied by a store query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    /// Exact `ac_year` match when set.
    pub ac_year: Option<String>,
    /// Exact `state_name` match when set.
    pub state_name: Option<String>,
    /// Row cap when set.
    pub limit: Option<u64>,
}

impl FilterParams {
    /// Builds parameters from query-string pairs.
    ///
    /// A repeated key keeps its last value. Unrecognized keys are ignored.
    #[must_use]
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "ac_year" => &mut params.ac_year,
                "state_name" => &mut params.state_name,
                "limit" => &mut params.limit,
                _ => continue,
            };
            *slot = Some(value.into());
        }
        params
    }

    /// Validates the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError`] when `limit` is not a non-negative integer.
    pub fn parse(&self) -> Result<RecordFilter, ParameterError> {
        let limit = match non_empty(self.limit.as_deref()) {
            Some(raw) => Some(parse_limit(raw)?),
            None => None,
        };
        Ok(RecordFilter {
            ac_year: non_empty(self.ac_year.as_deref()).map(str::to_string),
            state_name: non_empty(self.state_name.as_deref()).map(str::to_string),
            limit,
        })
    }
}

impl RecordFilter {
    /// Returns true when the record values satisfy the equality filters.
    #[must_use]
    pub fn matches(&self, ac_year: Option<&str>, state_name: Option<&str>) -> bool {
        let ac_year_ok = self.ac_year.as_deref().is_none_or(|want| ac_year == Some(want));
        let state_ok = self.state_name.as_deref().is_none_or(|want| state_name == Some(want));
        ac_year_ok && state_ok
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Treats empty strings as absent.
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.is_empty())
}

/// Parses a limit value.
fn parse_limit(raw: &str) -> Result<u64, ParameterError> {
    let trimmed = raw.trim();
    if trimmed.starts_with('-') {
        return Err(ParameterError {
            name: "limit",
            message: format!("must be a non-negative integer, got '{raw}'"),
        });
    }
    trimmed.parse::<u64>().map_err(|_| ParameterError {
        name: "limit",
        message: format!("must be an integer, got '{raw}'"),
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::missing_docs_in_private_items,
        reason = "Test-only assertions."
    )]

    use super::*;

    fn params(ac_year: Option<&str>, state_name: Option<&str>, limit: Option<&str>) -> FilterParams {
        FilterParams {
            ac_year: ac_year.map(str::to_string),
            state_name: state_name.map(str::to_string),
            limit: limit.map(str::to_string),
        }
    }

    #[test]
    fn empty_values_are_absent() {
        let filter = params(Some(""), Some(""), Some("")).parse().unwrap();
        assert_eq!(filter, RecordFilter::default());
    }

    #[test]
    fn limit_parses_and_rejects() {
        assert_eq!(params(None, None, Some("3")).parse().unwrap().limit, Some(3));
        assert_eq!(params(None, None, Some("0")).parse().unwrap().limit, Some(0));
        let err = params(None, None, Some("abc")).parse().unwrap_err();
        assert_eq!(err.name, "limit");
        let err = params(None, None, Some("-1")).parse().unwrap_err();
        assert!(err.message.contains("non-negative"));
    }

    #[test]
    fn matches_requires_every_set_filter() {
        let filter = params(Some("2023-24"), Some("Goa"), None).parse().unwrap();
        assert!(filter.matches(Some("2023-24"), Some("Goa")));
        assert!(!filter.matches(Some("2023-24"), Some("goa")));
        assert!(!filter.matches(None, Some("Goa")));
        assert!(RecordFilter::default().matches(None, None));
    }

    #[test]
    fn repeated_keys_keep_the_last_value() {
        let pairs = [("limit", "1"), ("state_name", "Goa"), ("limit", "2"), ("page", "9")];
        let collected = FilterParams::from_pairs(pairs);
        assert_eq!(collected.limit.as_deref(), Some("2"));
        assert_eq!(collected.state_name.as_deref(), Some("Goa"));
        assert_eq!(collected.ac_year, None);
        assert_eq!(collected.parse().unwrap().limit, Some(2));
    }
}
