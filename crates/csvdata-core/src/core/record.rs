// crates/csvdata-core/src/core/record.rs
// ============================================================================
// Module: Enrollment Record
// Description: Typed row model for the `csvdata` table.
// Purpose: Hold one parsed CSV row with per-column typing.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! [`EnrollmentRecord`] is the typed form of one table row minus its `id`.
//! Text columns are stored verbatim; integer columns accept trimmed decimal
//! input where an empty value means null.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::schema::CLASS_GRADES;
use crate::core::schema::ColumnKind;
use crate::core::schema::RECORD_FIELDS;
use crate::core::schema::RecordField;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while assigning or checking record fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// Value for an integer column is not a signed 64-bit integer.
    #[error("invalid integer for column {column}: '{value}'")]
    NotAnInteger {
        /// Column name.
        column: &'static str,
        /// Raw input value.
        value: String,
    },
    /// Value for a text column exceeds the column length limit.
    #[error("value too long for column {column}: {actual} characters (max {max_len})")]
    TooLong {
        /// Column name.
        column: &'static str,
        /// Maximum allowed characters.
        max_len: usize,
        /// Actual characters supplied.
        actual: usize,
    },
}

// ============================================================================
// SECTION: Field Values
// ============================================================================

/// Borrowed view of a single field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    /// SQL `NULL`.
    Null,
    /// Integer value.
    Integer(i64),
    /// Text value.
    Text(&'a str),
}

// ============================================================================
// SECTION: Record
// ============================================================================

/// One row of the `csvdata` table, excluding the store-assigned `id`.
///
/// # Invariants
/// - `class_boys[n]` and `class_girls[n]` hold grade `n + 1`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentRecord {
    /// Academic year identifier.
    pub ac_year: Option<String>,
    /// Age bracket.
    pub age: Option<i64>,
    /// State code.
    pub state_cd: Option<String>,
    /// State name.
    pub state_name: Option<String>,
    /// District code.
    pub district_cd: Option<String>,
    /// District name.
    pub district_name: Option<String>,
    /// Boys enrolled per grade.
    pub class_boys: [Option<i64>; CLASS_GRADES],
    /// Girls enrolled per grade.
    pub class_girls: [Option<i64>; CLASS_GRADES],
}

impl EnrollmentRecord {
    /// Returns the value of `field`.
    #[must_use]
    pub fn get(&self, field: RecordField) -> FieldValue<'_> {
        match field {
            RecordField::AcYear => text_value(self.ac_year.as_deref()),
            RecordField::StateCd => text_value(self.state_cd.as_deref()),
            RecordField::StateName => text_value(self.state_name.as_deref()),
            RecordField::DistrictCd => text_value(self.district_cd.as_deref()),
            RecordField::DistrictName => text_value(self.district_name.as_deref()),
            RecordField::Age => integer_value(self.age),
            RecordField::Boys(grade) => integer_value(self.class_boys[grade.index()]),
            RecordField::Girls(grade) => integer_value(self.class_girls[grade.index()]),
        }
    }

    /// Assigns a raw CSV cell to `field`.
    ///
    /// Text columns keep `raw` verbatim. Integer columns trim `raw`; an empty
    /// result is null.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::NotAnInteger`] when an integer column receives a
    /// value that does not parse as `i64`.
    pub fn assign(&mut self, field: RecordField, raw: &str) -> Result<(), FieldError> {
        match field.kind() {
            ColumnKind::Text {
                ..
            } => {
                self.set_text(field, Some(raw.to_string()));
                Ok(())
            }
            ColumnKind::Integer => {
                let value = parse_integer(field, raw)?;
                self.set_integer(field, value);
                Ok(())
            }
        }
    }

    /// Sets a text column. Integer fields are left untouched.
    pub fn set_text(&mut self, field: RecordField, value: Option<String>) {
        let slot = match field {
            RecordField::AcYear => &mut self.ac_year,
            RecordField::StateCd => &mut self.state_cd,
            RecordField::StateName => &mut self.state_name,
            RecordField::DistrictCd => &mut self.district_cd,
            RecordField::DistrictName => &mut self.district_name,
            RecordField::Age | RecordField::Boys(_) | RecordField::Girls(_) => return,
        };
        *slot = value;
    }

    /// Sets an integer column. Text fields are left untouched.
    pub fn set_integer(&mut self, field: RecordField, value: Option<i64>) {
        let slot = match field {
            RecordField::Age => &mut self.age,
            RecordField::Boys(grade) => &mut self.class_boys[grade.index()],
            RecordField::Girls(grade) => &mut self.class_girls[grade.index()],
            RecordField::AcYear
            | RecordField::StateCd
            | RecordField::StateName
            | RecordField::DistrictCd
            | RecordField::DistrictName => return,
        };
        *slot = value;
    }

    /// Checks text columns against their length limits.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::TooLong`] for the first column over its limit.
    pub fn check_lengths(&self) -> Result<(), FieldError> {
        for field in RECORD_FIELDS {
            if let ColumnKind::Text {
                max_len,
            } = field.kind()
                && let FieldValue::Text(text) = self.get(field)
            {
                let actual = text.chars().count();
                if actual > max_len {
                    return Err(FieldError::TooLong {
                        column: field.column_name(),
                        max_len,
                        actual,
                    });
                }
            }
        }
        Ok(())
    }

    /// Iterates fields and values in table column order.
    pub fn values(&self) -> impl Iterator<Item = (RecordField, FieldValue<'_>)> {
        RECORD_FIELDS.iter().map(move |field| (*field, self.get(*field)))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Wraps an optional text slot as a [`FieldValue`].
const fn text_value(value: Option<&str>) -> FieldValue<'_> {
    match value {
        Some(text) => FieldValue::Text(text),
        None => FieldValue::Null,
    }
}

/// Wraps an optional integer slot as a [`FieldValue`].
const fn integer_value(value: Option<i64>) -> FieldValue<'static> {
    match value {
        Some(number) => FieldValue::Integer(number),
        None => FieldValue::Null,
    }
}

/// Parses a raw integer cell.
fn parse_integer(field: RecordField, raw: &str) -> Result<Option<i64>, FieldError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed.parse::<i64>().map(Some).map_err(|_| FieldError::NotAnInteger {
        column: field.column_name(),
        value: raw.to_string(),
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
