// crates/csvdata-core/src/core/result.rs
// ============================================================================
// Module: Result Sets
// Description: Column-labelled rows returned by store queries.
// Purpose: Carry query output from a store to the renderer.
// Dependencies: crate::core::record
// ============================================================================

//! ## Overview
//! A [`ResultSet`] keeps column names in the order the store reported them
//! and one [`CellValue`] per column for every row.

use std::fmt;

use crate::core::record::FieldValue;

/// One cell of a result row.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// SQL `NULL`.
    Null,
    /// Integer value.
    Integer(i64),
    /// Floating point value.
    Real(f64),
    /// Text value.
    Text(String),
    /// Binary value.
    Blob(Vec<u8>),
}

impl CellValue {
    /// Returns true for `NULL`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Real(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
            Self::Blob(bytes) => f.write_str(&String::from_utf8_lossy(bytes)),
        }
    }
}

impl From<FieldValue<'_>> for CellValue {
    fn from(value: FieldValue<'_>) -> Self {
        match value {
            FieldValue::Null => Self::Null,
            FieldValue::Integer(number) => Self::Integer(number),
            FieldValue::Text(text) => Self::Text(text.to_string()),
        }
    }
}

/// Query output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    /// Column names in result order.
    pub columns: Vec<String>,
    /// Rows, each with one value per column.
    pub rows: Vec<Vec<CellValue>>,
}

impl ResultSet {
    /// Returns the number of rows.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true when there are no rows.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the index of a column by name.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Returns the cell at `row` for the named column.
    #[must_use]
    pub fn value(&self, row: usize, column: &str) -> Option<&CellValue> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index)
    }
}
