// crates/csvdata-core/src/core/schema.rs
// ============================================================================
// Module: Record Schema
// Description: Fixed column table for the `csvdata` relation.
// Purpose: Single source of truth for table, column, and field metadata.
// Dependencies: none
// ============================================================================

//! ## Overview
//! The `csvdata` table has a fixed schema: a store-assigned `id` followed by
//! 30 nullable fields. [`RecordField`] enumerates those fields in table order
//! and maps each one to its column name and [`ColumnKind`].
//!
//! Every identifier that ever appears in SQL text comes from this module.
//! Request input only ever supplies bound values.

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Name of the target table.
pub const TABLE_NAME: &str = "csvdata";
/// Name of the store-assigned identifier column.
pub const ID_COLUMN: &str = "id";
/// Number of class grades tracked per gender.
pub const CLASS_GRADES: usize = 12;
/// Number of non-id fields in a record.
pub const FIELD_COUNT: usize = 6 + 2 * CLASS_GRADES;
/// Maximum length of short code columns (`ac_year`, `state_cd`, `district_cd`).
pub const SHORT_TEXT_MAX_LEN: usize = 10;
/// Maximum length of name columns (`state_name`, `district_name`).
pub const LONG_TEXT_MAX_LEN: usize = 255;

/// Column names for boys' enrollment counts, indexed by grade - 1.
const BOYS_COLUMNS: [&str; CLASS_GRADES] = [
    "class_1_boys",
    "class_2_boys",
    "class_3_boys",
    "class_4_boys",
    "class_5_boys",
    "class_6_boys",
    "class_7_boys",
    "class_8_boys",
    "class_9_boys",
    "class_10_boys",
    "class_11_boys",
    "class_12_boys",
];

/// Column names for girls' enrollment counts, indexed by grade - 1.
const GIRLS_COLUMNS: [&str; CLASS_GRADES] = [
    "class_1_girls",
    "class_2_girls",
    "class_3_girls",
    "class_4_girls",
    "class_5_girls",
    "class_6_girls",
    "class_7_girls",
    "class_8_girls",
    "class_9_girls",
    "class_10_girls",
    "class_11_girls",
    "class_12_girls",
];

// ============================================================================
// SECTION: Types
// ============================================================================

/// Storage kind of a record column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Text column with a maximum length in characters.
    Text {
        /// Maximum number of characters accepted by the store.
        max_len: usize,
    },
    /// Signed 64-bit integer column.
    Integer,
}

/// School class grade (1 through 12).
///
/// # Invariants
/// - The wrapped value is always within `1..=12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Grade(u8);

impl Grade {
    /// Returns the grade when `value` is within `1..=12`.
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if value >= 1 && value as usize <= CLASS_GRADES { Some(Self(value)) } else { None }
    }

    /// Returns the grade number.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Returns the zero-based array index for this grade.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize - 1
    }
}

/// One of the 30 non-id fields of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordField {
    /// Academic year identifier.
    AcYear,
    /// Age bracket.
    Age,
    /// State code.
    StateCd,
    /// State name.
    StateName,
    /// District code.
    DistrictCd,
    /// District name.
    DistrictName,
    /// Boys enrolled in the given grade.
    Boys(Grade),
    /// Girls enrolled in the given grade.
    Girls(Grade),
}

/// All record fields in table column order.
pub const RECORD_FIELDS: [RecordField; FIELD_COUNT] = [
    RecordField::AcYear,
    RecordField::Age,
    RecordField::StateCd,
    RecordField::StateName,
    RecordField::DistrictCd,
    RecordField::DistrictName,
    RecordField::Boys(Grade(1)),
    RecordField::Boys(Grade(2)),
    RecordField::Boys(Grade(3)),
    RecordField::Boys(Grade(4)),
    RecordField::Boys(Grade(5)),
    RecordField::Boys(Grade(6)),
    RecordField::Boys(Grade(7)),
    RecordField::Boys(Grade(8)),
    RecordField::Boys(Grade(9)),
    RecordField::Boys(Grade(10)),
    RecordField::Boys(Grade(11)),
    RecordField::Boys(Grade(12)),
    RecordField::Girls(Grade(1)),
    RecordField::Girls(Grade(2)),
    RecordField::Girls(Grade(3)),
    RecordField::Girls(Grade(4)),
    RecordField::Girls(Grade(5)),
    RecordField::Girls(Grade(6)),
    RecordField::Girls(Grade(7)),
    RecordField::Girls(Grade(8)),
    RecordField::Girls(Grade(9)),
    RecordField::Girls(Grade(10)),
    RecordField::Girls(Grade(11)),
    RecordField::Girls(Grade(12)),
];

impl RecordField {
    /// Returns the column name used in the table and in CSV headers.
    #[must_use]
    pub const fn column_name(self) -> &'static str {
        match self {
            Self::AcYear => "ac_year",
            Self::Age => "age",
            Self::StateCd => "state_cd",
            Self::StateName => "state_name",
            Self::DistrictCd => "district_cd",
            Self::DistrictName => "district_name",
            Self::Boys(grade) => BOYS_COLUMNS[grade.index()],
            Self::Girls(grade) => GIRLS_COLUMNS[grade.index()],
        }
    }

    /// Returns the storage kind of the column.
    #[must_use]
    pub const fn kind(self) -> ColumnKind {
        match self {
            Self::AcYear | Self::StateCd | Self::DistrictCd => ColumnKind::Text {
                max_len: SHORT_TEXT_MAX_LEN,
            },
            Self::StateName | Self::DistrictName => ColumnKind::Text {
                max_len: LONG_TEXT_MAX_LEN,
            },
            Self::Age | Self::Boys(_) | Self::Girls(_) => ColumnKind::Integer,
        }
    }

    /// Returns the zero-based position of the field in [`RECORD_FIELDS`].
    #[must_use]
    pub const fn position(self) -> usize {
        match self {
            Self::AcYear => 0,
            Self::Age => 1,
            Self::StateCd => 2,
            Self::StateName => 3,
            Self::DistrictCd => 4,
            Self::DistrictName => 5,
            Self::Boys(grade) => 6 + grade.index(),
            Self::Girls(grade) => 6 + CLASS_GRADES + grade.index(),
        }
    }

    /// Resolves a field from an exact, case-sensitive column name.
    ///
    /// The `id` column is not a record field and never resolves.
    #[must_use]
    pub fn from_column_name(name: &str) -> Option<Self> {
        RECORD_FIELDS.iter().copied().find(|field| field.column_name() == name)
    }
}

/// Returns every table column name in order, starting with `id`.
#[must_use]
pub fn table_columns() -> Vec<&'static str> {
    let mut columns = Vec::with_capacity(FIELD_COUNT + 1);
    columns.push(ID_COLUMN);
    columns.extend(RECORD_FIELDS.iter().map(|field| field.column_name()));
    columns
}

// ============================================================================
// SECTION: Tests
// ============================================================================
