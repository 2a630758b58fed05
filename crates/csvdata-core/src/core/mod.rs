// crates/csvdata-core/src/core/mod.rs
// ============================================================================
// Module: CSV Data Core Types
// Description: Record schema, typed rows, header mapping, filters, results.
// Purpose: Provide the data types shared by stores, services, and servers.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Core types describe the fixed `csvdata` table and the values that flow
//! through ingestion and queries. They carry no I/O.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod filter;
pub mod header;
pub mod record;
pub mod result;
pub mod schema;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use filter::FilterParams;
pub use filter::ParameterError;
pub use filter::RecordFilter;
pub use header::HeaderError;
pub use header::HeaderMapping;
pub use header::RowError;
pub use header::UnknownColumnPolicy;
pub use record::EnrollmentRecord;
pub use record::FieldError;
pub use record::FieldValue;
pub use result::CellValue;
pub use result::ResultSet;
pub use schema::CLASS_GRADES;
pub use schema::ColumnKind;
pub use schema::FIELD_COUNT;
pub use schema::Grade;
pub use schema::ID_COLUMN;
pub use schema::LONG_TEXT_MAX_LEN;
pub use schema::RECORD_FIELDS;
pub use schema::RecordField;
pub use schema::SHORT_TEXT_MAX_LEN;
pub use schema::TABLE_NAME;
pub use schema::table_columns;
