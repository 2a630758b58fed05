// crates/csvdata-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite CSV Data Store
// Description: Durable CsvDataStore backend using SQLite.
// Purpose: Persist ingested enrollment rows in the `csvdata` table.
// Dependencies: csvdata-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`csvdata_core::CsvDataStore`]. The
//! table is declared `STRICT` with text length checks, ids come from
//! `AUTOINCREMENT` so they are never reused, and every upload is inserted in
//! a single transaction.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqliteCsvDataStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
pub use store::create_table_sql;
pub use store::insert_sql;
