// crates/csvdata-config/src/lib.rs
// ============================================================================
// Module: CSV Data Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for csvdata.toml semantics.
// Dependencies: csvdata-core, csvdata-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `csvdata-config` defines the configuration model for the csvdata server
//! and CLI. Loading is strict: bounded paths and sizes, UTF-8 only, and
//! validation before any value is used.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
