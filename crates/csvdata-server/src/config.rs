// crates/csvdata-server/src/config.rs
// ============================================================================
// Module: Server Configuration (Re-export)
// Description: Re-export canonical csvdata config types.
// Purpose: Keep server callers on one config model.
// Dependencies: csvdata-config
// ============================================================================

//! ## Overview
//! Re-exports the configuration model from `csvdata-config` so server callers
//! and the CLI share a single source of truth.

/// Re-export canonical config types and helpers.
pub use csvdata_config::*;
