// crates/certus-config/src/lib.rs
// ============================================================================
// Module: Certus Config Library
// Description: Canonical config model, validation, and the example config.
// Purpose: Single source of truth for certus.toml semantics.
// Dependencies: certus-core, certus-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `certus-config` defines the configuration model for the Certus evidence
//! service. Loading is strict and fail-closed: oversized, non-UTF-8, or
//! internally inconsistent files are rejected before any backend is built.
//!
//! Security posture: config inputs are untrusted; see
//! `Docs/security/threat_model.md`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
