// crates/certus-store-sqlite/src/lib.rs
// ============================================================================
// Module: Certus SQLite Store Library
// Description: Durable evidence and payload store backed by SQLite.
// Purpose: Expose the SQLite store and its configuration types.
// Dependencies: certus-core, rusqlite
// ============================================================================

//! ## Overview
//! A single `SQLite` database holds bundles, payloads, submission stamps, and
//! the correction index. Stored bundles are re-hashed on every read and fail
//! closed on mismatch; payload bytes are returned as stored so the verifier
//! can detect tampering.
//! Security posture: database contents are untrusted; see
//! `Docs/security/threat_model.md`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::MAX_BUNDLE_BYTES;
pub use store::MAX_PAYLOAD_BYTES;
pub use store::SqliteEvidenceStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
