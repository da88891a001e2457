// crates/certus-core/src/interfaces/mod.rs
// ============================================================================
// Module: Certus Interfaces
// Description: Backend-agnostic interfaces for signing, logging, and storage.
// Purpose: Define the contract surfaces used by the evidence runtime.
// Dependencies: crate::core, ed25519-dalek
// ============================================================================

//! ## Overview
//! Interfaces describe the collaborators of the evidence pipeline without
//! naming a backend. Local keys, remote KMS signers, and HSMs all implement
//! [`SigningBackend`]; an in-process Merkle log and an HTTP log client both
//! implement [`TransparencyLog`]. Implementations must fail closed on missing
//! or invalid data.

// ============================================================================
// SECTION: Imports
// ============================================================================

use ed25519_dalek::VerifyingKey;
use thiserror::Error;

use crate::core::bundle::EvidenceBundle;
use crate::core::hashing::HashDigest;
use crate::core::identifiers::BundleId;
use crate::core::identifiers::KeyId;
use crate::core::identifiers::LogId;
use crate::core::log::LogLeaf;
use crate::core::log::LogReceipt;
use crate::core::outcome::OutcomeEvent;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Signing Backend
// ============================================================================

/// Signing backend errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SigningError {
    /// Key material is missing or unreachable.
    #[error("signing key unavailable: {0}")]
    KeyUnavailable(String),
    /// Key material is malformed.
    #[error("signing key invalid: {0}")]
    InvalidKey(String),
    /// Backend reported a failure.
    #[error("signing backend error: {0}")]
    Backend(String),
}

/// Capability to sign bundle digests.
pub trait SigningBackend {
    /// Identifier of the key this backend signs with.
    fn key_id(&self) -> KeyId;

    /// Public half of the signing key.
    fn verifying_key(&self) -> VerifyingKey;

    /// Signs `message`, returning raw signature bytes.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError`] when the key is unavailable or the backend
    /// fails.
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SigningError>;
}

// ============================================================================
// SECTION: Transparency Log
// ============================================================================

/// Transparency log errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogError {
    /// Log unreachable or timed out; transient.
    #[error("transparency log unavailable: {0}")]
    Unavailable(String),
    /// Log refused the entry; deterministic.
    #[error("transparency log rejected entry: {0}")]
    Rejected(String),
    /// Requested entry does not exist.
    #[error("transparency log entry not found: {0}")]
    NotFound(String),
}

/// Append-only, externally auditable log of bundle existence.
pub trait TransparencyLog {
    /// Identifier of the log.
    fn log_id(&self) -> LogId;

    /// Appends a leaf, returning an inclusion receipt.
    ///
    /// Appending an identical leaf twice returns the original index.
    ///
    /// # Errors
    ///
    /// Returns [`LogError`] when the log is unavailable or rejects the leaf.
    fn append(&self, leaf: &LogLeaf) -> Result<LogReceipt, LogError>;

    /// Returns a fresh inclusion receipt for the leaf at `leaf_index`.
    ///
    /// # Errors
    ///
    /// Returns [`LogError`] when the log is unavailable or the index is
    /// unknown.
    fn inclusion_proof(&self, leaf_index: u64) -> Result<LogReceipt, LogError>;
}

// ============================================================================
// SECTION: Evidence Store
// ============================================================================

/// Evidence store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("evidence store io error: {0}")]
    Io(String),
    /// Store data is corrupted or fails integrity checks.
    #[error("evidence store corruption: {0}")]
    Corrupt(String),
    /// Store data version is incompatible.
    #[error("evidence store version mismatch: {0}")]
    VersionMismatch(String),
    /// Store data is invalid.
    #[error("evidence store invalid data: {0}")]
    Invalid(String),
    /// Store reported an error.
    #[error("evidence store error: {0}")]
    Store(String),
}

/// Result of a content-addressed put.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutOutcome {
    /// Identifier of the stored bundle.
    pub bundle_id: BundleId,
    /// False when an identical bundle was already present.
    pub inserted: bool,
}

/// Durable, content-addressed system of record for bundles.
pub trait EvidenceStore {
    /// Stores a bundle. Storing the same `bundle_id` twice keeps the first
    /// record and reports `inserted = false`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when storage fails.
    fn put(&self, bundle: &EvidenceBundle) -> Result<PutOutcome, StoreError>;

    /// Loads a bundle by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails or stored data is corrupt.
    fn get(&self, bundle_id: &BundleId) -> Result<Option<EvidenceBundle>, StoreError>;

    /// Returns the timestamp first claimed for `submission`, recording `now`
    /// when no claim exists. Racing callers observe a single winner.
    ///
    /// Claims are permanent. An identical untimestamped decision submitted
    /// any time later resolves to the first bundle.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when storage fails.
    fn claim_timestamp(
        &self,
        submission: &HashDigest,
        now: Timestamp,
    ) -> Result<Timestamp, StoreError>;

    /// Returns bundles whose decisions supersede `bundle_id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn superseded_by(&self, bundle_id: &BundleId) -> Result<Vec<BundleId>, StoreError>;
}

// ============================================================================
// SECTION: Payload Store
// ============================================================================

/// Raw evidence payload storage addressed by digest.
pub trait PayloadStore {
    /// Stores canonical payload bytes and returns their digest.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when storage fails.
    fn put_payload(&self, bytes: &[u8]) -> Result<HashDigest, StoreError>;

    /// Loads payload bytes exactly as stored; no integrity check is applied.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn get_payload(&self, digest: &HashDigest) -> Result<Option<Vec<u8>>, StoreError>;
}

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Source of creation timestamps.
pub trait Clock {
    /// Returns the current time.
    fn now(&self) -> Timestamp;
}

// ============================================================================
// SECTION: Outcome Sink
// ============================================================================

/// Consumer of decision outcome events.
pub trait OutcomeSink {
    /// Records one outcome; must not block the pipeline.
    fn record(&self, event: OutcomeEvent);
}

/// Outcome sink that discards events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopOutcomeSink;

impl OutcomeSink for NoopOutcomeSink {
    fn record(&self, _event: OutcomeEvent) {}
}
