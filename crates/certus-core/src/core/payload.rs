// crates/certus-core/src/core/payload.rs
// ============================================================================
// Module: Certus Evidence Payloads
// Description: Canonical payload bytes and digests for raw evidence.
// Purpose: Bind decisions to the scan output or transcript they summarize.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Raw evidence payloads are arbitrary JSON documents. They are stored as
//! RFC 8785 canonical bytes and addressed by the SHA-256 of those bytes, so
//! any later mutation of stored bytes changes the recomputed digest.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use serde_json::json;

use crate::core::decision::CheckedDraft;
use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::core::hashing::HashDigest;
use crate::core::hashing::HashError;
use crate::core::hashing::canonical_json_bytes;
use crate::core::hashing::hash_bytes;

// ============================================================================
// SECTION: Payload Encoding
// ============================================================================

/// Canonical payload bytes paired with their digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalPayload {
    /// RFC 8785 canonical bytes.
    pub bytes: Vec<u8>,
    /// Digest of `bytes`.
    pub digest: HashDigest,
}

impl CanonicalPayload {
    /// Canonicalizes a JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] when canonicalization fails.
    pub fn from_value(value: &Value) -> Result<Self, HashError> {
        let bytes = canonical_json_bytes(value)?;
        let digest = hash_bytes(DEFAULT_HASH_ALGORITHM, &bytes);
        Ok(Self {
            bytes,
            digest,
        })
    }
}

/// Builds the payload used when a producer sends neither payload nor digest.
///
/// The summary covers the judgment fields so the digest still binds the
/// decision to a concrete, retrievable document.
#[must_use]
pub fn summary_payload(draft: &CheckedDraft) -> Value {
    json!({
        "subject": draft.subject.as_str(),
        "decision_kind": draft.decision_kind.as_str(),
        "verdict": draft.verdict.as_str(),
        "scores": draft.scores,
        "reason": draft.reason,
    })
}
