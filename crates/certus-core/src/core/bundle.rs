// crates/certus-core/src/core/bundle.rs
// ============================================================================
// Module: Certus Evidence Bundles
// Description: Signed, content-addressed wrappers around integrity decisions.
// Purpose: Define the durable evidence record and its identifier derivation.
// Dependencies: base64, serde
// ============================================================================

//! ## Overview
//! [`BundleContent`] is the hashed part of a bundle. Its canonical digest is
//! the [`BundleId`], and the signature covers the canonical bytes of that
//! digest. Signature, log reference, and storage time sit outside the hashed
//! content, so identical decisions always map to the same id.
//!
//! Security posture: stored bundles are untrusted on read; see
//! `Docs/security/threat_model.md`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde::Serialize;

use crate::core::decision::IntegrityDecision;
use crate::core::decision::PolicyMode;
use crate::core::decision::Verdict;
use crate::core::hashing::HashAlgorithm;
use crate::core::hashing::HashDigest;
use crate::core::hashing::HashError;
use crate::core::hashing::canonical_json_bytes;
use crate::core::hashing::hash_canonical_json;
use crate::core::identifiers::BundleId;
use crate::core::identifiers::KeyId;
use crate::core::log::LogEntryRef;
use crate::core::log::LogStatus;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Current bundle content format version.
pub const BUNDLE_FORMAT_VERSION: u32 = 1;

// ============================================================================
// SECTION: Content
// ============================================================================

/// Hashed portion of an evidence bundle.
///
/// # Invariants
/// - `decisions` is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleContent {
    /// Content format version.
    pub version: u32,
    /// Wrapped decisions, owned by the bundle.
    pub decisions: Vec<IntegrityDecision>,
}

impl BundleContent {
    /// Wraps a single decision.
    #[must_use]
    pub fn single(decision: IntegrityDecision) -> Self {
        Self {
            version: BUNDLE_FORMAT_VERSION,
            decisions: vec![decision],
        }
    }

    /// Computes the canonical content digest.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] when canonicalization fails.
    pub fn digest(&self, algorithm: HashAlgorithm) -> Result<HashDigest, HashError> {
        hash_canonical_json(algorithm, self)
    }

    /// Returns the first wrapped decision.
    #[must_use]
    pub fn primary(&self) -> Option<&IntegrityDecision> {
        self.decisions.first()
    }
}

/// Returns the bytes a signing backend signs for a bundle digest.
///
/// # Errors
///
/// Returns [`HashError`] when canonicalization fails.
pub fn signing_message(bundle_digest: &HashDigest) -> Result<Vec<u8>, HashError> {
    canonical_json_bytes(bundle_digest)
}

// ============================================================================
// SECTION: Signature
// ============================================================================

/// Signature schemes accepted on bundles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureScheme {
    /// Ed25519 over the canonical bundle digest.
    Ed25519,
}

/// Signature attached to a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleSignature {
    /// Signature scheme.
    pub scheme: SignatureScheme,
    /// Signing key identifier.
    pub key_id: KeyId,
    /// Base64 signature bytes.
    pub signature: String,
}

impl BundleSignature {
    /// Creates an Ed25519 signature record from raw bytes.
    #[must_use]
    pub fn ed25519(key_id: KeyId, bytes: &[u8]) -> Self {
        Self {
            scheme: SignatureScheme::Ed25519,
            key_id,
            signature: STANDARD.encode(bytes),
        }
    }

    /// Decodes the signature bytes.
    ///
    /// # Errors
    ///
    /// Returns [`base64::DecodeError`] when the text is not base64.
    pub fn bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.signature)
    }
}

// ============================================================================
// SECTION: Bundle
// ============================================================================

/// Signed, logged, and stored evidence record.
///
/// # Invariants
/// - `bundle_id` equals the canonical digest of `content` when written by the
///   runtime. Readers must recompute it rather than trust it.
/// - `log_status` is `UnverifiedExternally` whenever `log_entry_ref` is absent
///   or a mock reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceBundle {
    /// Content-derived identifier.
    pub bundle_id: BundleId,
    /// Hashed content.
    pub content: BundleContent,
    /// Signature over the bundle digest.
    pub signature: BundleSignature,
    /// Transparency log reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_entry_ref: Option<LogEntryRef>,
    /// External verifiability.
    pub log_status: LogStatus,
    /// Time the bundle was assembled.
    pub created_at: Timestamp,
}

// ============================================================================
// SECTION: Bundle Reference
// ============================================================================

/// Handle returned to producers after submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleRef {
    /// Stored bundle identifier (also the public evidence id).
    pub bundle_id: BundleId,
    /// Recorded verdict.
    pub verdict: Verdict,
    /// Effective policy mode.
    pub mode: PolicyMode,
    /// Whether the calling workflow may proceed.
    pub allowed: bool,
    /// External verifiability.
    pub log_status: LogStatus,
    /// Transparency log reference.
    pub log_entry_ref: Option<LogEntryRef>,
    /// True when an identical bundle was already stored.
    pub deduplicated: bool,
}
