// crates/certus-core/src/core/log.rs
// ============================================================================
// Module: Certus Transparency Log Records
// Description: Log leaves, receipts, and the entry reference held by bundles.
// Purpose: Make live and mock log entries explicit and distinguishable.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A bundle is logged as a [`LogLeaf`] naming its id, key, and signature. A live
//! log answers with a [`LogReceipt`] carrying an inclusion proof. When the log
//! is bypassed the bundle holds [`LogEntryRef::Mock`] and
//! [`LogStatus::UnverifiedExternally`]; the two forms never share a shape.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::hashing::HashDigest;
use crate::core::hashing::HashError;
use crate::core::hashing::canonical_json_bytes;
use crate::core::identifiers::BundleId;
use crate::core::identifiers::KeyId;
use crate::core::identifiers::LogId;
use crate::core::merkle::InclusionProof;
use crate::core::merkle::MerkleHash;
use crate::core::merkle::leaf_hash;
use crate::core::merkle::to_digest;

// ============================================================================
// SECTION: Leaves
// ============================================================================

/// Entry appended to the transparency log for one bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLeaf {
    /// Bundle being attested.
    pub bundle_id: BundleId,
    /// Key that produced the signature.
    pub key_id: KeyId,
    /// Base64 signature over the bundle id.
    pub signature: String,
}

impl LogLeaf {
    /// Returns the canonical leaf bytes.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] when canonicalization fails.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, HashError> {
        canonical_json_bytes(self)
    }

    /// Returns the Merkle leaf hash.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] when canonicalization fails.
    pub fn merkle_hash(&self) -> Result<MerkleHash, HashError> {
        Ok(leaf_hash(&self.canonical_bytes()?))
    }

    /// Returns the Merkle leaf hash as a digest.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] when canonicalization fails.
    pub fn leaf_digest(&self) -> Result<HashDigest, HashError> {
        Ok(to_digest(&self.merkle_hash()?))
    }
}

// ============================================================================
// SECTION: Receipts
// ============================================================================

/// Log answer for an appended or queried leaf.
///
/// # Invariants
/// - `proof.leaf_index == leaf_index` and `proof.tree_size == tree_size`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogReceipt {
    /// Log that recorded the leaf.
    pub log_id: LogId,
    /// Zero-based leaf index.
    pub leaf_index: u64,
    /// Merkle leaf hash.
    pub leaf_hash: HashDigest,
    /// Tree size at proof time.
    pub tree_size: u64,
    /// Root hash at `tree_size`.
    pub root_hash: HashDigest,
    /// Inclusion proof for the leaf.
    pub proof: InclusionProof,
}

/// Reference stored in a bundle after the log step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogEntryRef {
    /// Entry recorded by a live log.
    Entry(LogReceipt),
    /// Locally generated stand-in; never a proof of inclusion.
    Mock {
        /// Local reference (`mock-` plus leaf hash prefix).
        reference: String,
        /// Why the live log was not used.
        reason: String,
    },
}

impl LogEntryRef {
    /// Returns true for mock references.
    #[must_use]
    pub const fn is_mock(&self) -> bool {
        matches!(self, Self::Mock { .. })
    }

    /// Returns the live receipt when present.
    #[must_use]
    pub const fn receipt(&self) -> Option<&LogReceipt> {
        match self {
            Self::Entry(receipt) => Some(receipt),
            Self::Mock { .. } => None,
        }
    }
}

/// External verifiability of a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogStatus {
    /// Recorded by a live transparency log.
    Included,
    /// Logged in mock mode; no external attestation exists.
    UnverifiedExternally,
}

impl LogStatus {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Included => "included",
            Self::UnverifiedExternally => "unverified_externally",
        }
    }
}

/// Builds the mock reference for a leaf.
#[must_use]
pub fn mock_reference(leaf: &HashDigest) -> String {
    let prefix: String = leaf.value.chars().take(16).collect();
    format!("mock-{prefix}")
}
