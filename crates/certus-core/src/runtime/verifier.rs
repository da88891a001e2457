// crates/certus-core/src/runtime/verifier.rs
// ============================================================================
// Module: Certus Verifier
// Description: Auditor-side re-derivation of bundle integrity.
// Purpose: Check content, signature, payload, and log inclusion for a bundle.
// Dependencies: crate::core, crate::interfaces, crate::runtime::signing
// ============================================================================

//! ## Overview
//! The verifier trusts nothing stored alongside a bundle. It recomputes the
//! content digest, resolves the signing key from the key ring at the
//! decision timestamp, rehashes every referenced payload, and recomputes the
//! log leaf before checking its inclusion proof. It reads the evidence store
//! and, when reachable, the transparency log; it never needs the signer.
//!
//! A bundle created in mock mode reports `log_included = false` with the
//! `unverified_externally` issue. That is a surfaced state, not an error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::bundle::EvidenceBundle;
use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::core::hashing::HashDigest;
use crate::core::hashing::hash_bytes;
use crate::core::identifiers::BundleId;
use crate::core::identifiers::KeyId;
use crate::core::log::LogEntryRef;
use crate::core::log::LogLeaf;
use crate::core::log::LogReceipt;
use crate::core::log::LogStatus;
use crate::core::merkle::from_digest;
use crate::core::merkle::verify_inclusion;
use crate::core::time::Timestamp;
use crate::interfaces::EvidenceStore;
use crate::interfaces::LogError;
use crate::interfaces::PayloadStore;
use crate::interfaces::StoreError;
use crate::interfaces::TransparencyLog;
use crate::runtime::signing::KeyResolution;
use crate::runtime::signing::KeyRing;
use crate::runtime::signing::signature_matches;

// ============================================================================
// SECTION: Results
// ============================================================================

/// Problem found while verifying a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationIssue {
    /// Recomputed content digest differs from the bundle id.
    ContentDigestMismatch,
    /// Signing key is not in the key ring.
    UnknownSigningKey,
    /// Signing key is known but was not valid at the decision timestamp.
    KeyNotValidAtTimestamp,
    /// Signature does not verify.
    SignatureInvalid,
    /// Referenced payload is absent from the payload store.
    PayloadMissing,
    /// Stored payload bytes no longer hash to the recorded digest.
    PayloadDigestMismatch,
    /// Bundle was logged in mock mode.
    UnverifiedExternally,
    /// Receipt leaf does not match the recomputed leaf.
    LogLeafMismatch,
    /// Inclusion proof does not reach the root.
    InclusionProofInvalid,
    /// Live log unreachable; the embedded proof was checked instead.
    LogUnreachable,
    /// Issuing log is reachable but has no entry for the receipt.
    NotInLog,
}

impl VerificationIssue {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ContentDigestMismatch => "content_digest_mismatch",
            Self::UnknownSigningKey => "unknown_signing_key",
            Self::KeyNotValidAtTimestamp => "key_not_valid_at_timestamp",
            Self::SignatureInvalid => "signature_invalid",
            Self::PayloadMissing => "payload_missing",
            Self::PayloadDigestMismatch => "payload_digest_mismatch",
            Self::UnverifiedExternally => "unverified_externally",
            Self::LogLeafMismatch => "log_leaf_mismatch",
            Self::InclusionProofInvalid => "inclusion_proof_invalid",
            Self::LogUnreachable => "log_unreachable",
            Self::NotInLog => "not_in_log",
        }
    }
}

/// Outcome of verifying one bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Verified bundle.
    pub bundle_id: BundleId,
    /// Signature verifies under a key valid at the decision timestamp.
    pub signature_valid: bool,
    /// Live receipt matches the bundle and its proof verifies.
    pub log_included: bool,
    /// Every referenced payload rehashes to its recorded digest.
    pub digest_matches: bool,
    /// Recomputed content digest equals the bundle id.
    pub content_matches: bool,
    /// Recorded log status.
    pub log_status: LogStatus,
    /// Key named on the signature.
    pub key_id: KeyId,
    /// Later bundles that correct this one.
    pub superseded_by: Vec<BundleId>,
    /// Problems found, in check order.
    pub issues: Vec<VerificationIssue>,
}

impl VerificationResult {
    /// Returns true when content, signature, and payloads all check out.
    #[must_use]
    pub const fn is_intact(&self) -> bool {
        self.content_matches && self.signature_valid && self.digest_matches
    }
}

/// Verification errors.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// No bundle has this identifier.
    #[error("evidence not found: {0}")]
    NotFound(BundleId),
    /// Store read failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Bundle is structurally unusable.
    #[error("evidence corrupt: {0}")]
    Corrupt(String),
}

// ============================================================================
// SECTION: Verifier
// ============================================================================

/// Read-only bundle verifier.
pub struct Verifier<S, P, L> {
    /// Evidence store.
    store: S,
    /// Raw payload store.
    payloads: P,
    /// Live log for fresh proofs, when reachable.
    log: Option<L>,
    /// Trusted keys across rotations.
    keys: KeyRing,
}

impl<S, P, L> Verifier<S, P, L>
where
    S: EvidenceStore,
    P: PayloadStore,
    L: TransparencyLog,
{
    /// Creates a verifier.
    #[must_use]
    pub const fn new(store: S, payloads: P, log: Option<L>, keys: KeyRing) -> Self {
        Self {
            store,
            payloads,
            log,
            keys,
        }
    }

    /// Returns the key ring.
    #[must_use]
    pub const fn keys(&self) -> &KeyRing {
        &self.keys
    }

    /// Loads and verifies a bundle.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::NotFound`] for unknown ids and
    /// [`VerifyError::Store`] when the store fails.
    pub fn verify(&self, bundle_id: &BundleId) -> Result<VerificationResult, VerifyError> {
        let bundle =
            self.store.get(bundle_id)?.ok_or_else(|| VerifyError::NotFound(bundle_id.clone()))?;
        self.verify_bundle(&bundle)
    }

    /// Verifies an already loaded bundle.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError`] when the bundle has no decisions or a store
    /// read fails.
    pub fn verify_bundle(&self, bundle: &EvidenceBundle) -> Result<VerificationResult, VerifyError> {
        let primary = bundle
            .content
            .primary()
            .ok_or_else(|| VerifyError::Corrupt(format!("bundle {} has no decisions", bundle.bundle_id)))?;
        let mut issues = Vec::new();

        let content_matches = bundle
            .content
            .digest(DEFAULT_HASH_ALGORITHM)
            .is_ok_and(|digest| BundleId::from_digest(&digest) == bundle.bundle_id);
        if !content_matches {
            issues.push(VerificationIssue::ContentDigestMismatch);
        }

        let signature_valid = self.check_signature(bundle, primary.timestamp, &mut issues);
        let digest_matches = self.check_payloads(bundle, &mut issues)?;
        let log_included = self.check_log(bundle, &mut issues);
        let superseded_by = self.store.superseded_by(&bundle.bundle_id)?;

        Ok(VerificationResult {
            bundle_id: bundle.bundle_id.clone(),
            signature_valid,
            log_included,
            digest_matches,
            content_matches,
            log_status: bundle.log_status,
            key_id: bundle.signature.key_id.clone(),
            superseded_by,
            issues,
        })
    }

    /// Checks the signature over the bundle id digest.
    fn check_signature(
        &self,
        bundle: &EvidenceBundle,
        at: Timestamp,
        issues: &mut Vec<VerificationIssue>,
    ) -> bool {
        let key = match self.keys.resolve(&bundle.signature.key_id, at) {
            KeyResolution::Valid(key) => key,
            KeyResolution::OutsideWindow(_) => {
                issues.push(VerificationIssue::KeyNotValidAtTimestamp);
                return false;
            }
            KeyResolution::Unknown => {
                issues.push(VerificationIssue::UnknownSigningKey);
                return false;
            }
        };
        let valid = HashDigest::from_hex(DEFAULT_HASH_ALGORITHM, bundle.bundle_id.as_str())
            .is_ok_and(|digest| signature_matches(key, &digest, &bundle.signature));
        if !valid {
            issues.push(VerificationIssue::SignatureInvalid);
        }
        valid
    }

    /// Rehashes every referenced payload.
    fn check_payloads(
        &self,
        bundle: &EvidenceBundle,
        issues: &mut Vec<VerificationIssue>,
    ) -> Result<bool, VerifyError> {
        let mut matches = true;
        for decision in &bundle.content.decisions {
            let expected = &decision.payload_digest;
            match self.payloads.get_payload(expected)? {
                None => {
                    matches = false;
                    issues.push(VerificationIssue::PayloadMissing);
                }
                Some(bytes) if hash_bytes(expected.algorithm, &bytes) != *expected => {
                    matches = false;
                    issues.push(VerificationIssue::PayloadDigestMismatch);
                }
                Some(_) => {}
            }
        }
        Ok(matches)
    }

    /// Checks the log receipt against a recomputed leaf.
    fn check_log(&self, bundle: &EvidenceBundle, issues: &mut Vec<VerificationIssue>) -> bool {
        let receipt = match &bundle.log_entry_ref {
            Some(LogEntryRef::Entry(receipt)) => receipt,
            Some(LogEntryRef::Mock { .. }) | None => {
                issues.push(VerificationIssue::UnverifiedExternally);
                return false;
            }
        };
        let leaf = LogLeaf {
            bundle_id: bundle.bundle_id.clone(),
            key_id: bundle.signature.key_id.clone(),
            signature: bundle.signature.signature.clone(),
        };
        let Ok(leaf_hash) = leaf.merkle_hash() else {
            issues.push(VerificationIssue::LogLeafMismatch);
            return false;
        };
        if from_digest(&receipt.leaf_hash) != Some(leaf_hash) {
            issues.push(VerificationIssue::LogLeafMismatch);
            return false;
        }
        let fresh;
        let current = match self.fresh_receipt(receipt) {
            FreshReceipt::Current(answer) => {
                fresh = answer;
                &fresh
            }
            FreshReceipt::Embedded => receipt,
            FreshReceipt::Unreachable => {
                issues.push(VerificationIssue::LogUnreachable);
                receipt
            }
            FreshReceipt::Missing => {
                issues.push(VerificationIssue::NotInLog);
                return false;
            }
        };
        let included = current.leaf_hash == receipt.leaf_hash
            && from_digest(&current.root_hash)
                .is_some_and(|root| verify_inclusion(&leaf_hash, &current.proof, &root));
        if !included {
            issues.push(VerificationIssue::InclusionProofInvalid);
        }
        included
    }

    /// Fetches a current proof from the live log when it is the issuing log.
    ///
    /// Only a transport outage falls back to the embedded proof. A reachable
    /// log that denies the entry is never treated as inclusion.
    fn fresh_receipt(&self, receipt: &LogReceipt) -> FreshReceipt {
        let Some(log) = self.log.as_ref().filter(|log| log.log_id() == receipt.log_id) else {
            return FreshReceipt::Embedded;
        };
        match log.inclusion_proof(receipt.leaf_index) {
            Ok(fresh) => FreshReceipt::Current(fresh),
            Err(LogError::Unavailable(_)) => FreshReceipt::Unreachable,
            Err(LogError::NotFound(_) | LogError::Rejected(_)) => FreshReceipt::Missing,
        }
    }
}

/// Answer from the issuing log for a stored receipt.
enum FreshReceipt {
    /// Log returned a current receipt.
    Current(LogReceipt),
    /// No issuing log configured; check the embedded proof.
    Embedded,
    /// Log unreachable; check the embedded proof.
    Unreachable,
    /// Log is reachable and does not hold the entry.
    Missing,
}
