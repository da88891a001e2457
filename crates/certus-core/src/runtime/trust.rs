// crates/certus-core/src/runtime/trust.rs
// ============================================================================
// Module: Certus Trust Service
// Description: Bundle signing and transparency log submission.
// Purpose: Turn canonical bundle content into a signed, logged entry.
// Dependencies: crate::core, crate::interfaces, serde
// ============================================================================

//! ## Overview
//! [`TrustService::sign_and_log`] derives the bundle id from canonical
//! content, signs the digest, checks the returned signature against the
//! backend's public key, and submits a [`LogLeaf`] according to [`LogMode`].
//! An unavailable log either fails the call or, with fallback enabled,
//! produces a mock reference flagged `unverified_externally`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::bundle::BundleContent;
use crate::core::bundle::BundleSignature;
use crate::core::bundle::signing_message;
use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::core::hashing::HashDigest;
use crate::core::identifiers::BundleId;
use crate::core::log::LogEntryRef;
use crate::core::log::LogLeaf;
use crate::core::log::LogStatus;
use crate::core::log::mock_reference;
use crate::interfaces::LogError;
use crate::interfaces::SigningBackend;
use crate::interfaces::SigningError;
use crate::interfaces::TransparencyLog;
use crate::runtime::signing::signature_matches;

// ============================================================================
// SECTION: Types
// ============================================================================

/// How the trust service uses the transparency log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogMode {
    /// Require the live log; outages surface as errors.
    #[default]
    Live,
    /// Never contact a log; every entry is a mock reference.
    Mock,
    /// Use the live log and fall back to a mock reference on outage.
    LiveWithMockFallback,
}

impl LogMode {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Mock => "mock",
            Self::LiveWithMockFallback => "live_with_mock_fallback",
        }
    }
}

/// Signed and logged bundle material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEntry {
    /// Content-derived identifier.
    pub bundle_id: BundleId,
    /// Content digest the signature covers.
    pub digest: HashDigest,
    /// Signature record.
    pub signature: BundleSignature,
    /// Log reference.
    pub log_entry_ref: LogEntryRef,
    /// External verifiability.
    pub log_status: LogStatus,
}

/// Trust service errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrustError {
    /// Bundle content could not be canonicalized.
    #[error("bundle encoding failed: {0}")]
    Encoding(String),
    /// Signing backend failed.
    #[error("signing failed for bundle {bundle_id}: {source}")]
    Signing {
        /// Bundle being signed.
        bundle_id: BundleId,
        /// Backend error.
        source: SigningError,
    },
    /// Log could not be reached.
    #[error("transparency log unavailable for bundle {bundle_id}: {message}")]
    LogUnavailable {
        /// Bundle being logged.
        bundle_id: BundleId,
        /// Log error detail.
        message: String,
    },
    /// Log refused the entry.
    #[error("transparency log rejected bundle {bundle_id}: {message}")]
    LogRejected {
        /// Bundle being logged.
        bundle_id: BundleId,
        /// Log error detail.
        message: String,
    },
}

// ============================================================================
// SECTION: Trust Service
// ============================================================================

/// Signs bundle content and records it in a transparency log.
pub struct TrustService<Sg, L> {
    /// Signing backend.
    signer: Sg,
    /// Transparency log; absent in mock-only deployments.
    log: Option<L>,
    /// Log usage mode.
    mode: LogMode,
}

impl<Sg, L> TrustService<Sg, L>
where
    Sg: SigningBackend,
    L: TransparencyLog,
{
    /// Creates a trust service.
    #[must_use]
    pub const fn new(signer: Sg, log: Option<L>, mode: LogMode) -> Self {
        Self {
            signer,
            log,
            mode,
        }
    }

    /// Returns the signing backend.
    pub const fn signer(&self) -> &Sg {
        &self.signer
    }

    /// Returns the transparency log, if configured.
    pub const fn log(&self) -> Option<&L> {
        self.log.as_ref()
    }

    /// Returns the log mode.
    #[must_use]
    pub const fn mode(&self) -> LogMode {
        self.mode
    }

    /// Computes the identifier for bundle content.
    ///
    /// # Errors
    ///
    /// Returns [`TrustError::Encoding`] when canonicalization fails.
    pub fn bundle_id(&self, content: &BundleContent) -> Result<(BundleId, HashDigest), TrustError> {
        let digest = content
            .digest(DEFAULT_HASH_ALGORITHM)
            .map_err(|err| TrustError::Encoding(err.to_string()))?;
        Ok((BundleId::from_digest(&digest), digest))
    }

    /// Signs the bundle digest and submits it to the log.
    ///
    /// # Errors
    ///
    /// Returns [`TrustError`] when signing fails or the log is unavailable
    /// without fallback.
    pub fn sign_and_log(&self, content: &BundleContent) -> Result<SignedEntry, TrustError> {
        let (bundle_id, digest) = self.bundle_id(content)?;
        let signature = self.sign(&bundle_id, &digest)?;
        let leaf = LogLeaf {
            bundle_id: bundle_id.clone(),
            key_id: signature.key_id.clone(),
            signature: signature.signature.clone(),
        };
        let (log_entry_ref, log_status) = self.submit(&leaf)?;
        Ok(SignedEntry {
            bundle_id,
            digest,
            signature,
            log_entry_ref,
            log_status,
        })
    }

    /// Signs and self-checks the digest.
    fn sign(&self, bundle_id: &BundleId, digest: &HashDigest) -> Result<BundleSignature, TrustError> {
        let signing_error = |source| TrustError::Signing {
            bundle_id: bundle_id.clone(),
            source,
        };
        let message = signing_message(digest)
            .map_err(|err| TrustError::Encoding(err.to_string()))?;
        let bytes = self.signer.sign(&message).map_err(signing_error)?;
        let signature = BundleSignature::ed25519(self.signer.key_id(), &bytes);
        if !signature_matches(&self.signer.verifying_key(), digest, &signature) {
            return Err(signing_error(SigningError::Backend(
                "signature does not verify under the backend public key".to_string(),
            )));
        }
        Ok(signature)
    }

    /// Submits the leaf according to the log mode.
    fn submit(&self, leaf: &LogLeaf) -> Result<(LogEntryRef, LogStatus), TrustError> {
        let live = match (self.mode, &self.log) {
            (LogMode::Mock, _) => return mock_entry(leaf, "log mode is mock"),
            (_, None) => Err(LogError::Unavailable("no transparency log configured".to_string())),
            (_, Some(log)) => log.append(leaf),
        };
        match live {
            Ok(receipt) => Ok((LogEntryRef::Entry(receipt), LogStatus::Included)),
            Err(LogError::Unavailable(message)) if self.mode == LogMode::LiveWithMockFallback => {
                mock_entry(leaf, &format!("log unavailable: {message}"))
            }
            Err(LogError::Unavailable(message)) => Err(TrustError::LogUnavailable {
                bundle_id: leaf.bundle_id.clone(),
                message,
            }),
            Err(LogError::Rejected(message) | LogError::NotFound(message)) => {
                Err(TrustError::LogRejected {
                    bundle_id: leaf.bundle_id.clone(),
                    message,
                })
            }
        }
    }
}

/// Builds a mock log reference for a leaf.
fn mock_entry(leaf: &LogLeaf, reason: &str) -> Result<(LogEntryRef, LogStatus), TrustError> {
    let digest = leaf.leaf_digest().map_err(|err| TrustError::Encoding(err.to_string()))?;
    Ok((
        LogEntryRef::Mock {
            reference: mock_reference(&digest),
            reason: reason.to_string(),
        },
        LogStatus::UnverifiedExternally,
    ))
}
