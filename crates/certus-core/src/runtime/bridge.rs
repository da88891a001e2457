// crates/certus-core/src/runtime/bridge.rs
// ============================================================================
// Module: Certus Integrity Bridge
// Description: Submission pipeline from producer draft to stored bundle.
// Purpose: Validate, apply policy, sign, log, and store one decision.
// Dependencies: crate::core, crate::interfaces, crate::runtime
// ============================================================================

//! ## Overview
//! [`IntegrityBridge::submit`] runs one decision through its lifecycle:
//! `received -> validated -> policy_applied -> forwarded_to_trust`, or
//! `rejected_locally` on validation failure or cancellation before signing.
//! The bridge never retries; callers opt in with
//! [`crate::runtime::retry::submit_with_retry`].
//!
//! Enforce-mode blocks are signed and stored like any other decision so the
//! denial is auditable; the caller receives [`SubmitError::PolicyViolation`]
//! carrying the stored reference.
//!
//! Security posture: drafts and payloads are untrusted; see
//! `Docs/security/threat_model.md`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::bundle::BundleContent;
use crate::core::bundle::BundleRef;
use crate::core::bundle::EvidenceBundle;
use crate::core::decision::CheckedDraft;
use crate::core::decision::DecisionDraft;
use crate::core::decision::IntegrityDecision;
use crate::core::decision::ValidationError;
use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::core::hashing::HashDigest;
use crate::core::hashing::hash_canonical_json;
use crate::core::identifiers::BundleId;
use crate::core::lifecycle::DecisionLifecycle;
use crate::core::lifecycle::LifecycleState;
use crate::core::outcome::OutcomeEvent;
use crate::core::outcome::PolicyOutcome;
use crate::core::payload::CanonicalPayload;
use crate::core::payload::summary_payload;
use crate::core::time::Timestamp;
use crate::interfaces::Clock;
use crate::interfaces::EvidenceStore;
use crate::interfaces::NoopOutcomeSink;
use crate::interfaces::OutcomeSink;
use crate::interfaces::PayloadStore;
use crate::interfaces::SigningBackend;
use crate::interfaces::SigningError;
use crate::interfaces::StoreError;
use crate::interfaces::TransparencyLog;
use crate::runtime::clock::SystemClock;
use crate::runtime::policy::IntegrityService;
use crate::runtime::policy::PolicyInput;
use crate::runtime::trust::TrustError;
use crate::runtime::trust::TrustService;

// ============================================================================
// SECTION: Cancellation
// ============================================================================

/// Cooperative cancellation flag checked before signing.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    /// Shared flag.
    flag: Arc<AtomicBool>,
}

impl CancelSignal {
    /// Creates an unset signal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Returns true once cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Submission errors.
///
/// Signing and log errors name the bundle that was attempted so callers can
/// reconcile offline.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Draft is malformed; not retried.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
    /// Enforce-mode block; the bundle is stored.
    #[error("policy violation: bundle {}", .bundle.bundle_id)]
    PolicyViolation {
        /// Stored evidence for the blocked decision.
        bundle: BundleRef,
    },
    /// Signing backend failed.
    #[error("signing failed for bundle {bundle_id}: {source}")]
    Signing {
        /// Bundle being signed.
        bundle_id: BundleId,
        /// Backend error.
        source: SigningError,
    },
    /// Transparency log unreachable; transient.
    #[error("transparency log unavailable for bundle {bundle_id}: {message}")]
    LogUnavailable {
        /// Bundle being logged.
        bundle_id: BundleId,
        /// Log error detail.
        message: String,
    },
    /// Transparency log refused the entry.
    #[error("transparency log rejected bundle {bundle_id}: {message}")]
    LogRejected {
        /// Bundle being logged.
        bundle_id: BundleId,
        /// Log error detail.
        message: String,
    },
    /// Evidence or payload store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Submission cancelled before signing.
    #[error("submission cancelled before signing")]
    Cancelled,
    /// Encoding or lifecycle invariant failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SubmitError {
    /// Returns true when a bounded retry may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::LogUnavailable { .. } | Self::Store(StoreError::Io(_)))
    }

    /// Returns the stable error label used on the wire and in audit events.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::PolicyViolation { .. } => "policy_violation",
            Self::Signing { .. } => "signing_error",
            Self::LogUnavailable { .. } => "log_unavailable",
            Self::LogRejected { .. } => "log_rejected",
            Self::Store(_) => "store_error",
            Self::Cancelled => "cancelled",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Returns the bundle the error refers to, when one was derived.
    #[must_use]
    pub const fn bundle_id(&self) -> Option<&BundleId> {
        match self {
            Self::PolicyViolation { bundle } => Some(&bundle.bundle_id),
            Self::Signing { bundle_id, .. }
            | Self::LogUnavailable { bundle_id, .. }
            | Self::LogRejected { bundle_id, .. } => Some(bundle_id),
            _ => None,
        }
    }
}

impl From<TrustError> for SubmitError {
    fn from(err: TrustError) -> Self {
        match err {
            TrustError::Encoding(message) => Self::Internal(message),
            TrustError::Signing {
                bundle_id,
                source,
            } => Self::Signing {
                bundle_id,
                source,
            },
            TrustError::LogUnavailable {
                bundle_id,
                message,
            } => Self::LogUnavailable {
                bundle_id,
                message,
            },
            TrustError::LogRejected {
                bundle_id,
                message,
            } => Self::LogRejected {
                bundle_id,
                message,
            },
        }
    }
}

// ============================================================================
// SECTION: Submission Trace
// ============================================================================

/// Submission result paired with the lifecycle it produced.
#[derive(Debug)]
pub struct SubmissionTrace {
    /// Visited lifecycle states.
    pub lifecycle: DecisionLifecycle,
    /// Decision as recorded, when policy was applied.
    pub decision: Option<IntegrityDecision>,
    /// Submission result.
    pub result: Result<BundleRef, SubmitError>,
}

/// Identity of a submission before a timestamp is assigned.
#[derive(Serialize)]
struct SubmissionKey<'a> {
    /// Normalized draft; its timestamp field is never serialized.
    draft: &'a CheckedDraft,
    /// Resolved payload digest.
    payload_digest: &'a HashDigest,
}

/// Draft with every derived field resolved.
struct NormalizedDraft {
    /// Field-checked draft.
    checked: CheckedDraft,
    /// Resolved payload digest.
    payload_digest: HashDigest,
    /// Resolved creation time.
    timestamp: Timestamp,
}

// ============================================================================
// SECTION: Bridge
// ============================================================================

/// Submission pipeline over pluggable stores and trust backends.
pub struct IntegrityBridge<S, P, Sg, L> {
    /// Evidence store.
    store: S,
    /// Raw payload store.
    payloads: P,
    /// Policy gate.
    policy: IntegrityService,
    /// Signing and log service.
    trust: TrustService<Sg, L>,
    /// Time source for omitted timestamps.
    clock: Arc<dyn Clock + Send + Sync>,
    /// Outcome event consumer.
    outcomes: Arc<dyn OutcomeSink + Send + Sync>,
}

impl<S, P, Sg, L> IntegrityBridge<S, P, Sg, L>
where
    S: EvidenceStore,
    P: PayloadStore,
    Sg: SigningBackend,
    L: TransparencyLog,
{
    /// Creates a bridge using the system clock and no outcome sink.
    #[must_use]
    pub fn new(store: S, payloads: P, policy: IntegrityService, trust: TrustService<Sg, L>) -> Self {
        Self {
            store,
            payloads,
            policy,
            trust,
            clock: Arc::new(SystemClock),
            outcomes: Arc::new(NoopOutcomeSink),
        }
    }

    /// Replaces the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the outcome sink.
    #[must_use]
    pub fn with_outcome_sink(mut self, outcomes: Arc<dyn OutcomeSink + Send + Sync>) -> Self {
        self.outcomes = outcomes;
        self
    }

    /// Returns the evidence store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Returns the payload store.
    pub const fn payloads(&self) -> &P {
        &self.payloads
    }

    /// Returns the policy gate.
    pub const fn policy(&self) -> &IntegrityService {
        &self.policy
    }

    /// Returns the trust service.
    pub const fn trust(&self) -> &TrustService<Sg, L> {
        &self.trust
    }

    /// Submits a decision draft.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError`] for validation failures, enforce-mode blocks,
    /// backend failures, and cancellation before signing.
    pub fn submit(&self, draft: &DecisionDraft, cancel: &CancelSignal) -> Result<BundleRef, SubmitError> {
        self.submit_traced(draft, cancel).result
    }

    /// Submits a decision draft and returns the lifecycle trail alongside
    /// the result.
    pub fn submit_traced(&self, draft: &DecisionDraft, cancel: &CancelSignal) -> SubmissionTrace {
        let mut lifecycle = DecisionLifecycle::new();
        let mut decision = None;
        let result = self.run(draft, cancel, &mut lifecycle, &mut decision);
        SubmissionTrace {
            lifecycle,
            decision,
            result,
        }
    }

    /// Drives one submission through its lifecycle.
    fn run(
        &self,
        draft: &DecisionDraft,
        cancel: &CancelSignal,
        lifecycle: &mut DecisionLifecycle,
        recorded: &mut Option<IntegrityDecision>,
    ) -> Result<BundleRef, SubmitError> {
        let normalized = match self.normalize(draft) {
            Ok(normalized) => normalized,
            Err(err) => {
                advance(lifecycle, LifecycleState::RejectedLocally)?;
                return Err(err);
            }
        };
        advance(lifecycle, LifecycleState::Validated)?;

        let outcome = self.policy.evaluate(&PolicyInput::from(&normalized.checked));
        advance(lifecycle, LifecycleState::PolicyApplied)?;
        let decision = build_decision(normalized, &outcome);
        *recorded = Some(decision.clone());

        if cancel.is_cancelled() {
            advance(lifecycle, LifecycleState::RejectedLocally)?;
            return Err(SubmitError::Cancelled);
        }

        // Past this point a signature may be externally visible; the store
        // step always runs.
        let content = BundleContent::single(decision);
        let signed = self.trust.sign_and_log(&content)?;
        let bundle = EvidenceBundle {
            bundle_id: signed.bundle_id,
            content,
            signature: signed.signature,
            log_entry_ref: Some(signed.log_entry_ref),
            log_status: signed.log_status,
            created_at: self.clock.now(),
        };
        let put = self.store.put(&bundle)?;
        let stored = if put.inserted {
            bundle
        } else {
            self.store.get(&put.bundle_id)?.unwrap_or(bundle)
        };
        advance(lifecycle, LifecycleState::ForwardedToTrust)?;

        let bundle_ref = BundleRef {
            bundle_id: stored.bundle_id,
            verdict: outcome.recorded_verdict,
            mode: outcome.mode,
            allowed: outcome.allow,
            log_status: stored.log_status,
            log_entry_ref: stored.log_entry_ref,
            deduplicated: !put.inserted,
        };
        if let Some(primary) = stored.content.primary() {
            self.outcomes.record(OutcomeEvent {
                decision_kind: primary.decision_kind,
                verdict: outcome.recorded_verdict,
                mode: outcome.mode,
                allowed: outcome.allow,
                log_status: bundle_ref.log_status,
                deduplicated: bundle_ref.deduplicated,
            });
        }
        if !outcome.allow {
            return Err(SubmitError::PolicyViolation {
                bundle: bundle_ref,
            });
        }
        Ok(bundle_ref)
    }

    /// Validates the draft and resolves payload digest and timestamp.
    fn normalize(&self, draft: &DecisionDraft) -> Result<NormalizedDraft, SubmitError> {
        let checked = draft.check()?;
        if let Some(target) = &checked.supersedes
            && self.store.get(target)?.is_none()
        {
            return Err(ValidationError::UnknownSupersedes(target.clone()).into());
        }
        let payload_digest = self.resolve_payload(draft.payload.as_ref(), &checked)?;
        let timestamp = match checked.timestamp {
            Some(timestamp) => timestamp,
            None => {
                let key = SubmissionKey {
                    draft: &checked,
                    payload_digest: &payload_digest,
                };
                let submission = hash_canonical_json(DEFAULT_HASH_ALGORITHM, &key)
                    .map_err(|err| SubmitError::Internal(err.to_string()))?;
                self.store.claim_timestamp(&submission, self.clock.now())?
            }
        };
        Ok(NormalizedDraft {
            checked,
            payload_digest,
            timestamp,
        })
    }

    /// Stores or locates the evidence payload and returns its digest.
    fn resolve_payload(
        &self,
        payload: Option<&Value>,
        checked: &CheckedDraft,
    ) -> Result<HashDigest, SubmitError> {
        match (payload, &checked.payload_digest) {
            (Some(value), supplied) => {
                let canonical = CanonicalPayload::from_value(value)
                    .map_err(|err| ValidationError::InvalidPayload(err.to_string()))?;
                if let Some(supplied) = supplied
                    && *supplied != canonical.digest
                {
                    return Err(ValidationError::PayloadDigestMismatch {
                        computed: canonical.digest.value,
                    }
                    .into());
                }
                Ok(self.payloads.put_payload(&canonical.bytes)?)
            }
            (None, Some(supplied)) => {
                if self.payloads.get_payload(supplied)?.is_none() {
                    return Err(ValidationError::UnknownPayload(supplied.to_string()).into());
                }
                Ok(supplied.clone())
            }
            (None, None) => {
                let canonical = CanonicalPayload::from_value(&summary_payload(checked))
                    .map_err(|err| SubmitError::Internal(err.to_string()))?;
                Ok(self.payloads.put_payload(&canonical.bytes)?)
            }
        }
    }
}

/// Applies a lifecycle transition.
fn advance(lifecycle: &mut DecisionLifecycle, next: LifecycleState) -> Result<(), SubmitError> {
    lifecycle.advance(next).map_err(|err| SubmitError::Internal(err.to_string()))
}

/// Builds the recorded decision from a normalized draft and policy outcome.
fn build_decision(normalized: NormalizedDraft, outcome: &PolicyOutcome) -> IntegrityDecision {
    let NormalizedDraft {
        checked,
        payload_digest,
        timestamp,
    } = normalized;
    IntegrityDecision {
        subject: checked.subject,
        decision_kind: checked.decision_kind,
        verdict: outcome.recorded_verdict,
        observed_verdict: outcome.observed_verdict,
        scores: checked.scores,
        mode: outcome.mode,
        reason: checked.reason,
        category: checked.category,
        timestamp,
        payload_digest,
        supersedes: checked.supersedes,
    }
}
