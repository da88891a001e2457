// crates/certus-core/src/runtime/mod.rs
// ============================================================================
// Module: Certus Runtime
// Description: Submission pipeline, verifier, and backend implementations.
// Purpose: Turn producer drafts into stored evidence and verify it later.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules implement the bridge, policy gate, trust service, and
//! verifier, plus in-process backends for every interface. The HTTP server
//! and CLI call into the same bridge and verifier.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod bridge;
pub mod clock;
pub mod policy;
pub mod retry;
pub mod signing;
pub mod stats;
pub mod store;
pub mod tlog;
pub mod trust;
pub mod verifier;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use bridge::CancelSignal;
pub use bridge::IntegrityBridge;
pub use bridge::SubmissionTrace;
pub use bridge::SubmitError;
pub use clock::FixedClock;
pub use clock::SystemClock;
pub use policy::IntegrityService;
pub use policy::ModeOverride;
pub use policy::PolicyConfig;
pub use policy::PolicyInput;
pub use retry::RetryPolicy;
pub use retry::RetriedSubmission;
pub use retry::Sleeper;
pub use retry::ThreadSleeper;
pub use retry::submit_traced_with_retry;
pub use retry::submit_with_retry;
pub use signing::Ed25519Signer;
pub use signing::KeyResolution;
pub use signing::KeyRing;
pub use signing::SharedSigningBackend;
pub use signing::TrustedKey;
pub use signing::key_id_for;
pub use stats::AggregatorHandle;
pub use stats::OutcomeAggregator;
pub use stats::OutcomeStats;
pub use stats::StatsError;
pub use store::InMemoryEvidenceStore;
pub use store::InMemoryPayloadStore;
pub use store::SharedEvidenceStore;
pub use store::SharedPayloadStore;
pub use tlog::InMemoryTransparencyLog;
pub use tlog::SharedTransparencyLog;
pub use trust::LogMode;
pub use trust::SignedEntry;
pub use trust::TrustError;
pub use trust::TrustService;
pub use verifier::VerificationIssue;
pub use verifier::VerificationResult;
pub use verifier::Verifier;
pub use verifier::VerifyError;
