// crates/certus-core/tests/common/mod.rs
// =============================================================================
// Module: Pipeline Test Helpers
// Description: Shared in-memory pipeline harness for integration tests.
// Purpose: Build bridges and verifiers over shared in-memory backends.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]
#![allow(clippy::unwrap_used, reason = "Test-only fixture parsing.")]

use std::sync::Arc;

use certus_core::DecisionDraft;
use certus_core::LogId;
use certus_core::NoopOutcomeSink;
use certus_core::OutcomeSink;
use certus_core::SigningBackend;
use certus_core::Timestamp;
use certus_core::runtime::CancelSignal;
use certus_core::runtime::Ed25519Signer;
use certus_core::runtime::FixedClock;
use certus_core::runtime::InMemoryEvidenceStore;
use certus_core::runtime::InMemoryPayloadStore;
use certus_core::runtime::InMemoryTransparencyLog;
use certus_core::runtime::IntegrityBridge;
use certus_core::runtime::IntegrityService;
use certus_core::runtime::KeyRing;
use certus_core::runtime::LogMode;
use certus_core::runtime::PolicyConfig;
use certus_core::runtime::SharedSigningBackend;
use certus_core::runtime::TrustService;
use certus_core::runtime::TrustedKey;
use certus_core::runtime::Verifier;
use serde_json::Value;

/// Bridge type used across suites.
pub type TestBridge = IntegrityBridge<
    InMemoryEvidenceStore,
    InMemoryPayloadStore,
    SharedSigningBackend,
    InMemoryTransparencyLog,
>;

/// Verifier type used across suites.
pub type TestVerifier =
    Verifier<InMemoryEvidenceStore, InMemoryPayloadStore, InMemoryTransparencyLog>;

/// Fixed seed so key ids are stable across runs.
pub const SEED: [u8; 32] = [7; 32];

/// Start time of the fixed clock.
pub const START_MS: i64 = 1_767_323_045_678;

/// In-memory pipeline with handles to every backend.
pub struct Harness {
    /// Evidence store shared with the bridge.
    pub store: InMemoryEvidenceStore,
    /// Payload store shared with the bridge.
    pub payloads: InMemoryPayloadStore,
    /// Transparency log shared with the bridge.
    pub log: InMemoryTransparencyLog,
    /// Signing backend shared with the bridge.
    pub signer: SharedSigningBackend,
    /// Clock shared with the bridge.
    pub clock: FixedClock,
    /// Submission pipeline.
    pub bridge: TestBridge,
}

impl Harness {
    /// Builds a harness with default policy and a live log.
    pub fn new() -> Self {
        Self::with(LogMode::Live, PolicyConfig::default())
    }

    /// Builds a harness with the given log mode and policy.
    pub fn with(mode: LogMode, policy: PolicyConfig) -> Self {
        Self::build(mode, policy, Arc::new(NoopOutcomeSink))
    }

    /// Builds a harness that reports outcomes to `outcomes`.
    pub fn build(
        mode: LogMode,
        policy: PolicyConfig,
        outcomes: Arc<dyn OutcomeSink + Send + Sync>,
    ) -> Self {
        let store = InMemoryEvidenceStore::new();
        let payloads = InMemoryPayloadStore::new();
        let log = InMemoryTransparencyLog::new(LogId::new("test-log"));
        let signer = SharedSigningBackend::from_backend(Ed25519Signer::from_seed(&SEED));
        let clock = FixedClock::new(Timestamp::from_unix_millis(START_MS));
        let trust = TrustService::new(signer.clone(), Some(log.clone()), mode);
        let bridge = IntegrityBridge::new(
            store.clone(),
            payloads.clone(),
            IntegrityService::new(policy),
            trust,
        )
        .with_clock(Arc::new(clock.clone()))
        .with_outcome_sink(outcomes);
        Self {
            store,
            payloads,
            log,
            signer,
            clock,
            bridge,
        }
    }

    /// Key ring trusting the harness signer without a window.
    pub fn key_ring(&self) -> KeyRing {
        let mut ring = KeyRing::new();
        ring.insert(TrustedKey::unbounded(self.signer.verifying_key()));
        ring
    }

    /// Verifier over the harness stores and live log.
    pub fn verifier(&self) -> TestVerifier {
        Verifier::new(
            self.store.clone(),
            self.payloads.clone(),
            Some(self.log.clone()),
            self.key_ring(),
        )
    }
}

/// Parses a JSON value into a draft.
pub fn draft(value: Value) -> DecisionDraft {
    serde_json::from_value(value).unwrap()
}

/// Returns an unset cancel signal.
pub fn no_cancel() -> CancelSignal {
    CancelSignal::new()
}
