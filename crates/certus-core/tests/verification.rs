// crates/certus-core/tests/verification.rs
// ============================================================================
// Module: Verification Tests
// Description: Tamper detection, mock-mode transparency, and key rotation.
// ============================================================================
//! ## Overview
//! Exercises the verifier against mutated payloads, mock log references,
//! unreachable logs, rotated keys, and corrections via `supersedes`.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use certus_core::BundleId;
use certus_core::EvidenceStore;
use certus_core::LogEntryRef;
use certus_core::LogId;
use certus_core::LogStatus;
use certus_core::SigningBackend;
use certus_core::Timestamp;
use certus_core::TransparencyLog;
use certus_core::ValidationError;
use certus_core::runtime::Ed25519Signer;
use certus_core::runtime::InMemoryTransparencyLog;
use certus_core::runtime::KeyRing;
use certus_core::runtime::LogMode;
use certus_core::runtime::PolicyConfig;
use certus_core::runtime::SubmitError;
use certus_core::runtime::TrustedKey;
use certus_core::runtime::VerificationIssue;
use certus_core::runtime::Verifier;
use certus_core::runtime::VerifyError;
use common::Harness;
use common::START_MS;
use common::draft;
use common::no_cancel;
use serde_json::Value;
use serde_json::json;

fn scan(subject: &str) -> Value {
    json!({
        "subject": subject,
        "decision_kind": "scan_result",
        "verdict": "pass",
        "payload": {"target": subject, "findings": []}
    })
}

// ============================================================================
// SECTION: Tamper Detection
// ============================================================================

#[test]
fn mutated_payload_fails_digest_check() {
    let harness = Harness::new();
    let submitted = harness.bridge.submit(&draft(scan("scan-1")), &no_cancel()).unwrap();
    let bundle = harness.store.get(&submitted.bundle_id).unwrap().unwrap();
    let digest = bundle.content.primary().unwrap().payload_digest.clone();

    harness.payloads.overwrite(&digest, br#"{"findings":[],"target":"other"}"#.to_vec()).unwrap();

    let result = harness.verifier().verify(&submitted.bundle_id).unwrap();
    assert!(!result.digest_matches);
    assert!(result.signature_valid);
    assert!(result.issues.contains(&VerificationIssue::PayloadDigestMismatch));
}

#[test]
fn unknown_bundle_is_not_found() {
    let harness = Harness::new();
    let err = harness.verifier().verify(&BundleId::new("00".repeat(32))).unwrap_err();
    assert!(matches!(err, VerifyError::NotFound(_)));
}

// ============================================================================
// SECTION: Log Modes
// ============================================================================

#[test]
fn fallback_bundle_is_flagged_and_not_included() {
    let harness = Harness::with(LogMode::LiveWithMockFallback, PolicyConfig::default());
    let live = harness.bridge.submit(&draft(scan("live")), &no_cancel()).unwrap();
    harness.log.set_available(false);
    let mocked = harness.bridge.submit(&draft(scan("offline")), &no_cancel()).unwrap();

    assert_eq!(live.log_status, LogStatus::Included);
    assert_eq!(mocked.log_status, LogStatus::UnverifiedExternally);
    assert!(mocked.log_entry_ref.as_ref().is_some_and(LogEntryRef::is_mock));

    harness.log.set_available(true);
    let verifier = harness.verifier();
    let live_result = verifier.verify(&live.bundle_id).unwrap();
    let mock_result = verifier.verify(&mocked.bundle_id).unwrap();
    assert!(live_result.log_included);
    assert!(!mock_result.log_included);
    assert!(mock_result.signature_valid);
    assert!(mock_result.digest_matches);
    assert_eq!(mock_result.issues, vec![VerificationIssue::UnverifiedExternally]);
}

#[test]
fn live_mode_surfaces_log_outage_with_bundle_id() {
    let harness = Harness::new();
    harness.log.set_available(false);
    let err = harness.bridge.submit(&draft(scan("s")), &no_cancel()).unwrap_err();
    assert!(err.is_retryable());
    assert!(matches!(err, SubmitError::LogUnavailable { .. }));
    assert!(err.bundle_id().is_some());
    assert!(harness.store.is_empty().unwrap());
}

#[test]
fn mock_mode_never_contacts_log() {
    let harness = Harness::with(LogMode::Mock, PolicyConfig::default());
    let submitted = harness.bridge.submit(&draft(scan("s")), &no_cancel()).unwrap();
    assert_eq!(submitted.log_status, LogStatus::UnverifiedExternally);
    assert_eq!(harness.log.size().unwrap(), 0);
}

#[test]
fn unreachable_log_falls_back_to_embedded_proof() {
    let harness = Harness::new();
    let submitted = harness.bridge.submit(&draft(scan("s")), &no_cancel()).unwrap();
    harness.log.set_available(false);
    let result = harness.verifier().verify(&submitted.bundle_id).unwrap();
    assert!(result.log_included);
    assert_eq!(result.issues, vec![VerificationIssue::LogUnreachable]);
}

#[test]
fn reachable_log_without_entry_is_not_included() {
    let harness = Harness::new();
    let submitted = harness.bridge.submit(&draft(scan("s")), &no_cancel()).unwrap();
    let empty = InMemoryTransparencyLog::new(LogId::new("test-log"));
    let verifier =
        Verifier::new(harness.store.clone(), harness.payloads.clone(), Some(empty), harness.key_ring());
    let result = verifier.verify(&submitted.bundle_id).unwrap();
    assert!(!result.log_included);
    assert!(result.is_intact());
    assert_eq!(result.issues, vec![VerificationIssue::NotInLog]);
}

#[test]
fn reused_index_in_foreign_log_is_not_included() {
    let harness = Harness::new();
    let submitted = harness.bridge.submit(&draft(scan("first")), &no_cancel()).unwrap();
    let other = Harness::new();
    other.bridge.submit(&draft(scan("second")), &no_cancel()).unwrap();
    let verifier = Verifier::new(
        harness.store.clone(),
        harness.payloads.clone(),
        Some(other.log.clone()),
        harness.key_ring(),
    );
    let result = verifier.verify(&submitted.bundle_id).unwrap();
    assert!(!result.log_included);
    assert_eq!(result.issues, vec![VerificationIssue::InclusionProofInvalid]);
}

#[test]
fn instance_scoped_log_defers_to_embedded_proof() {
    let harness = Harness::new();
    let submitted = harness.bridge.submit(&draft(scan("s")), &no_cancel()).unwrap();
    let base = LogId::new("test-log");
    let restarted = InMemoryTransparencyLog::instance_scoped(&base);
    assert_ne!(restarted.log_id(), base);
    assert_ne!(restarted.log_id(), InMemoryTransparencyLog::instance_scoped(&base).log_id());
    assert!(restarted.log_id().as_str().starts_with("test-log/"));

    let verifier = Verifier::new(
        harness.store.clone(),
        harness.payloads.clone(),
        Some(restarted),
        harness.key_ring(),
    );
    let result = verifier.verify(&submitted.bundle_id).unwrap();
    assert!(result.log_included);
    assert!(result.issues.is_empty(), "{:?}", result.issues);
}

#[test]
fn earlier_receipt_verifies_against_grown_log() {
    let harness = Harness::new();
    let first = harness.bridge.submit(&draft(scan("first")), &no_cancel()).unwrap();
    for index in 0 .. 5 {
        harness.bridge.submit(&draft(scan(&format!("later-{index}"))), &no_cancel()).unwrap();
    }
    let result = harness.verifier().verify(&first.bundle_id).unwrap();
    assert!(result.log_included);
}

#[test]
fn verification_works_without_signer_or_log() {
    let harness = Harness::new();
    let submitted = harness.bridge.submit(&draft(scan("s")), &no_cancel()).unwrap();
    let offline: Verifier<_, _, InMemoryTransparencyLog> =
        Verifier::new(harness.store.clone(), harness.payloads.clone(), None, harness.key_ring());
    let result = offline.verify(&submitted.bundle_id).unwrap();
    assert!(result.is_intact());
    assert!(result.log_included);
}

// ============================================================================
// SECTION: Key Rotation
// ============================================================================

#[test]
fn key_outside_window_is_reported() {
    let harness = Harness::new();
    let submitted = harness.bridge.submit(&draft(scan("s")), &no_cancel()).unwrap();
    let mut ring = KeyRing::new();
    ring.insert(TrustedKey::windowed(
        harness.signer.verifying_key(),
        Some(Timestamp::from_unix_millis(START_MS + 1)),
        None,
    ));
    let verifier = Verifier::new(
        harness.store.clone(),
        harness.payloads.clone(),
        Some(harness.log.clone()),
        ring,
    );
    let result = verifier.verify(&submitted.bundle_id).unwrap();
    assert!(!result.signature_valid);
    assert!(result.issues.contains(&VerificationIssue::KeyNotValidAtTimestamp));
}

#[test]
fn rotated_ring_still_verifies_old_bundles() {
    let harness = Harness::new();
    let submitted = harness.bridge.submit(&draft(scan("s")), &no_cancel()).unwrap();
    let successor = Ed25519Signer::from_seed(&[9; 32]);
    let mut ring = KeyRing::new();
    ring.insert(TrustedKey::windowed(
        harness.signer.verifying_key(),
        None,
        Some(Timestamp::from_unix_millis(START_MS + 1_000)),
    ));
    ring.insert(TrustedKey::windowed(
        successor.verifying_key(),
        Some(Timestamp::from_unix_millis(START_MS + 1_000)),
        None,
    ));
    let verifier = Verifier::new(
        harness.store.clone(),
        harness.payloads.clone(),
        Some(harness.log.clone()),
        ring,
    );
    assert!(verifier.verify(&submitted.bundle_id).unwrap().signature_valid);
}

#[test]
fn unknown_key_is_reported() {
    let harness = Harness::new();
    let submitted = harness.bridge.submit(&draft(scan("s")), &no_cancel()).unwrap();
    let verifier = Verifier::new(
        harness.store.clone(),
        harness.payloads.clone(),
        Some(harness.log.clone()),
        KeyRing::new(),
    );
    let result = verifier.verify(&submitted.bundle_id).unwrap();
    assert!(!result.signature_valid);
    assert!(result.issues.contains(&VerificationIssue::UnknownSigningKey));
}

// ============================================================================
// SECTION: Corrections
// ============================================================================

#[test]
fn correction_annotates_without_invalidating() {
    let harness = Harness::new();
    let original = harness.bridge.submit(&draft(scan("scan-9")), &no_cancel()).unwrap();
    let mut correction = scan("scan-9");
    correction["verdict"] = json!("fail");
    correction["reason"] = json!("late finding");
    correction["supersedes"] = json!(original.bundle_id.as_str());
    let corrected = harness.bridge.submit(&draft(correction), &no_cancel()).unwrap();

    let result = harness.verifier().verify(&original.bundle_id).unwrap();
    assert!(result.is_intact());
    assert!(result.log_included);
    assert_eq!(result.superseded_by, vec![corrected.bundle_id]);
}

#[test]
fn correction_of_unknown_bundle_is_rejected() {
    let harness = Harness::new();
    let mut correction = scan("scan-9");
    correction["supersedes"] = json!("ff".repeat(32));
    let err = harness.bridge.submit(&draft(correction), &no_cancel()).unwrap_err();
    assert!(matches!(err, SubmitError::Validation(ValidationError::UnknownSupersedes(_))));
}
