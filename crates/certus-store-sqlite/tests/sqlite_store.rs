// crates/certus-store-sqlite/tests/sqlite_store.rs
// ============================================================================
// Module: SQLite Evidence Store Tests
// Description: Durability, idempotence, and tamper detection for SQLite.
// Purpose: Validate persistence across reopen, first-writer-wins inserts,
//          schema versioning, and corruption detection.
// ============================================================================

//! ## Overview
//! Integration tests for the `SQLite` evidence store:
//! - Bundles and payloads survive reopening the database
//! - Duplicate puts and timestamp claims keep the first record
//! - Row tampering fails closed on load; payload tampering is caught by the
//!   verifier
//! - Unsupported schema versions and directory paths are rejected

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
    reason = "Test-only assertions and helpers are permitted."
)]

use std::path::Path;
use std::sync::Arc;
use std::thread;

use certus_core::BundleRef;
use certus_core::EvidenceStore;
use certus_core::LogId;
use certus_core::PayloadStore;
use certus_core::SigningBackend;
use certus_core::StoreError;
use certus_core::Timestamp;
use certus_core::hashing::DEFAULT_HASH_ALGORITHM;
use certus_core::hashing::hash_bytes;
use certus_core::runtime::CancelSignal;
use certus_core::runtime::Ed25519Signer;
use certus_core::runtime::FixedClock;
use certus_core::runtime::InMemoryTransparencyLog;
use certus_core::runtime::IntegrityBridge;
use certus_core::runtime::IntegrityService;
use certus_core::runtime::KeyRing;
use certus_core::runtime::LogMode;
use certus_core::runtime::PolicyConfig;
use certus_core::runtime::TrustService;
use certus_core::runtime::TrustedKey;
use certus_core::runtime::VerificationIssue;
use certus_core::runtime::Verifier;
use certus_store_sqlite::SqliteEvidenceStore;
use certus_store_sqlite::SqliteStoreConfig;
use certus_store_sqlite::SqliteStoreError;
use proptest::prelude::*;
use rusqlite::Connection;
use rusqlite::params;
use serde_json::json;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

const START_MS: i64 = 1_767_323_045_678;

fn open(path: &Path) -> SqliteEvidenceStore {
    SqliteEvidenceStore::new(SqliteStoreConfig::at(path)).unwrap()
}

/// Submits one scan decision through a bridge backed by `store`.
fn submit(
    store: &SqliteEvidenceStore,
    log: &InMemoryTransparencyLog,
    signer: Ed25519Signer,
    subject: &str,
    extra: serde_json::Value,
) -> BundleRef {
    let trust = TrustService::new(signer, Some(log.clone()), LogMode::Live);
    let bridge = IntegrityBridge::new(
        store.clone(),
        store.clone(),
        IntegrityService::new(PolicyConfig::default()),
        trust,
    )
    .with_clock(Arc::new(FixedClock::new(Timestamp::from_unix_millis(START_MS))));
    let mut input = json!({
        "subject": subject,
        "decision_kind": "scan_result",
        "verdict": "pass",
        "payload": {"target": subject, "findings": []}
    });
    if let (Some(object), Some(extra)) = (input.as_object_mut(), extra.as_object()) {
        object.extend(extra.clone());
    }
    bridge.submit(&serde_json::from_value(input).unwrap(), &CancelSignal::new()).unwrap()
}

fn signer() -> Ed25519Signer {
    Ed25519Signer::from_seed(&[3; 32])
}

fn verifier(
    store: &SqliteEvidenceStore,
    log: &InMemoryTransparencyLog,
) -> Verifier<SqliteEvidenceStore, SqliteEvidenceStore, InMemoryTransparencyLog> {
    let mut ring = KeyRing::new();
    ring.insert(TrustedKey::unbounded(signer().verifying_key()));
    Verifier::new(store.clone(), store.clone(), Some(log.clone()), ring)
}

// ============================================================================
// SECTION: Persistence
// ============================================================================

#[test]
fn bundles_survive_reopen_and_verify() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("evidence.db");
    let log = InMemoryTransparencyLog::new(LogId::new("test-log"));
    let submitted = {
        let store = open(&path);
        submit(&store, &log, signer(), "repo/main@4f2a", json!({}))
    };

    let reopened = open(&path);
    let bundle = reopened.get(&submitted.bundle_id).unwrap().unwrap();
    assert_eq!(bundle.bundle_id, submitted.bundle_id);
    let result = verifier(&reopened, &log).verify(&submitted.bundle_id).unwrap();
    assert!(result.is_intact(), "unexpected issues: {:?}", result.issues);
    assert!(result.log_included);
}

#[test]
fn nested_parent_directory_is_created() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("deeper").join("evidence.db");
    let store = open(&path);
    assert_eq!(store.bundle_count().unwrap(), 0);
    assert!(path.exists());
}

// ============================================================================
// SECTION: First Writer Wins
// ============================================================================

#[test]
fn duplicate_put_keeps_first_record() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir.path().join("evidence.db"));
    let log = InMemoryTransparencyLog::new(LogId::new("test-log"));
    let submitted = submit(&store, &log, signer(), "s", json!({}));
    let mut bundle = store.get(&submitted.bundle_id).unwrap().unwrap();
    let original_created_at = bundle.created_at;
    bundle.created_at = Timestamp::from_unix_millis(START_MS + 60_000);

    let outcome = store.put(&bundle).unwrap();
    assert!(!outcome.inserted);
    assert_eq!(store.bundle_count().unwrap(), 1);
    let stored = store.get(&submitted.bundle_id).unwrap().unwrap();
    assert_eq!(stored.created_at, original_created_at);
}

#[test]
fn concurrent_claims_observe_one_winner() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir.path().join("evidence.db"));
    let submission = hash_bytes(DEFAULT_HASH_ALGORITHM, b"submission");
    let handles: Vec<_> = (0 .. 8)
        .map(|offset| {
            let store = store.clone();
            let submission = submission.clone();
            thread::spawn(move || {
                store
                    .claim_timestamp(&submission, Timestamp::from_unix_millis(START_MS + offset))
                    .unwrap()
            })
        })
        .collect();
    let claims: Vec<Timestamp> = handles.into_iter().map(|handle| handle.join().unwrap()).collect();
    assert!(claims.windows(2).all(|pair| pair[0] == pair[1]));
    let later = store
        .claim_timestamp(&submission, Timestamp::from_unix_millis(START_MS + 1_000_000))
        .unwrap();
    assert_eq!(later, claims[0]);
}

#[test]
fn racing_bridges_store_one_bundle() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("evidence.db");
    let store = open(&path);
    let log = InMemoryTransparencyLog::new(LogId::new("test-log"));
    let handles: Vec<_> = (0 .. 8)
        .map(|offset| {
            let store = store.clone();
            let log = log.clone();
            thread::spawn(move || {
                let trust = TrustService::new(signer(), Some(log), LogMode::Live);
                let bridge = IntegrityBridge::new(
                    store.clone(),
                    store,
                    IntegrityService::new(PolicyConfig::default()),
                    trust,
                )
                .with_clock(Arc::new(FixedClock::new(Timestamp::from_unix_millis(START_MS + offset))));
                let input = json!({
                    "subject": "repo/main@4f2a",
                    "decision_kind": "scan_result",
                    "verdict": "pass",
                    "payload": {"findings": []}
                });
                bridge
                    .submit(&serde_json::from_value(input).unwrap(), &CancelSignal::new())
                    .unwrap()
                    .bundle_id
            })
        })
        .collect();
    let ids: Vec<_> = handles.into_iter().map(|handle| handle.join().unwrap()).collect();
    assert!(ids.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(log.size().unwrap(), 1);

    let raw = Connection::open(&path).unwrap();
    let rows: i64 = raw.query_row("SELECT COUNT(*) FROM bundles", params![], |row| row.get(0)).unwrap();
    assert_eq!(rows, 1);
    assert!(verifier(&store, &log).verify(&ids[0]).unwrap().log_included);
}

#[test]
fn correction_index_persists() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("evidence.db");
    let log = InMemoryTransparencyLog::new(LogId::new("test-log"));
    let (original, correction) = {
        let store = open(&path);
        let original = submit(&store, &log, signer(), "scan-9", json!({}));
        let correction = submit(
            &store,
            &log,
            signer(),
            "scan-9",
            json!({"verdict": "fail", "supersedes": original.bundle_id.as_str()}),
        );
        (original, correction)
    };
    let store = open(&path);
    assert_eq!(store.superseded_by(&original.bundle_id).unwrap(), vec![correction.bundle_id]);
}

// ============================================================================
// SECTION: Tamper Detection
// ============================================================================

#[test]
fn tampered_bundle_row_fails_closed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("evidence.db");
    let log = InMemoryTransparencyLog::new(LogId::new("test-log"));
    let store = open(&path);
    let submitted = submit(&store, &log, signer(), "s", json!({}));

    let raw = Connection::open(&path).unwrap();
    raw.execute(
        "UPDATE bundles SET bundle_json = CAST(replace(CAST(bundle_json AS TEXT), '\"pass\"', \
         '\"fail\"') AS BLOB) WHERE bundle_id = ?1",
        params![submitted.bundle_id.as_str()],
    )
    .unwrap();

    let err = store.get(&submitted.bundle_id).unwrap_err();
    assert!(matches!(err, StoreError::Corrupt(_)));
}

#[test]
fn tampered_payload_is_caught_by_verifier() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("evidence.db");
    let log = InMemoryTransparencyLog::new(LogId::new("test-log"));
    let store = open(&path);
    let submitted = submit(&store, &log, signer(), "s", json!({}));
    let bundle = store.get(&submitted.bundle_id).unwrap().unwrap();
    let digest = bundle.content.primary().unwrap().payload_digest.clone();

    let raw = Connection::open(&path).unwrap();
    raw.execute(
        "UPDATE payloads SET payload = ?1 WHERE digest = ?2",
        params![br#"{"findings":[],"target":"elsewhere"}"#.to_vec(), digest.value],
    )
    .unwrap();

    assert!(store.get_payload(&digest).unwrap().is_some());
    let result = verifier(&store, &log).verify(&submitted.bundle_id).unwrap();
    assert!(!result.digest_matches);
    assert!(result.signature_valid);
    assert!(result.issues.contains(&VerificationIssue::PayloadDigestMismatch));
}

// ============================================================================
// SECTION: Schema and Paths
// ============================================================================

#[test]
fn unsupported_schema_version_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("evidence.db");
    drop(open(&path));
    let raw = Connection::open(&path).unwrap();
    raw.execute("UPDATE store_meta SET version = 99", params![]).unwrap();
    drop(raw);

    let result = SqliteEvidenceStore::new(SqliteStoreConfig::at(&path));
    assert!(matches!(result, Err(SqliteStoreError::VersionMismatch(_))));
}

#[test]
fn directory_path_is_rejected() {
    let dir = TempDir::new().unwrap();
    let result = SqliteEvidenceStore::new(SqliteStoreConfig::at(dir.path()));
    assert!(matches!(result, Err(SqliteStoreError::Invalid(_))));
}

#[test]
fn missing_payload_is_none() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir.path().join("evidence.db"));
    let digest = hash_bytes(DEFAULT_HASH_ALGORITHM, b"never stored");
    assert!(store.get_payload(&digest).unwrap().is_none());
}

// ============================================================================
// SECTION: Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn first_claim_wins_for_any_sequence(offsets in prop::collection::vec(0_i64 .. 1_000_000, 1 .. 8)) {
        let dir = TempDir::new().unwrap();
        let store = open(&dir.path().join("evidence.db"));
        let submission = hash_bytes(DEFAULT_HASH_ALGORITHM, b"claims");
        let first = Timestamp::from_unix_millis(START_MS + offsets[0]);
        for offset in &offsets {
            let claimed = store
                .claim_timestamp(&submission, Timestamp::from_unix_millis(START_MS + offset))
                .unwrap();
            prop_assert_eq!(claimed, first);
        }
    }
}
