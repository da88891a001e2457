// crates/certus-server/tests/http_transparency_log.rs
// ============================================================================
// Module: HTTP Transparency Log Tests
// Description: Client behavior against a scripted log service.
// Purpose: Validate error classification and local receipt checks.
// Dependencies: certus-server, certus-core, tiny_http
// ============================================================================

//! ## Overview
//! The stub log answers with canned statuses and receipts; the client must
//! separate transient outages from refusals and reject receipts for a
//! different leaf.
//!
//! Security posture: the log service is untrusted; see
//! `Docs/security/threat_model.md`.

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
use certus_core::KeyId;
use certus_core::LogError;
use certus_core::LogId;
use certus_core::LogLeaf;
use certus_core::LogReceipt;
use certus_core::TransparencyLog;
use certus_core::runtime::InMemoryTransparencyLog;
use certus_server::HttpTransparencyLog;
use certus_server::HttpTransparencyLogSettings;

use crate::common::closed_url;
use crate::common::spawn_stub;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn leaf(tag: &str) -> LogLeaf {
    LogLeaf {
        bundle_id: BundleId::new(tag.repeat(32)),
        key_id: KeyId::new("ed25519:0011223344556677"),
        signature: "c2lnbmF0dXJl".to_string(),
    }
}

/// Produces a genuine receipt for `leaf` from an in-memory log.
fn receipt_for(leaf: &LogLeaf) -> LogReceipt {
    let log = InMemoryTransparencyLog::new(LogId::new("remote-log"));
    log.append(leaf).unwrap()
}

fn client(base_url: String) -> HttpTransparencyLog {
    HttpTransparencyLog::new(HttpTransparencyLogSettings {
        base_url,
        log_id: LogId::new("remote-log"),
        timeout_ms: 2_000,
    })
    .unwrap()
}

// ============================================================================
// SECTION: Append
// ============================================================================

#[test]
fn append_posts_leaf_and_returns_checked_receipt() {
    let leaf = leaf("ab");
    let receipt = receipt_for(&leaf);
    let (url, handle) = spawn_stub(vec![(200, serde_json::to_string(&receipt).unwrap())]);

    let returned = client(url).append(&leaf).unwrap();
    assert_eq!(returned, receipt);

    let requests = handle.join().unwrap();
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].url, "/v1/log/entries");
    let sent: LogLeaf = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(sent, leaf);
}

#[test]
fn base_path_is_preserved() {
    let leaf = leaf("ab");
    let receipt = receipt_for(&leaf);
    let (url, handle) = spawn_stub(vec![(200, serde_json::to_string(&receipt).unwrap())]);

    client(format!("{url}/tenant-a")).append(&leaf).unwrap();
    let requests = handle.join().unwrap();
    assert_eq!(requests[0].url, "/tenant-a/v1/log/entries");
}

#[test]
fn server_error_is_unavailable() {
    let (url, handle) = spawn_stub(vec![(503, "busy".to_string())]);
    let err = client(url).append(&leaf("ab")).unwrap_err();
    assert!(matches!(err, LogError::Unavailable(_)), "{err:?}");
    handle.join().unwrap();
}

#[test]
fn client_error_is_rejected() {
    let (url, handle) = spawn_stub(vec![(400, "bad leaf".to_string())]);
    let err = client(url).append(&leaf("ab")).unwrap_err();
    assert!(matches!(err, LogError::Rejected(_)), "{err:?}");
    handle.join().unwrap();
}

#[test]
fn receipt_for_other_leaf_is_rejected() {
    let other = receipt_for(&leaf("cd"));
    let (url, handle) = spawn_stub(vec![(200, serde_json::to_string(&other).unwrap())]);
    let err = client(url).append(&leaf("ab")).unwrap_err();
    assert_eq!(err, LogError::Rejected("receipt leaf hash mismatch".to_string()));
    handle.join().unwrap();
}

#[test]
fn malformed_receipt_is_rejected() {
    let (url, handle) = spawn_stub(vec![(200, "{\"leaf_index\": \"zero\"}".to_string())]);
    let err = client(url).append(&leaf("ab")).unwrap_err();
    assert!(matches!(err, LogError::Rejected(_)), "{err:?}");
    handle.join().unwrap();
}

#[test]
fn unreachable_log_is_unavailable() {
    let err = client(closed_url()).append(&leaf("ab")).unwrap_err();
    assert!(matches!(err, LogError::Unavailable(_)), "{err:?}");
}

// ============================================================================
// SECTION: Inclusion Proofs
// ============================================================================

#[test]
fn inclusion_proof_fetches_indexed_entry() {
    let leaf = leaf("ab");
    let receipt = receipt_for(&leaf);
    let (url, handle) = spawn_stub(vec![(200, serde_json::to_string(&receipt).unwrap())]);

    let fresh = client(url).inclusion_proof(0).unwrap();
    assert_eq!(fresh.leaf_hash, receipt.leaf_hash);

    let requests = handle.join().unwrap();
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].url, "/v1/log/entries/0/proof");
}

#[test]
fn missing_entry_is_not_found() {
    let (url, handle) = spawn_stub(vec![(404, "no such leaf".to_string())]);
    let err = client(url).inclusion_proof(7).unwrap_err();
    assert!(matches!(err, LogError::NotFound(_)), "{err:?}");
    handle.join().unwrap();
}

#[test]
fn proof_server_error_is_unavailable() {
    let (url, handle) = spawn_stub(vec![(500, "boom".to_string())]);
    let err = client(url).inclusion_proof(0).unwrap_err();
    assert!(matches!(err, LogError::Unavailable(_)), "{err:?}");
    handle.join().unwrap();
}
