// crates/certus-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument parsing, key files, and verification.
// Purpose: Ensure CLI helpers fail closed and verify durable evidence.
// Dependencies: certus-cli main helpers
// ============================================================================

//! ## Overview
//! Covers key file creation, offline verification against a `SQLite` store,
//! and the clap command surface.
//!
//! Security posture: key files must never be overwritten in place.

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

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::sync::Arc;

use certus_config::CertusConfig;
use certus_core::CancelSignal;
use certus_core::DecisionDraft;
use certus_core::NoopOutcomeSink;
use certus_core::SigningBackend;
use certus_core::runtime::Ed25519Signer;
use certus_server::ServiceBackends;
use clap::Parser;
use serde_json::json;

use super::Cli;
use super::Commands;
use super::ConfigCommand;
use super::verify_evidence;
use super::write_key_file;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn durable_config(dir: &Path) -> CertusConfig {
    let key_path = dir.join("signing.key");
    write_key_file(&key_path, &Ed25519Signer::from_seed(&[21; 32])).unwrap();
    let toml = format!(
        "[server]\naudit = {{ enabled = false }}\n\n\
         [signing]\nbackend = \"local_key\"\nkey_path = {:?}\n\n\
         [evidence_store]\ntype = \"sqlite\"\npath = {:?}\n",
        key_path.display().to_string(),
        dir.join("evidence.db").display().to_string(),
    );
    CertusConfig::from_bytes(toml.as_bytes()).unwrap()
}

fn draft() -> DecisionDraft {
    serde_json::from_value(json!({
        "subject": "repo/main@4f2a",
        "decision_kind": "scan_result",
        "verdict": "pass",
        "payload": {"findings": []}
    }))
    .unwrap()
}

// ============================================================================
// SECTION: Key Files
// ============================================================================

#[test]
fn key_file_loads_back_as_same_signer() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("k.key");
    let signer = Ed25519Signer::from_seed(&[3; 32]);
    write_key_file(&path, &signer).unwrap();
    let loaded = Ed25519Signer::from_key_file(&path).unwrap();
    assert_eq!(loaded.key_id(), signer.key_id());
}

#[test]
fn key_file_is_never_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("k.key");
    std::fs::write(&path, "existing").unwrap();
    let err = write_key_file(&path, &Ed25519Signer::generate()).unwrap_err();
    assert!(err.to_string().contains("failed to create"), "{err}");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "existing");
}

// ============================================================================
// SECTION: Verification
// ============================================================================

#[test]
fn verify_reads_bundle_written_by_earlier_process() {
    let dir = tempfile::tempdir().unwrap();
    let config = durable_config(dir.path());
    let evidence_id = {
        let backends =
            ServiceBackends::from_config(&config, Arc::new(NoopOutcomeSink)).unwrap();
        backends.bridge.submit(&draft(), &CancelSignal::new()).unwrap().bundle_id
    };

    let result = verify_evidence(&config, evidence_id.as_str()).unwrap();
    assert!(result.is_intact());
    assert!(result.log_included);
    assert!(result.issues.is_empty(), "{:?}", result.issues);
}

#[test]
fn verify_unknown_evidence_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = durable_config(dir.path());
    let err = verify_evidence(&config, &"0f".repeat(32)).unwrap_err();
    assert!(err.to_string().starts_with("evidence not found"), "{err}");
}

#[test]
fn verify_rejects_blank_evidence_id() {
    let err = verify_evidence(&CertusConfig::default(), "   ").unwrap_err();
    assert_eq!(err.to_string(), "evidence id must be non-empty");
}

// ============================================================================
// SECTION: Argument Parsing
// ============================================================================

#[test]
fn verify_command_requires_evidence_id() {
    assert!(Cli::try_parse_from(["certus", "verify"]).is_err());
    let cli = Cli::try_parse_from(["certus", "verify", "--evidence-id", "abc"]).unwrap();
    match cli.command {
        Commands::Verify(command) => {
            assert_eq!(command.evidence_id, "abc");
            assert!(command.config.is_none());
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn config_example_subcommand_parses() {
    let cli = Cli::try_parse_from(["certus", "config", "example"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Config {
            command: ConfigCommand::Example,
        }
    ));
}
