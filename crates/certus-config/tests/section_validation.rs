//! Section validation tests for certus-config.
// crates/certus-config/tests/section_validation.rs
// =============================================================================
// Module: Section Validation Tests
// Description: Cross-field and range checks for every config section.
// Purpose: Ensure invalid backend combinations fail closed at load time.
// =============================================================================

use std::path::PathBuf;

use certus_config::EvidenceStoreType;
use certus_config::LogBackendType;
use certus_config::RemoteSignerConfig;
use certus_config::SigningBackendType;
use certus_config::TrustedKeyConfig;
use certus_core::PolicyMode;
use certus_core::SigningBackend;
use certus_core::TimestampInput;
use certus_core::runtime::Ed25519Signer;
use certus_core::runtime::ModeOverride;
use certus_core::runtime::signing::encode_public_key;

mod common;

use common::TestResult;
use common::assert_invalid;
use common::minimal_config;

fn public_key(seed: u8) -> String {
    encode_public_key(&Ed25519Signer::from_seed(&[seed; 32]).verifying_key())
}

// ============================================================================
// SECTION: Server
// ============================================================================

#[test]
fn max_body_bytes_bounds() -> TestResult {
    let mut config = minimal_config()?;
    config.server.max_body_bytes = 0;
    assert_invalid(config.validate(), "max_body_bytes must be greater than zero")?;
    config.server.max_body_bytes = certus_config::MAX_BODY_BYTES_LIMIT + 1;
    assert_invalid(config.validate(), "max_body_bytes must be at most")?;
    config.server.max_body_bytes = 1;
    config.validate().map_err(|err| err.to_string())
}

#[test]
fn bind_must_be_socket_address() -> TestResult {
    let mut config = minimal_config()?;
    config.server.bind = "localhost".to_string();
    assert_invalid(config.validate(), "invalid bind address")
}

#[test]
fn blank_audit_path_is_rejected() -> TestResult {
    let mut config = minimal_config()?;
    config.server.audit.path = Some("  ".to_string());
    assert_invalid(config.validate(), "audit.path must be non-empty")
}

// ============================================================================
// SECTION: Policy
// ============================================================================

#[test]
fn override_category_must_be_non_empty() -> TestResult {
    let mut config = minimal_config()?;
    config.policy.overrides.push(ModeOverride {
        category: " ".to_string(),
        decision_kind: None,
        mode: PolicyMode::Enforce,
    });
    assert_invalid(config.validate(), "category must be non-empty")
}

#[test]
fn duplicate_override_target_is_rejected() -> TestResult {
    let mut config = minimal_config()?;
    let entry = ModeOverride {
        category: "pii".to_string(),
        decision_kind: None,
        mode: PolicyMode::Enforce,
    };
    config.policy.overrides.push(entry.clone());
    config.policy.overrides.push(entry);
    assert_invalid(config.validate(), "duplicate policy override")
}

#[test]
fn same_category_for_different_kinds_is_allowed() -> TestResult {
    let config = common::config_from_toml(
        "[[policy.overrides]]\ncategory = \"pii\"\nmode = \"enforce\"\n\n[[policy.overrides]]\n\
         category = \"pii\"\ndecision_kind = \"guardrail_result\"\nmode = \"shadow\"\n",
    )
    .map_err(|err| err.to_string())?;
    config.validate().map_err(|err| err.to_string())
}

// ============================================================================
// SECTION: Signing
// ============================================================================

#[test]
fn local_key_requires_path() -> TestResult {
    let mut config = minimal_config()?;
    config.signing.backend = SigningBackendType::LocalKey;
    assert_invalid(config.validate(), "local_key signing requires key_path")
}

#[test]
fn ephemeral_rejects_key_path() -> TestResult {
    let mut config = minimal_config()?;
    config.signing.key_path = Some(PathBuf::from("key"));
    assert_invalid(config.validate(), "ephemeral signing must not set key_path")
}

#[test]
fn remote_signer_requires_valid_key_and_url() -> TestResult {
    let mut config = minimal_config()?;
    config.signing.backend = SigningBackendType::Remote;
    assert_invalid(config.validate(), "remote signing requires remote settings")?;
    config.signing.remote = Some(RemoteSignerConfig {
        url: "ftp://kms.example.com".to_string(),
        public_key: public_key(1),
        timeout_ms: 2_000,
    });
    assert_invalid(config.validate(), "is not http(s)")?;
    config.signing.remote = Some(RemoteSignerConfig {
        url: "https://kms.example.com/sign".to_string(),
        public_key: "not-a-key".to_string(),
        timeout_ms: 2_000,
    });
    assert_invalid(config.validate(), "signing.remote.public_key")?;
    config.signing.remote = Some(RemoteSignerConfig {
        url: "https://kms.example.com/sign".to_string(),
        public_key: public_key(1),
        timeout_ms: 2_000,
    });
    config.validate().map_err(|err| err.to_string())
}

#[test]
fn trusted_key_window_must_be_ordered() -> TestResult {
    let mut config = minimal_config()?;
    config.signing.trusted_keys.push(TrustedKeyConfig {
        public_key: public_key(2),
        not_before: Some(TimestampInput::Rfc3339("2026-06-01T00:00:00Z".to_string())),
        not_after: Some(TimestampInput::UnixMillis(0)),
    });
    assert_invalid(config.validate(), "not_before must precede not_after")
}

#[test]
fn key_ring_includes_history_and_active_key() -> TestResult {
    let mut config = minimal_config()?;
    let retired = Ed25519Signer::from_seed(&[2; 32]);
    let active = Ed25519Signer::from_seed(&[3; 32]);
    config.signing.trusted_keys.push(TrustedKeyConfig {
        public_key: encode_public_key(&retired.verifying_key()),
        not_before: None,
        not_after: Some(TimestampInput::Rfc3339("2026-01-01T00:00:00Z".to_string())),
    });
    config.validate().map_err(|err| err.to_string())?;
    let ring =
        config.signing.key_ring(Some(&active.verifying_key())).map_err(|err| err.to_string())?;
    if ring.len() != 2 {
        return Err(format!("expected 2 keys, got {}", ring.len()));
    }
    Ok(())
}

// ============================================================================
// SECTION: Transparency Log
// ============================================================================

#[test]
fn http_log_requires_url() -> TestResult {
    let mut config = minimal_config()?;
    config.transparency_log.backend = LogBackendType::Http;
    assert_invalid(config.validate(), "http transparency_log requires url")
}

#[test]
fn local_log_rejects_url() -> TestResult {
    let mut config = minimal_config()?;
    config.transparency_log.url = Some("https://tlog.example.com".to_string());
    assert_invalid(config.validate(), "local transparency_log must not set url")
}

#[test]
fn log_timeout_out_of_range_is_rejected() -> TestResult {
    let mut config = minimal_config()?;
    config.transparency_log.timeout_ms = 10;
    assert_invalid(config.validate(), "transparency_log.timeout_ms must be between")
}

// ============================================================================
// SECTION: Retry
// ============================================================================

#[test]
fn retry_attempts_must_be_in_range() -> TestResult {
    let mut config = minimal_config()?;
    config.retry.max_attempts = 0;
    assert_invalid(config.validate(), "retry.max_attempts must be 1..=10")?;
    config.retry.max_attempts = 11;
    assert_invalid(config.validate(), "retry.max_attempts must be 1..=10")
}

#[test]
fn retry_initial_backoff_cannot_exceed_cap() -> TestResult {
    let mut config = minimal_config()?;
    config.retry.initial_backoff_ms = 5_000;
    config.retry.max_backoff_ms = 1_000;
    assert_invalid(config.validate(), "initial_backoff_ms must not exceed")
}

// ============================================================================
// SECTION: Evidence Store
// ============================================================================

#[test]
fn memory_store_rejects_path() -> TestResult {
    let mut config = minimal_config()?;
    config.evidence_store.path = Some(PathBuf::from("evidence.db"));
    assert_invalid(config.validate(), "memory evidence_store must not set path")
}

#[test]
fn sqlite_store_requires_path() -> TestResult {
    let mut config = minimal_config()?;
    config.evidence_store.store_type = EvidenceStoreType::Sqlite;
    assert_invalid(config.validate(), "sqlite evidence_store requires path")?;
    config.evidence_store.path = Some(PathBuf::from("evidence.db"));
    config.validate().map_err(|err| err.to_string())?;
    match config.evidence_store.sqlite_config() {
        Some(sqlite) if sqlite.path == PathBuf::from("evidence.db") => Ok(()),
        _ => Err("sqlite config not derived".to_string()),
    }
}
