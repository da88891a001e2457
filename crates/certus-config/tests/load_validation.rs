//! Load validation tests for certus-config.
// crates/certus-config/tests/load_validation.rs
// =============================================================================
// Module: Load Validation Tests
// Description: File size, encoding, parse, and default resolution checks.
// Purpose: Ensure config loading fails closed before validation runs.
// =============================================================================

#![allow(clippy::use_debug, reason = "Test failure messages include debug output.")]

use std::fs;

use certus_config::CertusConfig;
use certus_config::ConfigError;
use certus_config::EvidenceStoreType;
use certus_config::LogBackendType;
use certus_config::MAX_CONFIG_FILE_SIZE;
use certus_config::SigningBackendType;
use certus_config::config_toml_example;
use certus_core::PolicyMode;
use certus_core::runtime::LogMode;
use tempfile::TempDir;

mod common;

use common::TestResult;

#[test]
fn empty_file_yields_local_defaults() -> TestResult {
    let config = CertusConfig::from_bytes(b"").map_err(|err| err.to_string())?;
    if config.server.bind != "127.0.0.1:8080" {
        return Err(format!("unexpected bind {}", config.server.bind));
    }
    if config.evidence_store.store_type != EvidenceStoreType::Memory
        || config.signing.backend != SigningBackendType::Ephemeral
        || config.transparency_log.backend != LogBackendType::Local
        || config.transparency_log.mode != LogMode::Live
        || config.policy.default_mode != PolicyMode::Shadow
    {
        return Err("defaults drifted".to_string());
    }
    Ok(())
}

#[test]
fn example_config_validates() -> TestResult {
    let config =
        CertusConfig::from_bytes(config_toml_example().as_bytes()).map_err(|err| err.to_string())?;
    if config.policy.overrides.len() != 2 {
        return Err("example overrides not parsed".to_string());
    }
    if config.evidence_store.sqlite_config().is_none() {
        return Err("example should select sqlite".to_string());
    }
    Ok(())
}

#[test]
fn load_reads_explicit_path() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let path = dir.path().join("certus.toml");
    fs::write(&path, "[transparency_log]\nmode = \"mock\"\n").map_err(|err| err.to_string())?;
    let config = CertusConfig::load(Some(&path)).map_err(|err| err.to_string())?;
    if config.transparency_log.mode != LogMode::Mock {
        return Err("mode not loaded".to_string());
    }
    Ok(())
}

#[test]
fn missing_file_is_io_error() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    match CertusConfig::load(Some(&dir.path().join("absent.toml"))) {
        Err(ConfigError::Io(_)) => Ok(()),
        other => Err(format!("expected io error, got {other:?}")),
    }
}

#[test]
fn oversized_file_is_rejected() -> TestResult {
    let padding = "#".repeat(MAX_CONFIG_FILE_SIZE + 1);
    common::assert_invalid(
        CertusConfig::from_bytes(padding.as_bytes()).map(|_| ()),
        "exceeds size limit",
    )
}

#[test]
fn non_utf8_file_is_rejected() -> TestResult {
    common::assert_invalid(CertusConfig::from_bytes(&[0xff, 0xfe]).map(|_| ()), "utf-8")
}

#[test]
fn unknown_section_is_parse_error() -> TestResult {
    match CertusConfig::from_bytes(b"[metrics]\nenabled = true\n") {
        Err(ConfigError::Parse(_)) => Ok(()),
        other => Err(format!("expected parse error, got {other:?}")),
    }
}
