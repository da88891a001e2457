// crates/certus-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared helpers for config validation tests.
// Purpose: Reduce duplication across integration tests for certus-config.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use certus_config::CertusConfig;
use certus_config::ConfigError;

/// Outcome type for fallible tests.
pub type TestResult = Result<(), String>;

/// Parses a TOML string into a `CertusConfig` without validating it.
pub fn config_from_toml(toml_str: &str) -> Result<CertusConfig, toml::de::Error> {
    toml::from_str(toml_str)
}

/// Returns a minimal config with all defaults applied.
pub fn minimal_config() -> Result<CertusConfig, String> {
    config_from_toml("").map_err(|err| err.to_string())
}

/// Asserts that a validation result is an error containing `needle`.
pub fn assert_invalid(result: Result<(), ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error '{message}' did not contain '{needle}'"))
            }
        }
        Ok(()) => Err("expected invalid config".to_string()),
    }
}
