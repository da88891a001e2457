// crates/certus-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic example for docs and `certus config example`.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example for a durable Certus deployment. The output is static
//! and must always pass [`crate::CertusConfig::validate`].

/// Returns a canonical example `certus.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[server]
bind = "127.0.0.1:8080"
max_body_bytes = 1048576
audit = { enabled = true, path = "certus-audit.jsonl" }

[policy]
default_mode = "shadow"
allow_producer_mode = true

[[policy.overrides]]
category = "prompt_injection"
mode = "enforce"

[[policy.overrides]]
category = "critical_vulnerability"
decision_kind = "scan_result"
mode = "enforce"

[signing]
backend = "local_key"
key_path = "keys/certus-signing.key"
# Earlier keys stay trusted for bundles signed inside their window.
# [[signing.trusted_keys]]
# public_key = "<base64 ed25519 public key>"
# not_after = "2026-01-01T00:00:00Z"

[transparency_log]
backend = "http"
url = "https://tlog.example.com"
mode = "live_with_mock_fallback"
timeout_ms = 5000
log_id = "example-tlog"

[retry]
max_attempts = 3
initial_backoff_ms = 100
max_backoff_ms = 2000
multiplier = 2

[evidence_store]
type = "sqlite"
path = "certus-evidence.db"
journal_mode = "wal"
sync_mode = "full"
busy_timeout_ms = 5000
"#,
    )
}
