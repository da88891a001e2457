// crates/certus-config/src/config.rs
// ============================================================================
// Module: Certus Configuration
// Description: Configuration loading and validation for the evidence service.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: certus-core, certus-store-sqlite, ed25519-dalek, serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Every section defaults, so an empty file yields a local development setup:
//! in-memory store, ephemeral signing key, local Merkle log. Missing or
//! invalid configuration fails closed.
//! Security posture: config inputs are untrusted; see `Docs/security/threat_model.md`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use certus_core::Timestamp;
use certus_core::TimestampInput;
use certus_core::runtime::KeyRing;
use certus_core::runtime::LogMode;
use certus_core::runtime::PolicyConfig;
use certus_core::runtime::RetryPolicy;
use certus_core::runtime::TrustedKey;
use certus_core::runtime::signing::parse_public_key;
use certus_store_sqlite::SqliteStoreConfig;
use certus_store_sqlite::SqliteStoreMode;
use certus_store_sqlite::SqliteSyncMode;
use ed25519_dalek::VerifyingKey;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "certus.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "CERTUS_CONFIG";
/// Maximum configuration file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default HTTP bind address.
const DEFAULT_BIND: &str = "127.0.0.1:8080";
/// Default maximum request body size in bytes.
const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;
/// Largest configurable request body size in bytes.
pub const MAX_BODY_BYTES_LIMIT: usize = 16 * 1024 * 1024;
/// Maximum number of policy overrides.
const MAX_POLICY_OVERRIDES: usize = 256;
/// Maximum length of an override category.
const MAX_CATEGORY_LENGTH: usize = 128;
/// Maximum number of trusted keys.
const MAX_TRUSTED_KEYS: usize = 64;
/// Default timeout for remote collaborators in milliseconds.
const DEFAULT_REMOTE_TIMEOUT_MS: u64 = 5_000;
/// Minimum timeout for remote collaborators in milliseconds.
const MIN_REMOTE_TIMEOUT_MS: u64 = 100;
/// Maximum timeout for remote collaborators in milliseconds.
const MAX_REMOTE_TIMEOUT_MS: u64 = 60_000;
/// Default transparency log identifier.
const DEFAULT_LOG_ID: &str = "certus-local";
/// Maximum log identifier length.
const MAX_LOG_ID_LENGTH: usize = 128;
/// Maximum retry attempts.
const MAX_RETRY_ATTEMPTS: u32 = 10;
/// Maximum retry backoff in milliseconds.
const MAX_RETRY_BACKOFF_MS: u64 = 60_000;
/// Default `SQLite` busy timeout in milliseconds.
const DEFAULT_STORE_BUSY_TIMEOUT_MS: u64 = 5_000;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Certus service configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CertusConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Policy gate configuration.
    #[serde(default)]
    pub policy: PolicyConfig,
    /// Signing backend and trusted key history.
    #[serde(default)]
    pub signing: SigningConfig,
    /// Transparency log backend and mode.
    #[serde(default)]
    pub transparency_log: TransparencyLogConfig,
    /// Submission retry policy.
    #[serde(default)]
    pub retry: RetryPolicy,
    /// Evidence and payload store.
    #[serde(default)]
    pub evidence_store: EvidenceStoreConfig,
}

impl CertusConfig {
    /// Loads configuration from disk using the default resolution rules:
    /// explicit `path`, then `CERTUS_CONFIG`, then `./certus.toml`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| {
            ConfigError::Io(format!("failed to read {}: {err}", resolved.display()))
        })?;
        Self::from_bytes(&bytes)
    }

    /// Parses and validates configuration bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the bytes are oversized, not UTF-8, not
    /// valid TOML, or fail validation.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        validate_policy(&self.policy)?;
        self.signing.validate()?;
        self.transparency_log.validate()?;
        validate_retry(&self.retry)?;
        self.evidence_store.validate()?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Audit logging configuration.
    #[serde(default)]
    pub audit: ServerAuditConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: default_max_body_bytes(),
            audit: ServerAuditConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Returns the parsed bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `bind` is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("invalid bind address: {}", self.bind)))
    }

    /// Validates server configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_body_bytes must be greater than zero".to_string(),
            ));
        }
        if self.max_body_bytes > MAX_BODY_BYTES_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "max_body_bytes must be at most {MAX_BODY_BYTES_LIMIT}"
            )));
        }
        self.audit.validate()
    }
}

/// Audit logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerAuditConfig {
    /// Enable structured audit logging.
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,
    /// Optional audit log path (JSON lines); stderr when absent.
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for ServerAuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            path: None,
        }
    }
}

impl ServerAuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            validate_path_string("audit.path", path)?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Validates policy overrides: bounded, non-empty, unique per target.
fn validate_policy(policy: &PolicyConfig) -> Result<(), ConfigError> {
    if policy.overrides.len() > MAX_POLICY_OVERRIDES {
        return Err(ConfigError::Invalid(format!(
            "policy.overrides exceeds max entries ({MAX_POLICY_OVERRIDES})"
        )));
    }
    let mut seen = BTreeSet::new();
    for entry in &policy.overrides {
        let category = entry.category.trim();
        if category.is_empty() {
            return Err(ConfigError::Invalid(
                "policy.overrides category must be non-empty".to_string(),
            ));
        }
        if category.len() > MAX_CATEGORY_LENGTH {
            return Err(ConfigError::Invalid(format!(
                "policy.overrides category exceeds {MAX_CATEGORY_LENGTH} characters"
            )));
        }
        let kind = entry.decision_kind.map(|kind| kind.as_str());
        if !seen.insert((category, kind)) {
            return Err(ConfigError::Invalid(format!(
                "duplicate policy override for category {category}"
            )));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Signing
// ============================================================================

/// Signing backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SigningBackendType {
    /// Ed25519 seed read from `key_path`.
    LocalKey,
    /// Fresh key generated at startup; bundles are unverifiable after restart
    /// unless the public key is recorded in `trusted_keys`.
    #[default]
    Ephemeral,
    /// Remote KMS-style signer over HTTP.
    Remote,
}

/// Signing configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SigningConfig {
    /// Backend type.
    #[serde(default)]
    pub backend: SigningBackendType,
    /// Key file path for `local_key`.
    #[serde(default)]
    pub key_path: Option<PathBuf>,
    /// Remote signer settings for `remote`.
    #[serde(default)]
    pub remote: Option<RemoteSignerConfig>,
    /// Historical and current keys trusted by the verifier.
    #[serde(default)]
    pub trusted_keys: Vec<TrustedKeyConfig>,
}

impl SigningConfig {
    /// Builds the verifier key ring: every configured trusted key, plus
    /// `active` without a window when it is not listed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a trusted key entry is malformed.
    pub fn key_ring(
        &self,
        active: Option<&VerifyingKey>,
    ) -> Result<KeyRing, ConfigError> {
        let mut ring = KeyRing::new();
        for entry in &self.trusted_keys {
            ring.insert(entry.to_trusted_key()?);
        }
        if let Some(active) = active {
            ring.insert_if_absent(TrustedKey::unbounded(*active));
        }
        Ok(ring)
    }

    /// Validates signing configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.backend {
            SigningBackendType::LocalKey => {
                let path = self.key_path.as_ref().ok_or_else(|| {
                    ConfigError::Invalid("local_key signing requires key_path".to_string())
                })?;
                validate_store_path("signing.key_path", path)?;
                if self.remote.is_some() {
                    return Err(ConfigError::Invalid(
                        "local_key signing must not set remote".to_string(),
                    ));
                }
            }
            SigningBackendType::Ephemeral => {
                if self.key_path.is_some() || self.remote.is_some() {
                    return Err(ConfigError::Invalid(
                        "ephemeral signing must not set key_path or remote".to_string(),
                    ));
                }
            }
            SigningBackendType::Remote => {
                let remote = self.remote.as_ref().ok_or_else(|| {
                    ConfigError::Invalid("remote signing requires remote settings".to_string())
                })?;
                if self.key_path.is_some() {
                    return Err(ConfigError::Invalid(
                        "remote signing must not set key_path".to_string(),
                    ));
                }
                remote.validate()?;
            }
        }
        if self.trusted_keys.len() > MAX_TRUSTED_KEYS {
            return Err(ConfigError::Invalid(format!(
                "signing.trusted_keys exceeds max entries ({MAX_TRUSTED_KEYS})"
            )));
        }
        for entry in &self.trusted_keys {
            entry.to_trusted_key()?;
        }
        Ok(())
    }
}

/// Remote signer settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteSignerConfig {
    /// Sign endpoint URL.
    pub url: String,
    /// Base64 Ed25519 public key of the remote key.
    pub public_key: String,
    /// Request timeout in milliseconds.
    #[serde(default = "default_remote_timeout_ms")]
    pub timeout_ms: u64,
}

impl RemoteSignerConfig {
    /// Validates remote signer settings.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_http_url("signing.remote.url", &self.url)?;
        parse_public_key(&self.public_key)
            .map_err(|err| ConfigError::Invalid(format!("signing.remote.public_key: {err}")))?;
        validate_timeout("signing.remote.timeout_ms", self.timeout_ms)
    }
}

/// Trusted verifying key with an optional validity window.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrustedKeyConfig {
    /// Base64 Ed25519 public key.
    pub public_key: String,
    /// First instant the key may sign (RFC 3339 or unix millis).
    #[serde(default)]
    pub not_before: Option<TimestampInput>,
    /// Instant after which the key may no longer sign.
    #[serde(default)]
    pub not_after: Option<TimestampInput>,
}

impl TrustedKeyConfig {
    /// Converts the entry into a key ring record.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the key or window is malformed.
    pub fn to_trusted_key(&self) -> Result<TrustedKey, ConfigError> {
        let key = parse_public_key(&self.public_key)
            .map_err(|err| ConfigError::Invalid(format!("signing.trusted_keys: {err}")))?;
        let not_before = resolve_bound("not_before", self.not_before.as_ref())?;
        let not_after = resolve_bound("not_after", self.not_after.as_ref())?;
        if let (Some(start), Some(end)) = (not_before, not_after)
            && start >= end
        {
            return Err(ConfigError::Invalid(
                "signing.trusted_keys not_before must precede not_after".to_string(),
            ));
        }
        Ok(TrustedKey::windowed(key, not_before, not_after))
    }
}

/// Resolves an optional window bound.
fn resolve_bound(
    field: &str,
    input: Option<&TimestampInput>,
) -> Result<Option<Timestamp>, ConfigError> {
    input
        .map(|value| {
            value.resolve().map_err(|err| {
                ConfigError::Invalid(format!("signing.trusted_keys {field}: {}", err.0))
            })
        })
        .transpose()
}

// ============================================================================
// SECTION: Transparency Log
// ============================================================================

/// Transparency log backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogBackendType {
    /// In-process Merkle log.
    #[default]
    Local,
    /// Remote log reached over HTTP.
    Http,
}

/// Transparency log configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransparencyLogConfig {
    /// Backend type.
    #[serde(default)]
    pub backend: LogBackendType,
    /// Base URL for the `http` backend.
    #[serde(default)]
    pub url: Option<String>,
    /// Submission mode.
    #[serde(default)]
    pub mode: LogMode,
    /// Request timeout in milliseconds.
    #[serde(default = "default_remote_timeout_ms")]
    pub timeout_ms: u64,
    /// Log identifier recorded in receipts.
    #[serde(default = "default_log_id")]
    pub log_id: String,
}

impl Default for TransparencyLogConfig {
    fn default() -> Self {
        Self {
            backend: LogBackendType::default(),
            url: None,
            mode: LogMode::default(),
            timeout_ms: default_remote_timeout_ms(),
            log_id: default_log_id(),
        }
    }
}

impl TransparencyLogConfig {
    /// Validates transparency log configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.backend {
            LogBackendType::Local => {
                if self.url.is_some() {
                    return Err(ConfigError::Invalid(
                        "local transparency_log must not set url".to_string(),
                    ));
                }
            }
            LogBackendType::Http => {
                let url = self.url.as_deref().ok_or_else(|| {
                    ConfigError::Invalid("http transparency_log requires url".to_string())
                })?;
                validate_http_url("transparency_log.url", url)?;
            }
        }
        let log_id = self.log_id.trim();
        if log_id.is_empty() || log_id.len() > MAX_LOG_ID_LENGTH {
            return Err(ConfigError::Invalid(format!(
                "transparency_log.log_id must be 1..={MAX_LOG_ID_LENGTH} characters"
            )));
        }
        validate_timeout("transparency_log.timeout_ms", self.timeout_ms)
    }
}

// ============================================================================
// SECTION: Retry
// ============================================================================

/// Validates the retry policy ranges.
fn validate_retry(retry: &RetryPolicy) -> Result<(), ConfigError> {
    if retry.max_attempts == 0 || retry.max_attempts > MAX_RETRY_ATTEMPTS {
        return Err(ConfigError::Invalid(format!(
            "retry.max_attempts must be 1..={MAX_RETRY_ATTEMPTS}"
        )));
    }
    if retry.multiplier == 0 {
        return Err(ConfigError::Invalid("retry.multiplier must be at least 1".to_string()));
    }
    if retry.max_backoff_ms > MAX_RETRY_BACKOFF_MS {
        return Err(ConfigError::Invalid(format!(
            "retry.max_backoff_ms must be at most {MAX_RETRY_BACKOFF_MS}"
        )));
    }
    if retry.initial_backoff_ms > retry.max_backoff_ms {
        return Err(ConfigError::Invalid(
            "retry.initial_backoff_ms must not exceed max_backoff_ms".to_string(),
        ));
    }
    Ok(())
}

// ============================================================================
// SECTION: Evidence Store
// ============================================================================

/// Evidence store configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvidenceStoreConfig {
    /// Store backend type.
    #[serde(rename = "type", default)]
    pub store_type: EvidenceStoreType,
    /// `SQLite` database path when using the sqlite backend.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_store_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` synchronous mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl Default for EvidenceStoreConfig {
    fn default() -> Self {
        Self {
            store_type: EvidenceStoreType::default(),
            path: None,
            busy_timeout_ms: default_store_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

impl EvidenceStoreConfig {
    /// Returns the `SQLite` store config for the sqlite backend.
    #[must_use]
    pub fn sqlite_config(&self) -> Option<SqliteStoreConfig> {
        match (self.store_type, &self.path) {
            (EvidenceStoreType::Sqlite, Some(path)) => Some(SqliteStoreConfig {
                path: path.clone(),
                busy_timeout_ms: self.busy_timeout_ms,
                journal_mode: self.journal_mode,
                sync_mode: self.sync_mode,
            }),
            _ => None,
        }
    }

    /// Validates evidence store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.store_type {
            EvidenceStoreType::Memory => {
                if self.path.is_some() {
                    return Err(ConfigError::Invalid(
                        "memory evidence_store must not set path".to_string(),
                    ));
                }
                Ok(())
            }
            EvidenceStoreType::Sqlite => {
                let path = self.path.as_ref().ok_or_else(|| {
                    ConfigError::Invalid("sqlite evidence_store requires path".to_string())
                })?;
                validate_store_path("evidence_store.path", path)
            }
        }
    }
}

/// Evidence store backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceStoreType {
    /// Use the in-memory store; contents are lost on restart.
    #[default]
    Memory,
    /// Use the `SQLite`-backed durable store.
    Sqlite,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Returns the default bind address.
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

/// Returns the default maximum request body size.
const fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

/// Returns the default audit enablement.
const fn default_audit_enabled() -> bool {
    true
}

/// Returns the default remote timeout.
const fn default_remote_timeout_ms() -> u64 {
    DEFAULT_REMOTE_TIMEOUT_MS
}

/// Returns the default log identifier.
fn default_log_id() -> String {
    DEFAULT_LOG_ID.to_string()
}

/// Returns the default store busy timeout.
const fn default_store_busy_timeout_ms() -> u64 {
    DEFAULT_STORE_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    if path.to_string_lossy().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    validate_store_path(field, Path::new(trimmed))
}

/// Validates a filesystem path against length limits.
fn validate_store_path(field: &str, path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if path.to_string_lossy().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in path.components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates an `http`/`https` URL.
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|err| ConfigError::Invalid(format!("{field} is not a valid url: {err}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ConfigError::Invalid(format!("{field} scheme {scheme} is not http(s)"))),
    }
}

/// Validates a remote timeout range.
fn validate_timeout(field: &str, value: u64) -> Result<(), ConfigError> {
    if !(MIN_REMOTE_TIMEOUT_MS ..= MAX_REMOTE_TIMEOUT_MS).contains(&value) {
        return Err(ConfigError::Invalid(format!(
            "{field} must be between {MIN_REMOTE_TIMEOUT_MS} and {MAX_REMOTE_TIMEOUT_MS}"
        )));
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
