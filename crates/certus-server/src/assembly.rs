// crates/certus-server/src/assembly.rs
// ============================================================================
// Module: Backend Assembly
// Description: Builds stores, signer, log, and key ring from configuration.
// Purpose: Select interchangeable backends behind one trait per concern.
// Dependencies: certus-core, certus-config, certus-store-sqlite
// ============================================================================

//! ## Overview
//! Configuration names a backend per concern; this module turns those names
//! into shared trait objects. The `SQLite` store backs both the evidence and
//! payload stores from one database file. A local transparency log lives in
//! process memory under an id unique to the process, so a verifier in a
//! fresh process relies on the proofs embedded in each bundle instead of
//! asking a new log about indices it never issued.
//!
//! HTTP-backed components build blocking clients; call these constructors
//! outside an async context.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use certus_config::CertusConfig;
use certus_config::EvidenceStoreConfig;
use certus_config::EvidenceStoreType;
use certus_config::LogBackendType;
use certus_config::SigningBackendType;
use certus_config::SigningConfig;
use certus_config::TransparencyLogConfig;
use certus_core::LogId;
use certus_core::OutcomeSink;
use certus_core::SigningBackend;
use certus_core::runtime::Ed25519Signer;
use certus_core::runtime::InMemoryEvidenceStore;
use certus_core::runtime::InMemoryPayloadStore;
use certus_core::runtime::InMemoryTransparencyLog;
use certus_core::runtime::IntegrityBridge;
use certus_core::runtime::IntegrityService;
use certus_core::runtime::KeyRing;
use certus_core::runtime::SharedEvidenceStore;
use certus_core::runtime::SharedPayloadStore;
use certus_core::runtime::SharedSigningBackend;
use certus_core::runtime::SharedTransparencyLog;
use certus_core::runtime::TrustService;
use certus_core::runtime::Verifier;
use certus_core::runtime::signing::parse_public_key;
use certus_store_sqlite::SqliteEvidenceStore;

use crate::remote_signer::RemoteSigner;
use crate::remote_signer::RemoteSignerSettings;
use crate::server::ServerError;
use crate::tlog_client::HttpTransparencyLog;
use crate::tlog_client::HttpTransparencyLogSettings;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Bridge over the configured backends.
pub type ServiceBridge = IntegrityBridge<
    SharedEvidenceStore,
    SharedPayloadStore,
    SharedSigningBackend,
    SharedTransparencyLog,
>;

/// Verifier over the configured backends.
pub type ServiceVerifier = Verifier<SharedEvidenceStore, SharedPayloadStore, SharedTransparencyLog>;

/// Backends selected by configuration.
#[derive(Clone)]
pub struct Backends {
    /// Evidence store.
    pub store: SharedEvidenceStore,
    /// Raw payload store.
    pub payloads: SharedPayloadStore,
    /// Transparency log, absent when nothing durable can be consulted.
    pub log: Option<SharedTransparencyLog>,
    /// Trusted keys across rotations.
    pub key_ring: KeyRing,
}

impl Backends {
    /// Builds stores, log, and key ring for verification only.
    ///
    /// The signer is not contacted. A local key file is read only to add its
    /// public half to the key ring. A local log is omitted because a fresh
    /// process has no entries.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when a backend cannot be opened.
    pub fn for_verification(config: &CertusConfig) -> Result<Self, ServerError> {
        let (store, payloads) = build_stores(&config.evidence_store)?;
        let log = match config.transparency_log.backend {
            LogBackendType::Local => None,
            LogBackendType::Http => Some(build_log(&config.transparency_log)?),
        };
        let active = match config.signing.backend {
            SigningBackendType::Ephemeral => None,
            SigningBackendType::LocalKey | SigningBackendType::Remote => {
                Some(build_signer(&config.signing)?.verifying_key())
            }
        };
        let key_ring = config
            .signing
            .key_ring(active.as_ref())
            .map_err(|err| ServerError::Config(err.to_string()))?;
        Ok(Self {
            store,
            payloads,
            log,
            key_ring,
        })
    }

    /// Returns a verifier over these backends.
    #[must_use]
    pub fn verifier(&self) -> ServiceVerifier {
        Verifier::new(
            self.store.clone(),
            self.payloads.clone(),
            self.log.clone(),
            self.key_ring.clone(),
        )
    }
}

/// Everything the HTTP service needs.
pub struct ServiceBackends {
    /// Submission pipeline.
    pub bridge: ServiceBridge,
    /// Read-only verifier sharing the bridge's stores and log.
    pub verifier: ServiceVerifier,
    /// Identifier of the active signing key.
    pub signing_key_id: String,
}

impl ServiceBackends {
    /// Builds the bridge and verifier from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when a backend cannot be opened.
    pub fn from_config(
        config: &CertusConfig,
        outcomes: Arc<dyn OutcomeSink + Send + Sync>,
    ) -> Result<Self, ServerError> {
        let (store, payloads) = build_stores(&config.evidence_store)?;
        let signer = build_signer(&config.signing)?;
        let log = build_log(&config.transparency_log)?;
        let key_ring = config
            .signing
            .key_ring(Some(&signer.verifying_key()))
            .map_err(|err| ServerError::Config(err.to_string()))?;
        let signing_key_id = signer.key_id().to_string();
        let trust = TrustService::new(signer, Some(log.clone()), config.transparency_log.mode);
        let bridge = IntegrityBridge::new(
            store.clone(),
            payloads.clone(),
            IntegrityService::new(config.policy.clone()),
            trust,
        )
        .with_outcome_sink(outcomes);
        let verifier = Verifier::new(store, payloads, Some(log), key_ring);
        Ok(Self {
            bridge,
            verifier,
            signing_key_id,
        })
    }
}

// ============================================================================
// SECTION: Builders
// ============================================================================

/// Builds the evidence and payload stores.
///
/// # Errors
///
/// Returns [`ServerError`] when the store cannot be opened.
pub fn build_stores(
    config: &EvidenceStoreConfig,
) -> Result<(SharedEvidenceStore, SharedPayloadStore), ServerError> {
    match config.store_type {
        EvidenceStoreType::Memory => Ok((
            SharedEvidenceStore::from_store(InMemoryEvidenceStore::new()),
            SharedPayloadStore::from_store(InMemoryPayloadStore::new()),
        )),
        EvidenceStoreType::Sqlite => {
            let sqlite_config = config.sqlite_config().ok_or_else(|| {
                ServerError::Config("sqlite evidence_store requires path".to_string())
            })?;
            let store = SqliteEvidenceStore::new(sqlite_config)
                .map_err(|err| ServerError::Init(err.to_string()))?;
            Ok((
                SharedEvidenceStore::from_store(store.clone()),
                SharedPayloadStore::from_store(store),
            ))
        }
    }
}

/// Builds the configured signing backend.
///
/// # Errors
///
/// Returns [`ServerError`] when key material is missing or malformed.
pub fn build_signer(config: &SigningConfig) -> Result<SharedSigningBackend, ServerError> {
    match config.backend {
        SigningBackendType::Ephemeral => {
            Ok(SharedSigningBackend::from_backend(Ed25519Signer::generate()))
        }
        SigningBackendType::LocalKey => {
            let path = config.key_path.as_ref().ok_or_else(|| {
                ServerError::Config("local_key signing requires key_path".to_string())
            })?;
            let signer = Ed25519Signer::from_key_file(path)
                .map_err(|err| ServerError::Init(err.to_string()))?;
            Ok(SharedSigningBackend::from_backend(signer))
        }
        SigningBackendType::Remote => {
            let remote = config.remote.as_ref().ok_or_else(|| {
                ServerError::Config("remote signing requires remote settings".to_string())
            })?;
            let verifying_key = parse_public_key(&remote.public_key)
                .map_err(|err| ServerError::Config(err.to_string()))?;
            let signer = RemoteSigner::new(RemoteSignerSettings {
                url: remote.url.clone(),
                verifying_key,
                timeout_ms: remote.timeout_ms,
            })
            .map_err(|err| ServerError::Init(err.to_string()))?;
            Ok(SharedSigningBackend::from_backend(signer))
        }
    }
}

/// Builds the configured transparency log.
///
/// # Errors
///
/// Returns [`ServerError`] when the log client cannot be built.
pub fn build_log(config: &TransparencyLogConfig) -> Result<SharedTransparencyLog, ServerError> {
    let log_id = LogId::new(config.log_id.clone());
    match config.backend {
        LogBackendType::Local => {
            Ok(SharedTransparencyLog::from_log(InMemoryTransparencyLog::instance_scoped(&log_id)))
        }
        LogBackendType::Http => {
            let base_url = config.url.clone().ok_or_else(|| {
                ServerError::Config("http transparency_log requires url".to_string())
            })?;
            let log = HttpTransparencyLog::new(HttpTransparencyLogSettings {
                base_url,
                log_id,
                timeout_ms: config.timeout_ms,
            })
            .map_err(|err| ServerError::Init(err.to_string()))?;
            Ok(SharedTransparencyLog::from_log(log))
        }
    }
}
