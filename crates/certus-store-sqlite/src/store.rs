// crates/certus-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Evidence Store
// Description: Durable EvidenceStore and PayloadStore backed by SQLite WAL.
// Purpose: Persist bundles and payloads with content-addressed, first-wins writes.
// Dependencies: certus-core, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`SqliteEvidenceStore`] implements both [`EvidenceStore`] and
//! [`PayloadStore`] over one `SQLite` file. Bundles are stored as canonical
//! JSON next to their hash; loads recompute the hash and fail closed on
//! mismatch. Every insert is `ON CONFLICT DO NOTHING`, so the first record
//! for a content address wins and duplicates report `inserted = false`.
//! Payload reads return bytes exactly as stored; integrity of payloads is
//! the verifier's job.
//! The `submission_stamps` table only grows: a timestamp claim is permanent.
//! Security posture: database contents are untrusted; see
//! `Docs/security/threat_model.md`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use certus_core::BundleId;
use certus_core::EvidenceBundle;
use certus_core::EvidenceStore;
use certus_core::PayloadStore;
use certus_core::PutOutcome;
use certus_core::StoreError;
use certus_core::Timestamp;
use certus_core::hashing::DEFAULT_HASH_ALGORITHM;
use certus_core::hashing::HashAlgorithm;
use certus_core::hashing::HashDigest;
use certus_core::hashing::canonical_json_bytes;
use certus_core::hashing::hash_bytes;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum canonical bundle size accepted by the store.
pub const MAX_BUNDLE_BYTES: usize = 1024 * 1024;
/// Maximum payload size accepted by the store.
pub const MAX_PAYLOAD_BYTES: usize = 16 * 1024 * 1024;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// Write-ahead logging.
    #[default]
    Wal,
    /// Rollback journal deleted after each transaction.
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode.
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` evidence store.
///
/// # Invariants
/// - `path` must resolve to a file path, not a directory.
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Config for `path` with default pragmas.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
///
/// # Invariants
/// - Error messages never embed payload bytes or bundle JSON.
#[derive(Debug, Error, Clone)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Store corruption or hash mismatch.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data or configuration.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// Record exceeded size limits.
    #[error("sqlite store record too large: {actual_bytes} bytes (max {max_bytes})")]
    TooLarge {
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual record size in bytes.
        actual_bytes: usize,
    },
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
            SqliteStoreError::TooLarge {
                max_bytes,
                actual_bytes,
            } => Self::Invalid(format!(
                "record exceeds size limit: {actual_bytes} bytes (max {max_bytes})"
            )),
        }
    }
}

/// Maps an engine error into a store error.
fn db_error(err: &rusqlite::Error) -> SqliteStoreError {
    SqliteStoreError::Db(err.to_string())
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed evidence and payload store.
///
/// # Invariants
/// - Bundle loads verify the stored hash before deserialization.
/// - Connection access is serialized through a mutex, so each trait call is
///   one transaction.
#[derive(Clone)]
pub struct SqliteEvidenceStore {
    /// Store configuration.
    config: SqliteStoreConfig,
    /// Shared connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteEvidenceStore {
    /// Opens or creates the store at `config.path`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the path is unsafe, the database
    /// cannot be opened, or the schema version is unsupported.
    pub fn new(config: SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(&config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            config,
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Returns the store configuration.
    #[must_use]
    pub const fn config(&self) -> &SqliteStoreConfig {
        &self.config
    }

    /// Returns the number of stored bundles.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails.
    pub fn bundle_count(&self) -> Result<u64, SqliteStoreError> {
        let guard = self.lock()?;
        let count: i64 = guard
            .query_row("SELECT COUNT(1) FROM bundles", params![], |row| row.get(0))
            .map_err(|err| db_error(&err))?;
        drop(guard);
        u64::try_from(count).map_err(|_| SqliteStoreError::Corrupt("negative count".to_string()))
    }

    /// Locks the shared connection.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection
            .lock()
            .map_err(|_| SqliteStoreError::Db("connection mutex poisoned".to_string()))
    }

    /// Inserts a bundle and its correction edges in one transaction.
    fn put_bundle(&self, bundle: &EvidenceBundle) -> Result<bool, SqliteStoreError> {
        let bytes = canonical_json_bytes(bundle)
            .map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
        ensure_within(bytes.len(), MAX_BUNDLE_BYTES)?;
        let hash = hash_bytes(DEFAULT_HASH_ALGORITHM, &bytes);

        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| db_error(&err))?;
        let inserted = tx
            .execute(
                "INSERT INTO bundles (bundle_id, bundle_json, bundle_hash, hash_algorithm, \
                 created_at) VALUES (?1, ?2, ?3, ?4, ?5) ON CONFLICT(bundle_id) DO NOTHING",
                params![
                    bundle.bundle_id.as_str(),
                    bytes,
                    hash.value,
                    hash.algorithm.as_str(),
                    bundle.created_at.as_unix_millis(),
                ],
            )
            .map_err(|err| db_error(&err))?
            > 0;
        if inserted {
            for decision in &bundle.content.decisions {
                if let Some(target) = &decision.supersedes {
                    tx.execute(
                        "INSERT INTO supersessions (superseded_id, superseding_id) VALUES (?1, \
                         ?2) ON CONFLICT DO NOTHING",
                        params![target.as_str(), bundle.bundle_id.as_str()],
                    )
                    .map_err(|err| db_error(&err))?;
                }
            }
        }
        tx.commit().map_err(|err| db_error(&err))?;
        drop(guard);
        Ok(inserted)
    }

    /// Loads and verifies a bundle.
    fn get_bundle(&self, bundle_id: &BundleId) -> Result<Option<EvidenceBundle>, SqliteStoreError> {
        let guard = self.lock()?;
        let row: Option<(Vec<u8>, String, String)> = guard
            .query_row(
                "SELECT bundle_json, bundle_hash, hash_algorithm FROM bundles WHERE bundle_id = ?1",
                params![bundle_id.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
            .map_err(|err| db_error(&err))?;
        drop(guard);
        let Some((bytes, stored_hash, algorithm)) = row else {
            return Ok(None);
        };
        ensure_within(bytes.len(), MAX_BUNDLE_BYTES)?;
        let algorithm = HashAlgorithm::parse(&algorithm)
            .map_err(|err| SqliteStoreError::Corrupt(err.to_string()))?;
        let actual = hash_bytes(algorithm, &bytes);
        if actual.value != stored_hash {
            return Err(SqliteStoreError::Corrupt(format!(
                "hash mismatch for bundle {}",
                bundle_id.as_str()
            )));
        }
        let bundle: EvidenceBundle = serde_json::from_slice(&bytes)
            .map_err(|err| SqliteStoreError::Corrupt(format!("bundle decode failed: {err}")))?;
        if bundle.bundle_id != *bundle_id {
            return Err(SqliteStoreError::Corrupt(format!(
                "row {} holds bundle {}",
                bundle_id.as_str(),
                bundle.bundle_id.as_str()
            )));
        }
        Ok(Some(bundle))
    }

    /// Inserts a stamp unless one exists, then returns the stored value.
    fn claim(&self, submission: &HashDigest, now: Timestamp) -> Result<Timestamp, SqliteStoreError> {
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| db_error(&err))?;
        tx.execute(
            "INSERT INTO submission_stamps (submission_digest, claimed_at) VALUES (?1, ?2) ON \
             CONFLICT(submission_digest) DO NOTHING",
            params![submission.value, now.as_unix_millis()],
        )
        .map_err(|err| db_error(&err))?;
        let claimed: i64 = tx
            .query_row(
                "SELECT claimed_at FROM submission_stamps WHERE submission_digest = ?1",
                params![submission.value],
                |row| row.get(0),
            )
            .map_err(|err| db_error(&err))?;
        tx.commit().map_err(|err| db_error(&err))?;
        drop(guard);
        Ok(Timestamp::from_unix_millis(claimed))
    }

    /// Lists superseding bundles in insertion order.
    fn list_superseding(&self, bundle_id: &BundleId) -> Result<Vec<BundleId>, SqliteStoreError> {
        let guard = self.lock()?;
        let mut statement = guard
            .prepare(
                "SELECT superseding_id FROM supersessions WHERE superseded_id = ?1 ORDER BY rowid",
            )
            .map_err(|err| db_error(&err))?;
        let rows = statement
            .query_map(params![bundle_id.as_str()], |row| row.get::<_, String>(0))
            .map_err(|err| db_error(&err))?;
        let mut ids = Vec::new();
        for row in rows {
            ids.push(BundleId::new(row.map_err(|err| db_error(&err))?));
        }
        Ok(ids)
    }

    /// Inserts payload bytes under their digest.
    fn put_payload_bytes(&self, bytes: &[u8]) -> Result<HashDigest, SqliteStoreError> {
        ensure_within(bytes.len(), MAX_PAYLOAD_BYTES)?;
        let digest = hash_bytes(DEFAULT_HASH_ALGORITHM, bytes);
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO payloads (digest, hash_algorithm, payload) VALUES (?1, ?2, ?3) ON \
                 CONFLICT(digest) DO NOTHING",
                params![digest.value, digest.algorithm.as_str(), bytes],
            )
            .map_err(|err| db_error(&err))?;
        drop(guard);
        Ok(digest)
    }

    /// Loads payload bytes without checking them.
    fn get_payload_bytes(&self, digest: &HashDigest) -> Result<Option<Vec<u8>>, SqliteStoreError> {
        let guard = self.lock()?;
        let bytes: Option<Vec<u8>> = guard
            .query_row(
                "SELECT payload FROM payloads WHERE digest = ?1",
                params![digest.value],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| db_error(&err))?;
        drop(guard);
        if let Some(bytes) = &bytes {
            ensure_within(bytes.len(), MAX_PAYLOAD_BYTES)?;
        }
        Ok(bytes)
    }
}

impl EvidenceStore for SqliteEvidenceStore {
    fn put(&self, bundle: &EvidenceBundle) -> Result<PutOutcome, StoreError> {
        let inserted = self.put_bundle(bundle)?;
        Ok(PutOutcome {
            bundle_id: bundle.bundle_id.clone(),
            inserted,
        })
    }

    fn get(&self, bundle_id: &BundleId) -> Result<Option<EvidenceBundle>, StoreError> {
        Ok(self.get_bundle(bundle_id)?)
    }

    fn claim_timestamp(
        &self,
        submission: &HashDigest,
        now: Timestamp,
    ) -> Result<Timestamp, StoreError> {
        Ok(self.claim(submission, now)?)
    }

    fn superseded_by(&self, bundle_id: &BundleId) -> Result<Vec<BundleId>, StoreError> {
        Ok(self.list_superseding(bundle_id)?)
    }
}

impl PayloadStore for SqliteEvidenceStore {
    fn put_payload(&self, bytes: &[u8]) -> Result<HashDigest, StoreError> {
        Ok(self.put_payload_bytes(bytes)?)
    }

    fn get_payload(&self, digest: &HashDigest) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.get_payload_bytes(digest)?)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Rejects records larger than `max_bytes`.
const fn ensure_within(actual_bytes: usize, max_bytes: usize) -> Result<(), SqliteStoreError> {
    if actual_bytes > max_bytes {
        return Err(SqliteStoreError::TooLarge {
            max_bytes,
            actual_bytes,
        });
    }
    Ok(())
}

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    if path.display().to_string().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with secure defaults.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection =
        Connection::open_with_flags(&config.path, flags).map_err(|err| db_error(&err))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| db_error(&err))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| db_error(&err))?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| db_error(&err))?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(|err| db_error(&err))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| db_error(&err))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| db_error(&err))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| db_error(&err))?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS bundles (
                    bundle_id TEXT PRIMARY KEY,
                    bundle_json BLOB NOT NULL,
                    bundle_hash TEXT NOT NULL,
                    hash_algorithm TEXT NOT NULL,
                    created_at INTEGER NOT NULL
                );
                CREATE TABLE IF NOT EXISTS payloads (
                    digest TEXT PRIMARY KEY,
                    hash_algorithm TEXT NOT NULL,
                    payload BLOB NOT NULL
                );
                CREATE TABLE IF NOT EXISTS submission_stamps (
                    submission_digest TEXT PRIMARY KEY,
                    claimed_at INTEGER NOT NULL
                );
                CREATE TABLE IF NOT EXISTS supersessions (
                    superseded_id TEXT NOT NULL,
                    superseding_id TEXT NOT NULL,
                    PRIMARY KEY (superseded_id, superseding_id)
                );",
            )
            .map_err(|err| db_error(&err))?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(|err| db_error(&err))?;
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_path_is_rejected() {
        assert!(matches!(validate_store_path(Path::new("")), Err(SqliteStoreError::Invalid(_))));
    }

    #[test]
    fn overlong_component_is_rejected() {
        let path = PathBuf::from("x".repeat(MAX_PATH_COMPONENT_LENGTH + 1));
        assert!(matches!(validate_store_path(&path), Err(SqliteStoreError::Invalid(_))));
    }

    #[test]
    fn too_large_maps_to_invalid_store_error() {
        let err: StoreError = SqliteStoreError::TooLarge {
            max_bytes: 1,
            actual_bytes: 2,
        }
        .into();
        assert!(matches!(err, StoreError::Invalid(_)));
    }
}
