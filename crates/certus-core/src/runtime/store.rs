// crates/certus-core/src/runtime/store.rs
// ============================================================================
// Module: Certus In-Memory Stores
// Description: In-memory evidence and payload stores plus shared wrappers.
// Purpose: Provide deterministic store implementations without external deps.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! In-memory implementations of [`EvidenceStore`] and [`PayloadStore`] for
//! tests, demos, and the default server configuration. Contents are lost on
//! restart. The `Shared*` wrappers erase the backend behind an `Arc`.
//!
//! Timestamp claims are kept for the life of the store and never expire, so
//! repeated untimestamped submissions of the same content share one bundle.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use crate::core::bundle::EvidenceBundle;
use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::core::hashing::HashDigest;
use crate::core::hashing::hash_bytes;
use crate::core::identifiers::BundleId;
use crate::core::time::Timestamp;
use crate::interfaces::EvidenceStore;
use crate::interfaces::PayloadStore;
use crate::interfaces::PutOutcome;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: In-Memory Evidence Store
// ============================================================================

/// Mutable state behind the in-memory evidence store.
#[derive(Debug, Default)]
struct EvidenceState {
    /// Bundles keyed by bundle id.
    bundles: BTreeMap<BundleId, EvidenceBundle>,
    /// First-claimed timestamps keyed by submission digest value.
    stamps: BTreeMap<String, Timestamp>,
    /// Superseding bundles keyed by the superseded bundle id.
    superseded_by: BTreeMap<BundleId, Vec<BundleId>>,
}

/// In-memory evidence store for tests and examples.
#[derive(Debug, Default, Clone)]
pub struct InMemoryEvidenceStore {
    /// Store state protected by a single mutex so puts are atomic.
    state: Arc<Mutex<EvidenceState>>,
}

impl InMemoryEvidenceStore {
    /// Creates an empty in-memory evidence store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored bundles.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store mutex is poisoned.
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.bundles.len())
    }

    /// Returns true when no bundles are stored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store mutex is poisoned.
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Locks the store state.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, EvidenceState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Store("evidence store mutex poisoned".to_string()))
    }
}

impl EvidenceStore for InMemoryEvidenceStore {
    fn put(&self, bundle: &EvidenceBundle) -> Result<PutOutcome, StoreError> {
        let mut guard = self.lock()?;
        if guard.bundles.contains_key(&bundle.bundle_id) {
            return Ok(PutOutcome {
                bundle_id: bundle.bundle_id.clone(),
                inserted: false,
            });
        }
        for decision in &bundle.content.decisions {
            if let Some(target) = &decision.supersedes {
                guard
                    .superseded_by
                    .entry(target.clone())
                    .or_default()
                    .push(bundle.bundle_id.clone());
            }
        }
        guard.bundles.insert(bundle.bundle_id.clone(), bundle.clone());
        drop(guard);
        Ok(PutOutcome {
            bundle_id: bundle.bundle_id.clone(),
            inserted: true,
        })
    }

    fn get(&self, bundle_id: &BundleId) -> Result<Option<EvidenceBundle>, StoreError> {
        Ok(self.lock()?.bundles.get(bundle_id).cloned())
    }

    fn claim_timestamp(
        &self,
        submission: &HashDigest,
        now: Timestamp,
    ) -> Result<Timestamp, StoreError> {
        let mut guard = self.lock()?;
        let stamp = *guard.stamps.entry(submission.value.clone()).or_insert(now);
        drop(guard);
        Ok(stamp)
    }

    fn superseded_by(&self, bundle_id: &BundleId) -> Result<Vec<BundleId>, StoreError> {
        Ok(self.lock()?.superseded_by.get(bundle_id).cloned().unwrap_or_default())
    }
}

// ============================================================================
// SECTION: In-Memory Payload Store
// ============================================================================

/// In-memory raw payload store for tests and examples.
#[derive(Debug, Default, Clone)]
pub struct InMemoryPayloadStore {
    /// Payload bytes keyed by digest value.
    payloads: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
}

impl InMemoryPayloadStore {
    /// Creates an empty in-memory payload store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces stored bytes in place, simulating out-of-band mutation of
    /// object storage. Intended for tamper-detection tests.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store mutex is poisoned.
    pub fn overwrite(&self, digest: &HashDigest, bytes: Vec<u8>) -> Result<(), StoreError> {
        self.payloads
            .lock()
            .map_err(|_| StoreError::Store("payload store mutex poisoned".to_string()))?
            .insert(digest.value.clone(), bytes);
        Ok(())
    }
}

impl PayloadStore for InMemoryPayloadStore {
    fn put_payload(&self, bytes: &[u8]) -> Result<HashDigest, StoreError> {
        let digest = hash_bytes(DEFAULT_HASH_ALGORITHM, bytes);
        self.payloads
            .lock()
            .map_err(|_| StoreError::Store("payload store mutex poisoned".to_string()))?
            .entry(digest.value.clone())
            .or_insert_with(|| bytes.to_vec());
        Ok(digest)
    }

    fn get_payload(&self, digest: &HashDigest) -> Result<Option<Vec<u8>>, StoreError> {
        let guard = self
            .payloads
            .lock()
            .map_err(|_| StoreError::Store("payload store mutex poisoned".to_string()))?;
        Ok(guard.get(&digest.value).cloned())
    }
}

// ============================================================================
// SECTION: Shared Store Wrappers
// ============================================================================

/// Shared evidence store backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedEvidenceStore {
    /// Inner store implementation.
    inner: Arc<dyn EvidenceStore + Send + Sync>,
}

impl SharedEvidenceStore {
    /// Wraps an evidence store in a shared, clonable wrapper.
    #[must_use]
    pub fn from_store(store: impl EvidenceStore + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Wraps an existing shared store.
    #[must_use]
    pub const fn new(store: Arc<dyn EvidenceStore + Send + Sync>) -> Self {
        Self {
            inner: store,
        }
    }
}

impl EvidenceStore for SharedEvidenceStore {
    fn put(&self, bundle: &EvidenceBundle) -> Result<PutOutcome, StoreError> {
        self.inner.put(bundle)
    }

    fn get(&self, bundle_id: &BundleId) -> Result<Option<EvidenceBundle>, StoreError> {
        self.inner.get(bundle_id)
    }

    fn claim_timestamp(
        &self,
        submission: &HashDigest,
        now: Timestamp,
    ) -> Result<Timestamp, StoreError> {
        self.inner.claim_timestamp(submission, now)
    }

    fn superseded_by(&self, bundle_id: &BundleId) -> Result<Vec<BundleId>, StoreError> {
        self.inner.superseded_by(bundle_id)
    }
}

/// Shared payload store backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedPayloadStore {
    /// Inner store implementation.
    inner: Arc<dyn PayloadStore + Send + Sync>,
}

impl SharedPayloadStore {
    /// Wraps a payload store in a shared, clonable wrapper.
    #[must_use]
    pub fn from_store(store: impl PayloadStore + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Wraps an existing shared store.
    #[must_use]
    pub const fn new(store: Arc<dyn PayloadStore + Send + Sync>) -> Self {
        Self {
            inner: store,
        }
    }
}

impl PayloadStore for SharedPayloadStore {
    fn put_payload(&self, bytes: &[u8]) -> Result<HashDigest, StoreError> {
        self.inner.put_payload(bytes)
    }

    fn get_payload(&self, digest: &HashDigest) -> Result<Option<Vec<u8>>, StoreError> {
        self.inner.get_payload(digest)
    }
}
