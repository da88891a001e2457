// crates/certus-core/src/runtime/tlog.rs
// ============================================================================
// Module: Certus In-Process Transparency Log
// Description: Append-only Merkle log with idempotent appends.
// Purpose: Provide a local log backend and a reference for remote logs.
// Dependencies: crate::core, crate::interfaces, rand
// ============================================================================

//! ## Overview
//! [`InMemoryTransparencyLog`] keeps leaf hashes in append order and computes
//! inclusion proofs on demand against the current tree. Appending a leaf that
//! is already present returns its original index, so racing identical
//! submissions converge on one entry. An availability switch lets tests
//! exercise outage handling.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use rand::RngCore;
use rand::rngs::OsRng;

use crate::core::identifiers::LogId;
use crate::core::log::LogLeaf;
use crate::core::log::LogReceipt;
use crate::core::merkle::MerkleHash;
use crate::core::merkle::build_inclusion_proof;
use crate::core::merkle::merkle_root;
use crate::core::merkle::to_digest;
use crate::interfaces::LogError;
use crate::interfaces::TransparencyLog;

// ============================================================================
// SECTION: Log State
// ============================================================================

/// Mutable log contents.
#[derive(Debug, Default)]
struct LogState {
    /// Leaf hashes in append order.
    leaves: Vec<MerkleHash>,
    /// Leaf hash to index.
    positions: BTreeMap<MerkleHash, usize>,
}

impl LogState {
    /// Builds a receipt for `index` against the current tree.
    fn receipt(&self, log_id: &LogId, index: usize) -> Result<LogReceipt, LogError> {
        let leaf = self
            .leaves
            .get(index)
            .ok_or_else(|| LogError::NotFound(format!("leaf index {index}")))?;
        let proof = build_inclusion_proof(&self.leaves, index)
            .ok_or_else(|| LogError::NotFound(format!("leaf index {index}")))?;
        let root = merkle_root(&self.leaves)
            .ok_or_else(|| LogError::NotFound("empty log".to_string()))?;
        Ok(LogReceipt {
            log_id: log_id.clone(),
            leaf_index: proof.leaf_index,
            leaf_hash: to_digest(leaf),
            tree_size: proof.tree_size,
            root_hash: to_digest(&root),
            proof,
        })
    }
}

// ============================================================================
// SECTION: In-Memory Log
// ============================================================================

/// In-process append-only Merkle log.
#[derive(Debug, Clone)]
pub struct InMemoryTransparencyLog {
    /// Log identifier.
    log_id: LogId,
    /// Log contents.
    state: Arc<Mutex<LogState>>,
    /// Whether calls succeed; cleared to simulate an outage.
    available: Arc<AtomicBool>,
}

impl InMemoryTransparencyLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new(log_id: LogId) -> Self {
        Self {
            log_id,
            state: Arc::new(Mutex::new(LogState::default())),
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Creates an empty log whose identifier is unique to this instance.
    ///
    /// The id is `base` plus a random suffix. A restarted process then never
    /// answers proof requests for receipts issued by an earlier instance.
    #[must_use]
    pub fn instance_scoped(base: &LogId) -> Self {
        let suffix: u64 = OsRng.next_u64();
        Self::new(LogId::new(format!("{base}/{suffix:016x}")))
    }

    /// Toggles availability for all clones of this log.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Returns the number of leaves.
    ///
    /// # Errors
    ///
    /// Returns [`LogError`] when the log mutex is poisoned.
    pub fn size(&self) -> Result<usize, LogError> {
        Ok(self.lock()?.leaves.len())
    }

    /// Fails when the log is marked unavailable.
    fn ensure_available(&self) -> Result<(), LogError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(LogError::Unavailable(format!("log {} is offline", self.log_id)))
        }
    }

    /// Locks the log state.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, LogState>, LogError> {
        self.state.lock().map_err(|_| LogError::Unavailable("log mutex poisoned".to_string()))
    }
}

impl TransparencyLog for InMemoryTransparencyLog {
    fn log_id(&self) -> LogId {
        self.log_id.clone()
    }

    fn append(&self, leaf: &LogLeaf) -> Result<LogReceipt, LogError> {
        self.ensure_available()?;
        let hash = leaf.merkle_hash().map_err(|err| LogError::Rejected(err.to_string()))?;
        let mut guard = self.lock()?;
        let index = if let Some(existing) = guard.positions.get(&hash) {
            *existing
        } else {
            let index = guard.leaves.len();
            guard.leaves.push(hash);
            guard.positions.insert(hash, index);
            index
        };
        let receipt = guard.receipt(&self.log_id, index);
        drop(guard);
        receipt
    }

    fn inclusion_proof(&self, leaf_index: u64) -> Result<LogReceipt, LogError> {
        self.ensure_available()?;
        let index = usize::try_from(leaf_index)
            .map_err(|_| LogError::NotFound(format!("leaf index {leaf_index}")))?;
        let guard = self.lock()?;
        let receipt = guard.receipt(&self.log_id, index);
        drop(guard);
        receipt
    }
}

// ============================================================================
// SECTION: Shared Wrapper
// ============================================================================

/// Shared transparency log backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedTransparencyLog {
    /// Inner log implementation.
    inner: Arc<dyn TransparencyLog + Send + Sync>,
}

impl SharedTransparencyLog {
    /// Wraps a log in a shared, clonable wrapper.
    #[must_use]
    pub fn from_log(log: impl TransparencyLog + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(log),
        }
    }

    /// Wraps an existing shared log.
    #[must_use]
    pub const fn new(log: Arc<dyn TransparencyLog + Send + Sync>) -> Self {
        Self {
            inner: log,
        }
    }
}

impl TransparencyLog for SharedTransparencyLog {
    fn log_id(&self) -> LogId {
        self.inner.log_id()
    }

    fn append(&self, leaf: &LogLeaf) -> Result<LogReceipt, LogError> {
        self.inner.append(leaf)
    }

    fn inclusion_proof(&self, leaf_index: u64) -> Result<LogReceipt, LogError> {
        self.inner.inclusion_proof(leaf_index)
    }
}
