// crates/certus-core/src/runtime/stats.rs
// ============================================================================
// Module: Certus Outcome Aggregator
// Description: Process-wide decision outcome counters fed by an event channel.
// Purpose: Count outcomes without shared mutable counters on the hot path.
// Dependencies: serde, std::sync::mpsc, std::thread
// ============================================================================

//! ## Overview
//! One worker thread owns [`OutcomeStats`]. Producers send events through an
//! [`AggregatorHandle`], which implements [`OutcomeSink`]; recording never
//! waits on the worker. Snapshots and resets are request/response commands
//! on the same channel, so they observe every event sent before them.
//! Counters start at zero on [`OutcomeAggregator::start`] and live until
//! [`AggregatorHandle::shutdown`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::mpsc;
use std::thread;
use std::thread::JoinHandle;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::decision::Verdict;
use crate::core::log::LogStatus;
use crate::core::outcome::OutcomeEvent;
use crate::interfaces::OutcomeSink;

// ============================================================================
// SECTION: Counters
// ============================================================================

/// Aggregate decision outcome counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeStats {
    /// Stored submissions.
    pub total: u64,
    /// Enforce-mode blocks.
    pub blocked: u64,
    /// Negative verdicts recorded in shadow mode.
    pub shadow_denied: u64,
    /// Bundles logged with a mock reference.
    pub mock_logged: u64,
    /// Submissions that matched an already stored bundle.
    pub deduplicated: u64,
    /// Counts by recorded verdict label.
    pub by_verdict: BTreeMap<String, u64>,
    /// Counts by effective mode label.
    pub by_mode: BTreeMap<String, u64>,
    /// Counts by decision kind label.
    pub by_kind: BTreeMap<String, u64>,
}

impl OutcomeStats {
    /// Folds one event into the counters.
    pub fn apply(&mut self, event: &OutcomeEvent) {
        self.total += 1;
        if !event.allowed {
            self.blocked += 1;
        }
        if event.verdict == Verdict::ShadowDenied {
            self.shadow_denied += 1;
        }
        if event.log_status == LogStatus::UnverifiedExternally {
            self.mock_logged += 1;
        }
        if event.deduplicated {
            self.deduplicated += 1;
        }
        *self.by_verdict.entry(event.verdict.as_str().to_string()).or_default() += 1;
        *self.by_mode.entry(event.mode.as_str().to_string()).or_default() += 1;
        *self.by_kind.entry(event.decision_kind.as_str().to_string()).or_default() += 1;
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Messages handled by the aggregator worker.
enum AggregatorCommand {
    /// Fold an event.
    Record(OutcomeEvent),
    /// Return a copy of the counters.
    Snapshot(mpsc::Sender<OutcomeStats>),
    /// Zero the counters and return the previous values.
    Reset(mpsc::Sender<OutcomeStats>),
    /// Stop the worker.
    Shutdown,
}

/// Aggregator errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatsError {
    /// Worker thread is gone or could not start.
    #[error("outcome aggregator unavailable: {0}")]
    Unavailable(String),
}

// ============================================================================
// SECTION: Aggregator
// ============================================================================

/// Starts the outcome aggregation service.
pub struct OutcomeAggregator;

impl OutcomeAggregator {
    /// Spawns the worker thread with zeroed counters.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::Unavailable`] when the thread cannot be spawned.
    pub fn start() -> Result<AggregatorHandle, StatsError> {
        let (sender, receiver) = mpsc::channel();
        let worker = thread::Builder::new()
            .name("certus-outcome-stats".to_string())
            .spawn(move || aggregator_loop(&receiver))
            .map_err(|err| StatsError::Unavailable(format!("failed to spawn worker: {err}")))?;
        Ok(AggregatorHandle {
            sender,
            worker: Arc::new(Mutex::new(Some(worker))),
        })
    }
}

/// Worker loop; owns the counters.
fn aggregator_loop(receiver: &mpsc::Receiver<AggregatorCommand>) {
    let mut stats = OutcomeStats::default();
    while let Ok(command) = receiver.recv() {
        match command {
            AggregatorCommand::Record(event) => stats.apply(&event),
            AggregatorCommand::Snapshot(response) => {
                let _ = response.send(stats.clone());
            }
            AggregatorCommand::Reset(response) => {
                let _ = response.send(std::mem::take(&mut stats));
            }
            AggregatorCommand::Shutdown => break,
        }
    }
}

/// Clonable handle to the aggregation worker.
#[derive(Clone)]
pub struct AggregatorHandle {
    /// Command channel into the worker.
    sender: mpsc::Sender<AggregatorCommand>,
    /// Worker thread, joined on shutdown.
    worker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl AggregatorHandle {
    /// Returns the current counters.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::Unavailable`] after shutdown.
    pub fn snapshot(&self) -> Result<OutcomeStats, StatsError> {
        self.request(AggregatorCommand::Snapshot)
    }

    /// Zeroes the counters and returns their previous values.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::Unavailable`] after shutdown.
    pub fn reset(&self) -> Result<OutcomeStats, StatsError> {
        self.request(AggregatorCommand::Reset)
    }

    /// Stops the worker and waits for it to exit. Later calls are no-ops.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::Unavailable`] when the worker panicked.
    pub fn shutdown(&self) -> Result<(), StatsError> {
        let _ = self.sender.send(AggregatorCommand::Shutdown);
        let worker = self
            .worker
            .lock()
            .map_err(|_| StatsError::Unavailable("worker mutex poisoned".to_string()))?
            .take();
        if let Some(worker) = worker {
            worker.join().map_err(|_| StatsError::Unavailable("worker panicked".to_string()))?;
        }
        Ok(())
    }

    /// Sends a request command and waits for the reply.
    fn request(
        &self,
        command: impl FnOnce(mpsc::Sender<OutcomeStats>) -> AggregatorCommand,
    ) -> Result<OutcomeStats, StatsError> {
        let (response_tx, response_rx) = mpsc::channel();
        self.sender
            .send(command(response_tx))
            .map_err(|_| StatsError::Unavailable("worker stopped".to_string()))?;
        response_rx.recv().map_err(|_| StatsError::Unavailable("worker stopped".to_string()))
    }
}

impl OutcomeSink for AggregatorHandle {
    fn record(&self, event: OutcomeEvent) {
        let _ = self.sender.send(AggregatorCommand::Record(event));
    }
}
