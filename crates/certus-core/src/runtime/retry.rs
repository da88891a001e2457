// crates/certus-core/src/runtime/retry.rs
// ============================================================================
// Module: Certus Submission Retry
// Description: Bounded exponential backoff for transient submission errors.
// Purpose: Let producers retry log outages without retrying deterministic errors.
// Dependencies: crate::runtime::bridge, serde
// ============================================================================

//! ## Overview
//! [`submit_with_retry`] retries only errors for which
//! [`SubmitError::is_retryable`] is true. Validation errors and policy
//! violations return on the first attempt. Retrying a signed submission is
//! safe because the bundle id is content-derived and the store keeps the
//! first record.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::core::bundle::BundleRef;
use crate::core::decision::DecisionDraft;
use crate::interfaces::EvidenceStore;
use crate::interfaces::PayloadStore;
use crate::interfaces::SigningBackend;
use crate::interfaces::TransparencyLog;
use crate::runtime::bridge::CancelSignal;
use crate::runtime::bridge::IntegrityBridge;
use crate::runtime::bridge::SubmissionTrace;
use crate::runtime::bridge::SubmitError;

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Capped exponential backoff policy.
///
/// # Invariants
/// - `max_attempts >= 1` and `multiplier >= 1` once validated by config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first.
    pub max_attempts: u32,
    /// Delay after the first failure.
    pub initial_backoff_ms: u64,
    /// Upper bound on any single delay.
    pub max_backoff_ms: u64,
    /// Growth factor between delays.
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 2_000,
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
            multiplier: 1,
        }
    }

    /// Delay before attempt `failed + 1`, where `failed >= 1`.
    #[must_use]
    pub fn delay_after(&self, failed: u32) -> Duration {
        let exponent = failed.saturating_sub(1);
        let factor = u64::from(self.multiplier.max(1)).saturating_pow(exponent);
        let millis = self.initial_backoff_ms.saturating_mul(factor).min(self.max_backoff_ms);
        Duration::from_millis(millis)
    }
}

// ============================================================================
// SECTION: Sleeper
// ============================================================================

/// Blocking delay provider.
pub trait Sleeper {
    /// Blocks for `delay`.
    fn sleep(&self, delay: Duration);
}

/// Sleeper backed by `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, delay: Duration) {
        std::thread::sleep(delay);
    }
}

// ============================================================================
// SECTION: Retry Loop
// ============================================================================

/// Submits a draft, retrying transient failures under `policy`.
///
/// # Errors
///
/// Returns the last [`SubmitError`] when attempts are exhausted, the error is
/// not retryable, or cancellation is observed between attempts.
pub fn submit_with_retry<S, P, Sg, L>(
    bridge: &IntegrityBridge<S, P, Sg, L>,
    draft: &DecisionDraft,
    cancel: &CancelSignal,
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
) -> Result<BundleRef, SubmitError>
where
    S: EvidenceStore,
    P: PayloadStore,
    Sg: SigningBackend,
    L: TransparencyLog,
{
    submit_traced_with_retry(bridge, draft, cancel, policy, sleeper).trace.result
}

/// Final attempt of a retried submission.
#[derive(Debug)]
pub struct RetriedSubmission {
    /// Attempts made, including the last.
    pub attempts: u32,
    /// Trace of the last attempt.
    pub trace: SubmissionTrace,
}

/// Like [`submit_with_retry`], returning the last attempt's lifecycle trace.
pub fn submit_traced_with_retry<S, P, Sg, L>(
    bridge: &IntegrityBridge<S, P, Sg, L>,
    draft: &DecisionDraft,
    cancel: &CancelSignal,
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
) -> RetriedSubmission
where
    S: EvidenceStore,
    P: PayloadStore,
    Sg: SigningBackend,
    L: TransparencyLog,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempts = 0;
    loop {
        let trace = bridge.submit_traced(draft, cancel);
        attempts += 1;
        let retry = match &trace.result {
            Ok(_) => false,
            Err(err) => err.is_retryable() && attempts < max_attempts && !cancel.is_cancelled(),
        };
        if !retry {
            return RetriedSubmission {
                attempts,
                trace,
            };
        }
        sleeper.sleep(policy.delay_after(attempts));
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
