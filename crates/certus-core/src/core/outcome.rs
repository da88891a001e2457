// crates/certus-core/src/core/outcome.rs
// ============================================================================
// Module: Certus Decision Outcomes
// Description: Policy outcomes and the outcome events fed to aggregators.
// Purpose: Share one shape between the policy gate and observability sinks.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`PolicyOutcome`] is what the integrity gate decides for a decision.
//! [`OutcomeEvent`] is the redacted record emitted once per stored bundle; it
//! carries labels only, never payloads or subjects.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::decision::DecisionKind;
use crate::core::decision::PolicyMode;
use crate::core::decision::Verdict;
use crate::core::log::LogStatus;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Result of applying guardrail policy to one decision.
///
/// # Invariants
/// - `allow` is false only when `mode` is `Enforce` and the producer verdict is
///   negative.
/// - `recorded_verdict` is `ShadowDenied` only when `mode` is `Shadow`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyOutcome {
    /// Whether the calling workflow may proceed.
    pub allow: bool,
    /// Effective policy mode.
    pub mode: PolicyMode,
    /// Verdict written into the decision.
    pub recorded_verdict: Verdict,
    /// Producer verdict kept when it was rewritten.
    pub observed_verdict: Option<Verdict>,
}

/// Outcome of one stored submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeEvent {
    /// Producer kind.
    pub decision_kind: DecisionKind,
    /// Recorded verdict.
    pub verdict: Verdict,
    /// Effective mode.
    pub mode: PolicyMode,
    /// Whether the workflow was allowed.
    pub allowed: bool,
    /// External verifiability of the stored bundle.
    pub log_status: LogStatus,
    /// True when the store already held the bundle.
    pub deduplicated: bool,
}
