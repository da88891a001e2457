// crates/certus-core/src/core/lifecycle.rs
// ============================================================================
// Module: Certus Decision Lifecycle
// Description: Per-decision processing state machine.
// Purpose: Reject illegal transitions and keep terminal states terminal.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Each submission walks `received -> validated -> policy_applied` and ends in
//! `forwarded_to_trust` or `rejected_locally`. Validation failure is the only
//! exit from `received` besides `validated`. Terminal states accept no
//! further transition; a correction is a new decision with its own lifecycle.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: States
// ============================================================================

/// Processing state of one decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Draft accepted for processing.
    Received,
    /// Draft passed validation.
    Validated,
    /// Policy mode and verdict resolved.
    PolicyApplied,
    /// Signed, logged, and stored.
    ForwardedToTrust,
    /// Stopped before signing.
    RejectedLocally,
}

impl LifecycleState {
    /// Returns true for states with no outgoing transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::ForwardedToTrust | Self::RejectedLocally)
    }

    /// Returns true when `next` is a legal successor.
    #[must_use]
    pub const fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Received, Self::Validated | Self::RejectedLocally)
                | (Self::Validated, Self::PolicyApplied)
                | (Self::PolicyApplied, Self::ForwardedToTrust | Self::RejectedLocally)
        )
    }

    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Validated => "validated",
            Self::PolicyApplied => "policy_applied",
            Self::ForwardedToTrust => "forwarded_to_trust",
            Self::RejectedLocally => "rejected_locally",
        }
    }
}

/// Illegal lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("illegal lifecycle transition: {} -> {}", .from.as_str(), .to.as_str())]
pub struct LifecycleError {
    /// Current state.
    pub from: LifecycleState,
    /// Requested state.
    pub to: LifecycleState,
}

// ============================================================================
// SECTION: Tracker
// ============================================================================

/// Lifecycle of a single submission with its transition trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionLifecycle {
    /// Visited states in order; never empty.
    trail: Vec<LifecycleState>,
}

impl Default for DecisionLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionLifecycle {
    /// Starts a lifecycle in `received`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            trail: vec![LifecycleState::Received],
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn current(&self) -> LifecycleState {
        self.trail.last().copied().unwrap_or(LifecycleState::Received)
    }

    /// Advances to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError`] when the transition is illegal.
    pub fn advance(&mut self, next: LifecycleState) -> Result<(), LifecycleError> {
        let current = self.current();
        if !current.can_advance_to(next) {
            return Err(LifecycleError {
                from: current,
                to: next,
            });
        }
        self.trail.push(next);
        Ok(())
    }

    /// Returns the visited states.
    #[must_use]
    pub fn trail(&self) -> &[LifecycleState] {
        &self.trail
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use super::*;

    #[test]
    fn happy_path_reaches_forwarded() {
        let mut lifecycle = DecisionLifecycle::new();
        lifecycle.advance(LifecycleState::Validated).unwrap();
        lifecycle.advance(LifecycleState::PolicyApplied).unwrap();
        lifecycle.advance(LifecycleState::ForwardedToTrust).unwrap();
        assert!(lifecycle.current().is_terminal());
        assert_eq!(lifecycle.trail().len(), 4);
    }

    #[test]
    fn terminal_states_cannot_reenter_received() {
        let mut lifecycle = DecisionLifecycle::new();
        lifecycle.advance(LifecycleState::RejectedLocally).unwrap();
        let err = lifecycle.advance(LifecycleState::Received).unwrap_err();
        assert_eq!(err.from, LifecycleState::RejectedLocally);
        assert!(lifecycle.advance(LifecycleState::Validated).is_err());
    }

    #[test]
    fn policy_cannot_be_skipped() {
        let mut lifecycle = DecisionLifecycle::new();
        lifecycle.advance(LifecycleState::Validated).unwrap();
        assert!(lifecycle.advance(LifecycleState::ForwardedToTrust).is_err());
    }
}
