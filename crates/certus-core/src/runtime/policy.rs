// crates/certus-core/src/runtime/policy.rs
// ============================================================================
// Module: Certus Integrity Service
// Description: Shadow/enforce guardrail policy gate.
// Purpose: Resolve the effective mode for a decision and whether it blocks.
// Dependencies: crate::core, serde
// ============================================================================

//! ## Overview
//! Policy mode is one parameter consulted at decision time. The effective
//! mode comes from the first match of: an override for (category, kind), an
//! override for the category alone, the producer's requested mode when
//! producers may choose, and finally the default mode.
//!
//! In shadow mode the workflow always proceeds and a negative verdict is
//! recorded as `shadow_denied`. In enforce mode a negative verdict blocks.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::decision::CheckedDraft;
use crate::core::decision::DecisionKind;
use crate::core::decision::PolicyMode;
use crate::core::decision::Verdict;
use crate::core::outcome::PolicyOutcome;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Mode override for a guardrail category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeOverride {
    /// Category the override applies to.
    pub category: String,
    /// Restricts the override to one decision kind.
    #[serde(default)]
    pub decision_kind: Option<DecisionKind>,
    /// Mode to apply.
    pub mode: PolicyMode,
}

/// Policy gate configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Mode used when nothing else applies.
    pub default_mode: PolicyMode,
    /// Whether the producer's requested mode is honored.
    pub allow_producer_mode: bool,
    /// Category overrides; these win over producer requests.
    pub overrides: Vec<ModeOverride>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            default_mode: PolicyMode::Shadow,
            allow_producer_mode: true,
            overrides: Vec::new(),
        }
    }
}

// ============================================================================
// SECTION: Integrity Service
// ============================================================================

/// Inputs the policy gate reads from a decision.
#[derive(Debug, Clone, Copy)]
pub struct PolicyInput<'a> {
    /// Producer kind.
    pub decision_kind: DecisionKind,
    /// Producer verdict.
    pub verdict: Verdict,
    /// Producer's requested mode.
    pub requested_mode: Option<PolicyMode>,
    /// Guardrail category.
    pub category: Option<&'a str>,
}

impl<'a> From<&'a CheckedDraft> for PolicyInput<'a> {
    fn from(draft: &'a CheckedDraft) -> Self {
        Self {
            decision_kind: draft.decision_kind,
            verdict: draft.verdict,
            requested_mode: draft.mode,
            category: draft.category.as_deref(),
        }
    }
}

/// Guardrail policy gate.
#[derive(Debug, Clone, Default)]
pub struct IntegrityService {
    /// Policy configuration.
    config: PolicyConfig,
}

impl IntegrityService {
    /// Creates a policy gate from configuration.
    #[must_use]
    pub const fn new(config: PolicyConfig) -> Self {
        Self {
            config,
        }
    }

    /// Returns the policy configuration.
    #[must_use]
    pub const fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Resolves the effective mode for a decision.
    #[must_use]
    pub fn effective_mode(&self, input: &PolicyInput<'_>) -> PolicyMode {
        if let Some(category) = input.category {
            let scoped = self.config.overrides.iter().find(|rule| {
                rule.category == category && rule.decision_kind == Some(input.decision_kind)
            });
            let broad = || {
                self.config
                    .overrides
                    .iter()
                    .find(|rule| rule.category == category && rule.decision_kind.is_none())
            };
            if let Some(rule) = scoped.or_else(broad) {
                return rule.mode;
            }
        }
        match input.requested_mode {
            Some(mode) if self.config.allow_producer_mode => mode,
            _ => self.config.default_mode,
        }
    }

    /// Evaluates a decision against the policy.
    #[must_use]
    pub fn evaluate(&self, input: &PolicyInput<'_>) -> PolicyOutcome {
        let mode = self.effective_mode(input);
        let negative = input.verdict.is_negative();
        match (mode, negative) {
            (PolicyMode::Shadow, true) => PolicyOutcome {
                allow: true,
                mode,
                recorded_verdict: Verdict::ShadowDenied,
                observed_verdict: Some(input.verdict),
            },
            (PolicyMode::Enforce, true) => PolicyOutcome {
                allow: false,
                mode,
                recorded_verdict: input.verdict,
                observed_verdict: None,
            },
            (_, false) => PolicyOutcome {
                allow: true,
                mode,
                recorded_verdict: input.verdict,
                observed_verdict: None,
            },
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
