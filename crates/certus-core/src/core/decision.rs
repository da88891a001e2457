// crates/certus-core/src/core/decision.rs
// ============================================================================
// Module: Certus Decision Model
// Description: Canonical integrity decisions and producer drafts.
// Purpose: Define the unit of evidence and its field-level validation rules.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! An [`IntegrityDecision`] is a judgment about one subject produced by a scan,
//! evaluator, or guardrail. Producers submit a loosely typed
//! [`DecisionDraft`]; [`DecisionDraft::check`] turns it into a
//! [`CheckedDraft`] or a [`ValidationError`] naming the first rule broken.
//! Decisions are never edited after creation; corrections are new decisions
//! that carry `supersedes`.
//!
//! Security posture: drafts are untrusted input; see
//! `Docs/security/threat_model.md`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Number;
use serde_json::Value;
use thiserror::Error;

use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::core::hashing::HashDigest;
use crate::core::identifiers::BundleId;
use crate::core::identifiers::Subject;
use crate::core::time::Timestamp;
use crate::core::time::TimestampInput;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum subject length in bytes.
pub const MAX_SUBJECT_LENGTH: usize = 512;
/// Maximum reason length in bytes.
pub const MAX_REASON_LENGTH: usize = 1024;
/// Maximum category length in bytes.
pub const MAX_CATEGORY_LENGTH: usize = 128;
/// Maximum score metric name length in bytes.
pub const MAX_SCORE_NAME_LENGTH: usize = 128;
/// Maximum number of scores per decision.
pub const MAX_SCORES: usize = 256;

// ============================================================================
// SECTION: Enumerations
// ============================================================================

/// Kind of producer that emitted the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    /// Assurance scan finding.
    ScanResult,
    /// Evaluation outcome.
    EvaluationResult,
    /// Guardrail enforcement outcome.
    GuardrailResult,
}

impl DecisionKind {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ScanResult => "scan_result",
            Self::EvaluationResult => "evaluation_result",
            Self::GuardrailResult => "guardrail_result",
        }
    }

    /// Parses a wire label.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "scan_result" => Some(Self::ScanResult),
            "evaluation_result" => Some(Self::EvaluationResult),
            "guardrail_result" => Some(Self::GuardrailResult),
            _ => None,
        }
    }

    /// Verdicts a producer of this kind may submit.
    #[must_use]
    pub const fn allowed_verdicts(self) -> &'static [Verdict] {
        match self {
            Self::ScanResult | Self::EvaluationResult => &[Verdict::Pass, Verdict::Fail],
            Self::GuardrailResult => &[Verdict::Pass, Verdict::Denied],
        }
    }

    /// Returns true when `verdict` may be submitted for this kind.
    #[must_use]
    pub fn allows(self, verdict: Verdict) -> bool {
        self.allowed_verdicts().contains(&verdict)
    }
}

/// Judgment recorded for a subject.
///
/// # Invariants
/// - `ShadowDenied` is assigned by the policy gate only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Subject passed.
    Pass,
    /// Subject failed a scan or evaluation.
    Fail,
    /// Guardrail denied the subject.
    Denied,
    /// Negative verdict observed in shadow mode without blocking.
    ShadowDenied,
}

impl Verdict {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Denied => "denied",
            Self::ShadowDenied => "shadow_denied",
        }
    }

    /// Parses a wire label.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "pass" => Some(Self::Pass),
            "fail" => Some(Self::Fail),
            "denied" => Some(Self::Denied),
            "shadow_denied" => Some(Self::ShadowDenied),
            _ => None,
        }
    }

    /// Returns true for verdicts that block in enforce mode.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        matches!(self, Self::Fail | Self::Denied)
    }
}

/// Guardrail policy mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyMode {
    /// Record negative verdicts without blocking.
    #[default]
    Shadow,
    /// Block the calling workflow on negative verdicts.
    Enforce,
}

impl PolicyMode {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shadow => "shadow",
            Self::Enforce => "enforce",
        }
    }
}

// ============================================================================
// SECTION: Integrity Decision
// ============================================================================

/// Canonical, immutable unit of evidence.
///
/// # Invariants
/// - `verdict` is a member of `decision_kind.allowed_verdicts()` or
///   `ShadowDenied` with `observed_verdict` set to the producer's verdict.
/// - `scores` is ordered by key so canonical bytes ignore insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityDecision {
    /// Artifact or query being judged.
    pub subject: Subject,
    /// Producer kind.
    pub decision_kind: DecisionKind,
    /// Recorded verdict after policy.
    pub verdict: Verdict,
    /// Producer verdict when shadow mode rewrote it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_verdict: Option<Verdict>,
    /// Metric name to numeric value.
    pub scores: BTreeMap<String, Number>,
    /// Effective policy mode.
    pub mode: PolicyMode,
    /// Cause for negative verdicts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Guardrail or category name used for policy lookup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Creation time.
    pub timestamp: Timestamp,
    /// Digest of the underlying evidence payload.
    pub payload_digest: HashDigest,
    /// Earlier bundle this decision corrects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supersedes: Option<BundleId>,
}

impl IntegrityDecision {
    /// Returns the verdict the producer originally reported.
    #[must_use]
    pub fn producer_verdict(&self) -> Verdict {
        self.observed_verdict.unwrap_or(self.verdict)
    }
}

// ============================================================================
// SECTION: Producer Draft
// ============================================================================

/// Untrusted producer input for a decision.
///
/// Every field is optional at parse time so missing fields surface as
/// [`ValidationError`] rather than as a serialization failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DecisionDraft {
    /// Artifact or query being judged.
    #[serde(default)]
    pub subject: Option<String>,
    /// Producer kind label.
    #[serde(default)]
    pub decision_kind: Option<String>,
    /// Verdict label.
    #[serde(default)]
    pub verdict: Option<String>,
    /// Metric scores; values must be numbers.
    #[serde(default)]
    pub scores: BTreeMap<String, Value>,
    /// Requested policy mode.
    #[serde(default)]
    pub mode: Option<PolicyMode>,
    /// Cause for negative verdicts.
    #[serde(default)]
    pub reason: Option<String>,
    /// Guardrail or category name.
    #[serde(default)]
    pub category: Option<String>,
    /// Creation time; stamped by the service when omitted.
    #[serde(default)]
    pub timestamp: Option<TimestampInput>,
    /// Raw evidence payload.
    #[serde(default)]
    pub payload: Option<Value>,
    /// Hex digest of a payload already held by the payload store.
    #[serde(default)]
    pub payload_digest: Option<String>,
    /// Earlier bundle this decision corrects.
    #[serde(default)]
    pub supersedes: Option<BundleId>,
}

/// Draft that passed field-level validation.
///
/// # Invariants
/// - `verdict` is allowed for `decision_kind` and is never `ShadowDenied`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckedDraft {
    /// Artifact or query being judged.
    pub subject: Subject,
    /// Producer kind.
    pub decision_kind: DecisionKind,
    /// Producer verdict.
    pub verdict: Verdict,
    /// Numeric scores.
    pub scores: BTreeMap<String, Number>,
    /// Requested policy mode.
    pub mode: Option<PolicyMode>,
    /// Cause for negative verdicts.
    pub reason: Option<String>,
    /// Guardrail or category name.
    pub category: Option<String>,
    /// Producer timestamp, if supplied.
    #[serde(skip)]
    pub timestamp: Option<Timestamp>,
    /// Supplied payload digest, if any.
    pub payload_digest: Option<HashDigest>,
    /// Earlier bundle this decision corrects.
    pub supersedes: Option<BundleId>,
}

impl DecisionDraft {
    /// Validates required fields and field-level limits.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for the first rule the draft breaks.
    pub fn check(&self) -> Result<CheckedDraft, ValidationError> {
        let subject = self.subject.as_deref().map(str::trim).unwrap_or_default();
        if subject.is_empty() {
            return Err(ValidationError::MissingField("subject"));
        }
        if subject.len() > MAX_SUBJECT_LENGTH {
            return Err(ValidationError::TooLong("subject", MAX_SUBJECT_LENGTH));
        }
        let kind_label =
            self.decision_kind.as_deref().ok_or(ValidationError::MissingField("decision_kind"))?;
        let decision_kind = DecisionKind::parse(kind_label)
            .ok_or_else(|| ValidationError::UnknownDecisionKind(kind_label.to_string()))?;
        let verdict_label =
            self.verdict.as_deref().ok_or(ValidationError::MissingField("verdict"))?;
        let verdict = Verdict::parse(verdict_label)
            .ok_or_else(|| ValidationError::UnknownVerdict(verdict_label.to_string()))?;
        if !decision_kind.allows(verdict) {
            return Err(ValidationError::VerdictNotAllowed {
                decision_kind,
                verdict,
            });
        }
        let scores = check_scores(&self.scores)?;
        let reason = normalize_optional(self.reason.as_deref());
        if let Some(reason) = &reason
            && reason.len() > MAX_REASON_LENGTH
        {
            return Err(ValidationError::TooLong("reason", MAX_REASON_LENGTH));
        }
        let category = normalize_optional(self.category.as_deref());
        if let Some(category) = &category
            && category.len() > MAX_CATEGORY_LENGTH
        {
            return Err(ValidationError::TooLong("category", MAX_CATEGORY_LENGTH));
        }
        let timestamp = self
            .timestamp
            .as_ref()
            .map(TimestampInput::resolve)
            .transpose()
            .map_err(|err| ValidationError::InvalidTimestamp(err.0))?;
        let payload_digest = self
            .payload_digest
            .as_deref()
            .map(|value| HashDigest::from_hex(DEFAULT_HASH_ALGORITHM, value.trim()))
            .transpose()
            .map_err(|err| ValidationError::InvalidPayloadDigest(err.to_string()))?;
        Ok(CheckedDraft {
            subject: Subject::new(subject),
            decision_kind,
            verdict,
            scores,
            mode: self.mode,
            reason,
            category,
            timestamp,
            payload_digest,
            supersedes: self.supersedes.clone(),
        })
    }
}

/// Validates score names and converts values to JSON numbers.
fn check_scores(
    scores: &BTreeMap<String, Value>,
) -> Result<BTreeMap<String, Number>, ValidationError> {
    if scores.len() > MAX_SCORES {
        return Err(ValidationError::TooManyScores(MAX_SCORES));
    }
    let mut checked = BTreeMap::new();
    for (name, value) in scores {
        if name.trim().is_empty() || name.len() > MAX_SCORE_NAME_LENGTH {
            return Err(ValidationError::InvalidScoreName(name.clone()));
        }
        let Value::Number(number) = value else {
            return Err(ValidationError::NonNumericScore(name.clone()));
        };
        checked.insert(name.clone(), number.clone());
    }
    Ok(checked)
}

/// Trims optional text, mapping blank values to `None`.
fn normalize_optional(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|text| !text.is_empty()).map(ToString::to_string)
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Malformed decision errors.
///
/// Validation errors are deterministic and never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Required field absent or blank.
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    /// Field exceeds its length limit.
    #[error("{0} exceeds {1} bytes")]
    TooLong(&'static str, usize),
    /// Unknown decision kind label.
    #[error("unknown decision_kind: {0}")]
    UnknownDecisionKind(String),
    /// Unknown verdict label.
    #[error("unknown verdict: {0}")]
    UnknownVerdict(String),
    /// Verdict is not in the allowed set for the kind.
    #[error("verdict {} is not allowed for {}", .verdict.as_str(), .decision_kind.as_str())]
    VerdictNotAllowed {
        /// Submitted kind.
        decision_kind: DecisionKind,
        /// Submitted verdict.
        verdict: Verdict,
    },
    /// Score value is not numeric.
    #[error("score {0} must be numeric")]
    NonNumericScore(String),
    /// Score name is blank or too long.
    #[error("invalid score name: {0:?}")]
    InvalidScoreName(String),
    /// Too many scores.
    #[error("at most {0} scores are allowed")]
    TooManyScores(usize),
    /// Timestamp text failed to parse.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
    /// Payload digest failed to parse.
    #[error("invalid payload_digest: {0}")]
    InvalidPayloadDigest(String),
    /// Supplied digest disagrees with the supplied payload.
    #[error("payload_digest does not match payload (computed {computed})")]
    PayloadDigestMismatch {
        /// Digest computed from the payload.
        computed: String,
    },
    /// Digest references a payload the store does not hold.
    #[error("payload {0} not found in payload store")]
    UnknownPayload(String),
    /// Payload could not be canonicalized.
    #[error("payload is not canonicalizable: {0}")]
    InvalidPayload(String),
    /// Superseded bundle does not exist.
    #[error("superseded bundle not found: {0}")]
    UnknownSupersedes(BundleId),
}

// ============================================================================
// SECTION: Tests
// ============================================================================
