// crates/certus-server/src/audit.rs
// ============================================================================
// Module: Certus Audit Logging
// Description: Structured audit events for decision submissions.
// Purpose: Emit one JSON line per submission without a logging framework.
// Dependencies: certus-core, serde, serde_json
// ============================================================================

//! ## Overview
//! Every submission handled by the server produces exactly one
//! [`DecisionAuditEvent`], written as a JSON line by an [`AuditSink`].
//! Events carry identifiers, labels, and the lifecycle trail of the final
//! attempt. Raw payloads and score values are never included.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use certus_core::BundleRef;
use certus_core::DecisionKind;
use certus_core::LifecycleState;
use certus_core::LogStatus;
use certus_core::PolicyMode;
use certus_core::SubmitError;
use certus_core::Verdict;
use certus_core::runtime::RetriedSubmission;
use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Audit event for one decision submission.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Stored or attempted bundle id.
    pub evidence_id: Option<String>,
    /// Subject of the decision, once validated.
    pub subject: Option<String>,
    /// Producer kind, once validated.
    pub decision_kind: Option<DecisionKind>,
    /// Recorded verdict after policy.
    pub verdict: Option<Verdict>,
    /// Effective policy mode.
    pub mode: Option<PolicyMode>,
    /// Whether the workflow was allowed to proceed.
    pub allowed: Option<bool>,
    /// External verifiability of the stored bundle.
    pub log_status: Option<LogStatus>,
    /// Lifecycle states visited by the final attempt.
    pub lifecycle: Vec<LifecycleState>,
    /// Attempts made, including retries.
    pub attempts: u32,
    /// Submission outcome label.
    pub outcome: &'static str,
    /// Stable error label when the submission failed.
    pub error_kind: Option<&'static str>,
}

impl DecisionAuditEvent {
    /// Builds the audit event for a finished submission.
    #[must_use]
    pub fn from_submission(submission: &RetriedSubmission) -> Self {
        let trace = &submission.trace;
        let decision = trace.decision.as_ref();
        let stored = match &trace.result {
            Ok(bundle)
            | Err(SubmitError::PolicyViolation {
                bundle,
            }) => Some(bundle),
            Err(_) => None,
        };
        let evidence_id = match &trace.result {
            Ok(bundle) => Some(bundle.bundle_id.to_string()),
            Err(err) => err.bundle_id().map(ToString::to_string),
        };
        Self {
            event: "decision_audit",
            timestamp_ms: now_ms(),
            evidence_id,
            subject: decision.map(|decision| decision.subject.as_str().to_string()),
            decision_kind: decision.map(|decision| decision.decision_kind),
            verdict: decision.map(|decision| decision.verdict),
            mode: decision.map(|decision| decision.mode),
            allowed: stored.map(|bundle| bundle.allowed),
            log_status: stored.map(|bundle| bundle.log_status),
            lifecycle: trace.lifecycle.trail().to_vec(),
            attempts: submission.attempts,
            outcome: outcome_label(&trace.result),
            error_kind: trace.result.as_ref().err().map(SubmitError::kind),
        }
    }

    /// Builds the audit event for a body that did not parse as a draft.
    #[must_use]
    pub fn unparsed() -> Self {
        Self {
            event: "decision_audit",
            timestamp_ms: now_ms(),
            evidence_id: None,
            subject: None,
            decision_kind: None,
            verdict: None,
            mode: None,
            allowed: None,
            log_status: None,
            lifecycle: Vec::new(),
            attempts: 0,
            outcome: "rejected",
            error_kind: Some("validation_error"),
        }
    }
}

/// Classifies a submission result for audit output.
const fn outcome_label(result: &Result<BundleRef, SubmitError>) -> &'static str {
    match result {
        Ok(bundle) if bundle.deduplicated => "deduplicated",
        Ok(_) => "stored",
        Err(SubmitError::PolicyViolation { .. }) => "blocked",
        Err(SubmitError::Validation(_) | SubmitError::Cancelled) => "rejected",
        Err(_) => "failed",
    }
}

/// Returns the current wall-clock time in milliseconds.
fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|duration| duration.as_millis()).unwrap_or(0)
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink for submission events.
pub trait AuditSink: Send + Sync {
    /// Records an audit event.
    fn record(&self, event: &DecisionAuditEvent);
}

/// Audit sink that writes JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, event: &DecisionAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that appends JSON lines to a file.
pub struct FileAuditSink {
    /// Open audit log.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, event: &DecisionAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &DecisionAuditEvent) {}
}
