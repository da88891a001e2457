// crates/certus-core/tests/retry_and_stats.rs
// ============================================================================
// Module: Retry and Outcome Stats Tests
// Description: Bounded retry on log outages and outcome aggregation.
// ============================================================================
//! ## Overview
//! Retries must stop at deterministic errors; the aggregator must count every
//! stored outcome, including blocks and mock-logged bundles.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use certus_core::runtime::InMemoryTransparencyLog;
use certus_core::runtime::LogMode;
use certus_core::runtime::OutcomeAggregator;
use certus_core::runtime::PolicyConfig;
use certus_core::runtime::RetryPolicy;
use certus_core::runtime::Sleeper;
use certus_core::runtime::SubmitError;
use certus_core::LifecycleState;
use certus_core::runtime::submit_traced_with_retry;
use certus_core::runtime::submit_with_retry;
use common::Harness;
use common::draft;
use common::no_cancel;
use serde_json::json;

/// Records delays and brings the log back after a set number of sleeps.
struct RecoveringSleeper {
    delays: Mutex<Vec<Duration>>,
    log: InMemoryTransparencyLog,
    recover_after: usize,
}

impl Sleeper for RecoveringSleeper {
    fn sleep(&self, delay: Duration) {
        let mut delays = self.delays.lock().unwrap();
        delays.push(delay);
        if delays.len() >= self.recover_after {
            self.log.set_available(true);
        }
    }
}

fn policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 4,
        initial_backoff_ms: 10,
        max_backoff_ms: 25,
        multiplier: 2,
    }
}

#[test]
fn log_outage_is_retried_until_recovery() {
    let harness = Harness::new();
    harness.log.set_available(false);
    let sleeper = RecoveringSleeper {
        delays: Mutex::new(Vec::new()),
        log: harness.log.clone(),
        recover_after: 2,
    };
    let input = draft(json!({"subject": "s", "decision_kind": "scan_result", "verdict": "pass"}));
    let submitted =
        submit_with_retry(&harness.bridge, &input, &no_cancel(), &policy(), &sleeper).unwrap();
    assert!(submitted.allowed);
    let delays = sleeper.delays.lock().unwrap().clone();
    assert_eq!(delays, vec![Duration::from_millis(10), Duration::from_millis(20)]);
}

#[test]
fn retries_stop_at_max_attempts() {
    let harness = Harness::new();
    harness.log.set_available(false);
    let sleeper = RecoveringSleeper {
        delays: Mutex::new(Vec::new()),
        log: harness.log.clone(),
        recover_after: usize::MAX,
    };
    let input = draft(json!({"subject": "s", "decision_kind": "scan_result", "verdict": "pass"}));
    let err =
        submit_with_retry(&harness.bridge, &input, &no_cancel(), &policy(), &sleeper).unwrap_err();
    assert!(matches!(err, SubmitError::LogUnavailable { .. }));
    assert_eq!(sleeper.delays.lock().unwrap().len(), 3);
}

#[test]
fn traced_retry_reports_last_attempt() {
    let harness = Harness::new();
    harness.log.set_available(false);
    let sleeper = RecoveringSleeper {
        delays: Mutex::new(Vec::new()),
        log: harness.log.clone(),
        recover_after: 1,
    };
    let input = draft(json!({"subject": "s", "decision_kind": "scan_result", "verdict": "pass"}));
    let retried =
        submit_traced_with_retry(&harness.bridge, &input, &no_cancel(), &policy(), &sleeper);
    assert_eq!(retried.attempts, 2);
    assert!(retried.trace.result.is_ok());
    assert_eq!(retried.trace.lifecycle.current(), LifecycleState::ForwardedToTrust);
}

#[test]
fn deterministic_errors_are_not_retried() {
    let harness = Harness::new();
    let sleeper = RecoveringSleeper {
        delays: Mutex::new(Vec::new()),
        log: harness.log.clone(),
        recover_after: 1,
    };
    let blocked = draft(json!({
        "subject": "scan-42",
        "decision_kind": "scan_result",
        "verdict": "fail",
        "mode": "enforce"
    }));
    let err =
        submit_with_retry(&harness.bridge, &blocked, &no_cancel(), &policy(), &sleeper).unwrap_err();
    assert_eq!(err.kind(), "policy_violation");
    assert!(sleeper.delays.lock().unwrap().is_empty());
}

#[test]
fn aggregator_counts_outcomes() {
    let aggregator = OutcomeAggregator::start().unwrap();
    let harness = Harness::build(
        LogMode::LiveWithMockFallback,
        PolicyConfig::default(),
        Arc::new(aggregator.clone()),
    );
    let guardrail = json!({
        "subject": "prompt-1",
        "decision_kind": "guardrail_result",
        "verdict": "denied",
        "reason": "jailbreak"
    });
    harness.bridge.submit(&draft(guardrail.clone()), &no_cancel()).unwrap();
    harness.bridge.submit(&draft(guardrail), &no_cancel()).unwrap();
    let _ = harness.bridge.submit(
        &draft(json!({
            "subject": "scan-42",
            "decision_kind": "scan_result",
            "verdict": "fail",
            "mode": "enforce"
        })),
        &no_cancel(),
    );
    harness.log.set_available(false);
    harness
        .bridge
        .submit(
            &draft(json!({"subject": "eval-3", "decision_kind": "evaluation_result", "verdict": "pass"})),
            &no_cancel(),
        )
        .unwrap();

    let stats = aggregator.snapshot().unwrap();
    assert_eq!(stats.total, 4);
    assert_eq!(stats.shadow_denied, 2);
    assert_eq!(stats.deduplicated, 1);
    assert_eq!(stats.blocked, 1);
    assert_eq!(stats.mock_logged, 1);
    assert_eq!(stats.by_kind.get("guardrail_result"), Some(&2));
    assert_eq!(stats.by_mode.get("enforce"), Some(&1));

    let previous = aggregator.reset().unwrap();
    assert_eq!(previous.total, 4);
    assert_eq!(aggregator.snapshot().unwrap().total, 0);
    aggregator.shutdown().unwrap();
    assert!(aggregator.snapshot().is_err());
}
