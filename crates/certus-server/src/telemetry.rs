// crates/certus-server/src/telemetry.rs
// ============================================================================
// Module: Certus Telemetry
// Description: Observability hooks for HTTP routes.
// Purpose: Provide metric events and latency buckets without hard deps.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A thin metrics interface for request counters and latency histograms.
//! Deployments plug in their exporter by implementing [`ServerMetrics`].
//! Labels are fixed strings; subjects and evidence ids never become labels.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default latency buckets in milliseconds for request histograms.
pub const LATENCY_BUCKETS_MS: &[u64] =
    &[1, 2, 5, 10, 25, 50, 100, 250, 500, 1_000, 2_500, 5_000, 10_000, 30_000];

// ============================================================================
// SECTION: Metric Labels
// ============================================================================

/// HTTP route classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// `POST /v1/decisions`.
    SubmitDecision,
    /// `GET /v1/evidence/{id}`.
    GetEvidence,
    /// `GET /v1/stats`.
    Stats,
    /// `GET /v1/health`.
    Health,
}

impl Route {
    /// Returns the stable label for the route.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SubmitDecision => "submit_decision",
            Self::GetEvidence => "get_evidence",
            Self::Stats => "stats",
            Self::Health => "health",
        }
    }
}

/// Request outcome classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestOutcome {
    /// Request succeeded.
    Ok,
    /// Request was refused by policy or input validation.
    Rejected,
    /// Request failed inside the service or a backend.
    Error,
}

impl RequestOutcome {
    /// Returns the stable label for the outcome.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Rejected => "rejected",
            Self::Error => "error",
        }
    }
}

/// Metric event payload for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteMetricEvent {
    /// Route handled.
    pub route: Route,
    /// Request outcome.
    pub outcome: RequestOutcome,
    /// HTTP status returned.
    pub status: u16,
    /// Stable error label when present.
    pub error_kind: Option<&'static str>,
}

// ============================================================================
// SECTION: Metrics Sink
// ============================================================================

/// Metrics sink for HTTP requests.
pub trait ServerMetrics: Send + Sync {
    /// Records a request counter event.
    fn record_request(&self, event: RouteMetricEvent);

    /// Records request latency for histogram metrics.
    fn record_latency(&self, event: RouteMetricEvent, latency: Duration);
}

/// No-op metrics sink.
pub struct NoopMetrics;

impl ServerMetrics for NoopMetrics {
    fn record_request(&self, _event: RouteMetricEvent) {}

    fn record_latency(&self, _event: RouteMetricEvent, _latency: Duration) {}
}
