// crates/certus-server/src/server.rs
// ============================================================================
// Module: Certus HTTP Server
// Description: axum routes for decision submission and evidence retrieval.
// Purpose: Expose the integrity bridge and verifier over JSON HTTP.
// Dependencies: certus-core, certus-config, axum, tokio
// ============================================================================

//! ## Overview
//! Routes:
//! - `POST /v1/decisions` submits a [`DecisionDraft`] with bounded retry.
//! - `GET /v1/evidence/{evidence_id}` returns the bundle and a fresh
//!   verification result.
//! - `GET /v1/stats` returns the outcome counters.
//! - `GET /v1/health` reports the log mode and active signing key.
//!
//! Submissions, verification, and stats snapshots run on `spawn_blocking`;
//! once a submission is signed it runs to the store step even if the client
//! disconnects.
//! Security posture: request bodies are untrusted and size-limited; see
//! `Docs/security/threat_model.md`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::extract::Path as UrlPath;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use certus_config::CertusConfig;
use certus_core::BundleId;
use certus_core::BundleRef;
use certus_core::DecisionDraft;
use certus_core::EvidenceStore;
use certus_core::LogEntryRef;
use certus_core::SubmitError;
use certus_core::VerifyError;
use certus_core::runtime::AggregatorHandle;
use certus_core::runtime::CancelSignal;
use certus_core::runtime::LogMode;
use certus_core::runtime::OutcomeAggregator;
use certus_core::runtime::RetriedSubmission;
use certus_core::runtime::RetryPolicy;
use certus_core::runtime::ThreadSleeper;
use certus_core::runtime::submit_traced_with_retry;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

use crate::assembly::ServiceBackends;
use crate::assembly::ServiceBridge;
use crate::assembly::ServiceVerifier;
use crate::audit::AuditSink;
use crate::audit::DecisionAuditEvent;
use crate::audit::FileAuditSink;
use crate::audit::NoopAuditSink;
use crate::audit::StderrAuditSink;
use crate::telemetry::NoopMetrics;
use crate::telemetry::RequestOutcome;
use crate::telemetry::Route;
use crate::telemetry::RouteMetricEvent;
use crate::telemetry::ServerMetrics;


// ============================================================================
// SECTION: Constants
// ============================================================================

/// Longest evidence id accepted on the evidence route.
const MAX_EVIDENCE_ID_LENGTH: usize = 128;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Server startup and transport errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration is invalid for the requested backends.
    #[error("config error: {0}")]
    Config(String),
    /// A backend failed to initialize.
    #[error("init error: {0}")]
    Init(String),
    /// Listener or transport failure.
    #[error("transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// Certus HTTP server instance.
pub struct CertusServer {
    /// Listen address.
    bind: SocketAddr,
    /// Shared handler state.
    state: Arc<AppState>,
}

impl CertusServer {
    /// Builds a server from configuration.
    ///
    /// Opens HTTP clients for remote backends; call outside an async context.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when validation or backend setup fails.
    pub fn from_config(config: &CertusConfig) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        let audit = build_audit_sink(config)?;
        Self::from_config_with_sinks(config, audit, Arc::new(NoopMetrics))
    }

    /// Builds a server with caller-supplied audit and metrics sinks.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when validation or backend setup fails.
    pub fn from_config_with_sinks(
        config: &CertusConfig,
        audit: Arc<dyn AuditSink>,
        metrics: Arc<dyn ServerMetrics>,
    ) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        let bind = config.server.bind_addr().map_err(|err| ServerError::Config(err.to_string()))?;
        let stats = OutcomeAggregator::start().map_err(|err| ServerError::Init(err.to_string()))?;
        let backends = ServiceBackends::from_config(config, Arc::new(stats.clone()))?;
        let state = AppState {
            bridge: backends.bridge,
            verifier: backends.verifier,
            retry: config.retry,
            stats,
            audit,
            metrics,
            log_mode: config.transparency_log.mode,
            signing_key_id: backends.signing_key_id,
            max_body_bytes: config.server.max_body_bytes,
        };
        Ok(Self {
            bind,
            state: Arc::new(state),
        })
    }

    /// Returns the configured listen address.
    #[must_use]
    pub const fn bind_addr(&self) -> SocketAddr {
        self.bind
    }

    /// Returns the axum router for this server.
    #[must_use]
    pub fn router(&self) -> Router {
        build_router(Arc::clone(&self.state))
    }

    /// Serves requests until the listener fails.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        let app = self.router();
        let listener = tokio::net::TcpListener::bind(self.bind)
            .await
            .map_err(|_| ServerError::Transport("http bind failed".to_string()))?;
        let served = axum::serve(listener, app)
            .await
            .map_err(|_| ServerError::Transport("http server failed".to_string()));
        let _ = self.state.stats.shutdown();
        served
    }
}

/// Selects the audit sink from server configuration.
fn build_audit_sink(config: &CertusConfig) -> Result<Arc<dyn AuditSink>, ServerError> {
    let audit = &config.server.audit;
    if !audit.enabled {
        return Ok(Arc::new(NoopAuditSink));
    }
    match audit.path.as_deref() {
        Some(path) => {
            let sink = FileAuditSink::new(Path::new(path))
                .map_err(|err| ServerError::Init(format!("audit log {path}: {err}")))?;
            Ok(Arc::new(sink))
        }
        None => Ok(Arc::new(StderrAuditSink)),
    }
}

/// Builds the route table over shared state.
fn build_router(state: Arc<AppState>) -> Router {
    let max_body_bytes = state.max_body_bytes;
    Router::new()
        .route("/v1/decisions", post(submit_decision))
        .route("/v1/evidence/{evidence_id}", get(get_evidence))
        .route("/v1/stats", get(get_stats))
        .route("/v1/health", get(get_health))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

// ============================================================================
// SECTION: Handler State
// ============================================================================

/// Shared state for route handlers.
struct AppState {
    /// Submission pipeline.
    bridge: ServiceBridge,
    /// Read-only verifier.
    verifier: ServiceVerifier,
    /// Retry policy for transient failures.
    retry: RetryPolicy,
    /// Outcome counters.
    stats: AggregatorHandle,
    /// Audit sink for submissions.
    audit: Arc<dyn AuditSink>,
    /// Request metrics sink.
    metrics: Arc<dyn ServerMetrics>,
    /// Configured log mode.
    log_mode: LogMode,
    /// Active signing key id.
    signing_key_id: String,
    /// Maximum accepted request body.
    max_body_bytes: usize,
}

impl AppState {
    /// Runs one submission with retry and records its audit event.
    fn submit(&self, draft: &DecisionDraft) -> RetriedSubmission {
        let submission = submit_traced_with_retry(
            &self.bridge,
            draft,
            &CancelSignal::new(),
            &self.retry,
            &ThreadSleeper,
        );
        self.audit.record(&DecisionAuditEvent::from_submission(&submission));
        submission
    }
}

/// Handler reply before it becomes an HTTP response.
struct Reply {
    /// HTTP status.
    status: StatusCode,
    /// JSON body.
    body: Value,
    /// Stable error label for metrics.
    error_kind: Option<&'static str>,
}

impl Reply {
    /// Successful reply.
    const fn ok(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body,
            error_kind: None,
        }
    }

    /// Error reply with `{error, message}` body.
    fn error(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({"error": kind, "message": message.into()}),
            error_kind: Some(kind),
        }
    }
}

/// Records metrics for a reply and converts it into a response.
fn finish(state: &AppState, route: Route, started: Instant, reply: Reply) -> Response {
    let outcome = if reply.status.is_success() {
        RequestOutcome::Ok
    } else if reply.status.is_client_error() {
        RequestOutcome::Rejected
    } else {
        RequestOutcome::Error
    };
    let event = RouteMetricEvent {
        route,
        outcome,
        status: reply.status.as_u16(),
        error_kind: reply.error_kind,
    };
    state.metrics.record_request(event);
    state.metrics.record_latency(event, started.elapsed());
    (reply.status, Json(reply.body)).into_response()
}

// ============================================================================
// SECTION: Decisions
// ============================================================================

/// Handles `POST /v1/decisions`.
async fn submit_decision(State(state): State<Arc<AppState>>, bytes: Bytes) -> Response {
    let started = Instant::now();
    let reply = submit_reply(&state, &bytes).await;
    finish(&state, Route::SubmitDecision, started, reply)
}

/// Parses, submits, and maps the result of one decision request.
async fn submit_reply(state: &Arc<AppState>, bytes: &[u8]) -> Reply {
    if bytes.len() > state.max_body_bytes {
        return Reply::error(
            StatusCode::PAYLOAD_TOO_LARGE,
            "payload_too_large",
            format!("request body exceeds {} bytes", state.max_body_bytes),
        );
    }
    let draft: DecisionDraft = match serde_json::from_slice(bytes) {
        Ok(draft) => draft,
        Err(err) => {
            state.audit.record(&DecisionAuditEvent::unparsed());
            return Reply::error(
                StatusCode::BAD_REQUEST,
                "validation_error",
                format!("invalid decision json: {err}"),
            );
        }
    };
    let worker = Arc::clone(state);
    match tokio::task::spawn_blocking(move || worker.submit(&draft)).await {
        Ok(submission) => submission_reply(submission.trace.result),
        Err(_) => Reply::error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "submission worker failed",
        ),
    }
}

/// Maps a submission result onto the HTTP contract.
fn submission_reply(result: Result<BundleRef, SubmitError>) -> Reply {
    match result {
        Ok(bundle) => Reply::ok(StatusCode::CREATED, accepted_body(&bundle)),
        Err(SubmitError::PolicyViolation {
            bundle,
        }) => {
            let mut body = accepted_body(&bundle);
            if let Some(object) = body.as_object_mut() {
                object.insert("error".to_string(), json!("policy_violation"));
            }
            Reply {
                status: StatusCode::FORBIDDEN,
                body,
                error_kind: Some("policy_violation"),
            }
        }
        Err(err) => error_reply(&err),
    }
}

/// Maps a submission failure without stored evidence.
fn error_reply(err: &SubmitError) -> Reply {
    let kind = err.kind();
    let status = match err {
        SubmitError::Validation(_) => StatusCode::BAD_REQUEST,
        SubmitError::LogUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        SubmitError::Signing { .. } | SubmitError::LogRejected { .. } => StatusCode::BAD_GATEWAY,
        SubmitError::PolicyViolation { .. }
        | SubmitError::Store(_)
        | SubmitError::Cancelled
        | SubmitError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let mut body = json!({"error": kind, "message": err.to_string()});
    if let (Some(object), Some(bundle_id)) = (body.as_object_mut(), err.bundle_id()) {
        object.insert("bundle_id".to_string(), json!(bundle_id.as_str()));
    }
    Reply {
        status,
        body,
        error_kind: Some(kind),
    }
}

/// Builds the body describing a stored bundle.
fn accepted_body(bundle: &BundleRef) -> Value {
    let proof = bundle.log_entry_ref.as_ref().and_then(LogEntryRef::receipt).map(|receipt| {
        json!({
            "leaf_index": receipt.leaf_index,
            "tree_size": receipt.tree_size,
            "root_hash": receipt.root_hash,
            "path": receipt.proof.path,
        })
    });
    json!({
        "evidence_id": bundle.bundle_id.as_str(),
        "bundle_id": bundle.bundle_id.as_str(),
        "verdict": bundle.verdict,
        "mode": bundle.mode,
        "allowed": bundle.allowed,
        "log_status": bundle.log_status,
        "log_entry_ref": bundle.log_entry_ref,
        "proof": proof,
        "deduplicated": bundle.deduplicated,
    })
}

// ============================================================================
// SECTION: Evidence
// ============================================================================

/// Handles `GET /v1/evidence/{evidence_id}`.
async fn get_evidence(
    State(state): State<Arc<AppState>>,
    UrlPath(evidence_id): UrlPath<String>,
) -> Response {
    let started = Instant::now();
    let reply = evidence_reply(&state, evidence_id).await;
    finish(&state, Route::GetEvidence, started, reply)
}

/// Loads and verifies one bundle.
async fn evidence_reply(state: &Arc<AppState>, evidence_id: String) -> Reply {
    if evidence_id.is_empty() || evidence_id.len() > MAX_EVIDENCE_ID_LENGTH {
        return Reply::error(StatusCode::NOT_FOUND, "not_found", "evidence not found");
    }
    let worker = Arc::clone(state);
    let bundle_id = BundleId::new(evidence_id);
    let joined = tokio::task::spawn_blocking(move || worker.lookup(&bundle_id)).await;
    match joined {
        Ok(Ok(body)) => Reply::ok(StatusCode::OK, body),
        Ok(Err(VerifyError::NotFound(_))) => {
            Reply::error(StatusCode::NOT_FOUND, "not_found", "evidence not found")
        }
        Ok(Err(err)) => {
            Reply::error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", err.to_string())
        }
        Err(_) => Reply::error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "verification worker failed",
        ),
    }
}

impl AppState {
    /// Returns the primary decision summary with `bundle` and `verification`.
    fn lookup(&self, bundle_id: &BundleId) -> Result<Value, VerifyError> {
        let bundle = self
            .bridge
            .store()
            .get(bundle_id)?
            .ok_or_else(|| VerifyError::NotFound(bundle_id.clone()))?;
        let verification = self.verifier.verify_bundle(&bundle)?;
        let primary = bundle.content.primary();
        Ok(json!({
            "evidence_id": bundle.bundle_id.as_str(),
            "verdict": primary.map(|decision| decision.verdict),
            "mode": primary.map(|decision| decision.mode),
            "bundle": bundle,
            "verification": verification,
        }))
    }
}

// ============================================================================
// SECTION: Stats and Health
// ============================================================================

/// Handles `GET /v1/stats`.
async fn get_stats(State(state): State<Arc<AppState>>) -> Response {
    let started = Instant::now();
    let worker = Arc::clone(&state);
    let reply = match tokio::task::spawn_blocking(move || worker.stats.snapshot()).await {
        Ok(Ok(stats)) => Reply::ok(StatusCode::OK, json!(stats)),
        Ok(Err(err)) => {
            Reply::error(StatusCode::SERVICE_UNAVAILABLE, "stats_unavailable", err.to_string())
        }
        Err(_) => Reply::error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "stats worker failed",
        ),
    };
    finish(&state, Route::Stats, started, reply)
}

/// Handles `GET /v1/health`.
async fn get_health(State(state): State<Arc<AppState>>) -> Response {
    let started = Instant::now();
    let reply = Reply::ok(
        StatusCode::OK,
        json!({
            "status": "ok",
            "log_mode": state.log_mode.as_str(),
            "signing_key_id": state.signing_key_id,
        }),
    );
    finish(&state, Route::Health, started, reply)
}
