// crates/certus-server/src/lib.rs
// ============================================================================
// Module: Certus Server
// Description: HTTP evidence service over the Certus runtime.
// Purpose: Accept decisions, serve evidence, and assemble backends from config.
// Dependencies: certus-core, certus-config, certus-store-sqlite, axum, reqwest
// ============================================================================

//! ## Overview
//! Certus Server wires configured backends into an
//! [`certus_core::IntegrityBridge`] and exposes it over HTTP. Decision
//! submissions and evidence verification run on blocking worker threads so
//! the store step of a signed submission is never cut short by a dropped
//! client. Security posture: request bodies are untrusted and size-limited;
//! see `Docs/security/threat_model.md`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod assembly;
pub mod audit;
pub mod remote_signer;
pub mod server;
pub mod telemetry;
pub mod tlog_client;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use assembly::Backends;
pub use assembly::ServiceBackends;
pub use assembly::ServiceBridge;
pub use assembly::ServiceVerifier;
pub use audit::AuditSink;
pub use audit::DecisionAuditEvent;
pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use remote_signer::RemoteSigner;
pub use remote_signer::RemoteSignerSettings;
pub use server::CertusServer;
pub use server::ServerError;
pub use telemetry::LATENCY_BUCKETS_MS;
pub use telemetry::NoopMetrics;
pub use telemetry::RequestOutcome;
pub use telemetry::Route;
pub use telemetry::RouteMetricEvent;
pub use telemetry::ServerMetrics;
pub use tlog_client::HttpTransparencyLog;
pub use tlog_client::HttpTransparencyLogSettings;
