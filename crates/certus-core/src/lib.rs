// crates/certus-core/src/lib.rs
// ============================================================================
// Module: Certus Core Library
// Description: Public API surface for the Certus evidence pipeline.
// Purpose: Expose core types, interfaces, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Certus core converts scan, evaluation, and guardrail decisions into signed,
//! content-addressed evidence bundles recorded in a transparency log, and
//! verifies those bundles later from the store alone. It is backend-agnostic:
//! signers, logs, and stores plug in through [`interfaces`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use interfaces::Clock;
pub use interfaces::EvidenceStore;
pub use interfaces::LogError;
pub use interfaces::NoopOutcomeSink;
pub use interfaces::OutcomeSink;
pub use interfaces::PayloadStore;
pub use interfaces::PutOutcome;
pub use interfaces::SigningBackend;
pub use interfaces::SigningError;
pub use interfaces::StoreError;
pub use interfaces::TransparencyLog;
pub use runtime::CancelSignal;
pub use runtime::IntegrityBridge;
pub use runtime::IntegrityService;
pub use runtime::LogMode;
pub use runtime::SubmitError;
pub use runtime::TrustService;
pub use runtime::VerificationResult;
pub use runtime::Verifier;
pub use runtime::VerifyError;
