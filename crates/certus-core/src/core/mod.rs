// crates/certus-core/src/core/mod.rs
// ============================================================================
// Module: Certus Core Types
// Description: Canonical decision, bundle, and log record structures.
// Purpose: Provide stable, serializable types for the evidence pipeline.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Core types define decisions, evidence bundles, log receipts, and the
//! canonical hashing that derives their identifiers. These types are the
//! source of truth for the HTTP surface and the durable stores.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod bundle;
pub mod decision;
pub mod hashing;
pub mod identifiers;
pub mod lifecycle;
pub mod log;
pub mod merkle;
pub mod outcome;
pub mod payload;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use bundle::BUNDLE_FORMAT_VERSION;
pub use bundle::BundleContent;
pub use bundle::BundleRef;
pub use bundle::BundleSignature;
pub use bundle::EvidenceBundle;
pub use bundle::SignatureScheme;
pub use bundle::signing_message;
pub use decision::CheckedDraft;
pub use decision::DecisionDraft;
pub use decision::DecisionKind;
pub use decision::IntegrityDecision;
pub use decision::PolicyMode;
pub use decision::ValidationError;
pub use decision::Verdict;
pub use hashing::DEFAULT_HASH_ALGORITHM;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use hashing::HashError;
pub use identifiers::BundleId;
pub use identifiers::KeyId;
pub use identifiers::LogId;
pub use identifiers::Subject;
pub use lifecycle::DecisionLifecycle;
pub use lifecycle::LifecycleError;
pub use lifecycle::LifecycleState;
pub use log::LogEntryRef;
pub use log::LogLeaf;
pub use log::LogReceipt;
pub use log::LogStatus;
pub use merkle::InclusionProof;
pub use merkle::ProofDirection;
pub use merkle::ProofStep;
pub use outcome::OutcomeEvent;
pub use outcome::PolicyOutcome;
pub use payload::CanonicalPayload;
pub use time::Timestamp;
pub use time::TimestampError;
pub use time::TimestampInput;
