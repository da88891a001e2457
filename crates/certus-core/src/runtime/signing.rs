// crates/certus-core/src/runtime/signing.rs
// ============================================================================
// Module: Certus Signing
// Description: Local Ed25519 signing, signature checks, and the trusted key ring.
// Purpose: Sign bundle digests and resolve verifying keys across rotations.
// Dependencies: base64, ed25519-dalek, rand
// ============================================================================

//! ## Overview
//! [`Ed25519Signer`] is the local-key [`SigningBackend`]. Key material on disk
//! is either 32 raw bytes or base64 text. A [`KeyRing`] records every key the
//! deployment has trusted together with its validity window, which lets a
//! verifier resolve the key named on an old bundle after rotation.
//!
//! Security posture: key files are sensitive and untrusted inputs; see
//! `Docs/security/threat_model.md`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64;
use ed25519_dalek::Signature;
use ed25519_dalek::Signer;
use ed25519_dalek::SigningKey;
use ed25519_dalek::VerifyingKey;
use rand::rngs::OsRng;

use crate::core::bundle::BundleSignature;
use crate::core::bundle::SignatureScheme;
use crate::core::bundle::signing_message;
use crate::core::hashing::HashDigest;
use crate::core::hashing::hex_encode;
use crate::core::hashing::sha256;
use crate::core::identifiers::KeyId;
use crate::core::time::Timestamp;
use crate::interfaces::SigningBackend;
use crate::interfaces::SigningError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Ed25519 key and seed length in bytes.
const KEY_LENGTH: usize = 32;
/// Maximum key file size accepted from disk.
const MAX_KEY_FILE_BYTES: u64 = 4096;

// ============================================================================
// SECTION: Key Helpers
// ============================================================================

/// Derives the stable key identifier for a public key.
#[must_use]
pub fn key_id_for(key: &VerifyingKey) -> KeyId {
    let digest = hex_encode(&sha256(key.as_bytes()));
    KeyId::new(format!("ed25519:{}", &digest[..16]))
}

/// Decodes 32-byte key material given raw or as base64 text.
///
/// # Errors
///
/// Returns [`SigningError::InvalidKey`] when the material is malformed.
pub fn decode_key_material(bytes: &[u8]) -> Result<[u8; KEY_LENGTH], SigningError> {
    let decoded = if bytes.len() == KEY_LENGTH {
        bytes.to_vec()
    } else {
        let text = std::str::from_utf8(bytes)
            .map_err(|_| SigningError::InvalidKey("key material must be utf-8".to_string()))?;
        Base64
            .decode(text.trim())
            .map_err(|_| SigningError::InvalidKey("invalid base64 key material".to_string()))?
    };
    decoded
        .as_slice()
        .try_into()
        .map_err(|_| SigningError::InvalidKey("ed25519 key material must be 32 bytes".to_string()))
}

/// Parses a base64 Ed25519 public key.
///
/// # Errors
///
/// Returns [`SigningError::InvalidKey`] when the key is malformed.
pub fn parse_public_key(text: &str) -> Result<VerifyingKey, SigningError> {
    let bytes = decode_key_material(text.as_bytes())?;
    VerifyingKey::from_bytes(&bytes)
        .map_err(|_| SigningError::InvalidKey("invalid ed25519 public key".to_string()))
}

/// Encodes a public key as base64 text.
#[must_use]
pub fn encode_public_key(key: &VerifyingKey) -> String {
    Base64.encode(key.as_bytes())
}

/// Checks a bundle signature against the bundle digest.
#[must_use]
pub fn signature_matches(
    key: &VerifyingKey,
    bundle_digest: &HashDigest,
    signature: &BundleSignature,
) -> bool {
    if signature.scheme != SignatureScheme::Ed25519 {
        return false;
    }
    let Ok(message) = signing_message(bundle_digest) else {
        return false;
    };
    let Ok(bytes) = signature.bytes() else {
        return false;
    };
    let Ok(parsed) = Signature::try_from(bytes.as_slice()) else {
        return false;
    };
    key.verify_strict(&message, &parsed).is_ok()
}

// ============================================================================
// SECTION: Local Signer
// ============================================================================

/// Ed25519 signer holding key material in process memory.
pub struct Ed25519Signer {
    /// Private signing key.
    key: SigningKey,
    /// Derived key identifier.
    key_id: KeyId,
}

impl Ed25519Signer {
    /// Builds a signer from a 32-byte seed.
    #[must_use]
    pub fn from_seed(seed: &[u8; KEY_LENGTH]) -> Self {
        let key = SigningKey::from_bytes(seed);
        let key_id = key_id_for(&key.verifying_key());
        Self {
            key,
            key_id,
        }
    }

    /// Generates a fresh key from the operating system RNG.
    #[must_use]
    pub fn generate() -> Self {
        let key = SigningKey::generate(&mut OsRng);
        let key_id = key_id_for(&key.verifying_key());
        Self {
            key,
            key_id,
        }
    }

    /// Loads a signer from a key file holding a raw or base64 seed.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError`] when the file is unreadable or malformed.
    pub fn from_key_file(path: &Path) -> Result<Self, SigningError> {
        let metadata = fs::metadata(path)
            .map_err(|err| SigningError::KeyUnavailable(format!("{}: {err}", path.display())))?;
        if metadata.len() > MAX_KEY_FILE_BYTES {
            return Err(SigningError::InvalidKey("key file exceeds size limit".to_string()));
        }
        let bytes = fs::read(path)
            .map_err(|err| SigningError::KeyUnavailable(format!("{}: {err}", path.display())))?;
        let seed = decode_key_material(&bytes)?;
        Ok(Self::from_seed(&seed))
    }

    /// Returns the seed as base64 text for writing key files.
    #[must_use]
    pub fn seed_base64(&self) -> String {
        Base64.encode(self.key.to_bytes())
    }
}

impl SigningBackend for Ed25519Signer {
    fn key_id(&self) -> KeyId {
        self.key_id.clone()
    }

    fn verifying_key(&self) -> VerifyingKey {
        self.key.verifying_key()
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SigningError> {
        Ok(self.key.sign(message).to_bytes().to_vec())
    }
}

/// Shared signing backend backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedSigningBackend {
    /// Inner backend implementation.
    inner: Arc<dyn SigningBackend + Send + Sync>,
}

impl SharedSigningBackend {
    /// Wraps a signing backend in a shared, clonable wrapper.
    #[must_use]
    pub fn from_backend(backend: impl SigningBackend + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(backend),
        }
    }

    /// Wraps an existing shared backend.
    #[must_use]
    pub const fn new(backend: Arc<dyn SigningBackend + Send + Sync>) -> Self {
        Self {
            inner: backend,
        }
    }
}

impl SigningBackend for SharedSigningBackend {
    fn key_id(&self) -> KeyId {
        self.inner.key_id()
    }

    fn verifying_key(&self) -> VerifyingKey {
        self.inner.verifying_key()
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SigningError> {
        self.inner.sign(message)
    }
}

// ============================================================================
// SECTION: Key Ring
// ============================================================================

/// Verifying key trusted for a validity window.
///
/// # Invariants
/// - `not_before <= not_after` when both are set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedKey {
    /// Key identifier derived from the public key.
    pub key_id: KeyId,
    /// Public key.
    pub verifying_key: VerifyingKey,
    /// First instant the key may have signed.
    pub not_before: Option<Timestamp>,
    /// Last instant the key may have signed.
    pub not_after: Option<Timestamp>,
}

impl TrustedKey {
    /// Trusts `verifying_key` without a window.
    #[must_use]
    pub fn unbounded(verifying_key: VerifyingKey) -> Self {
        Self {
            key_id: key_id_for(&verifying_key),
            verifying_key,
            not_before: None,
            not_after: None,
        }
    }

    /// Trusts `verifying_key` within a window.
    #[must_use]
    pub fn windowed(
        verifying_key: VerifyingKey,
        not_before: Option<Timestamp>,
        not_after: Option<Timestamp>,
    ) -> Self {
        Self {
            key_id: key_id_for(&verifying_key),
            verifying_key,
            not_before,
            not_after,
        }
    }

    /// Returns true when `at` falls inside the window.
    #[must_use]
    pub fn valid_at(&self, at: Timestamp) -> bool {
        self.not_before.is_none_or(|start| at >= start)
            && self.not_after.is_none_or(|end| at <= end)
    }
}

/// Outcome of resolving a key identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyResolution<'a> {
    /// Key known and valid at the requested time.
    Valid(&'a VerifyingKey),
    /// Key known but outside its validity window.
    OutsideWindow(&'a VerifyingKey),
    /// Key not in the ring.
    Unknown,
}

/// Rotation history of trusted verifying keys.
#[derive(Debug, Clone, Default)]
pub struct KeyRing {
    /// Trusted keys by identifier.
    keys: BTreeMap<KeyId, TrustedKey>,
}

impl KeyRing {
    /// Creates an empty key ring.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a trusted key.
    pub fn insert(&mut self, key: TrustedKey) {
        self.keys.insert(key.key_id.clone(), key);
    }

    /// Adds a key only when its identifier is not yet present.
    pub fn insert_if_absent(&mut self, key: TrustedKey) {
        self.keys.entry(key.key_id.clone()).or_insert(key);
    }

    /// Resolves `key_id` for a signature made at `at`.
    #[must_use]
    pub fn resolve(&self, key_id: &KeyId, at: Timestamp) -> KeyResolution<'_> {
        match self.keys.get(key_id) {
            Some(key) if key.valid_at(at) => KeyResolution::Valid(&key.verifying_key),
            Some(key) => KeyResolution::OutsideWindow(&key.verifying_key),
            None => KeyResolution::Unknown,
        }
    }

    /// Returns the number of trusted keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true when no keys are trusted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
