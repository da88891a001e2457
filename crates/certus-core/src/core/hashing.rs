// crates/certus-core/src/core/hashing.rs
// ============================================================================
// Module: Certus Canonical Hashing
// Description: RFC 8785 JSON canonicalization and content digests.
// Purpose: Derive stable bundle identifiers and payload digests.
// Dependencies: serde, serde_jcs, sha2
// ============================================================================

//! ## Overview
//! Every content-derived identifier in Certus is a SHA-256 digest over RFC 8785
//! (JCS) canonical JSON. Two values that differ only in map ordering or number
//! spelling hash to the same digest; raw payload bytes are hashed directly.
//!
//! Security posture: digests anchor tamper detection; see
//! `Docs/security/threat_model.md`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

// ============================================================================
// SECTION: Hash Algorithm
// ============================================================================

/// Supported hash algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// SHA-256 hashing.
    Sha256,
}

impl HashAlgorithm {
    /// Returns the stable label stored alongside persisted digests.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
        }
    }

    /// Parses a stored algorithm label.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::UnsupportedAlgorithm`] for unknown labels.
    pub fn parse(label: &str) -> Result<Self, HashError> {
        match label {
            "sha256" => Ok(Self::Sha256),
            other => Err(HashError::UnsupportedAlgorithm(other.to_string())),
        }
    }

    /// Digest length in bytes.
    #[must_use]
    pub const fn digest_len(self) -> usize {
        match self {
            Self::Sha256 => 32,
        }
    }
}

/// Default hash algorithm for Certus.
pub const DEFAULT_HASH_ALGORITHM: HashAlgorithm = HashAlgorithm::Sha256;

// ============================================================================
// SECTION: Hash Digest
// ============================================================================

/// Deterministic content hash representation.
///
/// # Invariants
/// - `value` is lowercase hex of exactly `algorithm.digest_len()` bytes when
///   produced by this module or accepted by [`HashDigest::from_hex`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HashDigest {
    /// Hash algorithm identifier.
    pub algorithm: HashAlgorithm,
    /// Lowercase hex-encoded digest bytes.
    pub value: String,
}

impl HashDigest {
    /// Creates a new digest from raw bytes.
    #[must_use]
    pub fn new(algorithm: HashAlgorithm, bytes: &[u8]) -> Self {
        Self {
            algorithm,
            value: hex_encode(bytes),
        }
    }

    /// Parses an untrusted hex digest string.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::InvalidDigest`] when the string is not lowercase
    /// hex of the expected length.
    pub fn from_hex(algorithm: HashAlgorithm, value: &str) -> Result<Self, HashError> {
        let bytes = hex_decode(value)?;
        if bytes.len() != algorithm.digest_len() {
            return Err(HashError::InvalidDigest(format!(
                "expected {} bytes, got {}",
                algorithm.digest_len(),
                bytes.len()
            )));
        }
        Ok(Self::new(algorithm, &bytes))
    }

    /// Decodes the digest value into raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::InvalidDigest`] when the value is not valid hex.
    pub fn to_bytes(&self) -> Result<Vec<u8>, HashError> {
        hex_decode(&self.value)
    }
}

impl fmt::Display for HashDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm.as_str(), self.value)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when computing or parsing digests.
#[derive(Debug, Error)]
pub enum HashError {
    /// JSON canonicalization failed.
    #[error("failed to canonicalize json: {0}")]
    Canonicalization(String),
    /// Digest text failed to decode.
    #[error("invalid digest: {0}")]
    InvalidDigest(String),
    /// Unknown algorithm label.
    #[error("unsupported hash algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

// ============================================================================
// SECTION: Hashing Helpers
// ============================================================================

/// Returns canonical JSON bytes for a serializable value using RFC 8785.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when serialization fails.
pub fn canonical_json_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, HashError> {
    serde_jcs::to_vec(value).map_err(|err| HashError::Canonicalization(err.to_string()))
}

/// Hashes canonical JSON using the provided algorithm.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when serialization fails.
pub fn hash_canonical_json<T: Serialize + ?Sized>(
    algorithm: HashAlgorithm,
    value: &T,
) -> Result<HashDigest, HashError> {
    let bytes = canonical_json_bytes(value)?;
    Ok(hash_bytes(algorithm, &bytes))
}

/// Hashes raw bytes using the provided algorithm.
#[must_use]
pub fn hash_bytes(algorithm: HashAlgorithm, bytes: &[u8]) -> HashDigest {
    match algorithm {
        HashAlgorithm::Sha256 => HashDigest::new(HashAlgorithm::Sha256, &sha256(bytes)),
    }
}

/// Computes a raw SHA-256 digest.
#[must_use]
pub fn sha256(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

// ============================================================================
// SECTION: Hex Encoding
// ============================================================================

/// Encodes bytes as a lowercase hex string.
#[must_use]
pub fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}

/// Decodes a lowercase hex string.
///
/// # Errors
///
/// Returns [`HashError::InvalidDigest`] on odd length or non-hex characters.
pub fn hex_decode(value: &str) -> Result<Vec<u8>, HashError> {
    if value.len() % 2 != 0 {
        return Err(HashError::InvalidDigest("odd hex length".to_string()));
    }
    value
        .as_bytes()
        .chunks_exact(2)
        .map(|pair| Ok((hex_nibble(pair[0])? << 4) | hex_nibble(pair[1])?))
        .collect()
}

/// Decodes one lowercase hex character.
fn hex_nibble(ch: u8) -> Result<u8, HashError> {
    match ch {
        b'0'..=b'9' => Ok(ch - b'0'),
        b'a'..=b'f' => Ok(ch - b'a' + 10),
        _ => Err(HashError::InvalidDigest(format!("invalid hex character: {}", ch as char))),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
