// crates/certus-server/src/remote_signer.rs
// ============================================================================
// Module: Remote Signing Backend
// Description: KMS-style signer reached over HTTP.
// Purpose: Sign bundle digests with a key that never enters this process.
// Dependencies: certus-core, reqwest, base64, ed25519-dalek
// ============================================================================

//! ## Overview
//! [`RemoteSigner`] posts `{key_id, message_b64}` to the configured endpoint
//! and expects `{signature_b64}` back. The public key is pinned in
//! configuration; a returned signature that does not verify under it is
//! refused, so a misrouted or compromised endpoint cannot produce bundles
//! that later fail verification.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64;
use certus_core::KeyId;
use certus_core::SigningBackend;
use certus_core::SigningError;
use certus_core::runtime::key_id_for;
use ed25519_dalek::Signature;
use ed25519_dalek::VerifyingKey;
use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// Sign request body.
#[derive(Debug, Serialize)]
struct SignRequest<'a> {
    /// Key the endpoint should use.
    key_id: &'a str,
    /// Message to sign, base64.
    message_b64: String,
}

/// Sign response body.
#[derive(Debug, Deserialize)]
struct SignResponse {
    /// Raw signature, base64.
    signature_b64: String,
}

// ============================================================================
// SECTION: Signer
// ============================================================================

/// Connection settings for a remote signer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSignerSettings {
    /// Sign endpoint URL.
    pub url: String,
    /// Pinned public key of the remote signing key.
    pub verifying_key: VerifyingKey,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

/// Signing backend that delegates to a remote service.
pub struct RemoteSigner {
    /// Sign endpoint.
    url: Url,
    /// Pinned public key.
    verifying_key: VerifyingKey,
    /// Identifier derived from the pinned key.
    key_id: KeyId,
    /// Blocking HTTP client.
    client: Client,
}

impl RemoteSigner {
    /// Builds a remote signer.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::Backend`] when the URL is malformed or the HTTP
    /// client cannot be built.
    pub fn new(settings: RemoteSignerSettings) -> Result<Self, SigningError> {
        let url = Url::parse(&settings.url)
            .map_err(|_| SigningError::Backend("invalid remote signer url".to_string()))?;
        let client = Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .redirect(Policy::none())
            .build()
            .map_err(|_| SigningError::Backend("http client build failed".to_string()))?;
        Ok(Self {
            url,
            key_id: key_id_for(&settings.verifying_key),
            verifying_key: settings.verifying_key,
            client,
        })
    }
}

impl SigningBackend for RemoteSigner {
    fn key_id(&self) -> KeyId {
        self.key_id.clone()
    }

    fn verifying_key(&self) -> VerifyingKey {
        self.verifying_key
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SigningError> {
        let request = SignRequest {
            key_id: self.key_id.as_str(),
            message_b64: Base64.encode(message),
        };
        let response = self.client.post(self.url.clone()).json(&request).send().map_err(|err| {
            if err.is_timeout() {
                SigningError::KeyUnavailable("remote signer timed out".to_string())
            } else {
                SigningError::KeyUnavailable("remote signer unreachable".to_string())
            }
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(SigningError::Backend(format!("remote signer answered {status}")));
        }
        let body: SignResponse = response
            .json()
            .map_err(|_| SigningError::Backend("remote signer response is malformed".to_string()))?;
        let bytes = Base64
            .decode(body.signature_b64.trim())
            .map_err(|_| SigningError::Backend("remote signature is not base64".to_string()))?;
        let signature = Signature::try_from(bytes.as_slice())
            .map_err(|_| SigningError::Backend("remote signature is malformed".to_string()))?;
        self.verifying_key.verify_strict(message, &signature).map_err(|_| {
            SigningError::Backend("remote signature does not match pinned key".to_string())
        })?;
        Ok(bytes)
    }
}
