// crates/certus-server/src/tlog_client.rs
// ============================================================================
// Module: HTTP Transparency Log Client
// Description: Blocking HTTP client implementing the transparency log trait.
// Purpose: Append bundle leaves to a remote log and fetch inclusion proofs.
// Dependencies: certus-core, reqwest, serde_json
// ============================================================================

//! ## Overview
//! [`HttpTransparencyLog`] speaks a two-endpoint JSON protocol:
//! - `POST {base}/v1/log/entries` with a [`LogLeaf`] body returns a
//!   [`LogReceipt`].
//! - `GET {base}/v1/log/entries/{leaf_index}/proof` returns a fresh
//!   [`LogReceipt`].
//!
//! Transport failures, timeouts, and 5xx answers map to
//! [`LogError::Unavailable`] so the bridge may retry or fall back to a mock
//! reference. 4xx answers on append are deterministic refusals. A receipt
//! whose leaf hash does not match the submitted leaf is refused locally.
//!
//! Security posture: the log is remote and untrusted; response bodies are
//! size-limited and every receipt is re-checked by the verifier.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::time::Duration;

use certus_core::LogError;
use certus_core::LogId;
use certus_core::LogLeaf;
use certus_core::LogReceipt;
use certus_core::TransparencyLog;
use reqwest::StatusCode;
use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::blocking::Response;
use reqwest::redirect::Policy;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum receipt body accepted from the log.
const MAX_RECEIPT_BYTES: u64 = 1024 * 1024;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Connection settings for an HTTP transparency log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpTransparencyLogSettings {
    /// Base URL of the log service.
    pub base_url: String,
    /// Identifier of the log.
    pub log_id: LogId,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

/// Transparency log reached over HTTP.
pub struct HttpTransparencyLog {
    /// Log identifier.
    log_id: LogId,
    /// Append endpoint.
    entries_url: Url,
    /// Blocking HTTP client.
    client: Client,
}

impl HttpTransparencyLog {
    /// Builds a client for the configured log.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Rejected`] when the URL is malformed or the HTTP
    /// client cannot be built.
    pub fn new(settings: HttpTransparencyLogSettings) -> Result<Self, LogError> {
        let mut base = Url::parse(&settings.base_url)
            .map_err(|_| LogError::Rejected("invalid transparency log url".to_string()))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let entries_url = base
            .join("v1/log/entries")
            .map_err(|_| LogError::Rejected("invalid transparency log url".to_string()))?;
        let client = Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .redirect(Policy::none())
            .build()
            .map_err(|_| LogError::Rejected("http client build failed".to_string()))?;
        Ok(Self {
            log_id: settings.log_id,
            entries_url,
            client,
        })
    }

    /// Returns the proof endpoint for a leaf.
    fn proof_url(&self, leaf_index: u64) -> Url {
        let path = format!("{}/{leaf_index}/proof", self.entries_url.path());
        let mut url = self.entries_url.clone();
        url.set_path(&path);
        url
    }
}

impl TransparencyLog for HttpTransparencyLog {
    fn log_id(&self) -> LogId {
        self.log_id.clone()
    }

    fn append(&self, leaf: &LogLeaf) -> Result<LogReceipt, LogError> {
        let expected = leaf
            .leaf_digest()
            .map_err(|err| LogError::Rejected(format!("leaf encoding failed: {err}")))?;
        let response = self
            .client
            .post(self.entries_url.clone())
            .json(leaf)
            .send()
            .map_err(|err| LogError::Unavailable(transport_message(&err)))?;
        let status = response.status();
        if status.is_server_error() {
            return Err(LogError::Unavailable(format!("log answered {status}")));
        }
        if !status.is_success() {
            return Err(LogError::Rejected(format!("log answered {status}")));
        }
        let receipt = read_receipt(response)?;
        if receipt.leaf_hash != expected {
            return Err(LogError::Rejected("receipt leaf hash mismatch".to_string()));
        }
        Ok(receipt)
    }

    fn inclusion_proof(&self, leaf_index: u64) -> Result<LogReceipt, LogError> {
        let response = self
            .client
            .get(self.proof_url(leaf_index))
            .send()
            .map_err(|err| LogError::Unavailable(transport_message(&err)))?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(LogError::NotFound(format!("leaf {leaf_index}"))),
            status if status.is_success() => read_receipt(response),
            status => Err(LogError::Unavailable(format!("log answered {status}"))),
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Describes a transport failure without echoing the URL.
fn transport_message(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "log request timed out".to_string()
    } else if err.is_connect() {
        "log connection failed".to_string()
    } else {
        "log request failed".to_string()
    }
}

/// Reads and decodes a size-limited receipt body.
fn read_receipt(response: Response) -> Result<LogReceipt, LogError> {
    if response.content_length().is_some_and(|length| length > MAX_RECEIPT_BYTES) {
        return Err(LogError::Rejected("log receipt exceeds size limit".to_string()));
    }
    let mut body = Vec::new();
    response
        .take(MAX_RECEIPT_BYTES + 1)
        .read_to_end(&mut body)
        .map_err(|_| LogError::Unavailable("failed to read log response".to_string()))?;
    if u64::try_from(body.len()).unwrap_or(u64::MAX) > MAX_RECEIPT_BYTES {
        return Err(LogError::Rejected("log receipt exceeds size limit".to_string()));
    }
    serde_json::from_slice(&body)
        .map_err(|_| LogError::Rejected("log receipt is malformed".to_string()))
}
