// crates/certus-core/src/core/time.rs
// ============================================================================
// Module: Certus Time Model
// Description: Canonical timestamp values for decisions and bundles.
// Purpose: Provide a stable, integer wire form that never jitters under hashing.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Timestamps are unix epoch milliseconds. They serialize as plain integers so
//! canonical hashing is stable. Producers may supply RFC 3339 text, which is
//! converted once at the boundary by [`TimestampInput`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Time Values
// ============================================================================

/// Canonical timestamp in unix epoch milliseconds.
///
/// # Invariants
/// - Immutable once attached to a decision; the core never rewrites it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from unix milliseconds.
    #[must_use]
    pub const fn from_unix_millis(value: i64) -> Self {
        Self(value)
    }

    /// Returns the timestamp as unix milliseconds.
    #[must_use]
    pub const fn as_unix_millis(self) -> i64 {
        self.0
    }

    /// Parses RFC 3339 text into a timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError`] when the text is not RFC 3339 or is out of
    /// range for millisecond precision.
    pub fn parse_rfc3339(value: &str) -> Result<Self, TimestampError> {
        let parsed = OffsetDateTime::parse(value, &Rfc3339)
            .map_err(|err| TimestampError(err.to_string()))?;
        let millis = parsed.unix_timestamp_nanos() / 1_000_000;
        i64::try_from(millis)
            .map(Self)
            .map_err(|_| TimestampError("timestamp out of range".to_string()))
    }

    /// Formats the timestamp as RFC 3339 (UTC).
    #[must_use]
    pub fn to_rfc3339(self) -> Option<String> {
        let nanos = i128::from(self.0) * 1_000_000;
        OffsetDateTime::from_unix_timestamp_nanos(nanos).ok()?.format(&Rfc3339).ok()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Timestamp parse failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid timestamp: {0}")]
pub struct TimestampError(pub String);

/// Producer-supplied timestamp in either accepted wire form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimestampInput {
    /// Unix epoch milliseconds.
    UnixMillis(i64),
    /// RFC 3339 text.
    Rfc3339(String),
}

impl TimestampInput {
    /// Resolves the input into a canonical timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError`] when RFC 3339 text fails to parse.
    pub fn resolve(&self) -> Result<Timestamp, TimestampError> {
        match self {
            Self::UnixMillis(value) => Ok(Timestamp::from_unix_millis(*value)),
            Self::Rfc3339(text) => Timestamp::parse_rfc3339(text),
        }
    }
}

impl From<Timestamp> for TimestampInput {
    fn from(value: Timestamp) -> Self {
        Self::UnixMillis(value.as_unix_millis())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions.")]

    use super::*;

    #[test]
    fn rfc3339_and_millis_agree() {
        let parsed = Timestamp::parse_rfc3339("2026-01-02T03:04:05.678Z").unwrap();
        assert_eq!(parsed.as_unix_millis(), 1_767_323_045_678);
        assert_eq!(
            TimestampInput::UnixMillis(1_767_323_045_678).resolve().unwrap(),
            parsed
        );
    }

    #[test]
    fn rejects_free_text() {
        assert!(TimestampInput::Rfc3339("yesterday".to_string()).resolve().is_err());
    }
}
