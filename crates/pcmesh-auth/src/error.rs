//! Error types for request authentication.
//!
//! Every failure is represented by [`AuthError`] so it can be logged with its
//! cause. Callers outside this crate see only the uniform rejection produced by
//! [`AuthOutcome`](crate::principal::AuthOutcome); the variant never reaches the
//! remote peer.

use http::HeaderName;

/// Reasons a request fails authentication.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// A required header is absent or blank.
    #[error("Missing required header: {0}")]
    MissingField(HeaderName),

    /// A header is present but does not parse as its expected type.
    #[error("Malformed header {header}: expected {expected}")]
    MalformedField {
        /// Header name.
        header: HeaderName,
        /// Expected value type.
        expected: &'static str,
    },

    /// The sender's protocol version is below the accepted minimum.
    #[error("Protocol version {version} is below the minimum {minimum}")]
    VersionTooOld {
        /// Version sent by the peer.
        version: i32,
        /// Lowest version accepted.
        minimum: i32,
    },

    /// The cloud id does not resolve to a known key.
    #[error("Unknown cloud: {0}")]
    UnknownCloud(String),

    /// The request URL is absent or is not an absolute URL, so no digest can
    /// be computed.
    #[error("Request URL is missing or not absolute")]
    UnsignableUrl,

    /// The recomputed digest differs from the supplied one.
    #[error("Digest does not match")]
    DigestMismatch,

    /// The timestamp lies outside the configured freshness window.
    #[error("Timestamp {timestamp} is more than {max_skew_ms} ms away from local time")]
    StaleTimestamp {
        /// Timestamp sent by the peer.
        timestamp: i64,
        /// Allowed distance from the local clock.
        max_skew_ms: u64,
    },
}

impl AuthError {
    /// Short stable label for structured logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingField(_) => "missing_field",
            Self::MalformedField { .. } => "malformed_field",
            Self::VersionTooOld { .. } => "version_too_old",
            Self::UnknownCloud(_) => "unknown_cloud",
            Self::UnsignableUrl => "unsignable_url",
            Self::DigestMismatch => "digest_mismatch",
            Self::StaleTimestamp { .. } => "stale_timestamp",
        }
    }
}
