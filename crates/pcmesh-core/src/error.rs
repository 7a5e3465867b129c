//! Error types for the pcmesh core.

/// Core error type for pcmesh infrastructure.
#[derive(Debug, thiserror::Error)]
pub enum PcMeshError {
    /// Cloud identifier is empty or whitespace only.
    #[error("invalid cloud id: {0:?} (must not be blank)")]
    InvalidCloudId(String),

    /// A master key could not be decoded.
    #[error("invalid master key for cloud {cloud_id}: {reason}")]
    InvalidKey {
        /// Cloud the key was configured for.
        cloud_id: String,
        /// Why decoding failed.
        reason: String,
    },

    /// Unknown digest algorithm name.
    #[error("unknown digest algorithm: {0} (expected xxhash64 or hmac-sha256)")]
    UnknownDigestAlgorithm(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal error with context.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Convenience result type for pcmesh operations.
pub type PcMeshResult<T> = Result<T, PcMeshError>;
