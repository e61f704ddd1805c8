//! Error types for the embedding gateway.

/// Result type for embedding operations.
pub type Result<T> = std::result::Result<T, EmbedError>;

/// Errors from the embedding gateway.
///
/// Transport-level failures and remote API rejections are kept as separate
/// variants so callers can distinguish "the network/quota is unhappy" from
/// "the service answered but the answer is unusable". Both mean the
/// embedding capability is unavailable for this call.
#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    /// The gateway configuration is unusable (empty endpoint, zero
    /// dimension, and so on).
    #[error("invalid embedding configuration: {message}")]
    InvalidConfig { message: String },

    /// The HTTP request itself failed: connection refused, timeout, TLS.
    #[error("embedding request failed: {source}")]
    Http {
        #[from]
        source: reqwest::Error,
    },

    /// The remote service answered with an error status or a malformed or
    /// inconsistent payload (wrong vector count, wrong dimension).
    #[error("embedding service error: {message}")]
    Api { message: String },
}

impl EmbedError {
    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }
}
