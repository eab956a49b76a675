//! Error types for the completion-client crate.

use thiserror::Error;

/// Result type alias using the completion error type.
pub type Result<T> = std::result::Result<T, CompletionError>;

/// Error type for completion-service operations.
///
/// The first three variants are the transient/permanent failure modes a
/// completion service exposes; the core never retries them (retry policy, if
/// any, belongs to the service itself).
#[derive(Debug, Clone, Error)]
pub enum CompletionError {
    /// The service rejected the request due to rate limiting.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// The request did not complete in time.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// The service is unreachable or returned a server-side failure.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// The request was malformed or rejected by the provider.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration error (missing API key, bad base URL, etc.).
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CompletionError {
    /// Create a rate-limit error.
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a timeout error.
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create an unavailable error.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Returns true for failures that could succeed on a later attempt.
    ///
    /// The core itself never retries; callers that sit in front of the core
    /// can use this to decide whether a retry is even meaningful.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited(_) | Self::Timeout(_) | Self::Unavailable(_)
        )
    }
}
