//! Error types for the summarization crate.

use thiserror::Error;

use taliesin_llm::CompletionError;

/// Result type alias using the summarization error type.
pub type Result<T> = std::result::Result<T, SummarizeError>;

/// Error type for summarization operations.
#[derive(Debug, Error)]
pub enum SummarizeError {
    /// A completion call failed. Any map-stage or combine-stage failure
    /// fails the whole summarization; partial summaries are never returned.
    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    /// The operation was cancelled before it finished.
    #[error("Summarization cancelled")]
    Cancelled,
}
