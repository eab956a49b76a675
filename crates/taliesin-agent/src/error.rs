//! Error types for the agent crate.
//!
//! [`AgentError`] is the single failure type that crosses the
//! StreamPublisher boundary. Every variant maps onto an [`ErrorKind`] for
//! the client-facing `error` event, and [`AgentError::user_message`]
//! produces the user-safe description; raw upstream error bodies stay in
//! the logs and never reach the stream.

use thiserror::Error;

use taliesin_llm::CompletionError;
use taliesin_stream::ErrorKind;
use taliesin_summarize::SummarizeError;

/// Result type alias using the agent error type.
pub type Result<T> = std::result::Result<T, AgentError>;

// ─────────────────────────────────────────────────────────────────────────────
// Data Source Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Error type for data-source lookups.
#[derive(Debug, Clone, Error)]
pub enum DataSourceError {
    /// The source rejected the caller's credentials.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// The requested entity does not exist in the source.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The source failed upstream.
    #[error("Upstream error: {0}")]
    Upstream(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// Agent Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Error type for tool invocations and the request runner.
#[derive(Debug, Error)]
pub enum AgentError {
    /// A completion-service call failed.
    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    /// Summarization of fetched content failed.
    #[error("Summarization error: {0}")]
    Summarize(#[from] SummarizeError),

    /// A data-source lookup failed.
    #[error("Data source error: {0}")]
    DataSource(#[from] DataSourceError),

    /// The reasoning loop's output could not be interpreted.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A tool was requested that is not registered.
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AgentError {
    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Classify this failure for the client-facing `error` event.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Completion(_) => ErrorKind::CompletionFailure,
            Self::Summarize(SummarizeError::Completion(_)) => ErrorKind::CompletionFailure,
            Self::Summarize(SummarizeError::Cancelled) => ErrorKind::InternalFailure,
            Self::DataSource(_) => ErrorKind::DataSourceFailure,
            Self::Parse(_) => ErrorKind::ParseFailure,
            Self::ToolNotFound(_) | Self::Internal(_) => ErrorKind::InternalFailure,
        }
    }

    /// User-safe description for the client-facing `error` event.
    ///
    /// Deliberately canned per failure class; the full error stays in the
    /// server logs.
    pub fn user_message(&self) -> String {
        let message = match self {
            Self::Completion(e) | Self::Summarize(SummarizeError::Completion(e)) => match e {
                CompletionError::RateLimited(_) => {
                    "The completion service is currently rate limiting requests"
                }
                CompletionError::Timeout(_) => "A completion call timed out",
                _ => "The completion service is unavailable",
            },
            Self::Summarize(SummarizeError::Cancelled) => "The request was cancelled",
            Self::DataSource(DataSourceError::AccessDenied(_)) => {
                "Access to the data source was denied"
            }
            Self::DataSource(DataSourceError::NotFound(_)) => {
                "The requested data could not be found"
            }
            Self::DataSource(DataSourceError::Upstream(_)) => {
                "The data source failed to answer the query"
            }
            Self::Parse(_) => "The agent failed to interpret intermediate results",
            Self::ToolNotFound(_) | Self::Internal(_) => {
                "Something went wrong while processing your message"
            }
        };
        message.to_string()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        let err: AgentError = CompletionError::rate_limited("429").into();
        assert_eq!(err.kind(), ErrorKind::CompletionFailure);

        let err: AgentError = SummarizeError::Completion(CompletionError::timeout("t")).into();
        assert_eq!(err.kind(), ErrorKind::CompletionFailure);

        let err: AgentError = DataSourceError::AccessDenied("key expired".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::DataSourceFailure);

        assert_eq!(AgentError::parse("garbage").kind(), ErrorKind::ParseFailure);
        assert_eq!(
            AgentError::internal("oops").kind(),
            ErrorKind::InternalFailure
        );
        assert_eq!(
            AgentError::ToolNotFound("nope".to_string()).kind(),
            ErrorKind::InternalFailure
        );
    }

    #[test]
    fn test_user_message_never_leaks_upstream_detail() {
        let secret = "api key sk-12345 rejected by upstream";
        let err: AgentError = DataSourceError::AccessDenied(secret.to_string()).into();
        assert!(!err.user_message().contains("sk-12345"));

        let err: AgentError = CompletionError::unavailable(secret).into();
        assert!(!err.user_message().contains("sk-12345"));
    }

    #[test]
    fn test_user_message_distinguishes_completion_failures() {
        let rate: AgentError = CompletionError::rate_limited("x").into();
        let timeout: AgentError = CompletionError::timeout("x").into();
        assert_ne!(rate.user_message(), timeout.user_message());
    }
}
