//! Stream event types.
//!
//! A [`StreamEvent`] is one unit of progress, result or error information
//! delivered to a client over the request's ordered channel. The
//! `end_of_stream` variant is the terminal sentinel: a client can rely on
//! every stream ending with exactly one of them.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Error Kinds
// ─────────────────────────────────────────────────────────────────────────────

/// Failure taxonomy carried on `error` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A completion-service call failed (rate limit, timeout, unavailable).
    CompletionFailure,
    /// A data-source lookup failed (access denied, not found, upstream).
    DataSourceFailure,
    /// The reasoning loop's output could not be interpreted.
    ParseFailure,
    /// Catch-all for everything else.
    InternalFailure,
}

impl ErrorKind {
    /// Get the wire name for this kind.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::CompletionFailure => "completion_failure",
            ErrorKind::DataSourceFailure => "data_source_failure",
            ErrorKind::ParseFailure => "parse_failure",
            ErrorKind::InternalFailure => "internal_failure",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Stream Event
// ─────────────────────────────────────────────────────────────────────────────

/// An event on a request's client-facing stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A tool invocation is starting.
    ToolInit {
        /// Human-readable label, e.g. "Using market data tool...".
        message: String,
    },
    /// A tool finished; carries its raw structured result for UI rendering.
    ToolOutput {
        /// The tool's structured payload.
        payload: serde_json::Value,
    },
    /// The top-level reasoning loop produced its final answer.
    AgentOutput {
        /// The answer text.
        message: String,
    },
    /// A producer failed; the stream terminates right after this.
    Error {
        /// Failure classification.
        kind: ErrorKind,
        /// User-safe description. Raw upstream error bodies never appear here.
        description: String,
    },
    /// Terminal sentinel. Always the last event of a stream.
    EndOfStream,
}

impl StreamEvent {
    /// Create a tool-init event.
    pub fn tool_init(message: impl Into<String>) -> Self {
        Self::ToolInit {
            message: message.into(),
        }
    }

    /// Create a tool-output event.
    pub fn tool_output(payload: serde_json::Value) -> Self {
        Self::ToolOutput { payload }
    }

    /// Create an agent-output event.
    pub fn agent_output(message: impl Into<String>) -> Self {
        Self::AgentOutput {
            message: message.into(),
        }
    }

    /// Create an error event.
    pub fn error(kind: ErrorKind, description: impl Into<String>) -> Self {
        Self::Error {
            kind,
            description: description.into(),
        }
    }

    /// Returns true if this is the terminal sentinel.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::EndOfStream)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
