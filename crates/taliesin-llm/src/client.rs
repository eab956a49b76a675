//! The completion-client seam.
//!
//! [`CompletionClient`] is the only interface the rest of the system has to
//! a completion service: one prompt in, one text out. Implementations decide
//! transport, authentication and retry policy; the core treats every failure
//! as final.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{CompletionError, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Completion Client Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Trait for completion-service providers.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Issue one completion call against `model` and return its text.
    async fn complete(&self, model: &str, prompt: &str) -> Result<String>;

    /// Get the name of this client.
    fn name(&self) -> &str;
}

/// A completion client that can be shared across tasks.
pub type SharedCompletionClient = Arc<dyn CompletionClient>;

// ─────────────────────────────────────────────────────────────────────────────
// Mock Client
// ─────────────────────────────────────────────────────────────────────────────

/// A recorded completion request.
#[derive(Debug, Clone)]
pub struct CompletionRecord {
    /// The model identifier the call was made against.
    pub model: String,
    /// The full rendered prompt.
    pub prompt: String,
}

/// One scripted mock response: a result plus an optional artificial delay.
#[derive(Debug, Clone)]
pub struct ScriptedCompletion {
    result: std::result::Result<String, CompletionError>,
    delay: Option<Duration>,
}

impl ScriptedCompletion {
    /// A response that succeeds with `text`.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            result: Ok(text.into()),
            delay: None,
        }
    }

    /// A response that fails with `error`.
    pub fn error(error: CompletionError) -> Self {
        Self {
            result: Err(error),
            delay: None,
        }
    }

    /// A response that succeeds with `text` after sleeping for `delay`.
    ///
    /// Used to make concurrently dispatched calls resolve out of order.
    pub fn text_after(text: impl Into<String>, delay: Duration) -> Self {
        Self {
            result: Ok(text.into()),
            delay: Some(delay),
        }
    }
}

/// A mock completion client for testing.
///
/// Responses are returned in script order and every request is logged. When
/// the script runs dry the client either repeats a fallback text (if one was
/// configured) or fails.
#[derive(Debug)]
pub struct MockCompletion {
    name: String,
    script: Mutex<Vec<ScriptedCompletion>>,
    fallback: Option<String>,
    requests: Mutex<Vec<CompletionRecord>>,
}

impl MockCompletion {
    /// Create a mock with the given scripted responses.
    pub fn new(script: Vec<ScriptedCompletion>) -> Self {
        Self {
            name: "mock".to_string(),
            script: Mutex::new(script),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock with a single text response.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self::new(vec![ScriptedCompletion::text(text)])
    }

    /// Create a mock that answers every call with the same text.
    pub fn repeating(text: impl Into<String>) -> Self {
        let mut mock = Self::new(Vec::new());
        mock.fallback = Some(text.into());
        mock
    }

    /// Get all requests made against this client, in call order.
    pub fn requests(&self) -> Vec<CompletionRecord> {
        self.requests.lock().clone()
    }

    /// Get the number of requests made.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl CompletionClient for MockCompletion {
    async fn complete(&self, model: &str, prompt: &str) -> Result<String> {
        self.requests.lock().push(CompletionRecord {
            model: model.to_string(),
            prompt: prompt.to_string(),
        });

        let next = {
            let mut script = self.script.lock();
            if script.is_empty() {
                None
            } else {
                Some(script.remove(0))
            }
        };

        match next {
            Some(scripted) => {
                if let Some(delay) = scripted.delay {
                    tokio::time::sleep(delay).await;
                }
                scripted.result
            }
            None => match &self.fallback {
                Some(text) => Ok(text.clone()),
                None => Err(CompletionError::unavailable(
                    "MockCompletion: no scripted responses left",
                )),
            },
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
