//! Tool framework.
//!
//! A [`Tool`] wraps one external capability (a search index, a market-data
//! API) behind a uniform JSON-parameter interface so the reasoning loop can
//! invoke it by name. Tools return a [`ToolOutcome`]: the raw structured
//! payload destined for the client stream plus the text handed back to the
//! reasoning loop; the two are independent.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::error::{AgentError, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Parameter Extraction
// ─────────────────────────────────────────────────────────────────────────────

/// Helper trait for extracting tool parameters from JSON.
pub trait ParamExt {
    /// Get a required string parameter.
    fn required_str(&self, name: &'static str) -> Result<&str>;

    /// Get an optional string parameter.
    fn optional_str(&self, name: &str) -> Option<&str>;

    /// Get an optional array-of-strings parameter; absent means empty.
    fn optional_str_array(&self, name: &str) -> Vec<String>;
}

impl ParamExt for serde_json::Value {
    fn required_str(&self, name: &'static str) -> Result<&str> {
        self.get(name).and_then(|v| v.as_str()).ok_or_else(|| {
            AgentError::parse(format!("missing required tool parameter '{name}'"))
        })
    }

    fn optional_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.as_str())
    }

    fn optional_str_array(&self, name: &str) -> Vec<String> {
        self.get(name)
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_str())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tool Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Per-invocation context handed to a tool.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    /// The requesting client's timezone, if known.
    pub timezone: Option<String>,
    /// Cancellation signal for the owning request.
    pub cancellation: CancellationToken,
}

impl ToolContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the timezone.
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    /// Set the cancellation token.
    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }
}

/// What a successful tool invocation produces.
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    /// Raw structured result, published to the client stream for rendering.
    pub payload: serde_json::Value,
    /// Text handed back to the reasoning loop.
    pub text: String,
}

impl ToolOutcome {
    /// Create an outcome from a payload and its reasoning-loop text.
    pub fn new(payload: serde_json::Value, text: impl Into<String>) -> Self {
        Self {
            payload,
            text: text.into(),
        }
    }
}

/// Trait for agent tools.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The name the reasoning loop uses to invoke this tool.
    fn name(&self) -> &str;

    /// What the tool does, for the reasoning loop's tool listing.
    fn description(&self) -> &str;

    /// Human-readable label published as the `tool_init` event.
    fn init_label(&self) -> String {
        format!("Using {} tool...", self.name().replace('_', " "))
    }

    /// Execute the tool with JSON parameters.
    async fn run(&self, params: serde_json::Value, ctx: &ToolContext) -> Result<ToolOutcome>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Tool Set
// ─────────────────────────────────────────────────────────────────────────────

/// Registry of available tools, keyed by name.
#[derive(Default)]
pub struct ToolSet {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolSet {
    /// Create an empty tool set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any existing tool with the same name.
    pub fn register(&mut self, tool: impl Tool + 'static) {
        self.tools.insert(tool.name().to_string(), Arc::new(tool));
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Names of all registered tools, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns true if no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
