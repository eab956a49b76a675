//! The reasoning-loop seam and the tool broker.
//!
//! Taliesin does not implement a reasoning agent; it hosts one. The
//! [`ReasoningAgent`] trait is the external capability that decides which
//! tools to call and how to phrase the final answer. Everything it touches
//! goes through the [`ToolBroker`], which is the StreamPublisher boundary:
//! `tool_init` before each invocation, `tool_output` on success, and a
//! classified `error` plus stream termination on failure.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use taliesin_llm::{ModelProfile, SharedCompletionClient};
use taliesin_stream::StreamPublisher;

use crate::error::{AgentError, Result};
use crate::tool::{ToolContext, ToolSet};

// ─────────────────────────────────────────────────────────────────────────────
// Request Types
// ─────────────────────────────────────────────────────────────────────────────

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    /// The human user.
    User,
    /// The agent.
    Assistant,
}

/// One flattened conversation turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Who spoke.
    pub speaker: Speaker,
    /// What they said.
    pub content: String,
}

/// One request to the reasoning loop: the prompt plus prior conversation.
#[derive(Debug, Clone, Default)]
pub struct AgentRequest {
    /// The user's current prompt.
    pub prompt: String,
    /// Prior turns, oldest first.
    pub history: Vec<ChatTurn>,
}

impl AgentRequest {
    /// Create a request with no history.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            history: Vec::new(),
        }
    }

    /// Attach conversation history.
    pub fn with_history(mut self, history: Vec<ChatTurn>) -> Self {
        self.history = history;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tool Broker
// ─────────────────────────────────────────────────────────────────────────────

/// Mediates every tool invocation the reasoning loop makes.
///
/// On failure the broker classifies the error, publishes the `error` event
/// and terminates the stream before returning the error to the loop; no
/// further producer activity is expected for the request after that.
pub struct ToolBroker {
    tools: Arc<ToolSet>,
    publisher: StreamPublisher,
    cancellation: CancellationToken,
}

impl ToolBroker {
    /// Create a broker over a tool set and a request's publisher.
    pub fn new(tools: Arc<ToolSet>, publisher: StreamPublisher) -> Self {
        Self {
            tools,
            publisher,
            cancellation: CancellationToken::new(),
        }
    }

    /// Thread a cancellation token through tool invocations.
    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Names of the tools available to the reasoning loop.
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.names()
    }

    /// Invoke a tool by name, wrapping it in stream events.
    ///
    /// Returns the text the reasoning loop should see. On failure the stream
    /// has already been terminated when the error comes back.
    pub async fn call(&self, name: &str, params: serde_json::Value) -> Result<String> {
        let Some(tool) = self.tools.get(name) else {
            let err = AgentError::ToolNotFound(name.to_string());
            tracing::error!(tool = name, "Unknown tool requested");
            self.publisher.fail(err.kind(), err.user_message());
            return Err(err);
        };

        self.publisher.tool_init(tool.init_label());

        let ctx = {
            let mut ctx = ToolContext::new().with_cancellation(self.cancellation.clone());
            ctx.timezone = self
                .publisher
                .context()
                .timezone()
                .map(str::to_string);
            ctx
        };

        match tool.run(params, &ctx).await {
            Ok(outcome) => {
                self.publisher.tool_output(outcome.payload);
                tracing::debug!(tool = name, "Tool output: {}", outcome.text);
                Ok(outcome.text)
            }
            Err(err) => {
                tracing::error!(tool = name, error = %err, "Tool invocation failed");
                self.publisher.fail(err.kind(), err.user_message());
                Err(err)
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Reasoning Agent Trait
// ─────────────────────────────────────────────────────────────────────────────

/// The external reasoning-loop capability.
#[async_trait]
pub trait ReasoningAgent: Send + Sync {
    /// Answer the request, invoking tools through the broker as needed.
    async fn respond(&self, request: &AgentRequest, broker: &ToolBroker) -> Result<String>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Completion Agent
// ─────────────────────────────────────────────────────────────────────────────

/// A degenerate reasoning agent: one completion call over the transcript,
/// no tool planning.
///
/// Exists so the binary runs end to end without a full reasoning loop; a
/// real deployment plugs its own [`ReasoningAgent`] in here.
pub struct CompletionAgent {
    client: SharedCompletionClient,
    profile: ModelProfile,
}

impl CompletionAgent {
    /// Create an agent over a completion client and model profile.
    pub fn new(client: SharedCompletionClient, profile: ModelProfile) -> Self {
        Self { client, profile }
    }

    fn render_transcript(request: &AgentRequest) -> String {
        let mut parts = Vec::with_capacity(request.history.len() + 1);
        for turn in &request.history {
            let speaker = match turn.speaker {
                Speaker::User => "User",
                Speaker::Assistant => "Assistant",
            };
            parts.push(format!("{speaker}: {}", turn.content));
        }
        parts.push(format!("User: {}", request.prompt));
        parts.join("\n")
    }
}

#[async_trait]
impl ReasoningAgent for CompletionAgent {
    async fn respond(&self, request: &AgentRequest, _broker: &ToolBroker) -> Result<String> {
        let transcript = Self::render_transcript(request);
        let text = self.client.complete(self.profile.id(), &transcript).await?;
        Ok(text)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scripted Agent
// ─────────────────────────────────────────────────────────────────────────────

/// A deterministic reasoning agent for tests: invokes a fixed sequence of
/// tool calls, then returns a fixed answer.
pub struct ScriptedAgent {
    calls: Vec<(String, serde_json::Value)>,
    reply: String,
    /// When set, tool-call failures are swallowed instead of propagated.
    ignore_tool_errors: bool,
}

impl ScriptedAgent {
    /// An agent that immediately answers with `reply`.
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            calls: Vec::new(),
            reply: reply.into(),
            ignore_tool_errors: false,
        }
    }

    /// Add a tool call to the script.
    pub fn with_call(mut self, name: impl Into<String>, params: serde_json::Value) -> Self {
        self.calls.push((name.into(), params));
        self
    }

    /// Swallow tool-call failures and answer anyway.
    pub fn ignoring_tool_errors(mut self) -> Self {
        self.ignore_tool_errors = true;
        self
    }
}

#[async_trait]
impl ReasoningAgent for ScriptedAgent {
    async fn respond(&self, _request: &AgentRequest, broker: &ToolBroker) -> Result<String> {
        for (name, params) in &self.calls {
            match broker.call(name, params.clone()).await {
                Ok(_) => {}
                Err(_) if self.ignore_tool_errors => {}
                Err(err) => return Err(err),
            }
        }
        Ok(self.reply.clone())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use serde_json::json;

    use taliesin_llm::MockCompletion;
    use taliesin_stream::{ErrorKind, RequestContext, StreamEvent};

    use crate::tools::{MarketDataTool, MockMarketData};

    fn broker_with_market_tool(
        records: serde_json::Value,
    ) -> (ToolBroker, Arc<RequestContext>) {
        let mut tools = ToolSet::new();
        tools.register(MarketDataTool::new(Arc::new(MockMarketData::with_records(
            records,
        ))));
        let context = Arc::new(RequestContext::new());
        let publisher = StreamPublisher::new(context.clone());
        (ToolBroker::new(Arc::new(tools), publisher), context)
    }

    #[tokio::test]
    async fn test_broker_wraps_success_in_events() {
        let (broker, context) = broker_with_market_tool(json!({"value": 1}));

        let text = broker
            .call("market_data", json!({"symbol": "AAPL", "indicator": "rsi"}))
            .await
            .unwrap();
        assert!(text.contains("AAPL"));

        context.publish(StreamEvent::EndOfStream);
        let events: Vec<_> = context.drain().collect().await;
        assert!(matches!(&events[0], StreamEvent::ToolInit { message } if message.contains("market data")));
        assert!(matches!(
            &events[1],
            StreamEvent::ToolOutput { payload } if payload == &json!({"value": 1})
        ));
    }

    #[tokio::test]
    async fn test_broker_unknown_tool_terminates_stream() {
        let (broker, context) = broker_with_market_tool(json!({}));

        let result = broker.call("no_such_tool", json!({})).await;
        assert!(matches!(result, Err(AgentError::ToolNotFound(_))));

        let events: Vec<_> = context.drain().collect().await;
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[0],
            StreamEvent::Error {
                kind: ErrorKind::InternalFailure,
                ..
            }
        ));
        assert!(events[1].is_terminal());
    }

    #[tokio::test]
    async fn test_completion_agent_renders_history() {
        let mock = Arc::new(MockCompletion::with_text("the answer"));
        let agent = CompletionAgent::new(mock.clone(), ModelProfile::new("m", 128_000));

        let request = AgentRequest::new("and now?").with_history(vec![
            ChatTurn {
                speaker: Speaker::User,
                content: "hello".to_string(),
            },
            ChatTurn {
                speaker: Speaker::Assistant,
                content: "hi".to_string(),
            },
        ]);

        let (broker, _context) = broker_with_market_tool(json!({}));
        let answer = agent.respond(&request, &broker).await.unwrap();
        assert_eq!(answer, "the answer");

        let prompt = &mock.requests()[0].prompt;
        assert_eq!(prompt, "User: hello\nAssistant: hi\nUser: and now?");
    }

    #[test]
    fn test_chat_turn_serialization() {
        let turn = ChatTurn {
            speaker: Speaker::User,
            content: "hi".to_string(),
        };
        let json = serde_json::to_string(&turn).unwrap();
        assert!(json.contains("\"user\""));
    }
}
