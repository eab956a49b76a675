//! The request runner.
//!
//! [`RequestRunner`] is the orchestrating caller for all producer activity
//! on one request: it hosts the reasoning loop, hands it a tool broker, and
//! guarantees the stream terminates. Success ends with `agent_output` then
//! `end_of_stream`; failure with a classified `error` then `end_of_stream`;
//! a panicking producer is covered by the publisher's termination guard.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use taliesin_stream::{ErrorKind, RequestContext, StreamPublisher};

use crate::reasoning::{AgentRequest, ReasoningAgent, ToolBroker};
use crate::tool::ToolSet;

/// Hosts the reasoning loop for inbound requests.
pub struct RequestRunner {
    agent: Arc<dyn ReasoningAgent>,
    tools: Arc<ToolSet>,
}

impl RequestRunner {
    /// Create a runner over a reasoning agent and a tool set.
    pub fn new(agent: Arc<dyn ReasoningAgent>, tools: Arc<ToolSet>) -> Self {
        Self { agent, tools }
    }

    /// The tools this runner exposes to the reasoning loop.
    pub fn tools(&self) -> &Arc<ToolSet> {
        &self.tools
    }

    /// Run one request to completion.
    ///
    /// Always terminates the context's stream, whatever the reasoning loop
    /// does, including panicking.
    pub async fn run(&self, context: Arc<RequestContext>, request: AgentRequest) {
        let publisher = StreamPublisher::new(context.clone());
        let _guard = publisher.guard();
        let broker = ToolBroker::new(self.tools.clone(), publisher.clone());

        tracing::info!(request_id = %context.request_id(), "Running request");

        let outcome = AssertUnwindSafe(self.agent.respond(&request, &broker))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(answer)) => {
                tracing::info!(request_id = %context.request_id(), "Request completed");
                publisher.finish(answer);
            }
            Ok(Err(err)) => {
                tracing::error!(
                    request_id = %context.request_id(),
                    error = %err,
                    "Request failed"
                );
                // Tool failures already terminated the stream at the broker
                // boundary; fail() is a no-op then.
                publisher.fail(err.kind(), err.user_message());
            }
            Err(_) => {
                tracing::error!(
                    request_id = %context.request_id(),
                    "Reasoning loop panicked"
                );
                publisher.fail(
                    ErrorKind::InternalFailure,
                    "Something went wrong while processing your message",
                );
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures::StreamExt;
    use serde_json::json;
    use std::time::Duration;

    use taliesin_llm::{
        CompletionError, MockCompletion, ModelProfile, ScriptedCompletion, WordCounter,
    };
    use taliesin_stream::StreamEvent;

    use crate::error::{DataSourceError, Result};
    use crate::reasoning::ScriptedAgent;
    use crate::tools::{MarketDataTool, MockMarketData, MockSearchIndex, SearchSummaryTool};

    fn search_tool(
        index: MockSearchIndex,
        client: Arc<MockCompletion>,
        map_budget: usize,
    ) -> SearchSummaryTool {
        SearchSummaryTool::new(
            Arc::new(index),
            client,
            ModelProfile::new("map-model", map_budget)
                .with_counter(Arc::new(WordCounter)),
            ModelProfile::new("combine-model", 128_000).with_counter(Arc::new(WordCounter)),
        )
    }

    async fn run_and_drain(
        agent: impl ReasoningAgent + 'static,
        tools: ToolSet,
        prompt: &str,
    ) -> Vec<StreamEvent> {
        let runner = RequestRunner::new(Arc::new(agent), Arc::new(tools));
        let context = Arc::new(RequestContext::new().with_prompt(prompt));

        let consumer = tokio::spawn({
            let context = context.clone();
            async move { context.drain().collect::<Vec<_>>().await }
        });

        runner.run(context, AgentRequest::new(prompt)).await;

        tokio::time::timeout(Duration::from_secs(2), consumer)
            .await
            .expect("stream must terminate")
            .unwrap()
    }

    #[tokio::test]
    async fn test_successful_request_event_sequence() {
        let mut tools = ToolSet::new();
        tools.register(MarketDataTool::new(Arc::new(MockMarketData::with_records(
            json!({"value": 42}),
        ))));

        let agent = ScriptedAgent::new("markets are fine")
            .with_call("market_data", json!({"symbol": "SPY", "indicator": "rsi"}));

        let events = run_and_drain(agent, tools, "how is SPY?").await;

        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], StreamEvent::ToolInit { .. }));
        assert!(matches!(events[1], StreamEvent::ToolOutput { .. }));
        assert!(
            matches!(&events[2], StreamEvent::AgentOutput { message } if message == "markets are fine")
        );
        assert!(events[3].is_terminal());
    }

    #[tokio::test]
    async fn test_access_denied_yields_exact_error_sequence() {
        let client = Arc::new(MockCompletion::with_text("unused"));
        let mut tools = ToolSet::new();
        tools.register(search_tool(
            MockSearchIndex::failing(DataSourceError::AccessDenied(
                "apikey sk-secret rejected".to_string(),
            )),
            client,
            128_000,
        ));

        let agent =
            ScriptedAgent::new("never reached").with_call("media_search", json!({"query": "x"}));

        let events = run_and_drain(agent, tools, "what happened?").await;

        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], StreamEvent::ToolInit { .. }));
        match &events[1] {
            StreamEvent::Error { kind, description } => {
                assert_eq!(*kind, ErrorKind::DataSourceFailure);
                // Raw upstream detail must not reach the client.
                assert!(!description.contains("sk-secret"));
            }
            other => panic!("expected error event, got {other:?}"),
        }
        assert!(events[2].is_terminal());
    }

    #[tokio::test]
    async fn test_completion_timeout_classified_as_completion_failure() {
        // Corpus of 300 words against an 1100-token budget: 3 map calls, the
        // second of which times out.
        let corpus = (0..300).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        let client = Arc::new(MockCompletion::new(vec![
            ScriptedCompletion::text("part"),
            ScriptedCompletion::error(CompletionError::timeout("simulated")),
            ScriptedCompletion::text("part"),
        ]));

        let mut tools = ToolSet::new();
        tools.register(search_tool(MockSearchIndex::with_text(corpus), client, 1100));

        let agent =
            ScriptedAgent::new("never reached").with_call("media_search", json!({"query": "x"}));

        let events = run_and_drain(agent, tools, "summarize the news").await;

        assert_eq!(events.len(), 3);
        assert!(matches!(
            events[1],
            StreamEvent::Error {
                kind: ErrorKind::CompletionFailure,
                ..
            }
        ));
        assert!(events[2].is_terminal());
    }

    #[tokio::test]
    async fn test_panicking_agent_still_terminates_stream() {
        struct PanickingAgent;

        #[async_trait]
        impl ReasoningAgent for PanickingAgent {
            async fn respond(&self, _request: &AgentRequest, _broker: &ToolBroker) -> Result<String> {
                panic!("reasoning loop bug");
            }
        }

        let events = run_and_drain(PanickingAgent, ToolSet::new(), "boom").await;

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
    async fn test_no_producer_activity_after_fatal_tool_error() {
        // The agent swallows the tool failure and "answers" anyway; the
        // stream terminated at the broker boundary, so nothing further
        // appears after the sentinel.
        let client = Arc::new(MockCompletion::with_text("unused"));
        let mut tools = ToolSet::new();
        tools.register(search_tool(
            MockSearchIndex::failing(DataSourceError::NotFound("no index".to_string())),
            client,
            128_000,
        ));

        let agent = ScriptedAgent::new("stale answer")
            .with_call("media_search", json!({"query": "x"}))
            .ignoring_tool_errors();

        let events = run_and_drain(agent, tools, "q").await;

        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], StreamEvent::ToolInit { .. }));
        assert!(matches!(events[1], StreamEvent::Error { .. }));
        assert!(events[2].is_terminal());
    }

    #[tokio::test]
    async fn test_plain_answer_without_tools() {
        let events = run_and_drain(ScriptedAgent::new("direct answer"), ToolSet::new(), "hi").await;

        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], StreamEvent::AgentOutput { message } if message == "direct answer"));
        assert!(events[1].is_terminal());
    }
}
