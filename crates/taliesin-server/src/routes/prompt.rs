//! The prompt endpoint.
//!
//! `POST /api/v1/prompt` creates a fresh [`RequestContext`], spawns the
//! request runner as a background task, and returns the drained event
//! stream to the client as server-sent events. The SSE connection closes
//! when the `end_of_stream` sentinel comes through; the transport layer is
//! the stream consumer.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::HeaderMap,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt};
use serde::Deserialize;

use taliesin_agent::{AgentRequest, ChatTurn, Speaker};
use taliesin_stream::RequestContext;

use crate::error::ServerError;
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Request Types
// ─────────────────────────────────────────────────────────────────────────────

/// Request body for the prompt endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct PromptRequest {
    /// Prior conversation turns.
    #[serde(default)]
    pub conversation: Vec<ConversationTurn>,

    /// The user's prompt.
    pub prompt: String,
}

/// One turn of prior conversation as the client sends it.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationTurn {
    /// `"user"` or `"agent"`.
    pub speaker: String,
    /// The turn's content items.
    #[serde(default)]
    pub contents: Vec<ContentItem>,
}

/// One content item within a conversation turn.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentItem {
    /// Item kind; only `"message"` items carry conversational text.
    #[serde(rename = "type")]
    pub kind: String,
    /// The item's text.
    #[serde(default)]
    pub content: String,
}

/// Flatten client conversation turns into `(speaker, content)` pairs.
pub fn flatten_conversation(conversation: &[ConversationTurn]) -> Vec<ChatTurn> {
    let mut history = Vec::new();
    for turn in conversation {
        let speaker = if turn.speaker == "user" {
            Speaker::User
        } else {
            Speaker::Assistant
        };
        for item in &turn.contents {
            if item.kind == "message" {
                history.push(ChatTurn {
                    speaker,
                    content: item.content.clone(),
                });
            }
        }
    }
    history
}

// ─────────────────────────────────────────────────────────────────────────────
// Handler
// ─────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/prompt - run a request, streaming events back as SSE.
pub async fn prompt_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<PromptRequest>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>, ServerError> {
    if body.prompt.trim().is_empty() {
        return Err(ServerError::BadRequest("prompt must not be empty".to_string()));
    }

    tracing::info!(prompt = %body.prompt, "Prompt received");

    let mut context = RequestContext::new().with_prompt(body.prompt.clone());
    if let Some(timezone) = headers.get("Timezone").and_then(|v| v.to_str().ok()) {
        context = context.with_timezone(timezone);
    }
    let context = Arc::new(context);

    let request =
        AgentRequest::new(body.prompt).with_history(flatten_conversation(&body.conversation));

    let runner = state.runner.clone();
    tokio::spawn({
        let context = context.clone();
        async move {
            runner.run(context, request).await;
        }
    });

    let stream = context.drain().map(|event| {
        let sse = match Event::default().event("message").json_data(&event) {
            Ok(sse) => sse,
            Err(err) => {
                tracing::error!(error = %err, "Failed to serialize stream event");
                Event::default().event("message").data("{}")
            }
        };
        Ok(sse)
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
