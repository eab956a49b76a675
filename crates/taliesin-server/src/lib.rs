//! HTTP/SSE surface for Taliesin.
//!
//! The server is the stream consumer: each prompt request gets its own
//! [`RequestContext`](taliesin_stream::RequestContext), the runner is
//! spawned as a background task, and the drained event queue is forwarded
//! to the client as server-sent events until the `end_of_stream` sentinel.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use taliesin_agent::{RequestRunner, ToolSet};
//! use taliesin_server::{Server, ServerConfig};
//!
//! let runner = RequestRunner::new(agent, Arc::new(tools));
//! let server = Server::new(runner, ServerConfig::default());
//! server.run().await?;
//! ```

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::{ErrorResponse, Result, ServerError};
pub use routes::{PromptRequest, flatten_conversation};
pub use state::AppState;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use taliesin_agent::RequestRunner;

/// The Taliesin HTTP server.
pub struct Server {
    state: AppState,
}

impl Server {
    /// Create a server from a request runner and configuration.
    pub fn new(runner: RequestRunner, config: ServerConfig) -> Self {
        Self {
            state: AppState::new(runner, config),
        }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .merge(routes::health_routes())
            .nest("/api/v1", self.api_routes())
            .layer(TraceLayer::new_for_http());

        if self.state.config.permissive_cors {
            router = router.layer(CorsLayer::permissive());
        }

        router.with_state(self.state.clone())
    }

    /// API routes (v1).
    fn api_routes(&self) -> Router<AppState> {
        Router::new()
            .route("/ping", get(routes::ping))
            .route("/prompt", post(routes::prompt_handler))
    }

    /// Bind and serve until the process is stopped.
    pub async fn run(self) -> std::io::Result<()> {
        let addr = self.state.config.bind_address;
        let listener = TcpListener::bind(addr).await?;
        info!(%addr, "Server listening");
        axum::serve(listener, self.router()).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use serde_json::json;
    use std::sync::Arc;
    use tower::ServiceExt;

    use taliesin_agent::{
        DataSourceError, MarketDataTool, MockMarketData, ScriptedAgent, ToolSet,
    };
    use taliesin_stream::StreamEvent;

    fn test_server(agent: ScriptedAgent, tools: ToolSet) -> Server {
        Server::new(
            RequestRunner::new(Arc::new(agent), Arc::new(tools)),
            ServerConfig::default(),
        )
    }

    fn prompt_request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/prompt")
            .header(header::CONTENT_TYPE, "application/json")
            .header("Timezone", "America/Edmonton")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    /// Parse `data:` payloads out of an SSE body.
    fn parse_sse_events(body: &str) -> Vec<StreamEvent> {
        body.lines()
            .filter_map(|line| line.strip_prefix("data: "))
            .filter_map(|data| serde_json::from_str(data).ok())
            .collect()
    }

    #[tokio::test]
    async fn test_prompt_streams_events_and_closes() {
        let mut tools = ToolSet::new();
        tools.register(MarketDataTool::new(Arc::new(MockMarketData::with_records(
            json!({"value": 9}),
        ))));
        let agent = ScriptedAgent::new("all clear")
            .with_call("market_data", json!({"symbol": "SPY", "indicator": "rsi"}));

        let response = test_server(agent, tools)
            .router()
            .oneshot(prompt_request(json!({"prompt": "how is SPY?"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.starts_with("text/event-stream"));

        // The body ends because the drained stream ends at the sentinel.
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let events = parse_sse_events(std::str::from_utf8(&body).unwrap());

        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], StreamEvent::ToolInit { .. }));
        assert!(matches!(events[1], StreamEvent::ToolOutput { .. }));
        assert!(matches!(&events[2], StreamEvent::AgentOutput { message } if message == "all clear"));
        assert!(events[3].is_terminal());
    }

    #[tokio::test]
    async fn test_prompt_failure_still_closes_stream() {
        let mut tools = ToolSet::new();
        tools.register(MarketDataTool::new(Arc::new(MockMarketData::failing(
            DataSourceError::AccessDenied("bad key".to_string()),
        ))));
        let agent = ScriptedAgent::new("unreachable")
            .with_call("market_data", json!({"symbol": "SPY", "indicator": "rsi"}));

        let response = test_server(agent, tools)
            .router()
            .oneshot(prompt_request(json!({"prompt": "how is SPY?"})))
            .await
            .unwrap();

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let events = parse_sse_events(std::str::from_utf8(&body).unwrap());

        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], StreamEvent::ToolInit { .. }));
        assert!(matches!(events[1], StreamEvent::Error { .. }));
        assert!(events[2].is_terminal());
    }

    #[tokio::test]
    async fn test_empty_prompt_is_rejected() {
        let response = test_server(ScriptedAgent::new("x"), ToolSet::new())
            .router()
            .oneshot(prompt_request(json!({"prompt": "   "})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_ping_under_api_prefix() {
        let response = test_server(ScriptedAgent::new("x"), ToolSet::new())
            .router()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/ping")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
