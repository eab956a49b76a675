//! Agent-side plumbing for Taliesin.
//!
//! This crate wires the external capabilities together for one request:
//! tools over data sources, the reasoning-loop seam, and the request runner
//! that guarantees every client stream terminates.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  RequestRunner                                           │
//! │  - hosts the ReasoningAgent (external capability)        │
//! │  - guarantees end_of_stream, even on panic               │
//! └──────────────────────────────────────────────────────────┘
//!                            │
//!             ┌──────────────┼──────────────┐
//!             ▼              ▼              ▼
//!      ┌──────────┐   ┌───────────┐  ┌────────────┐
//!      │ToolBroker│   │  ToolSet  │  │StreamPub.  │
//!      │(events)  │   │(registry) │  │(taliesin-  │
//!      └──────────┘   └───────────┘  │ stream)    │
//!                                    └────────────┘
//! ```

pub mod error;
pub mod reasoning;
pub mod runner;
pub mod tool;
pub mod tools;

// Re-export core types
pub use error::{AgentError, DataSourceError, Result};

// Re-export tool framework
pub use tool::{ParamExt, Tool, ToolContext, ToolOutcome, ToolSet};

// Re-export reasoning seam
pub use reasoning::{
    AgentRequest, ChatTurn, CompletionAgent, ReasoningAgent, ScriptedAgent, Speaker, ToolBroker,
};

// Re-export runner
pub use runner::RequestRunner;

// Re-export built-in tools
pub use tools::{
    HttpMarketData, HttpSearchIndex, IndicatorRequest, MarketDataApi, MarketDataConfig,
    MarketDataTool, MockMarketData, MockSearchIndex, SearchIndex, SearchIndexConfig,
    SearchQuery, SearchSummaryTool,
};
