//! Taliesin - data-grounded question answering over streaming events.
//!
//! Main entry point: builds the completion client and tools from
//! configuration and serves the HTTP/SSE surface.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use taliesin_agent::{
    CompletionAgent, HttpMarketData, HttpSearchIndex, MarketDataConfig, MarketDataTool,
    RequestRunner, SearchIndexConfig, SearchSummaryTool, ToolSet,
};
use taliesin_llm::{ModelProfile, OpenAiClient, SharedCompletionClient};
use taliesin_server::{Server, ServerConfig};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Taliesin server.
#[derive(Parser)]
#[command(name = "taliesin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address to bind the server to.
    #[arg(long, default_value = "0.0.0.0:8020", env = "TALIESIN_BIND")]
    bind: SocketAddr,

    /// Model used for map-stage summarization calls.
    #[arg(long, default_value = "gpt-4o-mini", env = "TALIESIN_MAP_MODEL")]
    map_model: String,

    /// Token budget of the map model.
    #[arg(long, default_value_t = 128_000, env = "TALIESIN_MAP_BUDGET")]
    map_budget: usize,

    /// Model used for combine-stage summarization calls.
    #[arg(long, default_value = "gpt-4o-mini", env = "TALIESIN_COMBINE_MODEL")]
    combine_model: String,

    /// Token budget of the combine model.
    #[arg(long, default_value_t = 128_000, env = "TALIESIN_COMBINE_BUDGET")]
    combine_budget: usize,

    /// Model used by the answer agent.
    #[arg(long, default_value = "gpt-4o-mini", env = "TALIESIN_AGENT_MODEL")]
    agent_model: String,

    /// Base URL of the media search index (enables the search tool).
    #[arg(long, env = "TALIESIN_SEARCH_URL")]
    search_url: Option<String>,

    /// API key for the media search index.
    #[arg(long, env = "TALIESIN_SEARCH_KEY")]
    search_key: Option<String>,

    /// Base URL of the market-data API (enables the market tool).
    #[arg(long, env = "TALIESIN_MARKET_URL")]
    market_url: Option<String>,

    /// Secret for the market-data API.
    #[arg(long, env = "TALIESIN_MARKET_SECRET")]
    market_secret: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Entry Point
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let client: SharedCompletionClient = Arc::new(
        OpenAiClient::from_env().context("completion client configuration")?,
    );

    let map_profile = ModelProfile::new(&cli.map_model, cli.map_budget);
    let combine_profile = ModelProfile::new(&cli.combine_model, cli.combine_budget);
    let agent_profile = ModelProfile::new(&cli.agent_model, cli.map_budget);

    let mut tools = ToolSet::new();

    if let (Some(url), Some(key)) = (&cli.search_url, &cli.search_key) {
        let index = HttpSearchIndex::new(SearchIndexConfig::new(url, key))
            .context("search index configuration")?;
        tools.register(SearchSummaryTool::new(
            Arc::new(index),
            client.clone(),
            map_profile.clone(),
            combine_profile.clone(),
        ));
        tracing::info!(url = %url, "Media search tool enabled");
    }

    if let (Some(url), Some(secret)) = (&cli.market_url, &cli.market_secret) {
        let api = HttpMarketData::new(MarketDataConfig::new(url, secret))
            .context("market data configuration")?;
        tools.register(MarketDataTool::new(Arc::new(api)));
        tracing::info!(url = %url, "Market data tool enabled");
    }

    if tools.is_empty() {
        tracing::warn!("No data-source tools configured; answers will be model-only");
    }

    let agent = CompletionAgent::new(client, agent_profile);
    let runner = RequestRunner::new(Arc::new(agent), Arc::new(tools));

    let config = ServerConfig::default().with_bind_address(cli.bind);
    Server::new(runner, config)
        .run()
        .await
        .context("server terminated")?;

    Ok(())
}
