//! Market-data tool.
//!
//! Fetches technical-indicator records from an external market-data API.
//! The raw records go to the client stream as the tool's structured payload;
//! the reasoning loop receives a rendered text form.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use crate::error::{AgentError, DataSourceError, Result};
use crate::tool::{ParamExt, Tool, ToolContext, ToolOutcome};

/// Default candle interval when the reasoning loop does not specify one.
const DEFAULT_INTERVAL: &str = "1d";

// ─────────────────────────────────────────────────────────────────────────────
// Market Data Seam
// ─────────────────────────────────────────────────────────────────────────────

/// One indicator lookup.
#[derive(Debug, Clone)]
pub struct IndicatorRequest {
    /// Instrument symbol, e.g. `AAPL` or `BTC/USDT`.
    pub symbol: String,
    /// Indicator name, e.g. `rsi`, `macd`, `sma`.
    pub indicator: String,
    /// Candle interval, e.g. `1h`, `1d`.
    pub interval: String,
}

/// The seam to the market-data API.
#[async_trait]
pub trait MarketDataApi: Send + Sync {
    /// Fetch one indicator's records.
    async fn indicator(
        &self,
        request: &IndicatorRequest,
    ) -> std::result::Result<serde_json::Value, DataSourceError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Tool Parameters
// ─────────────────────────────────────────────────────────────────────────────

/// Validated parameters for the market-data tool.
#[derive(Debug, Clone)]
pub struct MarketParams {
    /// Instrument symbol.
    pub symbol: String,
    /// Indicator name.
    pub indicator: String,
    /// Candle interval.
    pub interval: String,
}

impl TryFrom<serde_json::Value> for MarketParams {
    type Error = AgentError;

    fn try_from(params: serde_json::Value) -> Result<Self> {
        Ok(Self {
            symbol: params.required_str("symbol")?.to_string(),
            indicator: params.required_str("indicator")?.to_string(),
            interval: params
                .optional_str("interval")
                .unwrap_or(DEFAULT_INTERVAL)
                .to_string(),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Market Data Tool
// ─────────────────────────────────────────────────────────────────────────────

/// Answers indicator questions against the market-data API.
pub struct MarketDataTool {
    api: Arc<dyn MarketDataApi>,
}

impl MarketDataTool {
    /// Create the tool over a market-data API.
    pub fn new(api: Arc<dyn MarketDataApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Tool for MarketDataTool {
    fn name(&self) -> &str {
        "market_data"
    }

    fn description(&self) -> &str {
        "Fetch a technical indicator (rsi, macd, sma, ...) for an instrument \
         symbol at a given candle interval."
    }

    async fn run(&self, params: serde_json::Value, _ctx: &ToolContext) -> Result<ToolOutcome> {
        let params = MarketParams::try_from(params)?;
        let request = IndicatorRequest {
            symbol: params.symbol,
            indicator: params.indicator,
            interval: params.interval,
        };

        tracing::debug!(
            symbol = %request.symbol,
            indicator = %request.indicator,
            "Fetching market data"
        );

        let records = self.api.indicator(&request).await?;
        let text = render_records(&request, &records);

        Ok(ToolOutcome::new(records, text))
    }
}

/// Render indicator records for the reasoning loop.
fn render_records(request: &IndicatorRequest, records: &serde_json::Value) -> String {
    let body = serde_json::to_string_pretty(records).unwrap_or_else(|_| records.to_string());
    format!(
        "{} {} ({} candles):\n{}",
        request.symbol, request.indicator, request.interval, body
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// HTTP Market Data
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for the HTTP market-data client.
#[derive(Debug, Clone)]
pub struct MarketDataConfig {
    /// Base URL of the indicator API.
    pub base_url: String,
    /// API secret sent with every request.
    pub secret: String,
}

impl MarketDataConfig {
    /// Create a config.
    pub fn new(base_url: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            secret: secret.into(),
        }
    }
}

/// reqwest-backed [`MarketDataApi`].
pub struct HttpMarketData {
    client: reqwest::Client,
    config: MarketDataConfig,
}

impl HttpMarketData {
    /// Create a market-data client.
    pub fn new(config: MarketDataConfig) -> std::result::Result<Self, DataSourceError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| DataSourceError::Upstream(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl MarketDataApi for HttpMarketData {
    async fn indicator(
        &self,
        request: &IndicatorRequest,
    ) -> std::result::Result<serde_json::Value, DataSourceError> {
        let url = format!("{}/{}", self.config.base_url, request.indicator);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("secret", self.config.secret.as_str()),
                ("symbol", request.symbol.as_str()),
                ("interval", request.interval.as_str()),
            ])
            .send()
            .await
            .map_err(|e| DataSourceError::Upstream(e.to_string()))?;

        match response.status().as_u16() {
            200..=299 => {}
            401 | 403 => {
                return Err(DataSourceError::AccessDenied(
                    "market-data API rejected the secret".to_string(),
                ));
            }
            404 => {
                return Err(DataSourceError::NotFound(format!(
                    "{} for {}",
                    request.indicator, request.symbol
                )));
            }
            status => {
                return Err(DataSourceError::Upstream(format!(
                    "market-data API returned HTTP {status}"
                )));
            }
        }

        response
            .json()
            .await
            .map_err(|e| DataSourceError::Upstream(format!("malformed indicator response: {e}")))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Mock Market Data
// ─────────────────────────────────────────────────────────────────────────────

/// A scripted market-data API for tests.
pub struct MockMarketData {
    result: std::result::Result<serde_json::Value, DataSourceError>,
}

impl MockMarketData {
    /// An API that returns the given records for every request.
    pub fn with_records(records: serde_json::Value) -> Self {
        Self {
            result: Ok(records),
        }
    }

    /// An API that fails every request with the given error.
    pub fn failing(error: DataSourceError) -> Self {
        Self { result: Err(error) }
    }
}

#[async_trait]
impl MarketDataApi for MockMarketData {
    async fn indicator(
        &self,
        _request: &IndicatorRequest,
    ) -> std::result::Result<serde_json::Value, DataSourceError> {
        self.result.clone()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_params_defaults_interval() {
        let params =
            MarketParams::try_from(json!({"symbol": "AAPL", "indicator": "rsi"})).unwrap();
        assert_eq!(params.interval, "1d");
    }

    #[test]
    fn test_market_params_requires_symbol_and_indicator() {
        assert!(MarketParams::try_from(json!({"indicator": "rsi"})).is_err());
        assert!(MarketParams::try_from(json!({"symbol": "AAPL"})).is_err());
    }

    #[tokio::test]
    async fn test_run_returns_raw_records_and_rendered_text() {
        let records = json!({"value": 62.5});
        let tool = MarketDataTool::new(Arc::new(MockMarketData::with_records(records.clone())));

        let outcome = tool
            .run(
                json!({"symbol": "AAPL", "indicator": "rsi", "interval": "1h"}),
                &ToolContext::new(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.payload, records);
        assert!(outcome.text.contains("AAPL rsi (1h candles)"));
        assert!(outcome.text.contains("62.5"));
    }

    #[tokio::test]
    async fn test_run_propagates_not_found() {
        let tool = MarketDataTool::new(Arc::new(MockMarketData::failing(
            DataSourceError::NotFound("rsi for XYZ".to_string()),
        )));

        let result = tool
            .run(json!({"symbol": "XYZ", "indicator": "rsi"}), &ToolContext::new())
            .await;
        assert!(matches!(
            result,
            Err(AgentError::DataSource(DataSourceError::NotFound(_)))
        ));
    }
}
