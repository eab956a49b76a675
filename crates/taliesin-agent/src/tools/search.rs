//! Search-index tool.
//!
//! Queries an external search index for documents matching a topic, then
//! reduces the (potentially very large) result text through the
//! summarization engine. The reasoning loop receives the distilled summary;
//! the client stream receives it as the tool's structured payload.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use taliesin_llm::{ModelProfile, SharedCompletionClient};
use taliesin_summarize::{Summarizer, SummaryRequest, extract_tag};

use crate::error::{AgentError, DataSourceError, Result};
use crate::tool::{ParamExt, Tool, ToolContext, ToolOutcome};

/// Default lower bound of the query time range.
const DEFAULT_FROM_DATE: &str = "now-24h";

/// Default upper bound of the query time range.
const DEFAULT_TO_DATE: &str = "now";

// ─────────────────────────────────────────────────────────────────────────────
// Search Query
// ─────────────────────────────────────────────────────────────────────────────

/// A filtered query against a search index.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Free-text search query.
    pub query: String,
    /// Lucene disjunction over sentiment terms, if any were requested.
    pub sentiment: Option<String>,
    /// Lucene disjunction over emotion terms, if any were requested.
    pub emotion: Option<String>,
    /// Start of the time range (`now-24h` style relative, or ISO 8601).
    pub from_date: String,
    /// End of the time range (`now`, or ISO 8601).
    pub to_date: String,
    /// Timezone for resolving relative bounds.
    pub timezone: Option<String>,
}

/// The seam to the search index itself.
///
/// Returns the concatenated text of all matching documents; the caller is
/// responsible for reducing it to something a model can hold.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Fetch matching document text for `query`.
    async fn fetch_text(&self, query: &SearchQuery)
    -> std::result::Result<String, DataSourceError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Lucene Clause Building
// ─────────────────────────────────────────────────────────────────────────────

/// Characters with reserved meaning in Lucene query syntax.
const LUCENE_SPECIALS: &[char] = &[
    '+', '-', '!', '(', ')', '{', '}', '[', ']', '^', '"', '~', '*', '?', ':', '/', '&', '|',
];

fn escape_lucene(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if LUCENE_SPECIALS.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Join filter terms into an escaped Lucene clause; `None` for no terms.
pub fn lucene_clause(terms: &[String], join_word: &str) -> Option<String> {
    if terms.is_empty() {
        return None;
    }
    Some(
        terms
            .iter()
            .map(|t| escape_lucene(t))
            .collect::<Vec<_>>()
            .join(&format!(" {join_word} ")),
    )
}

/// Validate a time-range bound: `now`, a `now-<duration>` offset, or an
/// ISO 8601 date / datetime.
fn is_valid_time_bound(bound: &str) -> bool {
    if bound == "now" || bound.starts_with("now-") {
        return true;
    }
    DateTime::parse_from_rfc3339(bound).is_ok() || bound.parse::<NaiveDate>().is_ok()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tool Parameters
// ─────────────────────────────────────────────────────────────────────────────

/// Validated parameters for the search tool.
#[derive(Debug, Clone)]
pub struct SearchParams {
    /// Search query.
    pub query: String,
    /// Optional sentiment filter terms.
    pub sentiment_filter: Vec<String>,
    /// Optional emotion filter terms.
    pub emotion_filter: Vec<String>,
    /// Start of the time range.
    pub from_date: String,
    /// End of the time range.
    pub to_date: String,
}

impl TryFrom<serde_json::Value> for SearchParams {
    type Error = AgentError;

    fn try_from(params: serde_json::Value) -> Result<Self> {
        let query = params.required_str("query")?.to_string();
        let from_date = params
            .optional_str("from_date")
            .unwrap_or(DEFAULT_FROM_DATE)
            .to_string();
        let to_date = params
            .optional_str("to_date")
            .unwrap_or(DEFAULT_TO_DATE)
            .to_string();

        if !is_valid_time_bound(&from_date) {
            return Err(AgentError::parse(format!(
                "invalid 'from_date' value '{from_date}'"
            )));
        }
        if !is_valid_time_bound(&to_date) {
            return Err(AgentError::parse(format!(
                "invalid 'to_date' value '{to_date}'"
            )));
        }

        Ok(Self {
            query,
            sentiment_filter: params.optional_str_array("sentiment_filter"),
            emotion_filter: params.optional_str_array("emotion_filter"),
            from_date,
            to_date,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Search Summary Tool
// ─────────────────────────────────────────────────────────────────────────────

/// Searches the media index and returns a bounded summary of the results.
pub struct SearchSummaryTool {
    index: Arc<dyn SearchIndex>,
    summarizer: Summarizer,
    map_profile: ModelProfile,
    combine_profile: ModelProfile,
}

impl SearchSummaryTool {
    /// Create the tool over a search index and a completion client.
    pub fn new(
        index: Arc<dyn SearchIndex>,
        client: SharedCompletionClient,
        map_profile: ModelProfile,
        combine_profile: ModelProfile,
    ) -> Self {
        Self {
            index,
            summarizer: Summarizer::new(client),
            map_profile,
            combine_profile,
        }
    }
}

#[async_trait]
impl Tool for SearchSummaryTool {
    fn name(&self) -> &str {
        "media_search"
    }

    fn description(&self) -> &str {
        "Search news and social media content by topic, with optional \
         sentiment and emotion filters and a bounded time range, and return \
         a summary of what was found."
    }

    async fn run(&self, params: serde_json::Value, ctx: &ToolContext) -> Result<ToolOutcome> {
        let params = SearchParams::try_from(params)?;

        let query = SearchQuery {
            query: params.query,
            sentiment: lucene_clause(&params.sentiment_filter, "OR"),
            emotion: lucene_clause(&params.emotion_filter, "OR"),
            from_date: params.from_date,
            to_date: params.to_date,
            timezone: ctx.timezone.clone(),
        };

        let text = self.index.fetch_text(&query).await?;
        if text.trim().is_empty() {
            let message = "The search returned no matching content.";
            return Ok(ToolOutcome::new(json!({ "summary": message }), message));
        }

        tracing::debug!(bytes = text.len(), query = %query.query, "Summarizing search results");

        let request = SummaryRequest::new(
            text,
            self.map_profile.clone(),
            self.combine_profile.clone(),
        );
        let response = self
            .summarizer
            .summarize_with_cancellation(&request, &ctx.cancellation)
            .await?;

        // Models occasionally ignore the tag instruction; fall back to the
        // whole response rather than failing the invocation.
        let summary = extract_tag(&response, "summary").unwrap_or(response);

        Ok(ToolOutcome::new(json!({ "summary": summary.clone() }), summary))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HTTP Search Index
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for the HTTP-backed search index.
#[derive(Debug, Clone)]
pub struct SearchIndexConfig {
    /// Base URL of the index API.
    pub base_url: String,
    /// API key sent as the `ApiKey` authorization scheme.
    pub api_key: String,
    /// Maximum number of documents to request.
    pub size: usize,
    /// Documents with fewer whitespace words than this are discarded.
    pub min_words: usize,
}

impl SearchIndexConfig {
    /// Create a config with default result sizing.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            size: 1500,
            min_words: 4,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

/// reqwest-backed [`SearchIndex`].
pub struct HttpSearchIndex {
    client: reqwest::Client,
    config: SearchIndexConfig,
}

impl HttpSearchIndex {
    /// Create an index client.
    pub fn new(config: SearchIndexConfig) -> std::result::Result<Self, DataSourceError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| DataSourceError::Upstream(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl SearchIndex for HttpSearchIndex {
    async fn fetch_text(
        &self,
        query: &SearchQuery,
    ) -> std::result::Result<String, DataSourceError> {
        let url = format!("{}/search", self.config.base_url);
        let mut request = self
            .client
            .get(&url)
            .header("Authorization", format!("ApiKey {}", self.config.api_key))
            .query(&[
                ("q", query.query.as_str()),
                ("from", query.from_date.as_str()),
                ("to", query.to_date.as_str()),
            ])
            .query(&[("size", self.config.size)]);

        if let Some(sentiment) = &query.sentiment {
            request = request.query(&[("sentiment", sentiment.as_str())]);
        }
        if let Some(emotion) = &query.emotion {
            request = request.query(&[("emotion", emotion.as_str())]);
        }
        if let Some(timezone) = &query.timezone {
            request = request.query(&[("timezone", timezone.as_str())]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DataSourceError::Upstream(e.to_string()))?;

        match response.status().as_u16() {
            200..=299 => {}
            401 | 403 => {
                return Err(DataSourceError::AccessDenied(
                    "search index rejected the API key".to_string(),
                ));
            }
            404 => return Err(DataSourceError::NotFound(query.query.clone())),
            status => {
                return Err(DataSourceError::Upstream(format!(
                    "search index returned HTTP {status}"
                )));
            }
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| DataSourceError::Upstream(format!("malformed index response: {e}")))?;

        let text = parsed
            .hits
            .iter()
            .map(|hit| hit.text.trim())
            .filter(|text| text.split_whitespace().count() >= self.config.min_words)
            .collect::<Vec<_>>()
            .join("\n\n");

        Ok(text)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Mock Search Index
// ─────────────────────────────────────────────────────────────────────────────

/// A scripted search index for tests.
pub struct MockSearchIndex {
    result: std::result::Result<String, DataSourceError>,
    queries: parking_lot::Mutex<Vec<SearchQuery>>,
}

impl MockSearchIndex {
    /// An index that returns the given text for every query.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            result: Ok(text.into()),
            queries: parking_lot::Mutex::new(Vec::new()),
        }
    }

    /// An index that fails every query with the given error.
    pub fn failing(error: DataSourceError) -> Self {
        Self {
            result: Err(error),
            queries: parking_lot::Mutex::new(Vec::new()),
        }
    }

    /// All queries made against this index.
    pub fn queries(&self) -> Vec<SearchQuery> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl SearchIndex for MockSearchIndex {
    async fn fetch_text(
        &self,
        query: &SearchQuery,
    ) -> std::result::Result<String, DataSourceError> {
        self.queries.lock().push(query.clone());
        self.result.clone()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
