//! The map-reduce summarization engine.
//!
//! [`Summarizer`] reduces a corpus that may exceed a completion model's
//! context window to one bounded summary. Small corpora take a single
//! completion call; large ones are chunked, summarized concurrently, and
//! merged by a combine call whose own input is re-reduced until it fits the
//! combine model's budget.

use tokio_util::sync::CancellationToken;

use taliesin_llm::{ModelProfile, SharedCompletionClient};

use crate::chunker::split_text;
use crate::error::{Result, SummarizeError};
use crate::prompt::{PromptTemplate, SOURCE_COMBINE_TEMPLATE, SOURCE_MAP_TEMPLATE};

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Tokens reserved for the model's anticipated response when checking
/// whether a rendered prompt fits a budget.
pub const RESPONSE_HEADROOM: usize = 1000;

/// Separator between chunk summaries in the combine-stage input.
const SUMMARY_SEPARATOR: &str = "\n\n";

// ─────────────────────────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────────────────────────

/// The final combined summary text.
pub type SummaryResult = String;

/// One summarization invocation: the corpus plus the prompts and model
/// profiles for both stages. Created per call, discarded after completion.
#[derive(Debug, Clone)]
pub struct SummaryRequest {
    /// The raw text to reduce.
    pub corpus: String,
    /// Template applied per chunk (or to the whole corpus when it fits).
    pub map_prompt: PromptTemplate,
    /// Template applied to the concatenated chunk summaries.
    pub combine_prompt: PromptTemplate,
    /// Model profile for the map stage.
    pub map_profile: ModelProfile,
    /// Model profile for the combine stage.
    pub combine_profile: ModelProfile,
}

impl SummaryRequest {
    /// Create a request with the built-in source-document templates.
    pub fn new(
        corpus: impl Into<String>,
        map_profile: ModelProfile,
        combine_profile: ModelProfile,
    ) -> Self {
        Self {
            corpus: corpus.into(),
            map_prompt: PromptTemplate::new(SOURCE_MAP_TEMPLATE),
            combine_prompt: PromptTemplate::new(SOURCE_COMBINE_TEMPLATE),
            map_profile,
            combine_profile,
        }
    }

    /// Replace the map-stage prompt.
    pub fn with_map_prompt(mut self, prompt: PromptTemplate) -> Self {
        self.map_prompt = prompt;
        self
    }

    /// Replace the combine-stage prompt.
    pub fn with_combine_prompt(mut self, prompt: PromptTemplate) -> Self {
        self.combine_prompt = prompt;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Summarizer
// ─────────────────────────────────────────────────────────────────────────────

/// Reduces corpora to bounded summaries via map-reduce over a completion
/// client.
///
/// The engine never retries failed completion calls, and a failure in any
/// map-stage chunk fails the whole operation once every in-flight call has
/// settled; partial summaries are never used.
pub struct Summarizer {
    client: SharedCompletionClient,
}

impl Summarizer {
    /// Create a new engine over the given completion client.
    pub fn new(client: SharedCompletionClient) -> Self {
        Self { client }
    }

    /// Reduce the request's corpus to a single summary.
    ///
    /// An empty (or whitespace-only) corpus yields an empty summary rather
    /// than an error.
    pub async fn summarize(&self, request: &SummaryRequest) -> Result<SummaryResult> {
        self.summarize_with_cancellation(request, &CancellationToken::new())
            .await
    }

    /// Like [`summarize`](Self::summarize), aborting between stages when
    /// `cancel` fires. In-flight map calls are abandoned on cancellation.
    pub async fn summarize_with_cancellation(
        &self,
        request: &SummaryRequest,
        cancel: &CancellationToken,
    ) -> Result<SummaryResult> {
        if request.corpus.trim().is_empty() {
            return Ok(String::new());
        }

        let rendered = request.map_prompt.render(&request.corpus);
        let prompt_tokens = request.map_profile.count(&rendered);
        tracing::debug!(tokens = prompt_tokens, "Map prompt token count");

        if fits(&request.map_profile, prompt_tokens) {
            if cancel.is_cancelled() {
                return Err(SummarizeError::Cancelled);
            }
            let text = self
                .client
                .complete(request.map_profile.id(), &rendered)
                .await?;
            return Ok(text);
        }

        let num_chunks = chunk_count(prompt_tokens, request.map_profile.token_budget());
        tracing::debug!(num_chunks, "Corpus exceeds map budget, chunking");

        let chunks = split_text(&request.corpus, num_chunks);
        let summaries = self
            .map_stage(&chunks, &request.map_prompt, &request.map_profile, cancel)
            .await?;
        let mut combined = summaries.join(SUMMARY_SEPARATOR);

        // Combine stage, re-applied to its own input until it fits. Assumes
        // summaries shrink their input; a model that echoes its input back
        // will keep this loop spinning.
        loop {
            let rendered = request.combine_prompt.render(&combined);
            let tokens = request.combine_profile.count(&rendered);

            if fits(&request.combine_profile, tokens) {
                if cancel.is_cancelled() {
                    return Err(SummarizeError::Cancelled);
                }
                let text = self
                    .client
                    .complete(request.combine_profile.id(), &rendered)
                    .await?;
                return Ok(text);
            }

            let num_chunks = chunk_count(tokens, request.combine_profile.token_budget());
            tracing::debug!(num_chunks, "Combine input exceeds budget, reducing again");

            let chunks = split_text(&combined, num_chunks);
            let summaries = self
                .map_stage(
                    &chunks,
                    &request.combine_prompt,
                    &request.combine_profile,
                    cancel,
                )
                .await?;
            combined = summaries.join(SUMMARY_SEPARATOR);
        }
    }

    /// Summarize every non-empty chunk concurrently, preserving chunk order.
    ///
    /// All calls are dispatched together and the stage returns only after
    /// every one has settled; the first failure then fails the stage.
    async fn map_stage(
        &self,
        chunks: &[String],
        prompt: &PromptTemplate,
        profile: &ModelProfile,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>> {
        if cancel.is_cancelled() {
            return Err(SummarizeError::Cancelled);
        }

        let calls = chunks.iter().filter(|chunk| !chunk.is_empty()).map(|chunk| {
            let rendered = prompt.render(chunk);
            async move { self.client.complete(profile.id(), &rendered).await }
        });

        let results = tokio::select! {
            _ = cancel.cancelled() => return Err(SummarizeError::Cancelled),
            results = futures::future::join_all(calls) => results,
        };

        let mut summaries = Vec::with_capacity(results.len());
        for result in results {
            summaries.push(result?);
        }
        Ok(summaries)
    }
}

/// Strict budget check: the rendered prompt plus response headroom must fit.
fn fits(profile: &ModelProfile, prompt_tokens: usize) -> bool {
    prompt_tokens + RESPONSE_HEADROOM <= profile.token_budget()
}

/// Number of chunks for an over-budget prompt.
///
/// The trailing `+ 1` biases toward smaller chunks, trading extra calls for
/// safety margin against counter drift; it is load-bearing.
fn chunk_count(prompt_tokens: usize, token_budget: usize) -> usize {
    (prompt_tokens + RESPONSE_HEADROOM).div_ceil(token_budget.max(1)) + 1
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
