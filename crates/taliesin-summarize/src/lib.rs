//! Adaptive map-reduce summarization for Taliesin.
//!
//! Data-source lookups routinely return far more text than a completion
//! model accepts in one call. This crate reduces an arbitrarily large corpus
//! to a single bounded summary:
//!
//! 1. If the rendered prompt fits the map model's budget (with response
//!    headroom reserved), one completion call produces the result directly.
//! 2. Otherwise the raw corpus is split into whitespace-aligned chunks, each
//!    chunk is summarized concurrently (the map stage), and the ordered
//!    chunk summaries are merged by a single combine call.
//! 3. If the combine input itself exceeds the combine model's budget, it is
//!    re-chunked and reduced again until it fits.
//!
//! # Core Components
//!
//! - [`split_text`]: deterministic whitespace-aligned chunker
//! - [`Summarizer`]: the engine; [`SummaryRequest`] in, summary text out
//! - [`PromptTemplate`]: `{text}` placeholder substitution for the map and
//!   combine prompts
//! - [`extract_tags`]: pulls `<tag>…</tag>` sections out of model output

pub mod chunker;
pub mod engine;
pub mod error;
pub mod prompt;

pub use chunker::split_text;
pub use engine::{RESPONSE_HEADROOM, Summarizer, SummaryRequest, SummaryResult};
pub use error::{Result, SummarizeError};
pub use prompt::{
    PromptTemplate, SOURCE_COMBINE_TEMPLATE, SOURCE_MAP_TEMPLATE, extract_tag, extract_tags,
};
