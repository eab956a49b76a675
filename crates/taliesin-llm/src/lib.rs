//! Completion-model access for Taliesin.
//!
//! This crate defines the seam between Taliesin and the completion services
//! it calls: the [`CompletionClient`] trait, the [`ModelProfile`] value that
//! carries a model's identity, context budget and token counter, and an
//! OpenAI-compatible HTTP backend.
//!
//! # Core Components
//!
//! - [`CompletionClient`]: `complete(model, prompt) -> text`, the only
//!   operation the rest of the system needs from a completion service
//! - [`ModelProfile`]: model id + token budget + counter, passed explicitly
//!   into every call that does budget arithmetic
//! - [`MockCompletion`]: scripted client for deterministic tests
//! - [`OpenAiClient`]: reqwest-backed client for OpenAI-compatible APIs

pub mod client;
pub mod counter;
pub mod error;
pub mod openai;
pub mod profile;

// Re-export core types
pub use client::{
    CompletionClient, CompletionRecord, MockCompletion, ScriptedCompletion, SharedCompletionClient,
};
pub use counter::{HeuristicCounter, TokenCounter, WordCounter};
pub use error::{CompletionError, Result};
pub use openai::{OpenAiClient, OpenAiConfig};
pub use profile::ModelProfile;
