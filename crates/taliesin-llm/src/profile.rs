//! Model profiles.
//!
//! A [`ModelProfile`] bundles everything budget arithmetic needs to know
//! about one completion model: its identifier, its context-window budget and
//! its token counter. Profiles are plain values passed explicitly into every
//! call that needs them; there is no process-wide model registry.

use std::sync::Arc;

use crate::counter::{HeuristicCounter, TokenCounter};

/// A completion model's identity, budget and token counter.
///
/// Read-only after construction and cheap to clone (the counter is shared).
#[derive(Clone)]
pub struct ModelProfile {
    id: String,
    token_budget: usize,
    counter: Arc<dyn TokenCounter>,
}

impl ModelProfile {
    /// Create a profile with the default heuristic counter.
    pub fn new(id: impl Into<String>, token_budget: usize) -> Self {
        Self {
            id: id.into(),
            token_budget,
            counter: Arc::new(HeuristicCounter::new()),
        }
    }

    /// Replace the token counter.
    pub fn with_counter(mut self, counter: Arc<dyn TokenCounter>) -> Self {
        self.counter = counter;
        self
    }

    /// The model identifier sent to the completion service.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The model's context-window budget in tokens.
    pub fn token_budget(&self) -> usize {
        self.token_budget
    }

    /// Count tokens for `text` with this model's counter.
    pub fn count(&self, text: &str) -> usize {
        self.counter.count(text)
    }
}

impl std::fmt::Debug for ModelProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelProfile")
            .field("id", &self.id)
            .field("token_budget", &self.token_budget)
            .finish_non_exhaustive()
    }
}
