//! Shared application state.

use std::sync::Arc;

use taliesin_agent::RequestRunner;

use crate::config::ServerConfig;

/// State shared by all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The request runner hosting the reasoning loop.
    pub runner: Arc<RequestRunner>,
    /// Server configuration.
    pub config: ServerConfig,
}

impl AppState {
    /// Create application state.
    pub fn new(runner: RequestRunner, config: ServerConfig) -> Self {
        Self {
            runner: Arc::new(runner),
            config,
        }
    }
}
