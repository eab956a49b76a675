//! HTTP route handlers.

pub mod health;
pub mod prompt;

pub use health::{HealthResponse, PingResponse, health, health_routes, ping};
pub use prompt::{ContentItem, ConversationTurn, PromptRequest, flatten_conversation, prompt_handler};
