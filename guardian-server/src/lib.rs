pub mod config;
pub mod error;
pub mod github;
pub mod openai;
pub mod pipeline;
pub mod webhook;

use github::GitHubClient;
use openai::OpenAIClient;

/// Shared by all request handlers. Everything here is immutable for the
/// process lifetime; per-request values (tokens, diffs, reviews) live on the
/// stack of the handling task.
pub struct AppState {
    pub github_client: GitHubClient,
    pub openai_client: OpenAIClient,
    pub webhook_secret: String,
    pub allow_unsigned_webhooks: bool,
}

/// Delivery id used to correlate log lines for one webhook request.
#[derive(Debug, Clone)]
pub struct CorrelationId(pub String);
