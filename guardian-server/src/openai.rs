//! OpenAI chat-completions client for review generation.

use guardian_core::review::{create_user_prompt, get_system_prompt};
use reqwest::header;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};

use crate::error::GenerationError;

const OPENAI_API_BASE: &str = "https://api.openai.com";
const USER_AGENT: &str = "PR-Guardian-AI";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Model and sampling parameters for review generation. Low temperature and
/// a bounded completion keep the output terse and near-deterministic.
const REVIEW_MODEL: &str = "gpt-4.1-mini";
const REVIEW_TEMPERATURE: f32 = 0.2;
const REVIEW_MAX_TOKENS: u32 = 700;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Clone)]
pub struct OpenAIClient {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
}

impl OpenAIClient {
    pub fn new(api_key: String) -> Self {
        Self::with_api_base(api_key, OPENAI_API_BASE.to_string())
    }

    pub fn with_api_base(api_key: String, api_base: String) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_key,
            api_base,
        }
    }

    /// Requests a review of the (already truncated by prompt assembly) diff.
    ///
    /// Single attempt: any transport or provider error is returned as-is;
    /// retry policy, if any, belongs to the caller.
    pub async fn generate_review(
        &self,
        diff: &str,
        pr_title: &str,
        pr_body: Option<&str>,
    ) -> Result<String, GenerationError> {
        let request = ChatCompletionRequest {
            model: REVIEW_MODEL.to_string(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: get_system_prompt(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: create_user_prompt(pr_title, pr_body, diff),
                },
            ],
            temperature: REVIEW_TEMPERATURE,
            max_tokens: REVIEW_MAX_TOKENS,
        };

        info!("Requesting AI review");

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.api_base))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(GenerationError::Transport)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("OpenAI API error: {} - {}", status, body);
            return Err(GenerationError::Status { status, body });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(GenerationError::Transport)?;

        let review = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(GenerationError::EmptyResponse)?;

        info!("AI review generated ({} chars)", review.len());
        Ok(review.trim().to_string())
    }
}
