//! OpenAI-compatible chat completion backend.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use scribe_core::{ChatBackend, ChatMessage, ChatOutcome, Error, Result, TokenUsage};

use crate::config::UpstreamConfig;

/// Request body for the chat completions endpoint.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    stream: bool,
}

/// Response from the chat completions endpoint.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: i64,
    #[serde(default)]
    completion_tokens: i64,
    #[serde(default)]
    total_tokens: i64,
}

/// Error envelope returned by OpenAI-compatible servers.
#[derive(Debug, Deserialize)]
struct UpstreamErrorResponse {
    error: UpstreamErrorBody,
}

#[derive(Debug, Deserialize)]
struct UpstreamErrorBody {
    message: String,
}

/// Classify a non-success upstream status into the gateway error taxonomy.
///
/// Only "too many requests" is transient; every other status is a permanent
/// failure surfaced immediately.
pub(crate) fn classify_status(status: StatusCode, message: String) -> Error {
    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            Error::UpstreamRateLimited(format!("upstream returned 429: {}", message))
        }
        StatusCode::PAYLOAD_TOO_LARGE => Error::PayloadTooLarge(message),
        _ => Error::Upstream(format!("upstream returned {}: {}", status, message)),
    }
}

/// Extract the error message from a non-success upstream response body.
pub(crate) async fn upstream_error_message(response: reqwest::Response) -> String {
    let body = response.text().await.unwrap_or_default();
    serde_json::from_str::<UpstreamErrorResponse>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}

/// OpenAI-compatible chat completion backend.
pub struct ChatCompletionBackend {
    client: Client,
    config: UpstreamConfig,
}

impl ChatCompletionBackend {
    /// Create a new backend with the given configuration.
    pub fn new(config: UpstreamConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.chat_timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    /// Get the current configuration.
    pub fn config(&self) -> &UpstreamConfig {
        &self.config
    }

    fn build_request(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint);
        let mut req = self.client.post(&url);
        if let Some(ref api_key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }
        req.header("Content-Type", "application/json")
    }
}

#[async_trait]
impl ChatBackend for ChatCompletionBackend {
    async fn chat_complete(
        &self,
        messages: &[ChatMessage],
        model: &str,
        temperature: f32,
    ) -> Result<ChatOutcome> {
        debug!(
            subsystem = "upstream",
            component = "chat",
            op = "chat_complete",
            model,
            message_count = messages.len(),
            "Chat completion request"
        );

        let request = ChatCompletionRequest {
            model,
            messages,
            temperature,
            stream: false,
        };

        let response = self
            .build_request("/chat/completions")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = upstream_error_message(response).await;
            return Err(classify_status(status, message));
        }

        let result: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("Failed to parse chat response: {}", e)))?;

        let content = result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::Upstream("Chat response contained no choices".to_string()))?;

        let usage = result
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        debug!(
            subsystem = "upstream",
            component = "chat",
            op = "chat_complete",
            model,
            response_len = content.len(),
            token_count = usage.total_tokens,
            "Chat completion succeeded"
        );

        Ok(ChatOutcome { content, usage })
    }
}
