//! OpenAI-compatible Chat Completions provider.
//!
//! This module provides an implementation of `LlmProvider` for any vendor
//! exposing the `OpenAI` Chat Completions wire format. The service fronts
//! two such vendors (a primary and a cheaper backup), so the base URL,
//! model and request timeout are all per-instance.

use crate::llm::{ChatOutcome, ChatRequest, ChatResponse, LlmProvider, Turn, Usage};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// LLM provider speaking the `OpenAI` Chat Completions API.
#[derive(Clone)]
pub struct OpenAiCompatProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    label: &'static str,
}

impl OpenAiCompatProvider {
    /// Create a new provider with the specified API key and default model.
    #[must_use]
    pub fn new(api_key: String, model: String) -> Self {
        Self::with_base_url(api_key, model, DEFAULT_BASE_URL.to_owned(), DEFAULT_TIMEOUT)
    }

    /// Create a provider against a custom `OpenAI`-compatible endpoint with a
    /// per-request timeout.
    #[must_use]
    pub fn with_base_url(
        api_key: String,
        model: String,
        base_url: String,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key,
            model,
            base_url,
            label: "openai",
        }
    }

    /// Set the label reported by [`LlmProvider::provider`], used to tell
    /// primary and backup endpoints apart in logs.
    #[must_use]
    pub const fn labeled(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatProvider {
    async fn chat(&self, request: ChatRequest) -> Result<ChatOutcome> {
        let model = request.model.as_deref().unwrap_or(&self.model);
        let messages = build_api_messages(&request);

        let api_request = ApiChatRequest {
            model,
            messages: &messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        log::debug!(
            "[{}] chat request model={} max_tokens={} message_count={}",
            self.label,
            model,
            request.max_tokens,
            messages.len()
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&api_request)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("request failed: {e}"))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| anyhow::anyhow!("failed to read response body: {e}"))?;

        log::debug!(
            "[{}] chat response status={} body_len={}",
            self.label,
            status,
            bytes.len()
        );

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Ok(ChatOutcome::RateLimited);
        }

        if status.is_server_error() {
            let body = String::from_utf8_lossy(&bytes);
            log::error!("[{}] server error status={status} body={body}", self.label);
            return Ok(ChatOutcome::ServerError(body.into_owned()));
        }

        if status.is_client_error() {
            let body = String::from_utf8_lossy(&bytes);
            log::warn!("[{}] client error status={status} body={body}", self.label);
            return Ok(ChatOutcome::InvalidRequest(body.into_owned()));
        }

        let api_response: ApiChatResponse = serde_json::from_slice(&bytes)
            .map_err(|e| anyhow::anyhow!("failed to parse response: {e}"))?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("no choices in response"))?;

        let text = choice.message.content.unwrap_or_default();
        if text.is_empty() {
            // Some compatible vendors return 200 with an empty body on
            // overload. Treat it like any other malformed payload.
            anyhow::bail!("empty content in response");
        }

        Ok(ChatOutcome::Success(ChatResponse {
            id: api_response.id.unwrap_or_default(),
            text,
            model: api_response.model.unwrap_or_else(|| model.to_owned()),
            usage: api_response
                .usage
                .map(|u| Usage {
                    input_tokens: u.prompt_tokens,
                    output_tokens: u.completion_tokens,
                })
                .unwrap_or_default(),
        }))
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn provider(&self) -> &'static str {
        self.label
    }
}

fn build_api_messages(request: &ChatRequest) -> Vec<Turn> {
    let mut messages = Vec::with_capacity(request.messages.len() + 1);

    // The system prompt goes first as its own message in the OpenAI format.
    if !request.system.is_empty() {
        messages.push(Turn::system(request.system.clone()));
    }

    messages.extend(request.messages.iter().cloned());
    messages
}

// ============================================================================
// API Request/Response Types
// ============================================================================

#[derive(serde::Serialize)]
struct ApiChatRequest<'a> {
    model: &'a str,
    messages: &'a [Turn],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ApiChatResponse {
    id: Option<String>,
    choices: Vec<ApiChoice>,
    model: Option<String>,
    usage: Option<ApiUsage>,
}

#[derive(Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
}

#[derive(Deserialize)]
struct ApiResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}
