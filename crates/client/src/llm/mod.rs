//! Language model completion client.
//!
//! ### Contract
//!
//! - One prompt in, one text reply out (`CompletionClient::complete`).
//! - Deterministic sampling (temperature 0) so cached replies stay
//!   representative of a fresh call.
//! - Rate limits, timeouts and 5xx replies are retried with exponential
//!   backoff; auth and other 4xx failures are returned at once.
//!
//! ### Anthropic Messages API
//!
//! - **Endpoint**: `{base_url}/messages`
//! - **Authentication**: `x-api-key` header, `anthropic-version: 2023-06-01`.

pub mod error;

pub use error::LlmError;

use async_trait::async_trait;
use lessonlens_core::AppConfig;
use reqwest::header;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const API_VERSION: &str = "2023-06-01";

/// First retry delay; doubled on each further attempt.
const BASE_BACKOFF: Duration = Duration::from_millis(500);

/// Text completion over a single user prompt.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError>;
}

/// Anthropic client configuration.
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub api_key: String,
    /// Base URL (default: https://api.anthropic.com/v1).
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub user_agent: String,
}

impl AnthropicConfig {
    pub fn from_app_config(config: &AppConfig) -> Result<Self, LlmError> {
        let api_key = config
            .require_anthropic_api_key()
            .map_err(|_| LlmError::MissingApiKey)?
            .to_string();

        Ok(Self {
            api_key,
            base_url: config.anthropic_base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            timeout: config.llm_timeout(),
            max_retries: config.llm_max_retries,
            user_agent: config.user_agent.clone(),
        })
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

impl MessagesResponse {
    fn text(&self) -> String {
        self.content
            .iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text.as_str())
            .collect::<Vec<_>>()
            .join("")
    }
}

/// Anthropic Messages API client.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    config: AnthropicConfig,
}

impl AnthropicClient {
    pub fn new(config: AnthropicConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() {
            return Err(LlmError::MissingApiKey);
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .use_rustls_tls()
            .build()
            .map_err(LlmError::from)?;

        Ok(Self { http, config })
    }

    pub fn from_app_config(config: &AppConfig) -> Result<Self, LlmError> {
        Self::new(AnthropicConfig::from_app_config(config)?)
    }

    async fn send(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError> {
        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens,
            temperature: 0.0,
            messages: [Message { role: "user", content: prompt }],
        };

        let response = self
            .http
            .post(format!("{}/messages", self.config.base_url))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status == 401 || status == 403 {
            return Err(LlmError::AuthError);
        }
        if status == 429 {
            return Err(LlmError::RateLimited);
        }
        if status.is_client_error() || status.is_server_error() {
            return Err(LlmError::HttpError { status: status.as_u16() });
        }

        let bytes = response.bytes().await?;
        let body: MessagesResponse = serde_json::from_slice(&bytes).map_err(|e| LlmError::Parse(e.to_string()))?;

        if let Some(usage) = &body.usage {
            tracing::debug!(input_tokens = usage.input_tokens, output_tokens = usage.output_tokens, "completion usage");
        }

        Ok(body.text())
    }
}

#[async_trait]
impl CompletionClient for AnthropicClient {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError> {
        let start = Instant::now();
        let mut attempt = 0;

        loop {
            match self.send(prompt, max_tokens).await {
                Ok(text) => {
                    tracing::debug!(model = %self.config.model, attempt, "completion in {:?}", start.elapsed());
                    return Ok(text);
                }
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = BASE_BACKOFF * 2u32.pow(attempt);
                    tracing::warn!(attempt, "completion failed, retrying in {:?}: {e}", delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
