//! Anthropic Messages API provider.
//!
//! HTTP 429, 503 and 529 as well as `overloaded_error` / `rate_limit_error`
//! bodies map to [`ProviderError::Overloaded`]. A request timeout does too.
//! Everything else is a non-retryable [`ProviderError::Other`].

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tabforge_core::ProviderConfig;
use tracing::debug;

use crate::provider::{CodeGenerator, ProviderError};

const API_VERSION: &str = "2023-06-01";

const SYSTEM_PROMPT: &str = "You write table transformation programs in the restricted \
language described by the user. Reply with the program only.";

// =============================================================================
// API Request/Response Types
// =============================================================================

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<ApiMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}

// =============================================================================
// Provider
// =============================================================================

pub struct AnthropicGenerator {
    client: Client,
    api_key: String,
    config: ProviderConfig,
}

impl AnthropicGenerator {
    pub fn new(api_key: impl Into<String>, config: ProviderConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            config,
        }
    }

    /// Read the API key from the environment variable named in `config`
    pub fn from_env(config: ProviderConfig) -> Result<Self, ProviderError> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| ProviderError::Other(format!("{} is not set", config.api_key_env)))?;
        if api_key.trim().is_empty() {
            return Err(ProviderError::Other(format!("{} is empty", config.api_key_env)));
        }
        Ok(Self::new(api_key, config))
    }

    fn endpoint(&self) -> String {
        format!("{}/messages", self.config.base_url.trim_end_matches('/'))
    }
}

/// Classify a non-success response
pub(crate) fn classify_failure(status: StatusCode, body: &str) -> ProviderError {
    let api_error = serde_json::from_str::<ErrorEnvelope>(body).ok().map(|e| e.error);
    let overloaded_body = api_error
        .as_ref()
        .map(|e| matches!(e.error_type.as_str(), "overloaded_error" | "rate_limit_error"))
        .unwrap_or(false);
    let message = api_error
        .map(|e| format!("{}: {}", e.error_type, e.message))
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

    match status.as_u16() {
        429 | 503 | 529 => ProviderError::Overloaded(message),
        _ if overloaded_body => ProviderError::Overloaded(message),
        _ => ProviderError::Other(message),
    }
}

#[async_trait]
impl CodeGenerator for AnthropicGenerator {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn invoke(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            system: SYSTEM_PROMPT,
            messages: vec![ApiMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Overloaded(format!("request timed out: {}", e))
                } else {
                    ProviderError::Other(format!("request failed: {}", e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Other(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(classify_failure(status, &body));
        }

        let parsed: MessagesResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::Other(format!("unexpected response: {}", e)))?;
        let text: String = parsed
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n");

        if text.trim().is_empty() {
            return Err(ProviderError::Other("response contained no text".to_string()));
        }
        debug!(model = %self.config.model, chars = text.len(), "provider response received");
        Ok(text)
    }
}
