//! Client for the generative language model used for machine translation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

pub const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 8192;

#[derive(Debug, Clone, Error)]
pub enum LanguageModelError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("rate limited")]
    RateLimited,
    #[error("invalid api key")]
    InvalidApiKey,
    #[error("json error: {0}")]
    Serde(String),
    #[error("empty response from model")]
    EmptyResponse,
    #[error("missing api key: ANTHROPIC_API_KEY environment variable not set")]
    MissingApiKey,
}

/// Text-in, text-out completion. Implemented by the HTTP client and by test doubles.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str, system: Option<&str>) -> Result<String, LanguageModelError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

impl MessagesResponse {
    fn text(&self) -> Option<&str> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            ContentBlock::Other => None,
        })
    }
}

/// Settings for [`ClaudeClient`]
#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub api_key: SecretString,
    pub model: String,
    pub api_url: String,
    pub timeout: Duration,
    pub max_tokens: u32,
}

impl ModelSettings {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            model: DEFAULT_MODEL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(120),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// Messages API client. Calls are made once; failures are returned to the caller as-is.
#[derive(Debug, Clone)]
pub struct ClaudeClient {
    http: Client,
    settings: ModelSettings,
}

impl ClaudeClient {
    pub fn new(settings: ModelSettings) -> Result<Self, LanguageModelError> {
        let http = Client::builder()
            .timeout(settings.timeout)
            .user_agent(concat!("travel-community/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LanguageModelError::Transport(e.to_string()))?;

        Ok(Self { http, settings })
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }
}

#[async_trait]
impl LanguageModel for ClaudeClient {
    async fn complete(&self, prompt: &str, system: Option<&str>) -> Result<String, LanguageModelError> {
        let request = MessagesRequest {
            model: &self.settings.model,
            max_tokens: self.settings.max_tokens,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            system,
        };

        let res = self
            .http
            .post(&self.settings.api_url)
            .header("x-api-key", self.settings.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let response = match res.status() {
            s if s.is_success() => res
                .json::<MessagesResponse>()
                .await
                .map_err(|e| LanguageModelError::Serde(e.to_string()))?,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(LanguageModelError::InvalidApiKey);
            }
            StatusCode::TOO_MANY_REQUESTS => return Err(LanguageModelError::RateLimited),
            s => {
                let status = s.as_u16();
                let body = res.text().await.unwrap_or_default();
                error!(status = status, "Language model request failed");
                return Err(LanguageModelError::Http { status, body });
            }
        };

        if let Some(usage) = &response.usage {
            debug!(
                model = %self.settings.model,
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                stop_reason = ?response.stop_reason,
                "Language model call completed"
            );
        }

        match response.text() {
            Some(text) if !text.trim().is_empty() => Ok(text.to_string()),
            _ => Err(LanguageModelError::EmptyResponse),
        }
    }
}

/// Stand-in used when no API key is configured; every call fails with `MissingApiKey`
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredModel;

#[async_trait]
impl LanguageModel for UnconfiguredModel {
    async fn complete(&self, _prompt: &str, _system: Option<&str>) -> Result<String, LanguageModelError> {
        Err(LanguageModelError::MissingApiKey)
    }
}

fn map_reqwest_error(e: reqwest::Error) -> LanguageModelError {
    if e.is_timeout() {
        LanguageModelError::Timeout
    } else {
        LanguageModelError::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_text_skips_non_text_blocks() {
        let json = r#"{
            "content": [
                {"type": "thinking", "thinking": "..."},
                {"type": "text", "text": "{\"title\": \"Hola\"}"}
            ],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 10, "output_tokens": 5}
        }"#;
        let response: MessagesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text(), Some(r#"{"title": "Hola"}"#));
    }

    #[test]
    fn test_request_omits_empty_system() {
        let request = MessagesRequest {
            model: DEFAULT_MODEL,
            max_tokens: 16,
            messages: vec![],
            system: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("system").is_none());
    }

    #[tokio::test]
    async fn test_unconfigured_model_fails() {
        let err = UnconfiguredModel.complete("hi", None).await.unwrap_err();
        assert!(matches!(err, LanguageModelError::MissingApiKey));
    }

    #[test]
    fn test_settings_defaults() {
        let settings = ModelSettings::new(SecretString::from("sk-test"));
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert_eq!(settings.timeout, Duration::from_secs(120));
    }
}
