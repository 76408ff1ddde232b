//! Upstream chat-completion client
//!
//! Encapsulates HTTP communication with the upstream LLM API. Used both by the
//! proxy handler and by the chat client's direct fallback.

use crate::config::settings::{GenerationConfig, Settings};
use crate::models::chat::Message;
use crate::models::upstream::{extract_error_message, CompletionRequest, CompletionResponse};
use crate::services::retry::{with_retry, RetryPolicy};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

/// Upstream failure kinds
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// Upstream answered with a non-2xx status
    #[error("upstream returned {status}: {detail}")]
    Status { status: StatusCode, detail: String },

    /// The request never produced a response
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// A 2xx body that could not be decoded
    #[error("failed to decode upstream response: {0}")]
    Decode(String),
}

/// Classification of a non-2xx upstream status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// 401 or 403
    Auth,
    /// 429 or 5xx
    Transient,
    Other,
}

impl StatusClass {
    pub fn of(status: StatusCode) -> Self {
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            StatusClass::Auth
        } else if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            StatusClass::Transient
        } else {
            StatusClass::Other
        }
    }
}

/// Normalized successful completion
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// HTTP status of the final attempt
    pub status: u16,
    pub content: String,
    pub usage: Option<serde_json::Value>,
    pub model: Option<String>,
    pub provider: Option<String>,
}

impl Completion {
    fn from_response(status: StatusCode, response: CompletionResponse) -> Self {
        Self {
            status: status.as_u16(),
            content: response.reply_text(),
            usage: response.usage,
            model: response.model,
            provider: response.provider,
        }
    }
}

/// Seam between request handling and the network
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Send a conversation upstream, attributing the call to `referer`
    async fn complete(
        &self,
        referer: &str,
        messages: &[Message],
        model: &str,
    ) -> Result<Completion, UpstreamError>;
}

/// Upstream client configuration
#[derive(Debug, Clone)]
pub struct UpstreamOptions {
    pub base_url: String,
    pub api_key: String,
    pub app_title: String,
    pub generation: GenerationConfig,
    pub retry: RetryPolicy,
    pub timeout: Duration,
}

impl UpstreamOptions {
    /// Options for the server-side proxy, if a credential is configured
    pub fn from_settings(settings: &Settings) -> Option<Self> {
        let api_key = settings.upstream.api_key.clone().filter(|k| !k.is_empty())?;

        Some(Self {
            base_url: settings.upstream.base_url.clone(),
            api_key,
            app_title: settings.upstream.app_title.clone(),
            generation: settings.generation.clone(),
            retry: RetryPolicy::from(&settings.retry),
            timeout: Duration::from_secs(settings.upstream.timeout),
        })
    }
}

/// Upstream API client
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    options: UpstreamOptions,
}

impl UpstreamClient {
    /// Create a new client instance
    pub fn new(options: UpstreamOptions) -> Result<Self> {
        let client = Client::builder()
            .timeout(options.timeout)
            .user_agent(concat!("chat-relay/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, options })
    }

    /// Chat completion endpoint
    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.options.base_url.trim_end_matches('/'))
    }

    fn build_request(&self, messages: &[Message], model: &str) -> CompletionRequest {
        CompletionRequest {
            model: model.to_string(),
            messages: messages.to_vec(),
            temperature: self.options.generation.temperature,
            max_tokens: self.options.generation.max_tokens,
            stream: false,
        }
    }
}

#[async_trait]
impl CompletionBackend for UpstreamClient {
    async fn complete(
        &self,
        referer: &str,
        messages: &[Message],
        model: &str,
    ) -> Result<Completion, UpstreamError> {
        let url = self.endpoint();
        let body = self.build_request(messages, model);

        debug!(model = %model, messages = messages.len(), "Sending upstream chat completion request");

        let response = with_retry(&self.options.retry, || {
            self.client
                .post(&url)
                .bearer_auth(&self.options.api_key)
                .header("Content-Type", "application/json")
                .header("HTTP-Referer", referer)
                .header("X-Title", &self.options.app_title)
                .json(&body)
                .send()
        })
        .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let detail = if text.trim().is_empty() {
                status.canonical_reason().unwrap_or("no response body").to_string()
            } else {
                extract_error_message(&text)
            };
            error!(status = status.as_u16(), detail = %detail, "Upstream API error");
            return Err(UpstreamError::Status { status, detail });
        }

        let parsed: CompletionResponse =
            serde_json::from_str(&text).map_err(|e| UpstreamError::Decode(e.to_string()))?;

        debug!(status = status.as_u16(), "Upstream request completed successfully");
        Ok(Completion::from_response(status, parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(base_url: &str) -> UpstreamOptions {
        UpstreamOptions {
            base_url: base_url.to_string(),
            api_key: "sk-or-test".to_string(),
            app_title: "Test".to_string(),
            generation: GenerationConfig::default(),
            retry: RetryPolicy::new(2, Duration::from_millis(1)),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_status_classes() {
        assert_eq!(StatusClass::of(StatusCode::UNAUTHORIZED), StatusClass::Auth);
        assert_eq!(StatusClass::of(StatusCode::FORBIDDEN), StatusClass::Auth);
        assert_eq!(StatusClass::of(StatusCode::TOO_MANY_REQUESTS), StatusClass::Transient);
        assert_eq!(StatusClass::of(StatusCode::BAD_GATEWAY), StatusClass::Transient);
        assert_eq!(StatusClass::of(StatusCode::NOT_FOUND), StatusClass::Other);
    }

    #[test]
    fn test_endpoint_and_body() {
        let client = UpstreamClient::new(options("https://openrouter.ai/api/v1/")).unwrap();
        assert_eq!(client.endpoint(), "https://openrouter.ai/api/v1/chat/completions");

        let body = client.build_request(&[Message::user("hi")], "openai/gpt-4o-mini");
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "openai/gpt-4o-mini");
        assert_eq!(json["max_tokens"], 500);
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn test_options_require_key() {
        let mut settings = Settings::default();
        assert!(UpstreamOptions::from_settings(&settings).is_none());

        settings.upstream.api_key = Some("sk-or-test".to_string());
        let opts = UpstreamOptions::from_settings(&settings).unwrap();
        assert_eq!(opts.retry.delay, Duration::from_millis(600));
    }

    #[tokio::test]
    async fn test_complete_against_mock() {
        use httpmock::prelude::*;

        let server = MockServer::start_async().await;
        let mock = server.mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .header("authorization", "Bearer sk-or-test")
                .header("http-referer", "https://app.example.com")
                .header("x-title", "Test");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"choices":[{"message":{"content":"hello"}}],"usage":{"total_tokens":5},"model":"m","provider":"p"}"#);
        }).await;

        let client = UpstreamClient::new(options(&server.base_url())).unwrap();
        let completion = client
            .complete("https://app.example.com", &[Message::user("hi")], "m")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(completion.status, 200);
        assert_eq!(completion.content, "hello");
        assert_eq!(completion.provider.as_deref(), Some("p"));
        assert_eq!(completion.usage, Some(serde_json::json!({"total_tokens": 5})));
    }

    #[tokio::test]
    async fn test_decode_failure() {
        use httpmock::prelude::*;

        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200).body("not json");
            })
            .await;

        let client = UpstreamClient::new(options(&server.base_url())).unwrap();
        let result = client.complete("r", &[Message::user("hi")], "m").await;
        assert!(matches!(result, Err(UpstreamError::Decode(_))));
    }
}
