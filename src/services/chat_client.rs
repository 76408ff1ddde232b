//! Chat client service
//!
//! The "send these messages, get a reply" entry point for UI code. Calls the
//! proxy, and when allowed by configuration falls back to calling upstream
//! directly. Always returns a [`ChatOutcome`]; errors never cross this boundary.

use crate::config::client::{ClientSettings, CLIENT_API_KEY_ENV};
use crate::config::settings::GenerationConfig;
use crate::handlers::CHAT_API_PATH;
use crate::models::chat::{ChatOutcome, ChatRequest, Message, UserProfile, NO_RESPONSE_PLACEHOLDER};
use crate::models::upstream::extract_error_message;
use crate::services::retry::{with_retry, RetryPolicy};
use crate::services::upstream::{
    CompletionBackend, StatusClass, UpstreamClient, UpstreamError, UpstreamOptions,
};
use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Proxy success body as the client reads it
///
/// Every field is optional so a sparse reply still counts as a success.
#[derive(Debug, Default, Deserialize)]
struct ProxyReply {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    usage: Option<serde_json::Value>,
}

impl ProxyReply {
    fn into_outcome(self) -> ChatOutcome {
        let message = self
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| NO_RESPONSE_PLACEHOLDER.to_string());
        ChatOutcome::success(message, self.usage)
    }
}

/// Chat client with proxy-first, direct-fallback delivery
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: Client,
    settings: ClientSettings,
    retry: RetryPolicy,
    /// Present only when fallback is allowed and a credential was supplied
    direct: Option<UpstreamClient>,
}

impl ChatClient {
    /// Create a new client instance
    pub fn new(settings: ClientSettings) -> Result<Self> {
        let timeout = Duration::from_secs(settings.timeout);
        let retry = RetryPolicy::new(settings.attempts, Duration::from_millis(settings.delay_ms));

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("chat-relay-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        let direct = match (&settings.direct_api_key, settings.allow_direct_fallback) {
            (Some(api_key), true) => Some(UpstreamClient::new(UpstreamOptions {
                base_url: settings.upstream_base_url.clone(),
                api_key: api_key.clone(),
                app_title: settings.app_title.clone(),
                generation: GenerationConfig::default(),
                retry: retry.clone(),
                timeout,
            })?),
            _ => None,
        };

        Ok(Self {
            client,
            settings,
            retry,
            direct,
        })
    }

    /// Send a conversation and return the assistant's reply
    ///
    /// `model` falls back to the configured default.
    pub async fn send_message(&self, messages: &[Message], model: Option<&str>) -> ChatOutcome {
        let model = model
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(self.settings.default_model.as_str());

        let proxy_error = match self.call_proxy(messages, model).await {
            Ok(reply) => return reply.into_outcome(),
            Err(message) => message,
        };

        if !self.settings.allow_direct_fallback {
            error!("Chat API error: {}", proxy_error);
            return ChatOutcome::failure(proxy_error);
        }

        warn!(
            "{} unavailable or failing; falling back to a direct upstream call: {}",
            CHAT_API_PATH, proxy_error
        );

        match self.call_direct(messages, model).await {
            Ok(outcome) => outcome,
            Err(message) => {
                error!("Direct upstream fallback failed: {}", message);
                ChatOutcome::failure(message)
            }
        }
    }

    /// Ask for career advice personalized to `profile`
    pub async fn generate_career_advice(&self, profile: &UserProfile, question: &str) -> ChatOutcome {
        let messages = [
            Message::system(career_advice_prompt(profile)),
            Message::user(question),
        ];
        self.send_message(&messages, None).await
    }

    /// Proxy endpoint URL
    pub fn proxy_url(&self) -> String {
        format!("{}{}", self.settings.proxy_base_url, CHAT_API_PATH)
    }

    async fn call_proxy(&self, messages: &[Message], model: &str) -> std::result::Result<ProxyReply, String> {
        let url = self.proxy_url();
        let body = ChatRequest {
            messages: messages.to_vec(),
            model: Some(model.to_string()),
        };

        debug!("Sending chat request to {}", url);

        let response = with_retry(&self.retry, || self.client.post(&url).json(&body).send())
            .await
            .map_err(|e| format!("Chat API request failed: {}", e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| format!("Failed to read chat API response: {}", e))?;

        if !status.is_success() {
            return Err(format!(
                "Chat API error {}: {}",
                status.as_u16(),
                extract_error_message(&text)
            ));
        }

        serde_json::from_str(&text).map_err(|e| format!("Failed to parse chat API response: {}", e))
    }

    async fn call_direct(&self, messages: &[Message], model: &str) -> std::result::Result<ChatOutcome, String> {
        let direct = self
            .direct
            .as_ref()
            .ok_or_else(|| format!("Missing {} for local fallback.", CLIENT_API_KEY_ENV))?;

        match direct.complete(&self.settings.origin, messages, model).await {
            Ok(completion) => Ok(ChatOutcome::success(completion.content, completion.usage)),
            Err(UpstreamError::Status { status, detail }) => Err(match StatusClass::of(status) {
                StatusClass::Auth => format!(
                    "Upstream auth failed in local fallback ({}). Check {}. Details: {}",
                    status.as_u16(),
                    CLIENT_API_KEY_ENV,
                    detail
                ),
                _ => format!("Upstream fallback error {}: {}", status.as_u16(), detail),
            }),
            Err(other) => Err(other.to_string()),
        }
    }
}

/// System instruction for career advice
pub fn career_advice_prompt(profile: &UserProfile) -> String {
    fn or_unspecified(value: &Option<String>) -> &str {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or("Not specified")
    }

    let name = profile
        .name
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("User");
    let interests = if profile.interests.is_empty() {
        "Not specified".to_string()
    } else {
        profile.interests.join(", ")
    };

    format!(
        "You are an expert AI career advisor. You help professionals navigate their career journey \
with personalized guidance, skill recommendations, and strategic advice.

User Profile:
- Name: {name}
- Current Title: {title}
- Location: {location}
- Interests: {interests}
- Bio: {bio}

Provide helpful, actionable career advice that is:
1. Personalized to their background and goals
2. Practical and implementable
3. Encouraging and supportive
4. Based on current industry trends
5. Specific with concrete next steps

Keep responses concise but comprehensive, around 200-300 words.",
        name = name,
        title = or_unspecified(&profile.title),
        location = or_unspecified(&profile.location),
        interests = interests,
        bio = or_unspecified(&profile.bio),
    )
}
