//! Chat API data models
//!
//! Types exchanged between the client wrapper and the proxy

use serde::{Deserialize, Serialize};

/// Placeholder reply used when upstream returns no content
pub const NO_RESPONSE_PLACEHOLDER: &str = "No response received";

/// Message author role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Inbound chat request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Ordered conversation, must be non-empty
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Model identifier (optional, falls back to the configured default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Successful proxy reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    /// Assistant reply text
    pub message: String,
    /// Opaque token accounting from upstream
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

/// Error response body: `{"error": {"message": ...}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail { message: message.into() },
        }
    }
}

/// Uniform result handed to UI code by the chat client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatOutcome {
    Success {
        success: Success,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        usage: Option<serde_json::Value>,
    },
    Failure {
        success: Failure,
        error: String,
    },
}

/// `true` marker for successful outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "bool", into = "bool")]
pub struct Success;

/// `false` marker for failed outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "bool", into = "bool")]
pub struct Failure;

impl TryFrom<bool> for Success {
    type Error = &'static str;

    fn try_from(value: bool) -> Result<Self, Self::Error> {
        if value { Ok(Success) } else { Err("expected success: true") }
    }
}

impl From<Success> for bool {
    fn from(_: Success) -> bool {
        true
    }
}

impl TryFrom<bool> for Failure {
    type Error = &'static str;

    fn try_from(value: bool) -> Result<Self, Self::Error> {
        if value { Err("expected success: false") } else { Ok(Failure) }
    }
}

impl From<Failure> for bool {
    fn from(_: Failure) -> bool {
        false
    }
}

impl ChatOutcome {
    pub fn success(message: impl Into<String>, usage: Option<serde_json::Value>) -> Self {
        ChatOutcome::Success {
            success: Success,
            message: message.into(),
            usage,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        ChatOutcome::Failure {
            success: Failure,
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ChatOutcome::Success { .. })
    }

    /// Reply text on success
    pub fn message(&self) -> Option<&str> {
        match self {
            ChatOutcome::Success { message, .. } => Some(message),
            ChatOutcome::Failure { .. } => None,
        }
    }

    /// Error text on failure
    pub fn error(&self) -> Option<&str> {
        match self {
            ChatOutcome::Success { .. } => None,
            ChatOutcome::Failure { error, .. } => Some(error),
        }
    }
}

/// Profile summary used to personalize career advice
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub bio: Option<String>,
}
