//! Data models module
//!
//! Defines request and response data structures for the chat proxy and the upstream API

pub mod chat;
pub mod upstream;

pub use chat::{
    ChatOutcome, ChatReply, ChatRequest, ErrorBody, Message, Role, UserProfile,
    NO_RESPONSE_PLACEHOLDER,
};
pub use upstream::{CompletionRequest, CompletionResponse};
