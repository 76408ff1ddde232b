//! Service layer module
//!
//! Contains the retry policy, the upstream API client, and the chat client wrapper

pub mod chat_client;
pub mod retry;
pub mod upstream;

pub use chat_client::{career_advice_prompt, ChatClient};
pub use retry::{with_retry, RetryPolicy};
pub use upstream::{Completion, CompletionBackend, UpstreamClient, UpstreamError, UpstreamOptions};
