//! Logging utilities
//!
//! Subscriber setup and truncated message summaries for debug logs

use crate::config::settings::LoggingConfig;
use crate::models::chat::{Message, Role};
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber
///
/// `json` emits one JSON object per line; anything else is human readable.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber: Box<dyn tracing::Subscriber + Send + Sync> = if config.format == "json" {
        Box::new(
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .finish(),
        )
    } else {
        Box::new(
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .finish(),
        )
    };

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))
}

/// Truncate a string with a note about original length
fn truncate_content(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let kept: String = s.chars().take(max_len).collect();
        format!("{}... ({} chars truncated)", kept, s.chars().count() - max_len)
    } else {
        s.to_string()
    }
}

/// Create a filtered summary of a chat request for logging
pub fn create_request_log_summary(messages: &[Message], model: &str) -> serde_json::Value {
    let messages: Vec<serde_json::Value> = messages
        .iter()
        .map(|msg| {
            // System prompts are long and repetitive
            let max_len = if msg.role == Role::System { 100 } else { 200 };
            serde_json::json!({ "role": msg.role, "content": truncate_content(&msg.content, max_len) })
        })
        .collect();

    serde_json::json!({
        "model": model,
        "messages": messages,
    })
}
