//! Upstream credential smoke test
//!
//! Sends a two-message conversation straight to the upstream API and prints
//! the status. Reads `CHAT_DIRECT_API_KEY`, then `OPENROUTER_API_KEY`.

use anyhow::{Context, Result};
use chat_relay::config::settings::{GenerationConfig, DEFAULT_MODEL, DEFAULT_UPSTREAM_BASE_URL};
use chat_relay::models::Message;
use chat_relay::services::{
    CompletionBackend, RetryPolicy, UpstreamClient, UpstreamError, UpstreamOptions,
};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string()))
        .with_target(false)
        .init();

    let api_key = std::env::var("CHAT_DIRECT_API_KEY")
        .or_else(|_| std::env::var("OPENROUTER_API_KEY"))
        .context("Set CHAT_DIRECT_API_KEY or OPENROUTER_API_KEY")?;
    let model = std::env::var("CHAT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
    let base_url =
        std::env::var("OPENROUTER_BASE_URL").unwrap_or_else(|_| DEFAULT_UPSTREAM_BASE_URL.to_string());

    let client = UpstreamClient::new(UpstreamOptions {
        base_url,
        api_key,
        app_title: "Key Test".to_string(),
        generation: GenerationConfig {
            temperature: 0.1,
            max_tokens: 10,
        },
        // single attempt: a retry would hide the first status
        retry: RetryPolicy::new(1, Duration::ZERO),
        timeout: Duration::from_secs(30),
    })?;

    let messages = [
        Message::system("You are a helpful assistant."),
        Message::user("Say ok."),
    ];

    match client.complete("http://localhost:5173", &messages, &model).await {
        Ok(completion) => {
            println!("status: {}", completion.status);
            println!("model: {}", completion.model.as_deref().unwrap_or(model.as_str()));
            println!("response: {}", completion.content);
            Ok(())
        }
        Err(UpstreamError::Status { status, detail }) => {
            eprintln!("status: {}", status.as_u16());
            eprintln!("error: {}", detail);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("request failed: {}", e);
            std::process::exit(1);
        }
    }
}
