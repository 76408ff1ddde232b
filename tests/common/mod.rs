//! Shared helpers for integration tests

#![allow(dead_code)]

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use chat_relay::Settings;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::net::TcpListener;

/// Canned `(status, body)` replies served in order; the last one repeats
pub type Script = Vec<(u16, &'static str)>;

/// Arrival times of every request a scripted server received
pub type CallLog = Arc<Mutex<Vec<Instant>>>;

#[derive(Clone)]
struct ScriptState {
    script: Arc<Script>,
    calls: CallLog,
}

async fn scripted_reply(State(state): State<ScriptState>) -> Response {
    let index = {
        let mut calls = state.calls.lock().unwrap();
        calls.push(Instant::now());
        calls.len() - 1
    };
    let (status, body) = state.script[index.min(state.script.len() - 1)];

    (
        StatusCode::from_u16(status).unwrap(),
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}

/// Serve `router` on an ephemeral local port and return its base URL
pub async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Start a server answering POST `path` from `script`
pub async fn spawn_scripted(path: &str, script: Script) -> (String, CallLog) {
    let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
    let router = Router::new().route(path, post(scripted_reply)).with_state(ScriptState {
        script: Arc::new(script),
        calls: Arc::clone(&calls),
    });
    (serve(router).await, calls)
}

/// A base URL nothing is listening on
pub async fn unreachable_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Server settings pointed at `upstream`, with a key and a short retry delay
pub fn settings_for(upstream: &str) -> Settings {
    let mut settings = Settings::default();
    settings.upstream.api_key = Some("sk-or-test-key".to_string());
    settings.upstream.base_url = upstream.to_string();
    settings.retry.delay_ms = 10;
    settings
}

pub const COMPLETION_OK: &str = r#"{"choices":[{"message":{"role":"assistant","content":"hello"}}],"usage":{"prompt_tokens":3,"completion_tokens":1,"total_tokens":4},"model":"openai/gpt-4o-mini","provider":"OpenAI"}"#;
