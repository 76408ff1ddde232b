//! Chat proxy handler
//!
//! Receives chat requests, attaches the server-held credential and forwards
//! them upstream. Every failure is converted into a `{"error": {"message"}}`
//! body; nothing escapes as a panic or an unhandled error.

use crate::handlers::AppState;
use crate::middleware::logging::header_str;
use crate::models::chat::{ChatReply, ChatRequest};
use crate::utils::error::{AppError, AppResult};
use crate::utils::logging::create_request_log_summary;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Path the chat proxy is mounted at
pub const CHAT_API_PATH: &str = "/api/chat";

/// Attribution host used when nothing better is known
const FALLBACK_REFERER_HOST: &str = "localhost";

/// Handle chat requests
///
/// ANY /api/chat
///
/// Only POST is accepted; the method check lives here so the 405 carries the
/// same JSON error body as every other failure.
pub async fn handle_chat(
    State(state): State<Arc<AppState>>,
    method: Method,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    match process_chat(&state, &method, &headers, body).await {
        Ok(reply) => Json(reply).into_response(),
        Err(err) => {
            if err.is_pre_flight() {
                debug!("Chat request rejected before any upstream call: {}", err.error_type());
            }
            err.into_response()
        }
    }
}

async fn process_chat(
    state: &AppState,
    method: &Method,
    headers: &HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> AppResult<ChatReply> {
    if *method != Method::POST {
        return Err(AppError::MethodNotAllowed);
    }

    let backend = state.backend.as_ref().ok_or_else(|| {
        AppError::Configuration("Missing OPENROUTER_API_KEY on server".to_string())
    })?;

    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge {
                limit: state.settings.request.max_request_size,
            }
        } else {
            AppError::Validation(format!("Failed to read request body: {}", rejection.body_text()))
        }
    })?;

    let request = parse_chat_request(&body)?;
    let model = request
        .model
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(state.settings.upstream.default_model.as_str())
        .to_string();

    let referer = resolve_referer(state.settings.upstream.deployment_host.as_deref(), headers);

    if let Ok(summary) = serde_json::to_string_pretty(&create_request_log_summary(&request.messages, &model)) {
        debug!("📥 Chat request (referer {}):\n{}", referer, summary);
    }

    let completion = backend.complete(&referer, &request.messages, &model).await?;

    info!(
        model = completion.model.as_deref().unwrap_or(model.as_str()),
        provider = completion.provider.as_deref().unwrap_or("unknown"),
        "Chat completion succeeded"
    );

    Ok(ChatReply {
        message: completion.content,
        usage: completion.usage,
        model: completion.model,
        provider: completion.provider,
    })
}

/// Parse and validate the request body
///
/// Accepts a JSON object, or a JSON string whose contents are the object.
pub fn parse_chat_request(body: &[u8]) -> AppResult<ChatRequest> {
    let value: Value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(body).map_err(|_| AppError::InvalidJson)?
    };

    let value = match value {
        Value::String(text) => serde_json::from_str(&text).map_err(|_| AppError::InvalidJson)?,
        other => other,
    };

    let has_messages = value
        .get("messages")
        .and_then(Value::as_array)
        .map_or(false, |messages| !messages.is_empty());
    if !has_messages {
        return Err(AppError::Validation(
            "Missing messages array in request body".to_string(),
        ));
    }

    serde_json::from_value(value)
        .map_err(|e| AppError::Validation(format!("Invalid chat request: {}", e)))
}

/// Decide the attribution value sent upstream
///
/// Deployment host hint, then the caller's Origin, then its Host, then a fixed fallback.
pub fn resolve_referer(deployment_host: Option<&str>, headers: &HeaderMap) -> String {
    if let Some(host) = deployment_host.map(str::trim).filter(|h| !h.is_empty()) {
        return if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{}", host)
        };
    }

    if let Some(origin) = header_str(headers, "origin") {
        return origin.to_string();
    }

    let host = header_str(headers, "host").unwrap_or(FALLBACK_REFERER_HOST);
    format!("https://{}", host)
}
