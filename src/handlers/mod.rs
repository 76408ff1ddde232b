//! HTTP handlers module
//!
//! Contains all HTTP endpoint handling logic

pub mod chat;
pub mod health;

use crate::config::Settings;
use crate::middleware::request_logging_middleware;
use crate::services::upstream::{CompletionBackend, UpstreamClient, UpstreamOptions};
use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{any, get},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

pub use chat::CHAT_API_PATH;

/// Application state
pub struct AppState {
    pub settings: Settings,
    /// Upstream backend; `None` when no credential is configured
    pub backend: Option<Arc<dyn CompletionBackend>>,
}

impl AppState {
    /// Build state from settings, creating the upstream client when a key is present
    pub fn new(settings: Settings) -> Result<Self> {
        let backend = match UpstreamOptions::from_settings(&settings) {
            Some(options) => Some(Arc::new(UpstreamClient::new(options)?) as Arc<dyn CompletionBackend>),
            None => None,
        };

        Ok(Self { settings, backend })
    }

    /// Build state around an explicit backend
    pub fn with_backend(settings: Settings, backend: Option<Arc<dyn CompletionBackend>>) -> Self {
        Self { settings, backend }
    }
}

/// Create application router
pub async fn create_router(settings: Settings) -> Result<Router> {
    let state = AppState::new(settings)?;
    Ok(build_router(state))
}

/// Assemble routes and middleware around prepared state
pub fn build_router(state: AppState) -> Router {
    health::mark_started();

    let max_request_size = state.settings.request.max_request_size;
    let cors = cors_layer(&state.settings);

    let middleware_stack = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(DefaultBodyLimit::max(max_request_size));

    let router = Router::new()
        .route(CHAT_API_PATH, any(chat::handle_chat))
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness_check))
        .with_state(Arc::new(state))
        .layer(middleware_stack);

    match cors {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

/// CORS layer from security settings
fn cors_layer(settings: &Settings) -> Option<CorsLayer> {
    if !settings.security.cors_enabled {
        return None;
    }

    let origins = &settings.security.allowed_origins;
    let allow_origin = if origins.is_empty() || origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin: {}", origin);
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    Some(
        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods(Any)
            .allow_headers(Any),
    )
}
