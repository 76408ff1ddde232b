//! Chat Relay Server
//!
//! HTTP proxy that forwards chat requests to the upstream LLM API with the
//! server-held credential

use anyhow::{Context, Result};
use chat_relay::utils::logging::init_logging;
use chat_relay::config::settings::SERVER_API_KEY_ENV;
use chat_relay::{create_router, handlers::CHAT_API_PATH, version_info, Settings};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::new().context("Failed to load server settings")?;

    init_logging(&settings.logging)?;
    info!("{}", version_info());

    if !settings.has_api_key() {
        warn!("{} is not set; chat requests will fail until it is configured", SERVER_API_KEY_ENV);
    }

    let app = create_router(settings.clone()).await?;

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("🚀 Chat relay server started!");
    info!("📝 Health check: http://{}/health", addr);
    info!("🔄 Chat endpoint: http://{}{}", addr, CHAT_API_PATH);

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to start server: {}", e))?;

    Ok(())
}
