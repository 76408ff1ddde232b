//! Chat Relay Library
//!
//! A single-hop LLM chat proxy that holds the upstream credential, plus the
//! client wrapper that talks to it and, in local development, can fall back
//! to calling the upstream API directly.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

// Re-export common types
pub use config::{ClientSettings, Settings};
pub use handlers::{build_router, create_router, AppState};
pub use models::{ChatOutcome, Message, Role, UserProfile};
pub use services::{ChatClient, RetryPolicy, UpstreamClient};
pub use utils::error::{AppError, AppResult};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Library description
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get version information
pub fn version_info() -> String {
    format!("{} v{} - {}", NAME, VERSION, DESCRIPTION)
}
