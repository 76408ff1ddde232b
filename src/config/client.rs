//! Client wrapper configuration
//!
//! Everything the chat client needs is resolved once here, so the client
//! itself never inspects the process environment.

use super::settings::{
    get_env_opt, get_env_or_default, DEFAULT_MODEL, DEFAULT_UPSTREAM_BASE_URL,
};
use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Environment variable holding the client-side fallback credential
pub const CLIENT_API_KEY_ENV: &str = "CHAT_DIRECT_API_KEY";

/// Hostnames treated as local development
const LOCAL_HOSTS: [&str; 3] = ["localhost", "127.0.0.1", "0.0.0.0"];

/// Chat client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSettings {
    /// Base URL of the server-side proxy
    pub proxy_base_url: String,
    /// Model used when the caller does not name one
    pub default_model: String,
    /// Credential for the direct fallback call
    #[serde(skip_serializing)]
    pub direct_api_key: Option<String>,
    /// Upstream base URL for the direct fallback call
    pub upstream_base_url: String,
    /// Whether a failed proxy call may fall back to calling upstream directly
    pub allow_direct_fallback: bool,
    /// Attribution sent as `HTTP-Referer` on direct calls
    pub origin: String,
    /// Product identifier sent as `X-Title` on direct calls
    pub app_title: String,
    /// Request timeout in seconds
    pub timeout: u64,
    /// Total attempts per hop
    pub attempts: u32,
    /// Delay between attempts in milliseconds
    pub delay_ms: u64,
}

impl ClientSettings {
    /// Build settings for a proxy base URL, deriving the fallback flag from its host
    pub fn for_proxy(proxy_base_url: impl Into<String>) -> Self {
        let proxy_base_url = proxy_base_url.into().trim_end_matches('/').to_string();
        let allow_direct_fallback = host_of(&proxy_base_url)
            .map_or(false, |host| is_local_development_host(&host));
        let origin = origin_of(&proxy_base_url);

        Self {
            proxy_base_url,
            default_model: DEFAULT_MODEL.to_string(),
            direct_api_key: None,
            upstream_base_url: DEFAULT_UPSTREAM_BASE_URL.to_string(),
            allow_direct_fallback,
            origin,
            app_title: "AI Career Guidance System (Local)".to_string(),
            timeout: 30,
            attempts: 2,
            delay_ms: 600,
        }
    }

    /// Load client settings from the environment
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let mut settings = Self::for_proxy(get_env_or_default("CHAT_PROXY_URL", "http://localhost:8082"));
        settings.default_model = get_env_or_default("CHAT_MODEL", DEFAULT_MODEL);
        settings.direct_api_key = get_env_opt(CLIENT_API_KEY_ENV);
        settings.upstream_base_url = get_env_or_default("OPENROUTER_BASE_URL", DEFAULT_UPSTREAM_BASE_URL);

        if let Some(flag) = get_env_opt("CHAT_ALLOW_DIRECT_FALLBACK") {
            settings.allow_direct_fallback = flag
                .parse()
                .context("Invalid CHAT_ALLOW_DIRECT_FALLBACK flag")?;
        }
        if let Some(origin) = get_env_opt("CHAT_ORIGIN") {
            settings.origin = origin;
        }
        settings.timeout = get_env_or_default("REQUEST_TIMEOUT", "30")
            .parse()
            .context("Invalid timeout value")?;

        let proxy_url = Url::parse(&settings.proxy_base_url).context("Invalid CHAT_PROXY_URL")?;
        if !matches!(proxy_url.scheme(), "http" | "https") {
            anyhow::bail!("Invalid CHAT_PROXY_URL scheme '{}', expected http or https", proxy_url.scheme());
        }

        Ok(settings)
    }
}

/// Whether a hostname denotes a local development context
pub fn is_local_development_host(host: &str) -> bool {
    LOCAL_HOSTS.iter().any(|local| local.eq_ignore_ascii_case(host))
}

/// Lowercased hostname of an absolute URL
fn host_of(url: &str) -> Option<String> {
    Url::parse(url).ok()?.host_str().map(str::to_string)
}

/// Serialized origin (scheme, host, non-default port) of an absolute URL
fn origin_of(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) if parsed.has_host() => parsed.origin().ascii_serialization(),
        _ => url.to_string(),
    }
}
