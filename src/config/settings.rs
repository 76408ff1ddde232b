//! Application configuration settings
//!
//! Defines all configuration structures and loading logic

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// Default upstream chat-completion API base URL
pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Default model used when a request does not name one
pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

/// Environment variable holding the server-side upstream credential
pub const SERVER_API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Server configuration
    pub server: ServerConfig,
    /// Upstream API configuration
    pub upstream: UpstreamConfig,
    /// Fixed generation parameters
    pub generation: GenerationConfig,
    /// Retry configuration
    pub retry: RetryConfig,
    /// Request configuration
    pub request: RequestConfig,
    /// Security configuration
    pub security: SecurityConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen host
    pub host: String,
    /// Listen port
    pub port: u16,
}

/// Upstream API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// API key. Missing keys are reported per request, not at startup.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// API base URL
    pub base_url: String,
    /// Model used when the request does not specify one
    pub default_model: String,
    /// Deployment hostname hint used for attribution
    pub deployment_host: Option<String>,
    /// Product identifier sent as `X-Title`
    pub app_title: String,
    /// Request timeout in seconds
    pub timeout: u64,
}

/// Generation parameters sent with every upstream call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts including the first one
    pub attempts: u32,
    /// Fixed delay between attempts in milliseconds
    pub delay_ms: u64,
}

/// Request configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestConfig {
    /// Maximum request size in bytes
    pub max_request_size: usize,
}

/// Security configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Allowed origins for CORS
    pub allowed_origins: Vec<String>,
    /// Whether CORS is enabled
    pub cors_enabled: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format (text/json)
    pub format: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_tokens: 500,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 2,
            delay_ms: 600,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8082,
            },
            upstream: UpstreamConfig {
                api_key: None,
                base_url: DEFAULT_UPSTREAM_BASE_URL.to_string(),
                default_model: DEFAULT_MODEL.to_string(),
                deployment_host: None,
                app_title: "AI Career Guidance System".to_string(),
                timeout: 30,
            },
            generation: GenerationConfig::default(),
            retry: RetryConfig::default(),
            request: RequestConfig {
                max_request_size: 1024 * 1024,
            },
            security: SecurityConfig {
                allowed_origins: vec!["*".to_string()],
                cors_enabled: true,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "text".to_string(),
            },
        }
    }
}

impl Settings {
    /// Create a new configuration instance from the environment
    pub fn new() -> Result<Self> {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        let defaults = Self::default();
        let settings = Self {
            server: ServerConfig {
                host: get_env_or_default("SERVER_HOST", &defaults.server.host),
                port: get_env_or_default("SERVER_PORT", "8082")
                    .parse()
                    .context("Invalid port number")?,
            },
            upstream: UpstreamConfig {
                api_key: get_env_opt(SERVER_API_KEY_ENV),
                base_url: get_env_or_default("OPENROUTER_BASE_URL", DEFAULT_UPSTREAM_BASE_URL),
                default_model: get_env_or_default("OPENROUTER_MODEL", DEFAULT_MODEL),
                deployment_host: get_env_opt("DEPLOYMENT_HOST"),
                app_title: get_env_or_default("APP_TITLE", &defaults.upstream.app_title),
                timeout: get_env_or_default("REQUEST_TIMEOUT", "30")
                    .parse()
                    .context("Invalid timeout value")?,
            },
            generation: GenerationConfig::default(),
            retry: RetryConfig {
                attempts: defaults.retry.attempts,
                delay_ms: get_env_or_default("RETRY_DELAY_MS", "600")
                    .parse()
                    .context("Invalid retry delay")?,
            },
            request: RequestConfig {
                max_request_size: get_env_or_default("MAX_REQUEST_SIZE", "1048576")
                    .parse()
                    .context("Invalid maximum request size")?,
            },
            security: SecurityConfig {
                allowed_origins: get_env_or_default("ALLOWED_ORIGINS", "*")
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                cors_enabled: get_env_or_default("CORS_ENABLED", "true")
                    .parse()
                    .context("Invalid CORS enabled flag")?,
            },
            logging: LoggingConfig {
                level: get_env_or_default("RUST_LOG", "info"),
                format: get_env_or_default("LOG_FORMAT", "text"),
            },
        };

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration validity
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Port number cannot be 0");
        }

        if let Some(key) = &self.upstream.api_key {
            if key.contains(char::is_whitespace) {
                anyhow::bail!("{} cannot contain whitespace characters", SERVER_API_KEY_ENV);
            }
        }

        if !self.upstream.base_url.starts_with("http") {
            anyhow::bail!("Invalid upstream base URL format, should start with 'http'");
        }

        if self.upstream.default_model.trim().is_empty() {
            anyhow::bail!("Default model cannot be empty");
        }

        if self.upstream.timeout == 0 {
            anyhow::bail!("Timeout values cannot be 0");
        }

        if self.retry.attempts == 0 {
            anyhow::bail!("Retry attempts cannot be 0");
        }

        if self.request.max_request_size == 0 {
            anyhow::bail!("Maximum request size cannot be 0");
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            anyhow::bail!("Invalid log level: {}", self.logging.level);
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            anyhow::bail!("Invalid log format: {}", self.logging.format);
        }

        Ok(())
    }

    /// Whether the upstream credential is configured
    pub fn has_api_key(&self) -> bool {
        self.upstream.api_key.as_deref().map_or(false, |k| !k.is_empty())
    }
}

/// Get environment variable or default value
pub(crate) fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get a non-empty environment variable
pub(crate) fn get_env_opt(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
