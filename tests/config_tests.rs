//! Configuration module unit tests

use chat_relay::config::{ClientSettings, Settings};
use std::env;
use std::sync::Mutex;

/// Environment variables are process-global; tests touching them take turns
static ENV_LOCK: Mutex<()> = Mutex::new(());

const VARS: [&str; 18] = [
    "OPENROUTER_API_KEY", "OPENROUTER_BASE_URL", "OPENROUTER_MODEL", "DEPLOYMENT_HOST",
    "APP_TITLE", "SERVER_HOST", "SERVER_PORT", "REQUEST_TIMEOUT", "RETRY_DELAY_MS",
    "MAX_REQUEST_SIZE", "ALLOWED_ORIGINS", "CORS_ENABLED", "RUST_LOG", "LOG_FORMAT",
    "CHAT_PROXY_URL", "CHAT_MODEL", "CHAT_DIRECT_API_KEY", "CHAT_ALLOW_DIRECT_FALLBACK",
];

fn cleanup_test_env() {
    for var in &VARS {
        env::remove_var(var);
    }
}

#[test]
fn test_settings_from_env() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_test_env();
    env::set_var("OPENROUTER_API_KEY", "sk-or-test-key-1234567890");
    env::set_var("OPENROUTER_MODEL", "anthropic/claude-3-haiku");
    env::set_var("DEPLOYMENT_HOST", "careers.example.dev");
    env::set_var("SERVER_PORT", "9090");
    env::set_var("RETRY_DELAY_MS", "250");
    env::set_var("ALLOWED_ORIGINS", "https://a.example.com, https://b.example.com");
    env::set_var("LOG_FORMAT", "json");

    let settings = Settings::new().unwrap();
    cleanup_test_env();

    assert!(settings.has_api_key());
    assert_eq!(settings.upstream.default_model, "anthropic/claude-3-haiku");
    assert_eq!(settings.upstream.deployment_host.as_deref(), Some("careers.example.dev"));
    assert_eq!(settings.server.port, 9090);
    assert_eq!(settings.retry.delay_ms, 250);
    assert_eq!(settings.retry.attempts, 2);
    assert_eq!(
        settings.security.allowed_origins,
        vec!["https://a.example.com".to_string(), "https://b.example.com".to_string()]
    );
    assert_eq!(settings.logging.format, "json");
}

#[test]
fn test_missing_api_key_is_not_fatal() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_test_env();

    let settings = Settings::new().unwrap();

    assert!(!settings.has_api_key());
    assert_eq!(settings.upstream.base_url, "https://openrouter.ai/api/v1");
    assert_eq!(settings.upstream.default_model, "openai/gpt-4o-mini");
}

#[test]
fn test_invalid_values_rejected() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());

    for (var, value) in [
        ("SERVER_PORT", "0"),
        ("SERVER_PORT", "not-a-port"),
        ("REQUEST_TIMEOUT", "0"),
        ("OPENROUTER_BASE_URL", "openrouter.ai"),
        ("LOG_FORMAT", "yaml"),
        ("CORS_ENABLED", "maybe"),
    ] {
        cleanup_test_env();
        env::set_var(var, value);
        assert!(Settings::new().is_err(), "{}={} should be rejected", var, value);
    }

    cleanup_test_env();
}

#[test]
fn test_api_key_not_serialized() {
    let mut settings = Settings::default();
    settings.upstream.api_key = Some("sk-or-secret".to_string());

    let json = serde_json::to_string(&settings).unwrap();
    assert!(!json.contains("sk-or-secret"));
}

#[test]
fn test_client_settings_from_env() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_test_env();
    env::set_var("CHAT_PROXY_URL", "https://careers.example.com");
    env::set_var("CHAT_MODEL", "openai/gpt-4o");

    let settings = ClientSettings::from_env().unwrap();

    assert_eq!(settings.proxy_base_url, "https://careers.example.com");
    assert_eq!(settings.default_model, "openai/gpt-4o");
    assert!(!settings.allow_direct_fallback);
    assert!(settings.direct_api_key.is_none());

    env::set_var("CHAT_ALLOW_DIRECT_FALLBACK", "true");
    env::set_var("CHAT_DIRECT_API_KEY", "sk-or-local");
    let settings = ClientSettings::from_env().unwrap();
    cleanup_test_env();

    assert!(settings.allow_direct_fallback);
    assert_eq!(settings.direct_api_key.as_deref(), Some("sk-or-local"));
}

#[test]
fn test_client_settings_default_to_local_fallback() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_test_env();

    let settings = ClientSettings::from_env().unwrap();

    assert_eq!(settings.proxy_base_url, "http://localhost:8082");
    assert!(settings.allow_direct_fallback);
    assert_eq!(settings.origin, "http://localhost:8082");
}

#[test]
fn test_client_proxy_url_must_parse() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());

    for value in ["careers.example.com", "ftp://example.com", "http://"] {
        cleanup_test_env();
        env::set_var("CHAT_PROXY_URL", value);
        assert!(ClientSettings::from_env().is_err(), "CHAT_PROXY_URL={} should be rejected", value);
    }

    cleanup_test_env();
    env::set_var("CHAT_PROXY_URL", "http://[::1]:8082");
    let settings = ClientSettings::from_env().unwrap();
    cleanup_test_env();

    assert_eq!(settings.origin, "http://[::1]:8082");
    assert!(!settings.allow_direct_fallback);
}
