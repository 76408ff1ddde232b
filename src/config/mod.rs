//! Configuration management module
//!
//! Responsible for loading and managing application configuration from environment variables

pub mod client;
pub mod settings;

pub use client::{is_local_development_host, ClientSettings, CLIENT_API_KEY_ENV};
pub use settings::Settings;
