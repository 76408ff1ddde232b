//! Error handling module
//!
//! Defines error types and handling logic used in the project

use crate::models::chat::ErrorBody;
use crate::services::upstream::{StatusClass, UpstreamError};
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Request used a method other than POST
    #[error("Method Not Allowed")]
    MethodNotAllowed,

    /// Server is missing required configuration
    #[error("{0}")]
    Configuration(String),

    /// Request body is not valid JSON
    #[error("Invalid JSON in request body")]
    InvalidJson,

    /// Request body exceeds the configured size limit
    #[error("Request body exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: usize },

    /// Request validation failed
    #[error("{0}")]
    Validation(String),

    /// Upstream rejected the credential (401/403)
    #[error("Upstream authentication failed ({status}). Check OPENROUTER_API_KEY permissions. Details: {detail}")]
    UpstreamAuth { status: u16, detail: String },

    /// Upstream still rate limited or failing after the retry (429/5xx)
    #[error("Upstream API error {status}: {detail}")]
    UpstreamTransient { status: u16, detail: String },

    /// Any other non-2xx upstream status
    #[error("Upstream API error {status}: {detail}")]
    UpstreamOther { status: u16, detail: String },

    /// Anything else: network failures, undecodable upstream bodies
    #[error("{0}")]
    Unexpected(String),
}

impl AppError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::InvalidJson | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::UpstreamAuth { status, .. }
            | AppError::UpstreamTransient { status, .. }
            | AppError::UpstreamOther { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            AppError::Configuration(_) | AppError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error kind string for logs
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::MethodNotAllowed
            | AppError::InvalidJson
            | AppError::Validation(_)
            | AppError::PayloadTooLarge { .. } => "validation_error",
            AppError::Configuration(_) => "configuration_error",
            AppError::UpstreamAuth { .. } => "upstream_auth_error",
            AppError::UpstreamTransient { .. } => "upstream_transient_error",
            AppError::UpstreamOther { .. } => "upstream_error",
            AppError::Unexpected(_) => "unexpected_error",
        }
    }

    /// Whether the upstream call was never attempted
    pub fn is_pre_flight(&self) -> bool {
        matches!(
            self,
            AppError::MethodNotAllowed
                | AppError::Configuration(_)
                | AppError::InvalidJson
                | AppError::Validation(_)
                | AppError::PayloadTooLarge { .. }
        )
    }

    /// Convert to the wire error body
    pub fn to_error_body(&self) -> ErrorBody {
        ErrorBody::new(self.to_string())
    }
}

impl From<UpstreamError> for AppError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Status { status, detail } => {
                let status_code = status.as_u16();
                match StatusClass::of(status) {
                    StatusClass::Auth => AppError::UpstreamAuth { status: status_code, detail },
                    StatusClass::Transient => AppError::UpstreamTransient { status: status_code, detail },
                    StatusClass::Other => AppError::UpstreamOther { status: status_code, detail },
                }
            }
            other => AppError::Unexpected(other.to_string()),
        }
    }
}

/// Implement IntoResponse trait to allow errors to be returned directly as HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!("Application error: {} - Status code: {}", self, status);
        } else {
            tracing::warn!("Client error: {} - Status code: {}", self.error_type(), status);
        }

        let mut response = (status, Json(self.to_error_body())).into_response();
        if matches!(self, AppError::MethodNotAllowed) {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static("POST"));
        }
        response
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;
