//! JSON error bodies for the HTTP API.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain_avail_lib::DomainCheckError;
use serde::{Deserialize, Serialize};

/// Machine-readable error codes.
pub mod error_codes {
    pub const INVALID_INPUT: &str = "invalid_input";
    pub const RATE_LIMITED: &str = "rate_limited";
    pub const UPSTREAM_ERROR: &str = "upstream_error";
    pub const TIMEOUT: &str = "timeout";
    pub const SERVICE_UNAVAILABLE: &str = "service_unavailable";
    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// Error body returned by every failing route: `{"error": code, "message": ..}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiError {
    pub error: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: code.into(),
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(error_codes::INVALID_INPUT, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(error_codes::TIMEOUT, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(error_codes::SERVICE_UNAVAILABLE, message)
    }

    pub fn status(&self) -> StatusCode {
        use error_codes::*;

        match self.error.as_str() {
            INVALID_INPUT => StatusCode::BAD_REQUEST,
            RATE_LIMITED => StatusCode::TOO_MANY_REQUESTS,
            UPSTREAM_ERROR => StatusCode::BAD_GATEWAY,
            TIMEOUT => StatusCode::GATEWAY_TIMEOUT,
            SERVICE_UNAVAILABLE => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DomainCheckError> for ApiError {
    fn from(err: DomainCheckError) -> Self {
        let code = match &err {
            DomainCheckError::InvalidInput { .. } => error_codes::INVALID_INPUT,
            DomainCheckError::RateLimitExceeded { .. } => error_codes::RATE_LIMITED,
            DomainCheckError::UpstreamTimeout { .. } => error_codes::TIMEOUT,
            DomainCheckError::UnsupportedDomain { .. }
            | DomainCheckError::UpstreamError { .. }
            | DomainCheckError::AllProvidersFailed { .. } => error_codes::UPSTREAM_ERROR,
            DomainCheckError::ConfigError { .. }
            | DomainCheckError::FileError { .. }
            | DomainCheckError::Internal { .. } => error_codes::INTERNAL_ERROR,
        };
        Self::new(code, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status(), Json(self)).into_response()
    }
}
