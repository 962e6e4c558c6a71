//! HTTP error responses.
//!
//! Every error leaves the gateway as `{ "success": false, "detail", "error" }`
//! so callers can render a failure without inspecting the status code.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Gateway(#[from] agent_gateway_core::Error),
    #[error("Malformed request body: {message}")]
    MalformedBody { status: StatusCode, message: String },
    #[error("File not found: {0}")]
    FileNotFound(String),
    #[error("Rate limit exceeded. Please wait a minute.")]
    RateLimited,
    #[error("Metrics exporter is not installed")]
    MetricsUnavailable,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    detail: String,
    error: &'static str,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        use agent_gateway_core::Error as E;
        match self {
            Self::Gateway(E::UnknownAgent(_)) => StatusCode::NOT_FOUND,
            Self::Gateway(E::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            Self::Gateway(E::InvalidOption { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Gateway(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::MalformedBody { status, .. } => *status,
            Self::FileNotFound(_) | Self::MetricsUnavailable => StatusCode::NOT_FOUND,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Gateway(err) => err.code(),
            Self::MalformedBody { .. } => "malformed_request",
            Self::FileNotFound(_) => "file_not_found",
            Self::RateLimited => "rate_limited",
            Self::MetricsUnavailable => "not_found",
            Self::Io(_) => "internal_error",
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::MalformedBody {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let body = ErrorBody {
            success: false,
            detail: self.to_string(),
            error: self.code(),
        };
        (status, Json(body)).into_response()
    }
}
