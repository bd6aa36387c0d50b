//! HTTP error responses.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use keygate_license::LicenseError;
use serde_json::json;
use thiserror::Error;
use tokio::task::JoinError;
use tracing::{debug, error};

/// Errors returned by the HTTP layer.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid email address")]
    InvalidEmail,

    /// The body was not JSON or did not match the expected shape. Carries
    /// the status to answer with.
    #[error("invalid request body")]
    InvalidBody(StatusCode),

    #[error("license not found")]
    NotFound,

    #[error("missing or invalid admin token")]
    Unauthorized,

    #[error("admin endpoints are disabled")]
    Forbidden,

    #[error("service unavailable")]
    Unavailable,

    /// Store failures. The cause is logged, never returned.
    #[error("internal server error")]
    Internal(#[source] LicenseError),

    /// A blocking store task panicked or was cancelled.
    #[error("internal server error")]
    TaskFailed(#[source] JoinError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidEmail => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InvalidBody(status) => *status,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) | Self::TaskFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<LicenseError> for ApiError {
    fn from(err: LicenseError) -> Self {
        match err {
            LicenseError::NotFound(_) | LicenseError::InvalidKeyFormat(_) => Self::NotFound,
            other => Self::Internal(other),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(reason = %rejection.body_text(), "rejected request body");
        let status = match rejection {
            JsonRejection::JsonDataError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            JsonRejection::MissingJsonContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            _ => StatusCode::BAD_REQUEST,
        };
        Self::InvalidBody(status)
    }
}

impl From<JoinError> for ApiError {
    fn from(err: JoinError) -> Self {
        Self::TaskFailed(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Internal(cause) => error!(error = %cause, "request failed"),
            Self::TaskFailed(cause) => error!(error = %cause, "store task failed"),
            _ => {}
        }
        let status = self.status();
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
