// ABOUTME: Route-boundary error type for the gateway, rendered as the `{error, detail?}` JSON envelope.
// ABOUTME: Maps session failures, backend outages, forwarded backend errors, and internal failures to statuses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use frameio_core::ErrorEnvelope;
use thiserror::Error;

use crate::backend::BackendError;

pub const ADMIN_LOGIN_HINT: &str = "Admin session required. Please log in at /admin/login.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("admin session required")]
    AdminUnauthorized,

    #[error("identity session required")]
    Unauthenticated,

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("admin login is not configured")]
    AdminDisabled,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found")]
    NotFound,

    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("backend returned {status}: {}", .envelope.error)]
    Backend {
        status: StatusCode,
        envelope: ErrorEnvelope,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::AdminUnauthorized
            | ApiError::Unauthenticated
            | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::AdminDisabled | ApiError::BackendUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Backend { status, .. } => *status,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        match self {
            ApiError::AdminUnauthorized => {
                ErrorEnvelope::new("Unauthorized").with_detail(ADMIN_LOGIN_HINT)
            }
            ApiError::Unauthenticated => ErrorEnvelope::new("Unauthenticated")
                .with_detail("Sign in to continue."),
            ApiError::InvalidCredentials => ErrorEnvelope::new("Invalid username or password"),
            ApiError::AdminDisabled => ErrorEnvelope::new("Admin login is not configured"),
            ApiError::BadRequest(msg) => ErrorEnvelope::new("Bad request").with_detail(msg.as_str()),
            ApiError::NotFound => ErrorEnvelope::new("Not found"),
            ApiError::BackendUnavailable(reason) => {
                ErrorEnvelope::new("Backend service unavailable").with_detail(reason.as_str())
            }
            ApiError::Backend { envelope, .. } => envelope.clone(),
            // Internal details stay in the logs.
            ApiError::Internal(_) => ErrorEnvelope::new("Internal server error"),
        }
    }
}

impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        if err.is_unavailable() {
            ApiError::BackendUnavailable(err.to_string())
        } else {
            ApiError::Internal(err.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "request rejected");
        }
        (status, Json(self.envelope())).into_response()
    }
}
