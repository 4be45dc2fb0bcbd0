// Application error taxonomy
// Every failure is per-operation and recoverable; nothing here aborts the process

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Typed errors surfaced to API callers
#[derive(Debug, Error)]
pub enum AppError {
    /// Link document missing or already deactivated
    #[error("link is invalid or no longer active")]
    LinkInvalid,

    /// Link has reached its maximum number of uses
    #[error("link has reached its maximum number of uses")]
    QuotaExhausted,

    /// Missing or unverifiable bearer token
    #[error("missing or invalid credentials")]
    Unauthenticated,

    /// Caller is authenticated but not allowed to perform the action
    #[error("permission denied")]
    PermissionDenied,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("invalid request: {0}")]
    BadRequest(String),

    /// Network or transaction-contention failure talking to the store;
    /// retryable from the client's point of view
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Store(anyhow::anyhow!(err))
    }
}

impl AppError {
    /// Stable machine-readable code for the front end
    pub fn code(&self) -> &'static str {
        match self {
            AppError::LinkInvalid => "LINK_INVALID",
            AppError::QuotaExhausted => "QUOTA_EXHAUSTED",
            AppError::Unauthenticated => "UNAUTHENTICATED",
            AppError::PermissionDenied => "PERMISSION_DENIED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Store(_) => "STORE_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::LinkInvalid => StatusCode::GONE,
            AppError::QuotaExhausted => StatusCode::CONFLICT,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::PermissionDenied => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Store(ref err) = self {
            error!("store error: {:?}", err);
        }

        let body = json!({
            "error": self.code(),
            "message": self.to_string(),
        });

        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(AppError::LinkInvalid.code(), "LINK_INVALID");
        assert_eq!(AppError::QuotaExhausted.code(), "QUOTA_EXHAUSTED");
        assert_eq!(AppError::NotFound("course").code(), "NOT_FOUND");
    }

    #[test]
    fn test_redemption_failures_are_client_errors() {
        assert_eq!(AppError::LinkInvalid.status(), StatusCode::GONE);
        assert_eq!(AppError::QuotaExhausted.status(), StatusCode::CONFLICT);
    }
}
