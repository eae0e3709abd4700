use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use marketplace_core::error::CoreError;
use serde_json::json;

use crate::auth::session::SessionError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] and [`SessionError`].
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `marketplace_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A login/refresh/logout failure.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// No route matches the request.
    #[error("{0}")]
    NotFound(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
            },

            // --- Session errors ---
            AppError::Session(err) => classify_session_error(err),

            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Classify a session error into an HTTP status, error code, and message.
///
/// - Bad credentials map to 401.
/// - Every refresh-token rejection maps to 403.
/// - Store outages map to 503; anything else to 500 with a sanitized message.
fn classify_session_error(err: &SessionError) -> (StatusCode, &'static str, String) {
    match err {
        SessionError::InvalidCredentials => (
            StatusCode::UNAUTHORIZED,
            "INVALID_CREDENTIALS",
            err.to_string(),
        ),
        SessionError::InvalidToken => (StatusCode::FORBIDDEN, "INVALID_TOKEN", err.to_string()),
        SessionError::UnknownSession => {
            (StatusCode::FORBIDDEN, "UNKNOWN_SESSION", err.to_string())
        }
        SessionError::SessionTheftSuspected => (
            StatusCode::FORBIDDEN,
            "SESSION_BINDING_MISMATCH",
            format!("Security violation: {err}"),
        ),
        SessionError::UserNotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string()),
        SessionError::Storage(store_err) => {
            tracing::error!(error = %store_err, "Session store error");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "STORAGE_UNAVAILABLE",
                "Session storage is unavailable".to_string(),
            )
        }
        SessionError::Internal(msg) => internal(msg),
    }
}

fn internal(msg: &str) -> (StatusCode, &'static str, String) {
    tracing::error!(error = %msg, "Internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}
