use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use touchline_core::error::CoreError;
use touchline_core::payload::DecodeError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and [`DecodeError`] for payloads
/// that could not be decoded. Implements [`IntoResponse`] to produce
/// consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `touchline_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A request body that failed tolerant decoding.
    #[error(transparent)]
    Malformed(#[from] DecodeError),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

const SANITIZED: &str = "An internal error occurred";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NoActiveSession => {
                    (StatusCode::BAD_REQUEST, "NO_ACTIVE_SESSION", core.to_string())
                }
                CoreError::SessionAlreadyActive { .. } => {
                    (StatusCode::CONFLICT, "SESSION_ALREADY_ACTIVE", core.to_string())
                }
                CoreError::SessionFinalizing { .. } => {
                    (StatusCode::CONFLICT, "SESSION_FINALIZING", core.to_string())
                }
                CoreError::SessionMismatch { .. } => {
                    (StatusCode::CONFLICT, "SESSION_MISMATCH", core.to_string())
                }
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Persistence(msg) => {
                    tracing::error!(error = %msg, "Persistence failure");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "PERSISTENCE_FAILURE",
                        "Failed to save session. The session is still active; retry completion."
                            .to_string(),
                    )
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        SANITIZED.to_string(),
                    )
                }
            },

            // --- Decode errors ---
            AppError::Malformed(err) => {
                tracing::warn!(
                    byte_length = err.byte_length,
                    preview = %err.preview,
                    error = %err.message,
                    "Rejected malformed payload",
                );
                let body = json!({
                    "status": "error",
                    "code": "MALFORMED_PAYLOAD",
                    "message": format!("Invalid JSON: {}", err.message),
                    "diagnostics": {
                        "byteLength": err.byte_length,
                        "preview": err.preview,
                    },
                });
                return (StatusCode::BAD_REQUEST, axum::Json(body)).into_response();
            }

            // --- HTTP-specific errors ---
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    SANITIZED.to_string(),
                )
            }
        };

        let body = json!({
            "status": "error",
            "code": code,
            "message": message,
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<touchline_core::store::StoreError> for AppError {
    fn from(err: touchline_core::store::StoreError) -> Self {
        match err {
            touchline_core::store::StoreError::InvalidId(id) => {
                AppError::Core(CoreError::Validation(format!("Invalid session id '{id}'")))
            }
            other => AppError::InternalError(other.to_string()),
        }
    }
}
