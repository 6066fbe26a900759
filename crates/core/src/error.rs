use crate::types::SessionId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("No active session. Call /api/video/start first.")]
    NoActiveSession,

    #[error("Session {session_id} is already active")]
    SessionAlreadyActive { session_id: SessionId },

    #[error("Session {session_id} is being finalized")]
    SessionFinalizing { session_id: SessionId },

    #[error("Request targets session {requested} but the current session is {current}")]
    SessionMismatch {
        requested: SessionId,
        current: SessionId,
    },

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Persistence failed: {0}")]
    Persistence(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
