//! Read-only queries against the session store.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use touchline_core::error::CoreError;
use touchline_core::session::{CompletedSession, SessionListing};
use touchline_core::store::validate_session_id;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub status: &'static str,
    pub count: usize,
    pub sessions: Vec<SessionListing>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub status: &'static str,
    pub session: CompletedSession,
}

/// GET /api/sessions
pub async fn list_sessions(State(state): State<AppState>) -> AppResult<Json<SessionListResponse>> {
    let sessions = state.store.list_summaries().await?;
    Ok(Json(SessionListResponse {
        status: "success",
        count: sessions.len(),
        sessions,
    }))
}

/// GET /api/sessions/{id}
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<SessionResponse>> {
    validate_session_id(&id)?;
    let found = state.store.load(&id).await?;
    let session = found.ok_or(AppError::Core(CoreError::NotFound {
        entity: "Session",
        id,
    }))?;
    Ok(Json(SessionResponse {
        status: "success",
        session,
    }))
}
