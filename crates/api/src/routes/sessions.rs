use axum::routing::get;
use axum::Router;

use crate::handlers::sessions;
use crate::state::AppState;

/// Read-only queries against the session store.
///
/// ```text
/// GET /sessions           list_sessions
/// GET /sessions/{id}      get_session
/// GET /session/{id}       get_session
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sessions", get(sessions::list_sessions))
        .route("/sessions/{id}", get(sessions::get_session))
        .route("/session/{id}", get(sessions::get_session))
}
