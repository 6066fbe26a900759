//! Route definitions for the session lifecycle.
//!
//! Mounted at `/api/video`.
//!
//! ```text
//! POST /start        start_session
//! POST /complete     complete_session
//! GET  /status       session_status
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::video;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/start", post(video::start_session))
        .route("/complete", post(video::complete_session))
        .route("/status", get(video::session_status))
}
