pub mod diagnostics;
pub mod frames;
pub mod health;
pub mod sessions;
pub mod video;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /health                      liveness check
///
/// /video/start                 start a session (POST)
/// /video/complete              complete and persist the session (POST)
/// /video/status                progress of the current session (GET)
///
/// /frames                      submit one frame (POST)
/// /frames/batch                submit a batch of frames (POST)
///
/// /sessions                    list stored sessions
/// /sessions/{id}               get a stored session
/// /session/{id}                get a stored session (producer path)
///
/// /test                        echo the decoded payload's keys (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/video", video::router())
        .nest("/frames", frames::router())
        .merge(sessions::router())
        .merge(diagnostics::router())
}
