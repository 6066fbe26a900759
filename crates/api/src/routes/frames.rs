//! Route definitions for frame ingestion.
//!
//! Mounted at `/api/frames`.
//!
//! ```text
//! POST /          submit_frame
//! POST /batch     submit_batch
//! ```

use axum::routing::post;
use axum::Router;

use crate::handlers::frames;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(frames::submit_frame))
        .route("/batch", post(frames::submit_batch))
}
