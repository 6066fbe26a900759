use axum::routing::post;
use axum::Router;

use crate::handlers::diagnostics;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/test", post(diagnostics::echo))
}
