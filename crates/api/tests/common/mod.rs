#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use touchline_api::config::{ServerConfig, StoreKind};
use touchline_api::router::build_app_router;
use touchline_api::state::AppState;
use touchline_core::session::{CompletedSession, SessionListing};
use touchline_core::store::{SessionStore, StoreError};
use touchline_core::types::SessionId;
use touchline_db::MemorySessionStore;

/// Build a test `ServerConfig` with safe defaults and the in-memory store.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        store: StoreKind::Memory,
        ..ServerConfig::default()
    }
}

/// Build the full application router (same middleware stack as `main.rs`)
/// over an in-memory store. The state is returned for direct inspection.
pub fn build_test_app() -> (Router, AppState) {
    build_test_app_with(test_config(), Arc::new(MemorySessionStore::new()))
}

pub fn build_test_app_with(
    config: ServerConfig,
    store: Arc<dyn SessionStore>,
) -> (Router, AppState) {
    let state = AppState::new(config.clone(), store);
    let app = build_app_router(state.clone(), &config);
    (app, state)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

/// POST a raw body without a content type, the way a sloppy producer might.
pub async fn post_raw(app: &Router, uri: &str, body: impl Into<Body>) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(body.into())
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn post_json(app: &Router, uri: &str, json: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// A frame with `players` players, one keypoint each, and optionally a ball.
pub fn frame_json(frame_number: i64, players: usize, with_ball: bool) -> serde_json::Value {
    let players: Vec<_> = (0..players)
        .map(|i| {
            serde_json::json!({
                "bbox": {"x": 10.0 * i as f64, "y": 20.0, "width": 30.0, "height": 60.0},
                "classId": 2,
                "confidence": 0.91,
                "label": "player",
                "teamId": (i % 2) as i64,
                "tacMapPosition": {"x": 1.5, "y": 2.5},
            })
        })
        .collect();
    let balls = if with_ball {
        serde_json::json!([{"x": 100.0, "y": 200.0, "confidence": 0.7}])
    } else {
        serde_json::json!([])
    };
    serde_json::json!({
        "frameNumber": frame_number,
        "timestamp": frame_number as f64 / 25.0,
        "players": players,
        "keypoints": [{"label": "Center circle", "x": 640.0, "y": 360.0, "confidence": 0.88}],
        "balls": balls,
    })
}

// ---------------------------------------------------------------------------
// Failing store
// ---------------------------------------------------------------------------

/// In-memory store whose saves can be made to fail.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemorySessionStore,
    pub failing: AtomicBool,
}

impl FlakyStore {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl SessionStore for FlakyStore {
    async fn save(&self, session: &CompletedSession) -> Result<SessionId, StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::other("disk full")));
        }
        self.inner.save(session).await
    }

    async fn load(&self, id: &str) -> Result<Option<CompletedSession>, StoreError> {
        self.inner.load(id).await
    }

    async fn list_summaries(&self) -> Result<Vec<SessionListing>, StoreError> {
        self.inner.list_summaries().await
    }
}
