//! Handlers for the session lifecycle: start, complete and progress.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use touchline_core::lifecycle::SessionStatus;
use touchline_core::payload::nullable;
use touchline_core::statistics::SessionStatistics;
use touchline_core::types::{SessionId, Timestamp};
use touchline_events::{event_types, IngestEvent};

use crate::error::AppResult;
use crate::handlers::decode_body;
use crate::state::AppState;

const UNKNOWN_SOURCE: &str = "unknown";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Body of `POST /api/video/start`.
///
/// The producer also sends its own `timestamp`; it is ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    #[serde(default, deserialize_with = "nullable")]
    pub video_source: Option<String>,
    /// Declared frame count; a progress hint only.
    #[serde(default, deserialize_with = "nullable")]
    pub total_frames: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartResponse {
    pub status: &'static str,
    pub session_id: SessionId,
    pub message: String,
    pub start_time: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replaced_session_id: Option<SessionId>,
}

/// Body of `POST /api/video/complete`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteRequest {
    #[serde(default, deserialize_with = "nullable")]
    pub video_source: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub session_id: Option<SessionId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteResponse {
    pub status: &'static str,
    pub session_id: SessionId,
    pub video_source: String,
    pub frames_received: u64,
    pub total_frames: i64,
    pub duration_secs: f64,
    pub avg_fps: Option<f64>,
    pub statistics: SessionStatistics,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub session: SessionStatus,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/video/start
///
/// Under the default policy an unfinished session is discarded, not saved.
pub async fn start_session(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<StartResponse>> {
    let request: StartRequest = decode_body(&state, "video/start", &body)?;
    let video_source = request
        .video_source
        .unwrap_or_else(|| UNKNOWN_SOURCE.to_string());

    let outcome = state
        .engine
        .start(video_source.clone(), request.total_frames)
        .await?;

    if let Some(old) = &outcome.replaced {
        state.event_bus.publish(
            IngestEvent::new(event_types::SESSION_REPLACED)
                .with_session(old.session_id.clone())
                .with_payload(json!({
                    "framesReceived": old.frames_received,
                    "replacedBy": outcome.session_id,
                })),
        );
    }
    state.event_bus.publish(
        IngestEvent::new(event_types::SESSION_STARTED)
            .with_session(outcome.session_id.clone())
            .with_payload(json!({
                "videoSource": video_source,
                "totalFrames": request.total_frames,
            })),
    );

    Ok(Json(StartResponse {
        status: "success",
        message: format!("Session {} started", outcome.session_id),
        session_id: outcome.session_id,
        start_time: outcome.start_time,
        replaced_session_id: outcome.replaced.map(|old| old.session_id),
    }))
}

/// POST /api/video/complete
///
/// Computes statistics, persists the session and returns the summary. If
/// the store fails the session stays active and completion can be retried.
pub async fn complete_session(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<CompleteResponse>> {
    let request: CompleteRequest = decode_body(&state, "video/complete", &body)?;

    let completion = state
        .engine
        .complete(request.session_id.as_deref(), state.store.as_ref())
        .await?;
    let session = &completion.session;

    if let Some(reported) = request
        .video_source
        .as_deref()
        .filter(|s| *s != session.video_source())
    {
        tracing::warn!(
            session_id = %session.session_id(),
            started_with = %session.video_source(),
            completed_with = %reported,
            "Completion reported a different video source; keeping the original",
        );
    }

    let statistics = *session.statistics();
    let duration_secs = session.duration_secs();
    let avg_fps = session.average_fps();

    state.event_bus.publish(
        IngestEvent::new(event_types::SESSION_COMPLETED)
            .with_session(completion.stored_id.clone())
            .with_payload(json!({
                "videoSource": session.video_source(),
                "framesReceived": session.frames_received(),
                "totalFrames": session.total_frames(),
                "durationSecs": duration_secs,
                "avgFps": avg_fps,
                "statistics": statistics,
            })),
    );

    Ok(Json(CompleteResponse {
        status: "success",
        message: format!(
            "Session {} completed with {} frames",
            completion.stored_id,
            session.frames_received()
        ),
        session_id: completion.stored_id.clone(),
        video_source: session.video_source().to_string(),
        frames_received: session.frames_received(),
        total_frames: session.total_frames(),
        duration_secs,
        avg_fps,
        statistics,
    }))
}

/// GET /api/video/status
pub async fn session_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "success",
        session: state.engine.status().await,
    })
}
