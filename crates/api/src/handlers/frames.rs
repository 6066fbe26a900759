//! Handlers for frame ingestion.
//!
//! Each frame is decoded from the raw body before the engine is touched, so a
//! malformed submission never changes the session. Progress and detail
//! notifications go to the event bus and never affect the response.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use touchline_core::frame::FrameRecord;
use touchline_core::payload::nullable;
use touchline_core::session::{is_cadence_frame, progress_percent};
use touchline_core::types::SessionId;
use touchline_events::{event_types, IngestEvent};

use crate::error::AppResult;
use crate::handlers::decode_body;
use crate::state::AppState;

/// Longest pretty-printed frame written to the debug log.
const DEBUG_JSON_MAX_CHARS: usize = 2000;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Body of `POST /api/frames`: one frame record, optionally tagged with the
/// session it belongs to.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameSubmission {
    #[serde(flatten)]
    pub frame: FrameRecord,
    #[serde(default, deserialize_with = "nullable")]
    pub session_id: Option<SessionId>,
}

/// Body of `POST /api/frames/batch`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    #[serde(default, deserialize_with = "nullable")]
    pub frames: Vec<FrameRecord>,
    #[serde(default, deserialize_with = "nullable")]
    pub session_id: Option<SessionId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameResponse {
    pub status: &'static str,
    pub session_id: SessionId,
    pub frame_number: i64,
    /// Frames received by the session so far.
    pub received: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    pub status: &'static str,
    pub session_id: SessionId,
    /// Frames in this batch.
    pub frames_received: u64,
    /// Frames received by the session so far.
    pub total_received: u64,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/frames
pub async fn submit_frame(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<FrameResponse>> {
    let FrameSubmission { frame, session_id } = decode_body(&state, "frames", &body)?;

    if state.config.debug_json {
        log_frame_json(&frame);
    }

    let frame_number = frame.frame_number;
    let counts = json!({
        "players": frame.players.len(),
        "keypoints": frame.keypoints.len(),
        "balls": frame.balls.len(),
    });
    let detail = is_detail_frame(frame_number, state.config.detail_cadence)
        .then(|| frame_detail(&frame));

    let ack = state
        .engine
        .submit_frame(frame, session_id.as_deref())
        .await?;

    if is_cadence_frame(frame_number, state.config.progress_cadence) {
        let mut payload = counts;
        payload["frameNumber"] = json!(frame_number);
        payload["received"] = json!(ack.frames_received);
        payload["progress"] = json!(progress_percent(ack.frames_received, ack.total_frames));
        state.event_bus.publish(
            IngestEvent::new(event_types::FRAME_PROGRESS)
                .with_session(ack.session_id.clone())
                .with_payload(payload),
        );
    }
    if let Some(detail) = detail {
        state.event_bus.publish(
            IngestEvent::new(event_types::FRAME_DETAIL)
                .with_session(ack.session_id.clone())
                .with_payload(detail),
        );
    }

    Ok(Json(FrameResponse {
        status: "success",
        session_id: ack.session_id,
        frame_number,
        received: ack.frames_received,
    }))
}

/// POST /api/frames/batch
///
/// The whole batch is appended in one step, in list order.
pub async fn submit_batch(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<BatchResponse>> {
    let BatchRequest { frames, session_id } = decode_body(&state, "frames/batch", &body)?;

    if state.config.debug_json {
        frames.iter().for_each(log_frame_json);
    }

    let ack = state
        .engine
        .submit_batch(frames, session_id.as_deref())
        .await?;

    state.event_bus.publish(
        IngestEvent::new(event_types::BATCH_RECEIVED)
            .with_session(ack.session_id.clone())
            .with_payload(json!({
                "batchSize": ack.batch_size,
                "received": ack.frames_received,
                "progress": progress_percent(ack.frames_received, ack.total_frames),
            })),
    );

    Ok(Json(BatchResponse {
        status: "success",
        session_id: ack.session_id,
        frames_received: ack.batch_size,
        total_received: ack.frames_received,
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn is_detail_frame(frame_number: i64, cadence: i64) -> bool {
    cadence > 0 && frame_number % cadence == 0
}

/// Team breakdown plus the first player and keypoint of a frame.
fn frame_detail(frame: &FrameRecord) -> serde_json::Value {
    let example_player = frame.players.first().map(|p| {
        json!({
            "bbox": p.bounding_box,
            "confidence": p.confidence,
        })
    });
    let example_keypoint = frame.keypoints.first().map(|k| {
        json!({
            "label": k.label,
            "x": k.x,
            "y": k.y,
        })
    });

    json!({
        "frameNumber": frame.frame_number,
        "playersByTeam": frame.team_counts(),
        "keypoints": frame.keypoints.len(),
        "examplePlayer": example_player,
        "exampleKeypoint": example_keypoint,
    })
}

fn log_frame_json(frame: &FrameRecord) {
    match serde_json::to_string_pretty(frame) {
        Ok(text) => {
            let total_chars = text.chars().count();
            if total_chars > DEBUG_JSON_MAX_CHARS {
                let head: String = text.chars().take(DEBUG_JSON_MAX_CHARS).collect();
                tracing::debug!(
                    frame_number = frame.frame_number,
                    total_chars,
                    "Decoded frame (truncated):\n{head}"
                );
            } else {
                tracing::debug!(frame_number = frame.frame_number, "Decoded frame:\n{text}");
            }
        }
        Err(e) => tracing::debug!(error = %e, "Could not render frame as JSON"),
    }
}

#[cfg(test)]
mod tests {
    use touchline_core::frame::{KeypointDetection, PlayerDetection};

    use super::*;

    #[test]
    fn submission_accepts_session_id_alongside_frame_keys() {
        let submission: FrameSubmission = serde_json::from_str(
            r#"{"frameNumber":7,"sessionId":"abc","players":[{"teamId":1}],"balls":null}"#,
        )
        .unwrap();
        assert_eq!(submission.session_id.as_deref(), Some("abc"));
        assert_eq!(submission.frame.frame_number, 7);
        assert_eq!(submission.frame.players.len(), 1);
        assert!(submission.frame.balls.is_empty());
    }

    #[test]
    fn empty_object_is_an_empty_frame() {
        let submission: FrameSubmission = serde_json::from_str("{}").unwrap();
        assert_eq!(submission.frame, FrameRecord::default());
        assert!(submission.session_id.is_none());
    }

    #[test]
    fn detail_cadence_skips_frame_one_and_can_be_disabled() {
        assert!(is_detail_frame(100, 100));
        assert!(is_detail_frame(200, 100));
        assert!(!is_detail_frame(1, 100));
        assert!(!is_detail_frame(100, 0));
    }

    #[test]
    fn detail_groups_unassigned_players() {
        let frame = FrameRecord {
            frame_number: 100,
            players: vec![
                PlayerDetection {
                    team_id: Some(0),
                    confidence: 0.9,
                    ..Default::default()
                },
                PlayerDetection::default(),
            ],
            keypoints: vec![KeypointDetection {
                label: "Center circle".into(),
                x: 10.0,
                y: 20.0,
                confidence: 0.8,
            }],
            ..Default::default()
        };

        let detail = frame_detail(&frame);
        assert_eq!(detail["playersByTeam"]["0"], 1);
        assert_eq!(detail["playersByTeam"]["-1"], 1);
        assert_eq!(detail["examplePlayer"]["confidence"], 0.9);
        assert_eq!(detail["exampleKeypoint"]["label"], "Center circle");
    }
}
