//! Logging sink for ingestion events.
//!
//! [`ProgressLog`] drains the bus and writes each event to the log. It is the
//! observability end of the progress notifications; losing events here never
//! affects session state.

use tokio::sync::broadcast;

use crate::bus::{event_types, IngestEvent};

/// Background task that logs every event published on the bus.
pub struct ProgressLog;

impl ProgressLog {
    /// Run until the bus is dropped.
    pub async fn run(mut receiver: broadcast::Receiver<IngestEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => Self::log(&event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Progress log lagged, some events were not logged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, progress log shutting down");
                    break;
                }
            }
        }
    }

    fn log(event: &IngestEvent) {
        let session_id = event.session_id.as_deref().unwrap_or("-");
        let p = &event.payload;

        match event.event_type.as_str() {
            event_types::FRAME_PROGRESS => tracing::info!(
                session_id,
                "Frame {:>4} | Progress: {:>5.1}% | Players: {:>2} | Keypoints: {:>2} | Balls: {}",
                p["frameNumber"].as_i64().unwrap_or_default(),
                p["progress"].as_f64().unwrap_or_default(),
                p["players"].as_u64().unwrap_or_default(),
                p["keypoints"].as_u64().unwrap_or_default(),
                p["balls"].as_u64().unwrap_or_default(),
            ),
            event_types::FRAME_DETAIL => tracing::info!(
                session_id,
                frame_number = p["frameNumber"].as_i64().unwrap_or_default(),
                players_by_team = %p["playersByTeam"],
                example_player = %p["examplePlayer"],
                example_keypoint = %p["exampleKeypoint"],
                "Frame details",
            ),
            event_types::SESSION_STARTED => tracing::info!(
                session_id,
                video_source = %p["videoSource"],
                total_frames = p["totalFrames"].as_i64().unwrap_or_default(),
                "Video processing started",
            ),
            event_types::SESSION_COMPLETED => tracing::info!(
                session_id,
                video_source = %p["videoSource"],
                frames_received = p["framesReceived"].as_u64().unwrap_or_default(),
                total_frames = p["totalFrames"].as_i64().unwrap_or_default(),
                duration_secs = p["durationSecs"].as_f64().unwrap_or_default(),
                avg_fps = %p["avgFps"],
                statistics = %p["statistics"],
                "Video processing completed",
            ),
            event_types::SESSION_REPLACED | event_types::SESSION_EXPIRED => tracing::warn!(
                session_id,
                event_type = %event.event_type,
                frames_discarded = p["framesReceived"].as_u64().unwrap_or_default(),
                "Unfinished session discarded",
            ),
            _ => tracing::info!(
                session_id,
                event_type = %event.event_type,
                payload = %p,
                "Ingestion event",
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::EventBus;

    #[tokio::test]
    async fn exits_when_bus_is_dropped() {
        let bus = EventBus::default();
        let handle = tokio::spawn(ProgressLog::run(bus.subscribe()));

        bus.publish(
            IngestEvent::new(event_types::FRAME_PROGRESS)
                .with_payload(serde_json::json!({"frameNumber": 1, "progress": 0.5})),
        );
        bus.publish(IngestEvent::new("custom.event"));
        drop(bus);

        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .expect("sink should stop once the bus is closed")
            .unwrap();
    }
}
