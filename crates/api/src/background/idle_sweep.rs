//! Expiry of abandoned sessions.
//!
//! A producer that crashes mid-run never sends `complete`, which leaves its
//! session active forever. When an idle timeout is configured this task
//! discards such a session, without persisting it, once nothing has been
//! appended for longer than the timeout.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use touchline_core::lifecycle::{DiscardedSession, SessionEngine};
use touchline_core::types::Timestamp;
use touchline_events::{event_types, EventBus, IngestEvent};

/// Upper bound on the time between checks.
const MAX_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Run the idle sweep until `cancel` is triggered.
pub async fn run(
    engine: Arc<SessionEngine>,
    event_bus: Arc<EventBus>,
    idle_timeout: Duration,
    cancel: CancellationToken,
) {
    let check_interval = idle_timeout.clamp(Duration::from_secs(1), MAX_CHECK_INTERVAL);

    tracing::info!(
        idle_timeout_secs = idle_timeout.as_secs(),
        interval_secs = check_interval.as_secs(),
        "Idle session sweep started"
    );

    let mut interval = tokio::time::interval(check_interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Idle session sweep stopping");
                break;
            }
            _ = interval.tick() => {
                sweep_once(&engine, &event_bus, idle_timeout, Utc::now()).await;
            }
        }
    }
}

/// Expire the active session if it has been idle for `idle_timeout` at `now`.
pub async fn sweep_once(
    engine: &SessionEngine,
    event_bus: &EventBus,
    idle_timeout: Duration,
    now: Timestamp,
) -> Option<DiscardedSession> {
    let timeout = chrono::Duration::from_std(idle_timeout).unwrap_or(chrono::Duration::MAX);
    let cutoff = now.checked_sub_signed(timeout)?;

    let expired = engine.expire_idle(cutoff).await?;
    tracing::warn!(
        session_id = %expired.session_id,
        frames_discarded = expired.frames_received,
        idle_timeout_secs = idle_timeout.as_secs(),
        "Expired idle session without persisting it",
    );
    event_bus.publish(
        IngestEvent::new(event_types::SESSION_EXPIRED)
            .with_session(expired.session_id.clone())
            .with_payload(json!({
                "framesReceived": expired.frames_received,
                "idleTimeoutSecs": idle_timeout.as_secs(),
            })),
    );
    Some(expired)
}

#[cfg(test)]
mod tests {
    use touchline_core::frame::FrameRecord;
    use touchline_core::lifecycle::SessionStatus;

    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(300);

    #[tokio::test]
    async fn fresh_session_survives() {
        let engine = SessionEngine::default();
        let bus = EventBus::default();
        engine.start("live.mp4", 0).await.unwrap();

        assert!(sweep_once(&engine, &bus, TIMEOUT, Utc::now()).await.is_none());
        assert!(matches!(engine.status().await, SessionStatus::Active { .. }));
    }

    #[tokio::test]
    async fn stale_session_is_discarded_and_announced() {
        let engine = SessionEngine::default();
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        let started = engine.start("abandoned.mp4", 0).await.unwrap();
        engine.submit_frame(FrameRecord::default(), None).await.unwrap();

        let later = Utc::now() + chrono::Duration::seconds(301);
        let expired = sweep_once(&engine, &bus, TIMEOUT, later)
            .await
            .expect("session should expire");

        assert_eq!(expired.session_id, started.session_id);
        assert_eq!(expired.frames_received, 1);
        assert_eq!(engine.status().await, SessionStatus::Idle);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type, event_types::SESSION_EXPIRED);
        assert_eq!(event.payload["framesReceived"], 1);
    }

    #[tokio::test]
    async fn stops_when_cancelled() {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(
            Arc::new(SessionEngine::default()),
            Arc::new(EventBus::default()),
            Duration::from_secs(1),
            cancel.clone(),
        ));

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("sweep should stop after cancellation")
            .unwrap();
    }
}
