//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] fans out [`IngestEvent`]s (session lifecycle changes and
//! progress notifications) to any number of subscribers. Publishing never
//! blocks: when nobody listens the event is dropped, and a slow subscriber
//! loses the oldest events instead of stalling the publisher.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use touchline_core::types::SessionId;

/// Event type names.
pub mod event_types {
    pub const SESSION_STARTED: &str = "session.started";
    pub const SESSION_REPLACED: &str = "session.replaced";
    pub const SESSION_COMPLETED: &str = "session.completed";
    pub const SESSION_EXPIRED: &str = "session.expired";
    pub const FRAME_PROGRESS: &str = "frame.progress";
    pub const FRAME_DETAIL: &str = "frame.detail";
    pub const BATCH_RECEIVED: &str = "batch.received";
}

// ---------------------------------------------------------------------------
// IngestEvent
// ---------------------------------------------------------------------------

/// Something that happened to the ingestion session.
///
/// Constructed via [`IngestEvent::new`] and enriched with
/// [`with_session`](IngestEvent::with_session) and
/// [`with_payload`](IngestEvent::with_payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestEvent {
    /// Dot-separated event name, e.g. `"frame.progress"`.
    pub event_type: String,

    /// Session the event belongs to, if any.
    pub session_id: Option<SessionId>,

    /// Event-specific data.
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl IngestEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            session_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_session(mut self, session_id: impl Into<SessionId>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
pub struct EventBus {
    sender: broadcast::Sender<IngestEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: IngestEvent) {
        // A send error only means there are no receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<IngestEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
