//! Session aggregate: the in-memory session being filled and the immutable
//! record it becomes at completion.
//!
//! [`ActiveSession`] owns its frame sequence; the only way to add frames is
//! through the state machine, which keeps `frames_received` equal to the
//! sequence length. [`ActiveSession::complete`] consumes the session and
//! yields a [`CompletedSession`], which exposes no mutators.

use serde::{Deserialize, Serialize};

use crate::frame::FrameRecord;
use crate::statistics::{self, SessionStatistics};
use crate::types::{SessionId, Timestamp};

/// Frame numbers that are multiples of this emit a progress notification.
pub const DEFAULT_PROGRESS_CADENCE: i64 = 30;

/// Frame numbers that are multiples of this emit a detailed diagnostic.
pub const DEFAULT_DETAIL_CADENCE: i64 = 100;

/// Generate a session identifier: UTC start time plus a random suffix.
pub fn generate_session_id(now: Timestamp) -> SessionId {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}", now.format("%Y%m%d_%H%M%S"), &suffix[..12])
}

/// Percentage of `total` frames received; `0` when no total was declared.
pub fn progress_percent(received: u64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    received as f64 / total as f64 * 100.0
}

/// Whether `frame_number` falls on a notification boundary.
///
/// Frame 1 always qualifies so the first frame of a run is visible.
/// A `cadence` of zero or less disables everything but frame 1.
pub fn is_cadence_frame(frame_number: i64, cadence: i64) -> bool {
    frame_number == 1 || (cadence > 0 && frame_number % cadence == 0)
}

// ---------------------------------------------------------------------------
// Active session
// ---------------------------------------------------------------------------

/// The session currently accumulating frames.
#[derive(Debug, Clone)]
pub struct ActiveSession {
    session_id: SessionId,
    video_source: String,
    total_frames: i64,
    start_time: Timestamp,
    last_activity: Timestamp,
    frames: Vec<FrameRecord>,
}

impl ActiveSession {
    /// Create an empty session started at `now` with a fresh identifier.
    pub fn new(video_source: impl Into<String>, total_frames: i64, now: Timestamp) -> Self {
        Self {
            session_id: generate_session_id(now),
            video_source: video_source.into(),
            total_frames,
            start_time: now,
            last_activity: now,
            frames: Vec::new(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn video_source(&self) -> &str {
        &self.video_source
    }

    /// Declared frame count; a hint only.
    pub fn total_frames(&self) -> i64 {
        self.total_frames
    }

    pub fn start_time(&self) -> Timestamp {
        self.start_time
    }

    /// Time of the last start or append.
    pub fn last_activity(&self) -> Timestamp {
        self.last_activity
    }

    /// Frames in arrival order.
    pub fn frames(&self) -> &[FrameRecord] {
        &self.frames
    }

    pub fn frames_received(&self) -> u64 {
        self.frames.len() as u64
    }

    pub fn progress_percent(&self) -> f64 {
        progress_percent(self.frames_received(), self.total_frames)
    }

    pub(crate) fn push_frame(&mut self, frame: FrameRecord, now: Timestamp) -> u64 {
        self.frames.push(frame);
        self.last_activity = now;
        self.frames_received()
    }

    pub(crate) fn extend_frames(&mut self, frames: Vec<FrameRecord>, now: Timestamp) -> u64 {
        self.frames.extend(frames);
        self.last_activity = now;
        self.frames_received()
    }

    /// Finalize the session: stamp `end_time` and compute statistics.
    pub fn complete(self, end_time: Timestamp) -> CompletedSession {
        let statistics = statistics::compute(&self.frames);
        CompletedSession {
            session_id: self.session_id,
            video_source: self.video_source,
            total_frames: self.total_frames,
            frames_received: self.frames.len() as u64,
            start_time: self.start_time,
            end_time,
            statistics,
            frames: self.frames,
        }
    }
}

// ---------------------------------------------------------------------------
// Completed session
// ---------------------------------------------------------------------------

/// A finalized session as handed to, and read back from, the session store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedSession {
    session_id: SessionId,
    video_source: String,
    total_frames: i64,
    frames_received: u64,
    start_time: Timestamp,
    end_time: Timestamp,
    statistics: SessionStatistics,
    frames: Vec<FrameRecord>,
}

impl CompletedSession {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn video_source(&self) -> &str {
        &self.video_source
    }

    pub fn total_frames(&self) -> i64 {
        self.total_frames
    }

    pub fn frames_received(&self) -> u64 {
        self.frames_received
    }

    pub fn start_time(&self) -> Timestamp {
        self.start_time
    }

    pub fn end_time(&self) -> Timestamp {
        self.end_time
    }

    pub fn statistics(&self) -> &SessionStatistics {
        &self.statistics
    }

    pub fn frames(&self) -> &[FrameRecord] {
        &self.frames
    }

    /// Wall-clock duration between start and completion, in seconds.
    pub fn duration_secs(&self) -> f64 {
        (self.end_time - self.start_time).num_milliseconds().max(0) as f64 / 1000.0
    }

    /// Frames received per second of wall-clock time, if any time elapsed.
    pub fn average_fps(&self) -> Option<f64> {
        let secs = self.duration_secs();
        (secs > 0.0).then(|| self.frames_received as f64 / secs)
    }

    /// Listing row for this session.
    pub fn listing(&self) -> SessionListing {
        SessionListing {
            session_id: self.session_id.clone(),
            video_source: self.video_source.clone(),
            frames_received: self.frames_received,
            start_time: self.start_time,
        }
    }

    /// Turn a record whose persistence failed back into an active session.
    pub(crate) fn reopen(self) -> ActiveSession {
        ActiveSession {
            session_id: self.session_id,
            video_source: self.video_source,
            total_frames: self.total_frames,
            start_time: self.start_time,
            last_activity: self.end_time,
            frames: self.frames,
        }
    }
}

/// Summary row returned by session listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionListing {
    pub session_id: SessionId,
    pub video_source: String,
    pub frames_received: u64,
    pub start_time: Timestamp,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
