//! Row types for the `sessions` table.

use sqlx::FromRow;
use touchline_core::session::SessionListing;
use touchline_core::types::{SessionId, Timestamp};

/// Listing columns of a `sessions` row.
#[derive(Debug, Clone, FromRow)]
pub struct SessionListingRow {
    pub session_id: SessionId,
    pub video_source: String,
    pub frames_received: i64,
    pub start_time: Timestamp,
}

impl From<SessionListingRow> for SessionListing {
    fn from(row: SessionListingRow) -> Self {
        SessionListing {
            session_id: row.session_id,
            video_source: row.video_source,
            frames_received: u64::try_from(row.frames_received).unwrap_or(0),
            start_time: row.start_time,
        }
    }
}
