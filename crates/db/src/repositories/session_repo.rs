//! Repository for the `sessions` table.

use sqlx::types::Json;
use sqlx::PgPool;
use touchline_core::session::CompletedSession;
use touchline_core::types::SessionId;

use crate::models::session::SessionListingRow;

/// Column list for listing queries.
const LISTING_COLUMNS: &str = "session_id, video_source, frames_received, start_time";

/// Provides data access for completed sessions.
pub struct SessionRepo;

impl SessionRepo {
    /// Insert a completed session, or overwrite the row with the same id.
    ///
    /// Idempotent so a retried completion never fails on the primary key.
    pub async fn upsert(
        pool: &PgPool,
        session: &CompletedSession,
    ) -> Result<SessionId, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "INSERT INTO sessions \
                 (session_id, video_source, total_frames, frames_received, \
                  start_time, end_time, statistics, record) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (session_id) DO UPDATE SET \
                 video_source = EXCLUDED.video_source, \
                 total_frames = EXCLUDED.total_frames, \
                 frames_received = EXCLUDED.frames_received, \
                 start_time = EXCLUDED.start_time, \
                 end_time = EXCLUDED.end_time, \
                 statistics = EXCLUDED.statistics, \
                 record = EXCLUDED.record \
             RETURNING session_id",
        )
        .bind(session.session_id())
        .bind(session.video_source())
        .bind(session.total_frames())
        .bind(i64::try_from(session.frames_received()).unwrap_or(i64::MAX))
        .bind(session.start_time())
        .bind(session.end_time())
        .bind(Json(session.statistics()))
        .bind(Json(session))
        .fetch_one(pool)
        .await
    }

    /// Fetch the full record for a session.
    pub async fn find_by_id(
        pool: &PgPool,
        session_id: &str,
    ) -> Result<Option<CompletedSession>, sqlx::Error> {
        let record = sqlx::query_scalar::<_, Json<CompletedSession>>(
            "SELECT record FROM sessions WHERE session_id = $1",
        )
        .bind(session_id)
        .fetch_optional(pool)
        .await?;
        Ok(record.map(|Json(session)| session))
    }

    /// List all sessions, oldest start first.
    pub async fn list(pool: &PgPool) -> Result<Vec<SessionListingRow>, sqlx::Error> {
        let query =
            format!("SELECT {LISTING_COLUMNS} FROM sessions ORDER BY start_time ASC, session_id ASC");
        sqlx::query_as::<_, SessionListingRow>(&query)
            .fetch_all(pool)
            .await
    }
}
