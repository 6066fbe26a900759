//! PostgreSQL-backed session store.

use async_trait::async_trait;
use touchline_core::session::{CompletedSession, SessionListing};
use touchline_core::store::{SessionStore, StoreError};
use touchline_core::types::SessionId;

use crate::repositories::SessionRepo;
use crate::DbPool;

/// Stores completed sessions in the `sessions` table.
#[derive(Debug, Clone)]
pub struct PgSessionStore {
    pool: DbPool,
}

impl PgSessionStore {
    /// Wrap a pool whose migrations have already been applied.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(Box::new(err))
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn save(&self, session: &CompletedSession) -> Result<SessionId, StoreError> {
        let id = SessionRepo::upsert(&self.pool, session)
            .await
            .map_err(backend)?;
        tracing::debug!(session_id = %id, "Session row written");
        Ok(id)
    }

    async fn load(&self, id: &str) -> Result<Option<CompletedSession>, StoreError> {
        SessionRepo::find_by_id(&self.pool, id).await.map_err(backend)
    }

    async fn list_summaries(&self) -> Result<Vec<SessionListing>, StoreError> {
        let rows = SessionRepo::list(&self.pool).await.map_err(backend)?;
        Ok(rows.into_iter().map(SessionListing::from).collect())
    }
}
