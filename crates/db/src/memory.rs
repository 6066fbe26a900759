//! In-memory session store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use touchline_core::session::{CompletedSession, SessionListing};
use touchline_core::store::{sort_listings, SessionStore, StoreError};
use touchline_core::types::SessionId;

/// Keeps completed sessions in a map for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<BTreeMap<SessionId, CompletedSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn save(&self, session: &CompletedSession) -> Result<SessionId, StoreError> {
        let id = session.session_id().to_owned();
        self.sessions
            .write()
            .await
            .insert(id.clone(), session.clone());
        Ok(id)
    }

    async fn load(&self, id: &str) -> Result<Option<CompletedSession>, StoreError> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn list_summaries(&self) -> Result<Vec<SessionListing>, StoreError> {
        let mut listings: Vec<SessionListing> = self
            .sessions
            .read()
            .await
            .values()
            .map(CompletedSession::listing)
            .collect();
        sort_listings(&mut listings);
        Ok(listings)
    }
}
