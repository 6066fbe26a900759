//! Session Store contract.
//!
//! Completed sessions are appended to a store and read back by identifier.
//! The medium (memory, files, a database) is supplied by the `touchline-db`
//! crate; the state machine only depends on this trait.

use async_trait::async_trait;

use crate::session::{CompletedSession, SessionListing};
use crate::types::SessionId;

/// Errors raised by a [`SessionStore`] backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Invalid session id '{0}'")]
    InvalidId(String),
}

/// Append-only persistence of completed sessions.
///
/// `save` must be durable before it returns `Ok`. `load` and
/// `list_summaries` must reflect every session previously saved.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a completed session, returning the identifier it is stored under.
    async fn save(&self, session: &CompletedSession) -> Result<SessionId, StoreError>;

    /// Load a session by identifier. Returns `Ok(None)` if it does not exist.
    async fn load(&self, id: &str) -> Result<Option<CompletedSession>, StoreError>;

    /// List all stored sessions, oldest start first.
    async fn list_summaries(&self) -> Result<Vec<SessionListing>, StoreError>;
}

/// Reject identifiers that are empty or contain anything but
/// `[A-Za-z0-9_-]`.
pub fn validate_session_id(id: &str) -> Result<(), StoreError> {
    let valid = !id.is_empty()
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidId(id.to_string()))
    }
}

/// Sort listings by start time, then id.
pub fn sort_listings(listings: &mut [SessionListing]) {
    listings.sort_by(|a, b| {
        a.start_time
            .cmp(&b.start_time)
            .then_with(|| a.session_id.cmp(&b.session_id))
    });
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn generated_ids_are_valid() {
        let id = crate::session::generate_session_id(chrono::Utc::now());
        assert!(validate_session_id(&id).is_ok());
    }

    #[test]
    fn path_like_ids_are_rejected() {
        for id in ["", "../etc/passwd", "a/b", r"a\b", "x.json", "id with space"] {
            assert_matches!(validate_session_id(id), Err(StoreError::InvalidId(_)), "{id}");
        }
    }
}
