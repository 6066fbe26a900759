//! Filesystem-backed session store.
//!
//! Layout:
//! ```text
//! {dir}/
//! ├── session_20240113_123030_3f2a9c1e0b7d.json
//! └── session_20240113_140211_81c0d44e92aa.json
//! ```
//!
//! Each file is the pretty-printed JSON of one [`CompletedSession`]. Writes go
//! to a hidden temp file that is fsynced and renamed into place, so a reader
//! never observes a partial record.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use touchline_core::session::{CompletedSession, SessionListing};
use touchline_core::store::{sort_listings, validate_session_id, SessionStore, StoreError};
use touchline_core::types::SessionId;

const FILE_PREFIX: &str = "session_";
const FILE_SUFFIX: &str = ".json";

/// Stores one JSON document per completed session.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the document for `id`. The id must already be validated.
    pub fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{FILE_PREFIX}{id}{FILE_SUFFIX}"))
    }

    fn temp_path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!(".{FILE_PREFIX}{id}{FILE_SUFFIX}.tmp"))
    }
}

fn is_session_file(name: &str) -> bool {
    name.starts_with(FILE_PREFIX) && name.ends_with(FILE_SUFFIX)
}

/// Flush the directory entry so a completed rename survives a crash.
#[cfg(unix)]
async fn sync_dir(dir: &Path) -> std::io::Result<()> {
    tokio::fs::File::open(dir).await?.sync_all().await
}

// Directory handles cannot be opened for fsync on Windows.
#[cfg(not(unix))]
async fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn save(&self, session: &CompletedSession) -> Result<SessionId, StoreError> {
        let id = session.session_id();
        validate_session_id(id)?;

        let bytes = serde_json::to_vec_pretty(session)?;
        let temp = self.temp_path_for(id);
        let written = async {
            let mut file = tokio::fs::File::create(&temp).await?;
            file.write_all(&bytes).await?;
            file.sync_all().await
        }
        .await;
        if let Err(err) = written {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(err.into());
        }

        let path = self.path_for(id);
        if let Err(err) = tokio::fs::rename(&temp, &path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(err.into());
        }
        sync_dir(&self.dir).await?;
        tracing::debug!(session_id = %id, path = %path.display(), "Session file written");

        Ok(id.to_owned())
    }

    async fn load(&self, id: &str) -> Result<Option<CompletedSession>, StoreError> {
        validate_session_id(id)?;
        match tokio::fs::read(self.path_for(id)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn list_summaries(&self) -> Result<Vec<SessionListing>, StoreError> {
        let mut listings = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !is_session_file(name) {
                continue;
            }

            let parsed = tokio::fs::read(entry.path())
                .await
                .map_err(StoreError::from)
                .and_then(|bytes| {
                    serde_json::from_slice::<SessionListing>(&bytes).map_err(StoreError::from)
                });
            match parsed {
                Ok(listing) => listings.push(listing),
                Err(err) => {
                    tracing::warn!(file = name, error = %err, "Skipping unreadable session file");
                }
            }
        }

        sort_listings(&mut listings);
        Ok(listings)
    }
}
