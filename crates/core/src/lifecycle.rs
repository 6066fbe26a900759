//! Session State Machine.
//!
//! [`SessionEngine`] owns the single current session behind one async mutex.
//! Every transition and every append takes the lock, checks the slot and
//! mutates it before releasing, so a frame can never land in a session other
//! than the one it was validated against.
//!
//! ```text
//!            start                      complete (save ok)
//!   Idle ─────────────▶ Active ──▶ Finalizing ───────────▶ Idle
//!     ▲                 │  ▲            │
//!     │  start (replace)│  └────────────┘ complete (save failed)
//!     │                 ▼
//!     └──── expire_idle / replaced by a newer start
//! ```
//!
//! `Finalizing` is internal: the session has left "current" and is being
//! written to the store without the lock held. Appends and completes observe
//! it as [`CoreError::SessionFinalizing`].

use std::str::FromStr;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::CoreError;
use crate::frame::FrameRecord;
use crate::session::{ActiveSession, CompletedSession};
use crate::store::SessionStore;
use crate::types::{SessionId, Timestamp};

// ---------------------------------------------------------------------------
// Start policy
// ---------------------------------------------------------------------------

/// What a start does while another session is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StartPolicy {
    /// Discard the in-memory session (without persisting it) and start anew.
    #[default]
    Replace,
    /// Refuse with [`CoreError::SessionAlreadyActive`].
    Reject,
}

impl FromStr for StartPolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(Self::Replace),
            "reject" => Ok(Self::Reject),
            other => Err(CoreError::Validation(format!(
                "Unknown start policy '{other}'. Must be one of: replace, reject"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// A session dropped from memory without being persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscardedSession {
    pub session_id: SessionId,
    pub frames_received: u64,
}

impl DiscardedSession {
    fn from_active(session: &ActiveSession) -> Self {
        Self {
            session_id: session.session_id().to_owned(),
            frames_received: session.frames_received(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StartOutcome {
    pub session_id: SessionId,
    pub start_time: Timestamp,
    /// The unfinished session this start replaced, if any.
    pub replaced: Option<DiscardedSession>,
}

#[derive(Debug, Clone)]
pub struct FrameAck {
    pub session_id: SessionId,
    pub frames_received: u64,
    pub total_frames: i64,
}

#[derive(Debug, Clone)]
pub struct BatchAck {
    pub session_id: SessionId,
    pub batch_size: u64,
    pub frames_received: u64,
    pub total_frames: i64,
}

/// Result of a successful completion.
#[derive(Debug, Clone)]
pub struct Completion {
    pub session: CompletedSession,
    /// Identifier returned by the store.
    pub stored_id: SessionId,
}

/// Point-in-time view of the engine for progress reads.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum SessionStatus {
    Idle,
    Active {
        session_id: SessionId,
        video_source: String,
        frames_received: u64,
        total_frames: i64,
        progress: f64,
        start_time: Timestamp,
        last_activity: Timestamp,
    },
    Finalizing {
        session_id: SessionId,
    },
}

// ---------------------------------------------------------------------------
// Slot
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
enum Slot {
    #[default]
    Idle,
    Active(ActiveSession),
    Finalizing(SessionId),
}

impl Slot {
    /// The active session, provided it matches `target` when one is given.
    fn active_mut(&mut self, target: Option<&str>) -> Result<&mut ActiveSession, CoreError> {
        match self {
            Slot::Idle => Err(CoreError::NoActiveSession),
            Slot::Finalizing(session_id) => Err(CoreError::SessionFinalizing {
                session_id: session_id.clone(),
            }),
            Slot::Active(session) => match target {
                Some(requested) if requested != session.session_id() => {
                    Err(CoreError::SessionMismatch {
                        requested: requested.to_owned(),
                        current: session.session_id().to_owned(),
                    })
                }
                _ => Ok(session),
            },
        }
    }

    fn is_finalizing(&self, session_id: &str) -> bool {
        matches!(self, Slot::Finalizing(id) if id == session_id)
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Owner of the one-session-at-a-time lifecycle.
#[derive(Debug, Default)]
pub struct SessionEngine {
    slot: Mutex<Slot>,
    policy: StartPolicy,
}

impl SessionEngine {
    pub fn new(policy: StartPolicy) -> Self {
        Self {
            slot: Mutex::new(Slot::Idle),
            policy,
        }
    }

    pub fn policy(&self) -> StartPolicy {
        self.policy
    }

    /// Begin a new session.
    ///
    /// Under [`StartPolicy::Replace`] an active session is discarded without
    /// persistence; a session already being finalized is left to finish.
    pub async fn start(
        &self,
        video_source: impl Into<String>,
        total_frames: i64,
    ) -> Result<StartOutcome, CoreError> {
        let mut slot = self.slot.lock().await;

        let replaced = match (&*slot, self.policy) {
            (Slot::Active(current), StartPolicy::Reject) => {
                return Err(CoreError::SessionAlreadyActive {
                    session_id: current.session_id().to_owned(),
                })
            }
            (Slot::Finalizing(session_id), StartPolicy::Reject) => {
                return Err(CoreError::SessionFinalizing {
                    session_id: session_id.clone(),
                })
            }
            (Slot::Active(current), StartPolicy::Replace) => {
                Some(DiscardedSession::from_active(current))
            }
            _ => None,
        };

        let session = ActiveSession::new(video_source, total_frames, Utc::now());
        let outcome = StartOutcome {
            session_id: session.session_id().to_owned(),
            start_time: session.start_time(),
            replaced,
        };
        *slot = Slot::Active(session);

        if let Some(old) = &outcome.replaced {
            tracing::warn!(
                replaced_session_id = %old.session_id,
                frames_discarded = old.frames_received,
                session_id = %outcome.session_id,
                "Unfinished session replaced by a new start",
            );
        }

        Ok(outcome)
    }

    /// Append one frame to the active session.
    pub async fn submit_frame(
        &self,
        frame: FrameRecord,
        target: Option<&str>,
    ) -> Result<FrameAck, CoreError> {
        let mut slot = self.slot.lock().await;
        let session = slot.active_mut(target)?;
        let frames_received = session.push_frame(frame, Utc::now());

        Ok(FrameAck {
            session_id: session.session_id().to_owned(),
            frames_received,
            total_frames: session.total_frames(),
        })
    }

    /// Append `frames` to the active session, in order, as one step.
    pub async fn submit_batch(
        &self,
        frames: Vec<FrameRecord>,
        target: Option<&str>,
    ) -> Result<BatchAck, CoreError> {
        let batch_size = frames.len() as u64;
        let mut slot = self.slot.lock().await;
        let session = slot.active_mut(target)?;
        let frames_received = session.extend_frames(frames, Utc::now());

        Ok(BatchAck {
            session_id: session.session_id().to_owned(),
            batch_size,
            frames_received,
            total_frames: session.total_frames(),
        })
    }

    /// Finalize the active session and persist it through `store`.
    ///
    /// The session is detached under the lock; the store call runs without
    /// it. If the store fails the session becomes active again so the
    /// caller may retry; a retry re-stamps the end time and recomputes the
    /// statistics.
    pub async fn complete(
        &self,
        target: Option<&str>,
        store: &dyn SessionStore,
    ) -> Result<Completion, CoreError> {
        let active = {
            let mut slot = self.slot.lock().await;
            slot.active_mut(target)?;
            let Slot::Active(active) = std::mem::take(&mut *slot) else {
                return Err(CoreError::Internal("session slot changed under lock".into()));
            };
            *slot = Slot::Finalizing(active.session_id().to_owned());
            active
        };

        let completed = active.complete(Utc::now());

        match store.save(&completed).await {
            Ok(stored_id) => {
                let mut slot = self.slot.lock().await;
                if slot.is_finalizing(completed.session_id()) {
                    *slot = Slot::Idle;
                }
                Ok(Completion {
                    session: completed,
                    stored_id,
                })
            }
            Err(err) => {
                tracing::error!(
                    error = %err,
                    session_id = %completed.session_id(),
                    "Failed to persist completed session",
                );
                let mut slot = self.slot.lock().await;
                if slot.is_finalizing(completed.session_id()) {
                    *slot = Slot::Active(completed.reopen());
                } else {
                    tracing::error!(
                        session_id = %completed.session_id(),
                        frames_lost = completed.frames_received(),
                        "Session replaced during finalization; unsaved frames dropped",
                    );
                }
                Err(CoreError::Persistence(err.to_string()))
            }
        }
    }

    /// Discard the active session if nothing has touched it since `cutoff`.
    pub async fn expire_idle(&self, cutoff: Timestamp) -> Option<DiscardedSession> {
        let mut slot = self.slot.lock().await;
        let expired = match &*slot {
            Slot::Active(session) if session.last_activity() < cutoff => {
                DiscardedSession::from_active(session)
            }
            _ => return None,
        };
        *slot = Slot::Idle;
        Some(expired)
    }

    pub async fn status(&self) -> SessionStatus {
        let slot = self.slot.lock().await;
        match &*slot {
            Slot::Idle => SessionStatus::Idle,
            Slot::Finalizing(session_id) => SessionStatus::Finalizing {
                session_id: session_id.clone(),
            },
            Slot::Active(session) => SessionStatus::Active {
                session_id: session.session_id().to_owned(),
                video_source: session.video_source().to_owned(),
                frames_received: session.frames_received(),
                total_frames: session.total_frames(),
                progress: session.progress_percent(),
                start_time: session.start_time(),
                last_activity: session.last_activity(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
