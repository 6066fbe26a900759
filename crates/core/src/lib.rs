//! Touchline core: the session lifecycle and frame-ingestion engine.
//!
//! Pure domain logic with no transport or storage concerns:
//!
//! - [`frame`]: typed per-frame detections.
//! - [`statistics`]: summary metrics over a session's frames.
//! - [`session`]: active and completed session aggregates.
//! - [`lifecycle`]: the lock-guarded Idle/Active state machine.
//! - [`payload`]: tolerant decoding of raw producer bodies.
//! - [`store`]: the session persistence contract.

pub mod error;
pub mod frame;
pub mod lifecycle;
pub mod payload;
pub mod session;
pub mod statistics;
pub mod store;
pub mod types;
