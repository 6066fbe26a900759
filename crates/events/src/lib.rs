//! Touchline event bus and progress log.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`IngestEvent`]: the event envelope.
//! - [`ProgressLog`]: background task that writes events to the log.

pub mod bus;
pub mod sink;

pub use bus::{event_types, EventBus, IngestEvent};
pub use sink::ProgressLog;
