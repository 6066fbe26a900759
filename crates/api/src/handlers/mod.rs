pub mod diagnostics;
pub mod frames;
pub mod health;
pub mod sessions;
pub mod video;

use serde::de::DeserializeOwned;
use touchline_core::payload::{self, Decoded};

use crate::error::AppResult;
use crate::state::AppState;

/// Decode a raw request body with the server's decoder settings.
///
/// Content type is never consulted. A repaired decode is accepted but logged.
pub(crate) fn decode_body<T: DeserializeOwned>(
    state: &AppState,
    route: &'static str,
    body: &[u8],
) -> AppResult<T> {
    let Decoded { value, repaired } = payload::decode(body, &state.config.decode_options())?;
    if repaired {
        tracing::warn!(
            route,
            byte_length = body.len(),
            "Accepted payload after repairing invalid backslash escapes",
        );
    }
    Ok(value)
}
