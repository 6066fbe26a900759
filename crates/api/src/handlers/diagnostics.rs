use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::error::AppResult;
use crate::handlers::decode_body;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EchoResponse {
    pub status: &'static str,
    pub message: &'static str,
    /// Top-level keys of the decoded document; empty unless it is an object.
    pub data_keys: Vec<String>,
}

/// POST /api/test
///
/// Decodes the body the same way ingestion does and logs it, so a producer
/// can check its encoding without touching the session.
pub async fn echo(State(state): State<AppState>, body: Bytes) -> AppResult<Json<EchoResponse>> {
    let value: serde_json::Value = decode_body(&state, "test", &body)?;

    tracing::info!(
        byte_length = body.len(),
        "Test payload received:\n{}",
        serde_json::to_string_pretty(&value).unwrap_or_default()
    );

    let data_keys = value
        .as_object()
        .map(|map| map.keys().cloned().collect())
        .unwrap_or_default();

    Ok(Json(EchoResponse {
        status: "success",
        message: "Test data received",
        data_keys,
    }))
}
