//! Tests for `AppError` → HTTP response mapping.
//!
//! These call `IntoResponse` directly on `AppError` values; no router is
//! involved.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use touchline_api::error::AppError;
use touchline_core::error::CoreError;
use touchline_core::payload::DecodeError;
use touchline_core::store::StoreError;

/// Helper: convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

// ---------------------------------------------------------------------------
// Test: malformed payloads carry diagnostics
// ---------------------------------------------------------------------------

#[tokio::test]
async fn malformed_payload_returns_400_with_diagnostics() {
    let err = AppError::Malformed(DecodeError {
        message: "invalid escape at line 1 column 21".into(),
        byte_length: 58,
        preview: r#"{"videoSource":"D:\videos"#.into(),
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], "error");
    assert_eq!(json["code"], "MALFORMED_PAYLOAD");
    assert_eq!(json["diagnostics"]["byteLength"], 58);
    assert_eq!(json["diagnostics"]["preview"], r#"{"videoSource":"D:\videos"#);
    assert!(json["message"].as_str().unwrap().contains("invalid escape"));
}

// ---------------------------------------------------------------------------
// Test: lifecycle errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn no_active_session_returns_400() {
    let (status, json) = error_to_response(CoreError::NoActiveSession.into()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "NO_ACTIVE_SESSION");
    assert_eq!(
        json["message"],
        "No active session. Call /api/video/start first."
    );
}

#[tokio::test]
async fn session_conflicts_return_409() {
    let cases = [
        (
            CoreError::SessionMismatch {
                requested: "a".into(),
                current: "b".into(),
            },
            "SESSION_MISMATCH",
        ),
        (
            CoreError::SessionAlreadyActive {
                session_id: "a".into(),
            },
            "SESSION_ALREADY_ACTIVE",
        ),
        (
            CoreError::SessionFinalizing {
                session_id: "a".into(),
            },
            "SESSION_FINALIZING",
        ),
    ];

    for (err, code) in cases {
        let (status, json) = error_to_response(err.into()).await;
        assert_eq!(status, StatusCode::CONFLICT, "{code}");
        assert_eq!(json["code"], code);
    }
}

// ---------------------------------------------------------------------------
// Test: CoreError::NotFound maps to 404 with NOT_FOUND code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn not_found_error_returns_404() {
    let err = AppError::Core(CoreError::NotFound {
        entity: "Session",
        id: "20240113_123030_abcdef012345".into(),
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(
        json["message"],
        "Session with id 20240113_123030_abcdef012345 not found"
    );
}

// ---------------------------------------------------------------------------
// Test: 500s never leak details
// ---------------------------------------------------------------------------

#[tokio::test]
async fn persistence_failure_returns_500_and_sanitizes_message() {
    let err = AppError::Core(CoreError::Persistence(
        "I/O error: /secret/mount/session.json: disk full".into(),
    ));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "PERSISTENCE_FAILURE");
    assert!(!json.to_string().contains("secret"));
}

#[tokio::test]
async fn internal_error_returns_500_and_sanitizes_message() {
    let err = AppError::InternalError("secret database credentials leaked".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert!(
        !json.to_string().contains("secret"),
        "Internal error response must not leak sensitive details"
    );
    assert_eq!(json["message"], "An internal error occurred");
}

// ---------------------------------------------------------------------------
// Test: store errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_store_id_is_a_validation_error() {
    let (status, json) =
        error_to_response(StoreError::InvalidId("../etc".into()).into()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
}
