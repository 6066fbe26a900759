//! Integration tests for the stored-session queries.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use common::{body_json, frame_json, get, post_json};
use serde_json::json;
use touchline_db::FileSessionStore;

/// Run a full start → frames → complete cycle and return the stored id.
async fn record_session(app: &axum::Router, source: &str, frames: i64) -> String {
    let response = post_json(
        app,
        "/api/video/start",
        json!({"videoSource": source, "totalFrames": frames}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    for n in 1..=frames {
        post_json(app, "/api/frames", frame_json(n, 2, n % 2 == 0)).await;
    }

    let response = post_json(app, "/api/video/complete", json!({"videoSource": source})).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["sessionId"]
        .as_str()
        .unwrap()
        .to_string()
}

// ---------------------------------------------------------------------------
// Test: listing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_is_empty_initially() {
    let (app, _) = common::build_test_app();

    let response = get(&app, "/api/sessions").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "success");
    assert_eq!(json["count"], 0);
    assert_eq!(json["sessions"], json!([]));
}

#[tokio::test]
async fn list_returns_summaries_in_start_order() {
    let (app, _) = common::build_test_app();
    let first = record_session(&app, "first.mp4", 2).await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = record_session(&app, "second.mp4", 1).await;

    let json = body_json(get(&app, "/api/sessions").await).await;
    assert_eq!(json["count"], 2);

    let sessions = json["sessions"].as_array().unwrap();
    assert_eq!(sessions[0]["sessionId"], first.as_str());
    assert_eq!(sessions[0]["videoSource"], "first.mp4");
    assert_eq!(sessions[0]["framesReceived"], 2);
    assert!(sessions[0]["startTime"].is_string());
    assert_eq!(sessions[1]["sessionId"], second.as_str());
    assert!(sessions[0].get("frames").is_none());
}

// ---------------------------------------------------------------------------
// Test: fetching one session
// ---------------------------------------------------------------------------

#[tokio::test]
async fn get_session_returns_full_record_on_both_paths() {
    let (app, _) = common::build_test_app();
    let id = record_session(&app, "match.mp4", 3).await;

    for path in [format!("/api/session/{id}"), format!("/api/sessions/{id}")] {
        let response = get(&app, &path).await;
        assert_eq!(response.status(), StatusCode::OK, "{path}");

        let json = body_json(response).await;
        let session = &json["session"];
        assert_eq!(session["sessionId"], id.as_str());
        assert_eq!(session["framesReceived"], 3);
        assert_eq!(session["frames"].as_array().unwrap().len(), 3);
        assert_eq!(session["statistics"]["avgPlayers"], 2.0);
        assert_eq!(session["statistics"]["framesWithBall"], 1);
        assert!(session["endTime"].is_string());
        assert_eq!(session["frames"][0]["players"][0]["tacMapPosition"]["x"], 1.5);
    }
}

#[tokio::test]
async fn unknown_session_returns_404() {
    let (app, _) = common::build_test_app();

    let response = get(&app, "/api/session/20240113_123030_abcdef012345").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}

#[tokio::test]
async fn path_like_session_id_is_rejected() {
    let (app, _) = common::build_test_app();

    let response = get(&app, "/api/session/session.json").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

// ---------------------------------------------------------------------------
// Test: raw path separators survive the file store byte for byte
// ---------------------------------------------------------------------------

#[tokio::test]
async fn windows_path_round_trips_through_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileSessionStore::open(dir.path()).await.unwrap();
    let (app, _) = common::build_test_app_with(common::test_config(), Arc::new(store));

    let source = r#"D:\videos\"derby" match.mp4"#;
    let id = record_session(&app, source, 1).await;

    let json = body_json(get(&app, &format!("/api/session/{id}")).await).await;
    assert_eq!(json["session"]["videoSource"], source);

    assert!(dir.path().join(format!("session_{id}.json")).exists());
}
