//! Integration tests for the HTTP API.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

mod common;

use common::{StubGenerator, test_app, test_app_with};

/// Start a session and return the parsed reply.
async fn start_session(app: &Router, body: &'static str) -> serde_json::Value {
    let response = app
        .clone()
        .oneshot(
            Request::post("/api/v1/sessions")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

// ============================================================================
// Health Endpoints
// ============================================================================

#[tokio::test]
async fn test_livez() {
    let app = test_app();

    let response = app
        .oneshot(Request::get("/livez").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"ok");
}

#[tokio::test]
async fn test_readyz() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(Request::get("/readyz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["status"], "ok");
    assert_eq!(json["active_sessions"], 0);

    start_session(&app, r#"{"topic": "nutrition", "student_id": "s1"}"#).await;

    let response = app
        .oneshot(Request::get("/readyz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["active_sessions"], 1);
}

#[tokio::test]
async fn test_version() {
    let app = test_app();

    let response = app
        .oneshot(Request::get("/version").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert!(json.get("version").is_some());
}

// ============================================================================
// Topics API
// ============================================================================

#[tokio::test]
async fn test_list_topics() {
    let app = test_app();

    let response = app
        .oneshot(Request::get("/api/v1/topics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    let topics = json["topics"].as_array().unwrap();
    assert_eq!(topics.len(), 2);
    assert_eq!(topics[0]["topic"], "nutrition");
    assert_eq!(topics[0]["chunk_count"], 5);
    assert_eq!(
        topics[0]["description"],
        "Study material with 5 content sections"
    );
    assert_eq!(topics[1]["topic"], "photosynthesis");
    assert_eq!(topics[1]["chunk_count"], 3);
}

#[tokio::test]
async fn test_list_topics_fail_open_on_missing_corpus() {
    use revaid::server::{self, AppState};
    use tempfile::TempDir;

    let tmp = TempDir::new().unwrap();
    // Leak the TempDir so it doesn't get cleaned up during the test.
    let tmp = Box::leak(Box::new(tmp));
    let engine = common::build_engine(
        &tmp.path().join("absent.jsonl"),
        &tmp.path().join("sessions"),
        Arc::new(StubGenerator::new("unused")),
    );
    let app = server::build_app(
        AppState {
            engine: Arc::new(engine),
            max_connections: 16,
        },
        300,
    );

    let response = app
        .oneshot(Request::get("/api/v1/topics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["topics"], serde_json::json!([]));
}

// ============================================================================
// Sessions API
// ============================================================================

#[tokio::test]
async fn test_list_sessions_empty() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::get("/api/v1/sessions")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["sessions"], serde_json::json!([]));
}

#[tokio::test]
async fn test_start_session_created() {
    let app = test_app();

    let json = start_session(&app, r#"{"topic": "nutrition", "student_id": "s1"}"#).await;

    assert!(json["session_id"].as_str().unwrap().starts_with("sess_"));
    assert_eq!(json["response"], "Stubbed tutor reply");
    assert_eq!(json["topic"], "nutrition");
    assert_eq!(json["conversation_count"], 0);
    assert_eq!(json["current_stage"], "kickoff_response");
    assert_eq!(json["is_session_complete"], false);
    assert_eq!(
        json["sources"],
        serde_json::json!(["nutri_0", "nutri_1", "nutri_2"])
    );
    assert_eq!(json["max_conversations"], 30);
    assert_eq!(json["completion_threshold"], 20);
}

#[tokio::test]
async fn test_start_session_empty_topic_rejected() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::post("/api/v1/sessions")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"topic": "   ", "student_id": "s1"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["status"], 400);
    assert!(json["detail"].as_str().unwrap().contains("topic"));
}

#[tokio::test]
async fn test_start_session_generator_fault_is_bad_gateway() {
    let app = test_app_with(Arc::new(StubGenerator::failing_from("unused", 1)));

    let response = app
        .oneshot(
            Request::post("/api/v1/sessions")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"topic": "nutrition", "student_id": "s1"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["status"], 502);
}

#[tokio::test]
async fn test_continue_session_roundtrip() {
    let app = test_app();

    let start = start_session(&app, r#"{"topic": "nutrition", "student_id": "s1"}"#).await;
    let session_id = start["session_id"].as_str().unwrap();

    let response = app
        .oneshot(
            Request::post(format!("/api/v1/sessions/{session_id}/messages"))
                .header("content-type", "application/json")
                .body(Body::from(r#"{"message": "ok continue please"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["conversation_count"], 1);
    assert_eq!(json["current_stage"], "kickoff_response");
    assert_eq!(json["sources"], serde_json::json!(["nutri_0"]));
    assert_eq!(json["is_session_complete"], false);
}

#[tokio::test]
async fn test_continue_unknown_session_not_found() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::post("/api/v1/sessions/nonexistent/messages")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"message": "hello"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/problem+json"
    );

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["status"], 404);
    assert_eq!(
        json["detail"],
        "Session not found. Please start a new revision session."
    );
}

#[tokio::test]
async fn test_get_session_progress() {
    let app = test_app();

    let start = start_session(&app, r#"{"topic": "nutrition", "student_id": "s1"}"#).await;
    let session_id = start["session_id"].as_str().unwrap();

    let response = app
        .oneshot(
            Request::get(format!("/api/v1/sessions/{session_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["topic"], "nutrition");
    assert_eq!(json["student_id"], "s1");
    assert_eq!(json["conversation_count"], 0);
    assert_eq!(json["is_complete"], false);
    assert_eq!(json["completion_percentage"], 0.0);
    assert_eq!(json["total_chunks"], 5);
    assert_eq!(json["max_conversations"], 30);
    assert_eq!(json["completion_threshold"], 20);
    assert_eq!(json["understanding_level"], "beginner");
    assert_eq!(json["key_concepts_covered"], serde_json::json!([]));
}

#[tokio::test]
async fn test_get_session_not_found() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::get("/api/v1/sessions/nonexistent")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["status"], 404);
}

#[tokio::test]
async fn test_list_sessions_after_start() {
    let app = test_app();

    let start = start_session(&app, r#"{"topic": "nutrition", "student_id": "s1"}"#).await;
    let session_id = start["session_id"].as_str().unwrap();

    let response = app
        .oneshot(
            Request::get("/api/v1/sessions")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    let sessions = json["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["session_id"], session_id);
    assert_eq!(sessions[0]["topic"], "nutrition");
    assert_eq!(sessions[0]["conversation_count"], 0);
    assert_eq!(sessions[0]["is_complete"], false);
}

#[tokio::test]
async fn test_delete_session() {
    let app = test_app();

    let start = start_session(&app, r#"{"topic": "nutrition", "student_id": "s1"}"#).await;
    let session_id = start["session_id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::delete(format!("/api/v1/sessions/{session_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(
            Request::get(format!("/api/v1/sessions/{session_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(
            Request::delete(format!("/api/v1/sessions/{session_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Turn Log
// ============================================================================

#[tokio::test]
async fn test_turn_log_records_every_turn() {
    let app = test_app();

    let start = start_session(&app, r#"{"topic": "nutrition", "student_id": "s1"}"#).await;
    let session_id = start["session_id"].as_str().unwrap();

    for message in [
        r#"{"message": "ok continue please"}"#,
        r#"{"message": "tell me more"}"#,
    ] {
        let response = app
            .clone()
            .oneshot(
                Request::post(format!("/api/v1/sessions/{session_id}/messages"))
                    .header("content-type", "application/json")
                    .body(Body::from(message))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .oneshot(
            Request::get(format!("/api/v1/sessions/{session_id}/turns"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    let turns = json["turns"].as_array().unwrap();
    assert_eq!(turns.len(), 3);
    assert_eq!(turns[0]["turn"], 0);
    assert!(turns[0].get("user_message").is_none());
    assert_eq!(turns[0]["stage"], "kickoff_response");
    assert_eq!(turns[1]["turn"], 1);
    assert_eq!(turns[1]["user_message"], "ok continue please");
    assert_eq!(turns[1]["stage"], "kickoff_response");
    assert_eq!(turns[2]["turn"], 2);
    assert_eq!(turns[2]["stage"], "progressive_recap");
}

#[tokio::test]
async fn test_turns_limit_keeps_most_recent() {
    let app = test_app();

    let start = start_session(&app, r#"{"topic": "nutrition", "student_id": "s1"}"#).await;
    let session_id = start["session_id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::post(format!("/api/v1/sessions/{session_id}/messages"))
                .header("content-type", "application/json")
                .body(Body::from(r#"{"message": "ok continue please"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::get(format!("/api/v1/sessions/{session_id}/turns?limit=1"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    let turns = json["turns"].as_array().unwrap();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0]["turn"], 1);
}

#[tokio::test]
async fn test_turns_unknown_session_not_found() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::get("/api/v1/sessions/nonexistent/turns")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Error Responses
// ============================================================================

#[tokio::test]
async fn test_problem_details_format() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::get("/api/v1/sessions/nonexistent")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/problem+json"
    );

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    // RFC 7807 required fields
    assert!(json.get("type").is_some());
    assert!(json.get("title").is_some());
    assert!(json.get("status").is_some());
}
