//! Companion chat service endpoint tests

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use neomind::server::{self, ConversationStore};
use tokio::sync::Mutex;
use tower::ServiceExt;

/// Build a test router with empty history
fn build_test_router() -> axum::Router {
    server::router(Arc::new(Mutex::new(ConversationStore::new())))
}

fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = build_test_router();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["message"], "NeoMind server is running");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_chat_reply_and_history() {
    let app = build_test_router();

    let response = app
        .clone()
        .oneshot(post_json(
            "/chat/text",
            &serde_json::json!({ "message": "Can we do math?", "child_name": "Mia" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(
        body["response"],
        "I love math, Mia! Math is like solving fun puzzles. What math problem are you working on?"
    );
    assert_eq!(body["child_name"], "Mia");
    assert_eq!(body["conversation_count"], 2);
    assert_eq!(body["memories_used"], 1);

    let response = app
        .oneshot(post_json(
            "/chat/text",
            &serde_json::json!({ "message": "hello", "child_name": "Mia" }),
        ))
        .await
        .unwrap();
    assert_eq!(json_body(response).await["conversation_count"], 4);
}

#[tokio::test]
async fn test_chat_defaults_child_name() {
    let app = build_test_router();

    let response = app
        .oneshot(post_json("/chat/text", &serde_json::json!({ "message": "paint" })))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["child_name"], "friend");
    assert!(body["response"].as_str().unwrap().contains("friend"));
}

#[tokio::test]
async fn test_chat_rejects_malformed_body() {
    let app = build_test_router();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/chat/text")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_memory_search() {
    let app = build_test_router();

    app.clone()
        .oneshot(post_json(
            "/chat/text",
            &serde_json::json!({ "message": "I saw a Rainbow today", "child_name": "Leo" }),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(post_json(
            "/memories/search",
            &serde_json::json!({ "query": "rainbow", "child_name": "Leo" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["query"], "rainbow");
    assert_eq!(body["count"], 1);
    assert_eq!(body["memories"][0]["fact"], "I saw a Rainbow today");
    assert_eq!(body["memories"][0]["relevance"], 0.8);

    // Other children's history is separate
    let response = app
        .oneshot(post_json(
            "/memories/search",
            &serde_json::json!({ "query": "rainbow", "child_name": "Mia" }),
        ))
        .await
        .unwrap();
    assert_eq!(json_body(response).await["count"], 0);
}
