#![allow(clippy::unwrap_used, clippy::panic, clippy::missing_panics_doc, clippy::must_use_candidate, missing_debug_implementations, clippy::cast_precision_loss, clippy::items_after_statements, unreachable_pub, clippy::print_stdout, clippy::similar_names)]
use reqwest::StatusCode;
use serde_json::{Value, json};

mod common;

#[tokio::test]
async fn test_request_past_deadline_returns_timeout_envelope() {
    let app = common::TestApp::spawn().await;

    // Registration hashes a password, which cannot finish inside a zero deadline
    let mut config = common::get_test_config();
    config.server.request_timeout_secs = 0;
    let strict = common::TestApp::spawn_with_config(config).await;

    let resp = strict
        .client
        .post(format!("{}/users", strict.server_url))
        .json(&json!({ "username": format!("slow_{}", common::run_id()), "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::REQUEST_TIMEOUT);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Request timed out");

    // The default deadline leaves room for the same work
    let user = app.register_user("patient").await;
    assert_eq!(app.unread_count(&user).await, 0);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = common::TestApp::spawn().await;

    let resp = app
        .client
        .get(format!("{}/openapi.yaml", app.server_url))
        .header("x-request-id", "trace-me-123")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.headers()["x-request-id"], "trace-me-123");

    let resp = app.client.get(format!("{}/openapi.yaml", app.server_url)).send().await.unwrap();
    let generated = resp.headers()["x-request-id"].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(generated).is_ok());
}
