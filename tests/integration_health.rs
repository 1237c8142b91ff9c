#![allow(clippy::unwrap_used, clippy::panic, clippy::missing_panics_doc, clippy::must_use_candidate, missing_debug_implementations, clippy::cast_precision_loss, clippy::items_after_statements, unreachable_pub, clippy::print_stdout, clippy::similar_names)]
use alertdavao_server::config::TypingBackend;
use reqwest::StatusCode;
use serde_json::Value;

mod common;

#[tokio::test]
async fn test_livez() {
    let app = common::TestApp::spawn().await;

    let resp = app.client.get(format!("{}/livez", app.mgmt_url)).send().await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_readyz_happy_path() {
    let app = common::TestApp::spawn().await;

    let resp = app.client.get(format!("{}/readyz", app.mgmt_url)).send().await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
    assert_eq!(body["typing"], "ok");
    assert_eq!(body["typingBackend"], "memory");
}

#[tokio::test]
async fn test_readyz_database_error() {
    let app = common::TestApp::spawn().await;

    // A closed pool behaves like an unreachable database
    app.pool.close().await;

    let resp = app.client.get(format!("{}/readyz", app.mgmt_url)).send().await.unwrap();

    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "error");
    assert_eq!(body["database"], "error");
    // The in-memory typing store does not depend on the database
    assert_eq!(body["typing"], "ok");
}

#[tokio::test]
async fn test_readyz_checks_table_backed_typing_store() {
    let app = common::TestApp::spawn_with_config(common::get_test_config_with_backend(TypingBackend::Database)).await;

    let resp = app.client.get(format!("{}/readyz", app.mgmt_url)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["typing"], "ok");
    assert_eq!(body["typingBackend"], "database");

    app.pool.close().await;

    let resp = app.client.get(format!("{}/readyz", app.mgmt_url)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "error");
    assert_eq!(body["typing"], "error");
    assert_eq!(body["typingBackend"], "database");
}

#[tokio::test]
async fn test_openapi_document_carries_crate_version() {
    let app = common::TestApp::spawn().await;

    let resp = app.client.get(format!("{}/openapi.yaml", app.server_url)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "text/yaml");

    let text = resp.text().await.unwrap();
    assert!(text.contains(&format!("version: {}", env!("CARGO_PKG_VERSION"))));
    assert!(text.contains("/messages/typing-status/{senderId}/{receiverId}"));
}
