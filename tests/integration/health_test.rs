use reqwest::StatusCode;
use serde_json::Value;

use super::common::{client, spawn_gateway, unreachable_backend_url, MockBackend, TEST_MODEL};

#[tokio::test]
async fn test_health_reports_backend_down() {
    let gateway = spawn_gateway(&unreachable_backend_url().await).await;

    let response = client().get(gateway.url("/health")).send().await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "error");
    assert_eq!(body["backend"], "unreachable");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_health_reports_loaded_model() {
    let backend = MockBackend::start(&[TEST_MODEL]).await;
    backend.set_loaded(&[TEST_MODEL]);
    let gateway = spawn_gateway(&backend.url()).await;

    let response = client().get(gateway.url("/health")).send().await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["backend_version"], "0.5.7");
    assert_eq!(body["model"], TEST_MODEL);
    assert_eq!(body["model_loaded"], true);
}

#[tokio::test]
async fn test_health_reports_model_not_loaded() {
    let backend = MockBackend::start(&[TEST_MODEL]).await;
    backend.set_loaded(&["llama3:8b"]);
    let gateway = spawn_gateway(&backend.url()).await;

    let body: Value = client()
        .get(gateway.url("/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "ok");
    assert_eq!(body["model_loaded"], false);
}
