use reqwest::StatusCode;
use serde_json::Value;

use super::common::{bearer, client, spawn_gateway, MockBackend, TEST_MODEL};

#[tokio::test]
async fn test_missing_token_is_rejected_before_backend() {
    let backend = MockBackend::start(&[TEST_MODEL]).await;
    let gateway = spawn_gateway(&backend.url()).await;

    let response = client()
        .post(gateway.url("/api/generate"))
        .body(r#"{"model":"mistral:7b","prompt":"hi"}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["type"], "authentication_error");
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_wrong_token_is_rejected_on_every_protected_route() {
    let backend = MockBackend::start(&[TEST_MODEL]).await;
    let gateway = spawn_gateway(&backend.url()).await;
    let client = client();

    for (method, path) in [
        (reqwest::Method::GET, "/api/tags"),
        (reqwest::Method::GET, "/api/ps"),
        (reqwest::Method::POST, "/api/chat"),
        (reqwest::Method::POST, "/api/pull"),
        (reqwest::Method::DELETE, "/api/delete"),
        (reqwest::Method::HEAD, "/api/blobs/sha256:abc"),
    ] {
        let response = client
            .request(method.clone(), gateway.url(path))
            .header("Authorization", "Bearer not-the-token")
            .send()
            .await
            .unwrap();
        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "{} {} should require a valid token",
            method,
            path
        );
    }
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_valid_token_is_not_forwarded_to_backend() {
    let backend = MockBackend::start(&[TEST_MODEL]).await;
    let gateway = spawn_gateway(&backend.url()).await;

    let response = client()
        .get(gateway.url("/api/tags"))
        .header("Authorization", bearer())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let recorded = backend.requests_to("/api/tags");
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].authorization, None);
}

#[tokio::test]
async fn test_health_needs_no_token() {
    let backend = MockBackend::start(&[TEST_MODEL]).await;
    let gateway = spawn_gateway(&backend.url()).await;

    let response = client().get(gateway.url("/health")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
