//! Integration tests for the health endpoint.

mod common;

use common::spawn_app;

#[tokio::test]
async fn health_check_returns_ok() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/health"))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "gateway-service");
    assert_eq!(body["checks"]["cache"], "up");
    assert_eq!(body["checks"]["store"], "up");
}
