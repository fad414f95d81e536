//! Integration tests for the generative proxy operations.

mod common;

use common::{spawn_app, spawn_app_with_state, test_state};
use gateway_service::services::providers::mock::MockGenerativeProvider;
use std::sync::Arc;

#[tokio::test]
async fn generate_text_returns_text_and_usage() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/generateText"))
        .json(&serde_json::json!({
            "prompt": "How do I protect tomatoes from blight?",
            "temperature": 0.4,
            "maxTokens": 256
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert!(body["text"].as_str().unwrap().contains("tomatoes"));
    assert!(body["usage"]["inputTokens"].is_number());
    assert!(body["usage"]["outputTokens"].is_number());
}

#[tokio::test]
async fn empty_prompt_is_rejected_with_invalid_request() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/generateText"))
        .json(&serde_json::json!({ "prompt": "" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 422);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["code"], "invalid_request");
    assert!(body["error"].as_str().unwrap().contains("prompt"));
}

#[tokio::test]
async fn analyze_image_returns_structured_diagnosis() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/analyzeImage"))
        .json(&serde_json::json!({
            "image": "aGVsbG8gbGVhZg==",
            "mimeType": "image/jpeg",
            "prompt": "Diagnose this leaf"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["diseaseName"], "Late Blight");
    assert_eq!(body["severity"], "medium");
    assert!(body["symptoms"].as_array().unwrap().len() > 0);
    assert_eq!(body["treatment"]["chemical"]["productName"], "Mancozeb 75% WP");

    let confidence = body["confidence"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&confidence));
}

#[tokio::test]
async fn out_of_range_confidence_is_clamped() {
    let mut state = test_state();
    state.generative = Arc::new(MockGenerativeProvider::with_confidence(1.4));
    let app = spawn_app_with_state(state).await;

    let response = app
        .client
        .post(app.url("/analyzeImage"))
        .json(&serde_json::json!({
            "image": "aGVsbG8gbGVhZg==",
            "mimeType": "image/jpeg",
            "prompt": "Diagnose this leaf"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["confidence"].as_f64().unwrap(), 1.0);
}

#[tokio::test]
async fn analyze_image_rejects_invalid_base64() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/analyzeImage"))
        .json(&serde_json::json!({
            "image": "!!! not base64 !!!",
            "mimeType": "image/jpeg",
            "prompt": "Diagnose this leaf"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 400);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["code"], "invalid_request");
}

#[tokio::test]
async fn analyze_image_rejects_non_image_mime_type() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/analyzeImage"))
        .json(&serde_json::json!({
            "image": "aGVsbG8=",
            "mimeType": "application/pdf",
            "prompt": "Diagnose this leaf"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn chat_answers_price_questions_with_price_information() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/chat"))
        .json(&serde_json::json!({
            "messages": [{ "role": "user", "content": "What is the wheat price?" }]
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    let reply = body["response"].as_str().unwrap();
    assert!(!reply.is_empty());
    assert!(reply.to_lowercase().contains("price"));
}

#[tokio::test]
async fn chat_with_no_history_greets() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/chat"))
        .json(&serde_json::json!({ "messages": [] }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert!(body["response"].as_str().unwrap().contains("farming"));
}
