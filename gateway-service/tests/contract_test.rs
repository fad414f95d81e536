//! Tests for the uniform endpoint contract: preflight, method gating,
//! and cross-origin headers.

mod common;

use common::spawn_app;
use reqwest::Method;

const ALL_ROUTES: [&str; 6] = [
    "/generateText",
    "/analyzeImage",
    "/chat",
    "/getWeather",
    "/getMarketPrices",
    "/syncData",
];

const POST_ONLY_ROUTES: [&str; 4] = ["/generateText", "/analyzeImage", "/chat", "/syncData"];

#[tokio::test]
async fn options_preflight_returns_204_with_empty_body() {
    let app = spawn_app().await;

    for route in ALL_ROUTES {
        let response = app
            .client
            .request(Method::OPTIONS, app.url(route))
            .send()
            .await
            .expect("Failed to send request");

        assert_eq!(response.status().as_u16(), 204, "route {route}");
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("*"),
            "route {route}"
        );
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-methods")
                .and_then(|v| v.to_str().ok()),
            Some("GET, POST, OPTIONS"),
            "route {route}"
        );
        let body = response.text().await.expect("Failed to read body");
        assert!(body.is_empty(), "route {route} body: {body}");
    }
}

#[tokio::test]
async fn non_post_methods_get_405_with_contract_body() {
    let app = spawn_app().await;

    for route in POST_ONLY_ROUTES {
        for method in [Method::GET, Method::PUT, Method::DELETE] {
            let response = app
                .client
                .request(method.clone(), app.url(route))
                .send()
                .await
                .expect("Failed to send request");

            assert_eq!(response.status().as_u16(), 405, "{method} {route}");

            let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
            assert_eq!(
                body,
                serde_json::json!({ "error": "Method not allowed" }),
                "{method} {route}"
            );
        }
    }
}

#[tokio::test]
async fn every_response_allows_any_origin() {
    let app = spawn_app().await;

    // success, client error, and 405 responses all carry the header
    let checks = [
        app.client.get(app.url("/getWeather")).send().await.unwrap(),
        app.client.get(app.url("/health")).send().await.unwrap(),
        app.client.get(app.url("/chat")).send().await.unwrap(),
        app.client
            .post(app.url("/generateText"))
            .json(&serde_json::json!({ "prompt": "" }))
            .send()
            .await
            .unwrap(),
    ];

    for response in checks {
        let url = response.url().clone();
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("*"),
            "url {url}"
        );
    }
}

#[tokio::test]
async fn post_responses_advertise_allowed_methods() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/chat"))
        .json(&serde_json::json!({ "messages": [] }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-methods")
            .and_then(|v| v.to_str().ok()),
        Some("GET, POST, OPTIONS")
    );
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-headers")
            .and_then(|v| v.to_str().ok()),
        Some("Content-Type")
    );
}
