//! Forecast job kickoff against a mock upstream.

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use common::TestApp;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::{
    matchers::{body_partial_json, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn trigger(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/forecast-runs")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn trigger_relays_the_timestamp_to_the_job_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/run"))
        .and(body_partial_json(
            json!({"timestamp": "2024-05-01T00:00:00+00:00"}),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let app = TestApp::with_forecast_job_url(format!("{}/run", server.uri())).await;

    let response = app
        .router()
        .oneshot(trigger(json!({"timestamp": "2024-05-01T00:00:00Z"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["requestedAt"], json!("2024-05-01T00:00:00Z"));
}

#[tokio::test]
async fn upstream_failure_surfaces_as_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/run"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let app = TestApp::with_forecast_job_url(format!("{}/run", server.uri())).await;

    let response = app
        .router()
        .oneshot(trigger(json!({"timestamp": "2024-05-01T00:00:00Z"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = body_json(response).await;
    assert!(body["detail"].as_str().unwrap().contains("forecast job"));
}

#[tokio::test]
async fn unconfigured_job_endpoint_is_rejected_up_front() {
    let app = TestApp::new().await;

    let response = app.router().oneshot(trigger(json!({}))).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .contains("not configured"));
}
