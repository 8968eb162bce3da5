//! HTTP route tests.

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use common::RawFileSinks;
use dashcam_api::{create_router, ApiConfig, AppState};
use serde_json::Value;
use tower::ServiceExt;

fn test_router() -> Router {
    let state = AppState::with_sink_factory(ApiConfig::default(), Arc::new(RawFileSinks::default()))
        .unwrap();
    create_router(state, None)
}

async fn send(request: Request<Body>) -> (StatusCode, Value) {
    let response = test_router().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from("{}"))
        .unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let (status, body) = send(get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_root_lists_endpoints() {
    let (status, body) = send(get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "BikeDashcamAI Video Processing Service");
    assert_eq!(body["version"], "1.0.0");
    assert_eq!(body["endpoints"]["websocket"], "/ws/{client_id}");
    assert_eq!(body["endpoints"]["health"], "/health");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let request = Request::builder()
        .uri("/health")
        .header("X-Request-ID", "abc-123")
        .body(Body::empty())
        .unwrap();
    let response = test_router().oneshot(request).await.unwrap();
    assert_eq!(response.headers()["X-Request-ID"], "abc-123");
}

#[tokio::test]
async fn test_detect_scene_defaults() {
    let (status, body) = send(post("/api/detect_scene")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Scene detector initialized");
    assert_eq!(body["config"]["threshold"], 0.3);
    assert_eq!(body["config"]["min_frames"], 3);
    assert_eq!(body["config"]["max_frames"], 5);
}

#[tokio::test]
async fn test_detect_scene_custom_parameters() {
    let (status, body) =
        send(post("/api/detect_scene?threshold=0.5&min_frames=2&max_frames=4")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["config"]["threshold"], 0.5);
    assert_eq!(body["config"]["min_frames"], 2);
    assert_eq!(body["config"]["max_frames"], 4);
}

#[tokio::test]
async fn test_detect_scene_rejects_invalid_parameters() {
    let (status, body) = send(post("/api/detect_scene?threshold=1.5")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("threshold"));

    let (status, _) = send(post("/api/detect_scene?min_frames=6&max_frames=5")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_ws_rejects_invalid_client_id() {
    let (status, _) = send(get("/ws/bad%21id")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let long_id = "a".repeat(65);
    let (status, _) = send(get(&format!("/ws/{}", long_id))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_ws_requires_upgrade() {
    let (status, _) = send(get("/ws/cam-1")).await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_metrics_disabled_is_not_found() {
    let (status, _) = send(get("/metrics")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[test]
fn test_invalid_config_rejected_at_startup() {
    let config = ApiConfig {
        output_width: 1281,
        ..Default::default()
    };
    assert!(AppState::with_sink_factory(config, Arc::new(RawFileSinks::default())).is_err());
}

#[tokio::test]
async fn test_detect_scene_rejects_malformed_query() {
    let (status, body) = send(post("/api/detect_scene?min_frames=-1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}
