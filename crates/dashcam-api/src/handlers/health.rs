//! Health check handlers.

use std::collections::BTreeMap;

use axum::Json;
use chrono::Utc;
use serde::Serialize;

/// Service banner.
#[derive(Serialize)]
pub struct RootResponse {
    pub message: String,
    pub version: String,
    pub endpoints: BTreeMap<String, String>,
}

/// Service banner with the available endpoints.
pub async fn root() -> Json<RootResponse> {
    let endpoints = [
        ("websocket", "/ws/{client_id}"),
        ("health", "/health"),
        ("detect_scene", "/api/detect_scene"),
    ]
    .into_iter()
    .map(|(name, path)| (name.to_string(), path.to_string()))
    .collect();

    Json(RootResponse {
        message: "BikeDashcamAI Video Processing Service".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints,
    })
}

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint (liveness probe).
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}
