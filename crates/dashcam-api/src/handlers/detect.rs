//! Scene detector configuration check.

use axum::extract::rejection::QueryRejection;
use axum::extract::Query;
use axum::Json;
use dashcam_media::{RetentionConfig, SceneChangeDetector};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};

/// Detector parameters; omitted values take the detector defaults.
#[derive(Debug, Default, Deserialize)]
pub struct DetectSceneParams {
    pub threshold: Option<f64>,
    pub min_frames: Option<usize>,
    pub max_frames: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct DetectorConfigResponse {
    pub threshold: f64,
    pub min_frames: usize,
    pub max_frames: usize,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct DetectSceneResponse {
    pub message: String,
    pub config: DetectorConfigResponse,
}

/// Validate detector parameters and echo the resulting configuration.
pub async fn detect_scene(
    params: Result<Query<DetectSceneParams>, QueryRejection>,
) -> ApiResult<Json<DetectSceneResponse>> {
    let Query(params) = params.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let defaults = RetentionConfig::default();
    let retention = RetentionConfig::new(
        params.threshold.unwrap_or(defaults.threshold),
        params.min_frames.unwrap_or(defaults.min_frames_per_scene),
        params.max_frames.unwrap_or(defaults.max_frames_per_scene),
    )?;
    let detector = SceneChangeDetector::new(retention.threshold);

    Ok(Json(DetectSceneResponse {
        message: "Scene detector initialized".to_string(),
        config: DetectorConfigResponse {
            threshold: detector.threshold(),
            min_frames: retention.min_frames_per_scene,
            max_frames: retention.max_frames_per_scene,
        },
    }))
}
