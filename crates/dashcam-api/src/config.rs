//! API configuration.

use std::path::PathBuf;
use std::str::FromStr;

use dashcam_media::{MediaResult, ProcessorConfig, RetentionConfig, DEFAULT_PREVIEW_QUALITY};

use crate::session::SessionSettings;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Directory receiving assembled videos
    pub output_dir: PathBuf,
    /// Output frame rate
    pub output_fps: u32,
    /// Output width
    pub output_width: u32,
    /// Output height
    pub output_height: u32,
    /// Pixel difference threshold for scene changes
    pub scene_threshold: f64,
    /// Frames kept per continuing scene
    pub min_frames_per_scene: usize,
    /// Frames kept for a frame that opens a scene
    pub max_frames_per_scene: usize,
    /// JPEG quality of preview frames
    pub preview_quality: u8,
    /// Answer malformed frames with an error instead of ending the session
    pub skip_invalid_frames: bool,
    /// Outbound messages buffered per session before backpressure
    pub outbound_buffer: usize,
    /// Largest accepted WebSocket message
    pub max_message_size: usize,
    /// Max HTTP request body size
    pub max_body_size: usize,
    /// Expose Prometheus metrics at /metrics
    pub metrics_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        let processor = ProcessorConfig::default();
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            output_dir: PathBuf::from("outputs"),
            output_fps: processor.fps,
            output_width: processor.output_width,
            output_height: processor.output_height,
            scene_threshold: processor.retention.threshold,
            min_frames_per_scene: processor.retention.min_frames_per_scene,
            max_frames_per_scene: processor.retention.max_frames_per_scene,
            preview_quality: DEFAULT_PREVIEW_QUALITY,
            skip_invalid_frames: false,
            outbound_buffer: 32,
            max_message_size: 16 * 1024 * 1024, // 16MB
            max_body_size: 10 * 1024 * 1024,    // 10MB
            metrics_enabled: true,
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

fn env_flag(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes"))
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: env_parse("API_PORT").unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            output_dir: std::env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            output_fps: env_parse("OUTPUT_FPS").unwrap_or(defaults.output_fps),
            output_width: env_parse("OUTPUT_WIDTH").unwrap_or(defaults.output_width),
            output_height: env_parse("OUTPUT_HEIGHT").unwrap_or(defaults.output_height),
            scene_threshold: env_parse("SCENE_THRESHOLD").unwrap_or(defaults.scene_threshold),
            min_frames_per_scene: env_parse("MIN_FRAMES_PER_SCENE")
                .unwrap_or(defaults.min_frames_per_scene),
            max_frames_per_scene: env_parse("MAX_FRAMES_PER_SCENE")
                .unwrap_or(defaults.max_frames_per_scene),
            preview_quality: env_parse::<u32>("PREVIEW_QUALITY")
                .map(|q| q.min(100) as u8)
                .unwrap_or(defaults.preview_quality),
            skip_invalid_frames: env_flag("SKIP_INVALID_FRAMES")
                .unwrap_or(defaults.skip_invalid_frames),
            outbound_buffer: env_parse::<usize>("OUTBOUND_BUFFER")
                .map(|n| n.max(1))
                .unwrap_or(defaults.outbound_buffer),
            max_message_size: env_parse("WS_MAX_MESSAGE_SIZE").unwrap_or(defaults.max_message_size),
            max_body_size: env_parse("MAX_BODY_SIZE").unwrap_or(defaults.max_body_size),
            metrics_enabled: env_flag("METRICS_ENABLED").unwrap_or(defaults.metrics_enabled),
        }
    }

    /// Build and validate the per-session processing config.
    pub fn processor_config(&self) -> MediaResult<ProcessorConfig> {
        let config = ProcessorConfig {
            fps: self.output_fps,
            output_width: self.output_width,
            output_height: self.output_height,
            retention: RetentionConfig::new(
                self.scene_threshold,
                self.min_frames_per_scene,
                self.max_frames_per_scene,
            )?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Settings shared by every session this server runs.
    pub fn session_settings(&self) -> MediaResult<SessionSettings> {
        Ok(SessionSettings {
            processor: self.processor_config()?,
            output_dir: self.output_dir.clone(),
            preview_quality: self.preview_quality.min(100),
            skip_invalid_frames: self.skip_invalid_frames,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_processor_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.output_dir, PathBuf::from("outputs"));
        assert_eq!(config.preview_quality, 80);
        assert!(!config.skip_invalid_frames);
        assert_eq!(config.processor_config().unwrap(), ProcessorConfig::default());
    }

    #[test]
    fn test_invalid_retention_rejected() {
        let config = ApiConfig {
            min_frames_per_scene: 6,
            max_frames_per_scene: 5,
            ..Default::default()
        };
        assert!(config.processor_config().is_err());
        assert!(config.session_settings().is_err());
    }

    #[test]
    fn test_session_settings() {
        let config = ApiConfig {
            output_dir: PathBuf::from("/tmp/dashcam"),
            skip_invalid_frames: true,
            ..Default::default()
        };
        let settings = config.session_settings().unwrap();
        assert_eq!(settings.output_dir, PathBuf::from("/tmp/dashcam"));
        assert!(settings.skip_invalid_frames);
        assert_eq!(settings.preview_quality, 80);
    }
}
