//! Scene detection and output configuration.

use crate::error::{MediaError, MediaResult};

/// Histogram correlation below which a pixel-level change is corroborated.
pub const CORRELATION_CUTOFF: f64 = 0.8;

/// Scene detection and retention parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetentionConfig {
    /// Pixel difference (0.0-1.0) above which a frame may start a new scene
    pub threshold: f64,

    /// Frames kept per scene while the scene continues
    pub min_frames_per_scene: usize,

    /// Frames kept for a frame that starts a new scene
    pub max_frames_per_scene: usize,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            threshold: 0.3,
            min_frames_per_scene: 3,
            max_frames_per_scene: 5,
        }
    }
}

impl RetentionConfig {
    /// Create and validate a retention config.
    pub fn new(threshold: f64, min_frames_per_scene: usize, max_frames_per_scene: usize) -> MediaResult<Self> {
        let config = Self {
            threshold,
            min_frames_per_scene,
            max_frames_per_scene,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the documented bounds.
    pub fn validate(&self) -> MediaResult<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(MediaError::invalid_config(format!(
                "scene threshold {} is outside [0, 1]",
                self.threshold
            )));
        }
        if self.max_frames_per_scene < self.min_frames_per_scene {
            return Err(MediaError::invalid_config(format!(
                "max frames per scene ({}) is below min frames per scene ({})",
                self.max_frames_per_scene, self.min_frames_per_scene
            )));
        }
        Ok(())
    }

    /// Retention cap for a frame, depending on whether it opened a new scene.
    pub fn cap(&self, changed: bool) -> usize {
        if changed {
            self.max_frames_per_scene
        } else {
            self.min_frames_per_scene
        }
    }
}

/// Full per-session processing configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessorConfig {
    /// Output frame rate
    pub fps: u32,
    /// Canonical output width
    pub output_width: u32,
    /// Canonical output height
    pub output_height: u32,
    /// Scene detection and retention
    pub retention: RetentionConfig,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            output_width: 1280,
            output_height: 720,
            retention: RetentionConfig::default(),
        }
    }
}

impl ProcessorConfig {
    /// Validate geometry, frame rate and retention settings.
    pub fn validate(&self) -> MediaResult<()> {
        if self.fps == 0 {
            return Err(MediaError::invalid_config("fps must be positive"));
        }
        if self.output_width == 0 || self.output_height == 0 {
            return Err(MediaError::invalid_config(format!(
                "output size {}x{} is empty",
                self.output_width, self.output_height
            )));
        }
        // Most encoders reject odd dimensions for yuv420p output.
        if self.output_width % 2 != 0 || self.output_height % 2 != 0 {
            return Err(MediaError::invalid_config(format!(
                "output size {}x{} must be even",
                self.output_width, self.output_height
            )));
        }
        self.retention.validate()
    }
}
