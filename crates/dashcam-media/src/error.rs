//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during frame and video processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Failed to decode frame: {0}")]
    Decode(String),

    #[error("Failed to encode frame: {0}")]
    Encode(String),

    #[error("Frame dimensions differ: {left_width}x{left_height} vs {right_width}x{right_height}")]
    DimensionMismatch {
        left_width: u32,
        left_height: u32,
        right_width: u32,
        right_height: u32,
    },

    #[error("Pixel ({x}, {y}) is outside a {width}x{height} frame")]
    PixelOutOfBounds { x: u32, y: u32, width: u32, height: u32 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Output sink error: {message}")]
    Sink {
        message: String,
        path: Option<PathBuf>,
    },

    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Create a decode failure error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Create an encode failure error.
    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode(message.into())
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Create an output sink error.
    pub fn sink(message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::Sink {
            message: message.into(),
            path,
        }
    }

    /// Whether this error came from the output resource rather than the input.
    pub fn is_sink_error(&self) -> bool {
        matches!(
            self,
            MediaError::Sink { .. } | MediaError::FfmpegNotFound | MediaError::Io(_)
        )
    }
}
