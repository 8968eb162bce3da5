//! Session statistics.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Summary statistics of an assembled output video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct SessionStatistics {
    /// Sum of retained frames over every closed scene
    pub total_frames: u64,
    /// Output frame rate
    pub fps: u32,
    /// Output width in pixels
    pub output_width: u32,
    /// Output height in pixels
    pub output_height: u32,
}

impl SessionStatistics {
    /// Create empty statistics for the given output geometry.
    pub fn new(fps: u32, output_width: u32, output_height: u32) -> Self {
        Self {
            total_frames: 0,
            fps,
            output_width,
            output_height,
        }
    }
}
