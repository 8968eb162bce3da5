//! Frame retention for the open scene.
//!
//! The buffer holds copies of the frames kept for the scene currently in
//! progress. A continuing frame is kept while the scene holds fewer than
//! `min_frames_per_scene` frames; a boundary frame is admitted against
//! `max_frames_per_scene`. After a boundary frame has been offered the scene
//! is closed (its first frame becomes the representative) and the next
//! scene starts empty.

use crate::config::RetentionConfig;
use crate::frame::Frame;

/// A scene that was closed by a boundary or by the end of the stream.
#[derive(Debug, Clone)]
pub struct ClosedScene {
    /// Frames retained for the scene, in arrival order
    pub frames: Vec<Frame>,
}

impl ClosedScene {
    /// Number of retained frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// First retained frame of the scene.
    pub fn representative(&self) -> Option<&Frame> {
        self.frames.first()
    }

    /// Take the first retained frame.
    pub fn into_representative(self) -> Option<Frame> {
        self.frames.into_iter().next()
    }
}

/// Retained frames of the open scene.
#[derive(Debug, Default)]
pub struct SceneBuffer {
    frames: Vec<Frame>,
}

impl SceneBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames retained so far in the open scene.
    pub fn frames_in_open_scene(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Offer a frame to the open scene. Returns whether it was retained.
    pub fn offer(&mut self, frame: &Frame, changed: bool, config: &RetentionConfig) -> bool {
        let retain = self.frames.len() < config.cap(changed);
        if retain {
            self.frames.push(frame.clone());
        }
        retain
    }

    /// Close the open scene, leaving the buffer empty.
    pub fn close_scene(&mut self) -> ClosedScene {
        ClosedScene {
            frames: std::mem::take(&mut self.frames),
        }
    }

    /// Discard everything without producing a scene.
    pub fn clear(&mut self) {
        self.frames.clear();
    }
}
