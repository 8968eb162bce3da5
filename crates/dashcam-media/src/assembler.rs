//! Output video assembly.
//!
//! The assembler owns the session's output sink and its statistics. Every
//! incoming frame is scaled to the canonical output resolution here before
//! detection, so all comparisons happen at one size.
//!
//! # Lifecycle
//! `open_sink` succeeds at most once per assembler. `close_sink` takes the
//! sink out of the assembler before finishing it, so the underlying
//! resource is finished exactly once no matter how many exit paths call it.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dashcam_models::SessionStatistics;
use image::imageops::{self, FilterType};
use tracing::{debug, info, warn};

use crate::config::ProcessorConfig;
use crate::error::{MediaError, MediaResult};
use crate::frame::Frame;

/// Parameters of an output video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkSpec {
    pub path: PathBuf,
    pub fps: u32,
    pub width: u32,
    pub height: u32,
}

/// Destination for assembled frames.
#[async_trait]
pub trait VideoSink: Send {
    /// Append one frame; frames are stored in call order.
    async fn write_frame(&mut self, frame: &Frame) -> MediaResult<()>;

    /// Flush and release the underlying resource.
    async fn finish(&mut self) -> MediaResult<()>;
}

/// Opens output sinks.
pub trait SinkFactory: Send + Sync {
    fn open(&self, spec: &SinkSpec) -> MediaResult<Box<dyn VideoSink>>;
}

/// Scale a frame to the given size with bilinear filtering.
pub fn resize(frame: Frame, width: u32, height: u32) -> Frame {
    if frame.width() == width && frame.height() == height {
        return frame;
    }
    let resized = imageops::resize(&frame.to_rgb_image(), width, height, FilterType::Triangle);
    Frame::from(resized)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SinkState {
    Unopened,
    Open,
    Closed,
}

/// Per-session output video and statistics.
pub struct VideoAssembler {
    fps: u32,
    width: u32,
    height: u32,
    sink: Option<Box<dyn VideoSink>>,
    sink_state: SinkState,
    output_path: Option<PathBuf>,
    total_frames: u64,
    frames_written: u64,
}

impl VideoAssembler {
    pub fn new(config: &ProcessorConfig) -> Self {
        Self {
            fps: config.fps,
            width: config.output_width,
            height: config.output_height,
            sink: None,
            sink_state: SinkState::Unopened,
            output_path: None,
            total_frames: 0,
            frames_written: 0,
        }
    }

    /// Scale a frame to the canonical output resolution.
    pub fn resize(&self, frame: Frame) -> Frame {
        resize(frame, self.width, self.height)
    }

    /// Open the output sink. Fails if a sink was already opened.
    pub fn open_sink(&mut self, factory: &dyn SinkFactory, path: impl AsRef<Path>) -> MediaResult<()> {
        let path = path.as_ref().to_path_buf();
        if self.sink_state != SinkState::Unopened {
            return Err(MediaError::sink(
                "output sink was already opened for this session",
                Some(path),
            ));
        }

        let spec = SinkSpec {
            path: path.clone(),
            fps: self.fps,
            width: self.width,
            height: self.height,
        };
        let sink = factory.open(&spec)?;

        info!(
            path = %path.display(),
            fps = self.fps,
            size = format!("{}x{}", self.width, self.height),
            "Output sink opened"
        );
        self.sink = Some(sink);
        self.sink_state = SinkState::Open;
        self.output_path = Some(path);
        Ok(())
    }

    /// Append a frame to the output video.
    pub async fn write_frame(&mut self, frame: &Frame) -> MediaResult<()> {
        if frame.width() != self.width || frame.height() != self.height {
            return Err(MediaError::DimensionMismatch {
                left_width: frame.width(),
                left_height: frame.height(),
                right_width: self.width,
                right_height: self.height,
            });
        }
        let sink = self
            .sink
            .as_mut()
            .ok_or_else(|| MediaError::sink("output sink is not open", self.output_path.clone()))?;
        sink.write_frame(frame).await?;
        self.frames_written += 1;
        debug!(frames_written = self.frames_written, "Frame written to output");
        Ok(())
    }

    /// Account for a closed scene's retained frames.
    pub fn record_scene(&mut self, retained_frames: usize) {
        self.total_frames += retained_frames as u64;
    }

    /// Finish and release the sink. Later calls are no-ops.
    pub async fn close_sink(&mut self) -> MediaResult<()> {
        let Some(mut sink) = self.sink.take() else {
            return Ok(());
        };
        self.sink_state = SinkState::Closed;

        let result = sink.finish().await;
        match &result {
            Ok(()) => info!(
                frames_written = self.frames_written,
                total_frames = self.total_frames,
                "Output sink closed"
            ),
            Err(e) => warn!(error = %e, "Output sink failed to close cleanly"),
        }
        result
    }

    pub fn is_open(&self) -> bool {
        self.sink_state == SinkState::Open
    }

    pub fn is_closed(&self) -> bool {
        self.sink_state == SinkState::Closed
    }

    pub fn output_path(&self) -> Option<&Path> {
        self.output_path.as_deref()
    }

    /// Frames appended to the output video.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn statistics(&self) -> SessionStatistics {
        SessionStatistics {
            total_frames: self.total_frames,
            fps: self.fps,
            output_width: self.width,
            output_height: self.height,
        }
    }
}
