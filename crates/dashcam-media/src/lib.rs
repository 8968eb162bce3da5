#![deny(unreachable_patterns)]
//! Frame processing for live dashcam streams.
//!
//! This crate provides:
//! - Frame buffers and JPEG/base64 codecs
//! - Color histogram signatures and frame comparison
//! - Scene change detection against a per-session reference frame
//! - Frame retention for the open scene
//! - Output video assembly through an FFmpeg child process

pub mod assembler;
pub mod codec;
pub mod config;
pub mod error;
pub mod frame;
pub mod histogram;
pub mod processor;
pub mod retention;
pub mod scene;
pub mod sink;

pub use assembler::{resize, SinkFactory, SinkSpec, VideoAssembler, VideoSink};
pub use codec::{
    decode_base64_payload, encode_base64, frame_from_base64, frame_to_base64, ImageCodec,
    JpegCodec, DEFAULT_PREVIEW_QUALITY,
};
pub use config::{ProcessorConfig, RetentionConfig, CORRELATION_CUTOFF};
pub use error::{MediaError, MediaResult};
pub use frame::{ChannelOrder, Frame};
pub use histogram::{ColorHistogram, HistogramComparator, HistogramSignature};
pub use processor::{FrameOutcome, FrameProcessor};
pub use retention::{ClosedScene, SceneBuffer};
pub use scene::{Evaluation, SceneChangeDetector, SceneReference, SceneState};
pub use sink::{check_ffmpeg, FfmpegSink, FfmpegSinkFactory, DEFAULT_VIDEO_CODEC};
