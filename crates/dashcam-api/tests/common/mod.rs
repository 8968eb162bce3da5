//! Shared helpers for API integration tests.

#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dashcam_media::{
    frame_to_base64, Frame, JpegCodec, MediaError, MediaResult, SinkFactory, SinkSpec, VideoSink,
};
use dashcam_models::{InboundMessage, OutboundMessage};
use tokio::sync::mpsc;

/// Sink factory writing raw frames to the requested path.
#[derive(Clone, Default)]
pub struct RawFileSinks {
    pub opened: Arc<Mutex<Vec<PathBuf>>>,
    pub frames_written: Arc<AtomicUsize>,
    pub finished: Arc<AtomicUsize>,
}

impl RawFileSinks {
    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written.load(Ordering::SeqCst)
    }

    pub fn opened(&self) -> Vec<PathBuf> {
        self.opened.lock().unwrap().clone()
    }
}

struct RawFileSink {
    file: Option<File>,
    frames_written: Arc<AtomicUsize>,
    finished: Arc<AtomicUsize>,
}

#[async_trait]
impl VideoSink for RawFileSink {
    async fn write_frame(&mut self, frame: &Frame) -> MediaResult<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| MediaError::sink("sink finished", None))?;
        file.write_all(frame.data())?;
        self.frames_written.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn finish(&mut self) -> MediaResult<()> {
        if let Some(mut file) = self.file.take() {
            file.flush()?;
            self.finished.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

impl SinkFactory for RawFileSinks {
    fn open(&self, spec: &SinkSpec) -> MediaResult<Box<dyn VideoSink>> {
        let file = File::create(&spec.path)?;
        self.opened.lock().unwrap().push(spec.path.clone());
        Ok(Box::new(RawFileSink {
            file: Some(file),
            frames_written: Arc::clone(&self.frames_written),
            finished: Arc::clone(&self.finished),
        }))
    }
}

/// Sink factory that cannot open anything.
pub struct BrokenSinks;

impl SinkFactory for BrokenSinks {
    fn open(&self, spec: &SinkSpec) -> MediaResult<Box<dyn VideoSink>> {
        Err(MediaError::sink("disk full", Some(spec.path.clone())))
    }
}

pub fn solid(rgb: [u8; 3]) -> Frame {
    Frame::filled(64, 48, rgb)
}

/// Frame message carrying a JPEG of a solid color.
pub fn frame_message(rgb: [u8; 3]) -> InboundMessage {
    InboundMessage::Frame {
        data: frame_to_base64(&JpegCodec, &solid(rgb), 95).unwrap(),
    }
}

pub const BLACK: [u8; 3] = [0, 0, 0];
pub const WHITE: [u8; 3] = [255, 255, 255];

/// Drain every message sent to a session after it ended.
pub async fn drain(mut rx: mpsc::Receiver<OutboundMessage>) -> Vec<OutboundMessage> {
    let mut messages = Vec::new();
    while let Some(message) = rx.recv().await {
        messages.push(message);
    }
    messages
}

pub fn count_previews(messages: &[OutboundMessage]) -> usize {
    messages
        .iter()
        .filter(|m| matches!(m, OutboundMessage::ProcessedFrame { .. }))
        .count()
}
