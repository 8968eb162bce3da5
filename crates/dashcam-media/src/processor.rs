//! Per-session frame pipeline.
//!
//! [`FrameProcessor`] runs one frame at a time through resize, scene
//! detection, retention and assembly. It holds no locks: the owning session
//! drives it sequentially.

use std::path::Path;

use dashcam_models::SessionStatistics;
use tracing::{debug, info};

use crate::assembler::{SinkFactory, VideoAssembler};
use crate::config::ProcessorConfig;
use crate::error::MediaResult;
use crate::frame::Frame;
use crate::histogram::{ColorHistogram, HistogramComparator};
use crate::retention::SceneBuffer;
use crate::scene::{Evaluation, SceneChangeDetector};

/// Result of processing one frame.
#[derive(Debug, Clone)]
pub struct FrameOutcome {
    /// Detector output for the frame
    pub evaluation: Evaluation,
    /// Whether the frame was kept in the open scene
    pub retained: bool,
    /// Retained-frame count of the scene this frame closed
    pub closed_scene_frames: Option<usize>,
    /// Representative of the scene this frame closed
    pub representative: Option<Frame>,
}

impl FrameOutcome {
    /// Whether this frame started a new scene.
    pub fn changed(&self) -> bool {
        self.evaluation.changed
    }
}

/// Scene detection and assembly pipeline for one session.
pub struct FrameProcessor<C = ColorHistogram> {
    config: ProcessorConfig,
    detector: SceneChangeDetector<C>,
    buffer: SceneBuffer,
    assembler: VideoAssembler,
    frames_received: u64,
}

impl FrameProcessor<ColorHistogram> {
    /// Create a processor with the default comparator.
    pub fn new(config: ProcessorConfig) -> MediaResult<Self> {
        Self::with_comparator(config, ColorHistogram)
    }
}

impl<C: HistogramComparator> FrameProcessor<C> {
    pub fn with_comparator(config: ProcessorConfig, comparator: C) -> MediaResult<Self> {
        config.validate()?;
        Ok(Self {
            detector: SceneChangeDetector::with_comparator(config.retention.threshold, comparator),
            buffer: SceneBuffer::new(),
            assembler: VideoAssembler::new(&config),
            config,
            frames_received: 0,
        })
    }

    /// Open the output video at `path`.
    pub fn open_output(&mut self, factory: &dyn SinkFactory, path: impl AsRef<Path>) -> MediaResult<()> {
        self.assembler.open_sink(factory, path)
    }

    /// Process one decoded frame.
    ///
    /// The frame is offered to the open scene first, against
    /// `max_frames_per_scene` when it marks a boundary. A boundary then
    /// closes the scene: its retained frames are counted and its first frame
    /// is written to the output and returned as the representative. The next
    /// scene starts empty.
    pub async fn process_frame(&mut self, frame: Frame) -> MediaResult<FrameOutcome> {
        self.frames_received += 1;
        let frame = self.assembler.resize(frame);
        let evaluation = self.detector.evaluate(&frame)?;

        let retained = self
            .buffer
            .offer(&frame, evaluation.changed, &self.config.retention);

        let mut closed_scene_frames = None;
        let mut representative = None;
        if evaluation.changed {
            let closed = self.buffer.close_scene();
            let scene_frames = closed.len();
            self.assembler.record_scene(scene_frames);

            let rep = closed.into_representative().unwrap_or(frame);
            self.assembler.write_frame(&rep).await?;

            debug!(retained_frames = scene_frames, "Scene closed");
            closed_scene_frames = Some(scene_frames);
            representative = Some(rep);
        }

        Ok(FrameOutcome {
            evaluation,
            retained,
            closed_scene_frames,
            representative,
        })
    }

    /// Close the open scene into the statistics and output.
    ///
    /// Returns the number of frames counted. An empty scene counts nothing
    /// and writes nothing.
    pub async fn flush(&mut self) -> MediaResult<usize> {
        let closed = self.buffer.close_scene();
        let retained = closed.len();
        if let Some(rep) = closed.into_representative() {
            self.assembler.record_scene(retained);
            self.assembler.write_frame(&rep).await?;
        }
        Ok(retained)
    }

    /// Flush the open scene, close the output and return final statistics.
    pub async fn finish(&mut self) -> MediaResult<SessionStatistics> {
        let flushed = self.flush().await;
        let closed = self.assembler.close_sink().await;
        let flushed = flushed?;
        closed?;

        let stats = self.assembler.statistics();
        info!(
            frames_received = self.frames_received,
            flushed_frames = flushed,
            total_frames = stats.total_frames,
            scenes = self.detector.cut_count(),
            "Session output finished"
        );
        Ok(stats)
    }

    /// Close the output without flushing. No-op once closed.
    pub async fn close(&mut self) -> MediaResult<()> {
        self.assembler.close_sink().await
    }

    /// Drop the reference frame and any retained frames.
    pub fn reset(&mut self) {
        self.detector.reset();
        self.buffer.clear();
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn detector(&self) -> &SceneChangeDetector<C> {
        &self.detector
    }

    pub fn buffer(&self) -> &SceneBuffer {
        &self.buffer
    }

    pub fn assembler(&self) -> &VideoAssembler {
        &self.assembler
    }

    pub fn frames_received(&self) -> u64 {
        self.frames_received
    }

    pub fn statistics(&self) -> SessionStatistics {
        self.assembler.statistics()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::tests::RecordingFactory;
    use crate::config::RetentionConfig;

    fn config(min: usize, max: usize) -> ProcessorConfig {
        ProcessorConfig {
            fps: 10,
            output_width: 16,
            output_height: 8,
            retention: RetentionConfig::new(0.3, min, max).unwrap(),
        }
    }

    fn black() -> Frame {
        Frame::filled(32, 16, [0, 0, 0])
    }

    fn white() -> Frame {
        Frame::filled(32, 16, [255, 255, 255])
    }

    async fn open(config: ProcessorConfig) -> (FrameProcessor, RecordingFactory) {
        let factory = RecordingFactory::default();
        let mut processor = FrameProcessor::new(config).unwrap();
        processor.open_output(&factory, "out/test.mp4").unwrap();
        (processor, factory)
    }

    #[tokio::test]
    async fn test_five_identical_then_one_different() {
        let (mut processor, factory) = open(config(4, 5)).await;

        let mut changes = Vec::new();
        for _ in 0..5 {
            let outcome = processor.process_frame(black()).await.unwrap();
            assert!(outcome.representative.is_none());
            changes.push(outcome.changed());
        }
        let outcome = processor.process_frame(white()).await.unwrap();
        changes.push(outcome.changed());

        assert_eq!(changes.iter().filter(|c| **c).count(), 1);
        assert!(outcome.retained);
        assert_eq!(outcome.closed_scene_frames, Some(5));
        assert_eq!(outcome.representative, Some(Frame::filled(16, 8, [0, 0, 0])));
        assert_eq!(processor.statistics().total_frames, 5);
        assert!(processor.buffer().is_empty());

        let stats = processor.finish().await.unwrap();
        assert_eq!(stats.total_frames, 5);

        let recording = factory.recording.lock().unwrap();
        assert_eq!(recording.frames.len(), 1);
        assert_eq!(recording.frames[0], Frame::filled(16, 8, [0, 0, 0]));
        assert_eq!(recording.finished, 1);
    }

    #[tokio::test]
    async fn test_default_retention_caps_continuing_scene() {
        let (mut processor, _factory) = open(config(3, 5)).await;
        for _ in 0..5 {
            processor.process_frame(black()).await.unwrap();
        }
        let outcome = processor.process_frame(white()).await.unwrap();
        assert_eq!(outcome.closed_scene_frames, Some(4));
        assert_eq!(processor.finish().await.unwrap().total_frames, 4);
    }

    #[tokio::test]
    async fn test_max_cap_bounds_boundary_frame() {
        async fn boundary_and_final(max: usize) -> (u64, u64) {
            let (mut processor, _factory) = open(config(3, max)).await;
            for _ in 0..5 {
                processor.process_frame(black()).await.unwrap();
            }
            processor.process_frame(white()).await.unwrap();
            let boundary = processor.statistics().total_frames;
            (boundary, processor.finish().await.unwrap().total_frames)
        }

        assert_eq!(boundary_and_final(3).await, (3, 3));
        assert_eq!(boundary_and_final(50).await, (4, 4));
    }

    #[tokio::test]
    async fn test_frames_after_boundary_open_next_scene() {
        let (mut processor, factory) = open(config(2, 5)).await;
        processor.process_frame(black()).await.unwrap();
        processor.process_frame(white()).await.unwrap();
        processor.process_frame(white()).await.unwrap();
        processor.process_frame(white()).await.unwrap();
        processor.process_frame(white()).await.unwrap();

        assert_eq!(processor.buffer().frames_in_open_scene(), 2);
        assert_eq!(processor.finish().await.unwrap().total_frames, 4);

        let recording = factory.recording.lock().unwrap();
        assert_eq!(
            recording.frames,
            vec![
                Frame::filled(16, 8, [0, 0, 0]),
                Frame::filled(16, 8, [255, 255, 255]),
            ]
        );
    }

    #[tokio::test]
    async fn test_frames_are_resized_before_detection() {
        let (mut processor, _factory) = open(config(3, 5)).await;
        processor.process_frame(Frame::filled(64, 48, [0, 0, 0])).await.unwrap();
        let reference = processor.detector().state().reference_frame().unwrap();
        assert_eq!((reference.width(), reference.height()), (16, 8));

        // A different input size is scaled to the same output size.
        let outcome = processor.process_frame(Frame::filled(20, 10, [0, 0, 0])).await.unwrap();
        assert!(!outcome.changed());
    }

    #[tokio::test]
    async fn test_total_matches_closed_scenes() {
        let (mut processor, _factory) = open(config(2, 4)).await;
        let mut closed = 0;
        for frame in [black(), black(), black(), white(), white(), black(), white()] {
            let outcome = processor.process_frame(frame).await.unwrap();
            closed += outcome.closed_scene_frames.unwrap_or(0);
        }
        assert_eq!(processor.statistics().total_frames, closed as u64);
        assert_eq!(processor.detector().cut_count(), 3);
    }

    #[tokio::test]
    async fn test_finish_without_frames() {
        let (mut processor, factory) = open(config(3, 5)).await;
        let stats = processor.finish().await.unwrap();
        assert_eq!(stats.total_frames, 0);
        assert!(factory.recording.lock().unwrap().frames.is_empty());
    }

    #[tokio::test]
    async fn test_close_then_finish_closes_once() {
        let (mut processor, factory) = open(config(3, 5)).await;
        processor.process_frame(black()).await.unwrap();
        processor.close().await.unwrap();
        processor.close().await.unwrap();
        assert_eq!(factory.recording.lock().unwrap().finished, 1);
    }

    #[tokio::test]
    async fn test_reset_starts_fresh() {
        let (mut processor, _factory) = open(config(3, 5)).await;
        processor.process_frame(black()).await.unwrap();
        processor.reset();
        assert!(processor.buffer().is_empty());
        assert!(processor.detector().state().is_empty());
        assert!(!processor.process_frame(white()).await.unwrap().changed());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let bad = ProcessorConfig {
            fps: 0,
            ..Default::default()
        };
        assert!(FrameProcessor::new(bad).is_err());
    }
}
