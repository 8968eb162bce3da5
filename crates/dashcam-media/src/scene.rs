//! Scene change detection.
//!
//! Detects scene boundaries in a live frame stream by comparing each frame
//! against a reference frame (the first frame of the current scene).
//!
//! # Algorithm
//! 1. The first frame of a session becomes the reference; no change.
//! 2. For later frames compute the normalized luma difference `d` to the
//!    reference and the histogram correlation `c` with the reference
//!    signature.
//! 3. A scene change requires `d > threshold` AND `c < 0.8`. The histogram
//!    term filters out global lighting shifts that move every pixel without
//!    changing the color composition.
//! 4. On a change the frame becomes the new reference.
//!
//! Each frame must be evaluated exactly once: evaluation advances the
//! reference, so a second call on the same frame would compare the frame
//! against itself and hide the boundary. [`SceneChangeDetector::evaluate`]
//! therefore returns everything retention and emission need in one result.

use tracing::{debug, info};

use crate::config::CORRELATION_CUTOFF;
use crate::error::MediaResult;
use crate::frame::Frame;
use crate::histogram::{ColorHistogram, HistogramComparator, HistogramSignature};

/// Reference frame of the current scene and its color signature.
#[derive(Debug, Clone)]
pub struct SceneReference {
    pub frame: Frame,
    pub histogram: HistogramSignature,
}

/// Per-session detector state.
///
/// The reference frame and histogram are stored together, so one is
/// present exactly when the other is.
#[derive(Debug, Clone, Default)]
pub struct SceneState {
    reference: Option<SceneReference>,
}

impl SceneState {
    pub fn reference(&self) -> Option<&SceneReference> {
        self.reference.as_ref()
    }

    pub fn reference_frame(&self) -> Option<&Frame> {
        self.reference.as_ref().map(|r| &r.frame)
    }

    pub fn reference_histogram(&self) -> Option<&HistogramSignature> {
        self.reference.as_ref().map(|r| &r.histogram)
    }

    /// True before the first frame of a session has been evaluated.
    pub fn is_empty(&self) -> bool {
        self.reference.is_none()
    }
}

/// Outcome of evaluating one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    /// Whether this frame starts a new scene
    pub changed: bool,
    /// Luma difference to the reference (absent for the first frame)
    pub pixel_difference: Option<f64>,
    /// Histogram correlation with the reference (absent for the first frame)
    pub correlation: Option<f64>,
}

impl Evaluation {
    fn first_frame() -> Self {
        Self {
            changed: false,
            pixel_difference: None,
            correlation: None,
        }
    }
}

/// Scene change detector holding the session's reference frame.
pub struct SceneChangeDetector<C = ColorHistogram> {
    comparator: C,
    threshold: f64,
    state: SceneState,
    /// Total boundaries detected
    cut_count: u64,
}

impl SceneChangeDetector<ColorHistogram> {
    /// Create a detector with the default histogram comparator.
    pub fn new(threshold: f64) -> Self {
        Self::with_comparator(threshold, ColorHistogram)
    }
}

impl<C: HistogramComparator> SceneChangeDetector<C> {
    /// Create a detector with a custom comparator.
    pub fn with_comparator(threshold: f64, comparator: C) -> Self {
        Self {
            comparator,
            threshold,
            state: SceneState::default(),
            cut_count: 0,
        }
    }

    /// Evaluate one frame against the reference, advancing the reference on
    /// a scene change.
    pub fn evaluate(&mut self, frame: &Frame) -> MediaResult<Evaluation> {
        let Some(reference) = self.state.reference.as_ref() else {
            self.state.reference = Some(SceneReference {
                frame: frame.clone(),
                histogram: self.comparator.histogram(frame),
            });
            return Ok(Evaluation::first_frame());
        };

        let pixel_difference = self.comparator.pixel_difference(&reference.frame, frame)?;
        let histogram = self.comparator.histogram(frame);
        let correlation = self.comparator.correlate(&reference.histogram, &histogram);

        let changed = pixel_difference > self.threshold && correlation < CORRELATION_CUTOFF;

        if changed {
            self.cut_count += 1;
            info!(
                pixel_diff = format!("{:.3}", pixel_difference),
                correlation = format!("{:.3}", correlation),
                threshold = self.threshold,
                scene = self.cut_count,
                "Scene change detected"
            );
            self.state.reference = Some(SceneReference {
                frame: frame.clone(),
                histogram,
            });
        } else {
            debug!(
                pixel_diff = format!("{:.3}", pixel_difference),
                correlation = format!("{:.3}", correlation),
                "Frame continues scene"
            );
        }

        Ok(Evaluation {
            changed,
            pixel_difference: Some(pixel_difference),
            correlation: Some(correlation),
        })
    }

    /// Current detector state.
    pub fn state(&self) -> &SceneState {
        &self.state
    }

    /// Pixel difference threshold.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Get total scene changes detected.
    pub fn cut_count(&self) -> u64 {
        self.cut_count
    }

    /// Drop the reference so the next frame starts fresh.
    pub fn reset(&mut self) {
        self.state = SceneState::default();
    }
}
