//! Color histogram signatures and frame comparison.
//!
//! # Signatures
//! Each frame is binned into a coarse 8x8x8 RGB grid (512 bins) and
//! normalized so the signature sums to 1. Two signatures are compared with
//! the Pearson correlation coefficient: 1 for identical color composition,
//! around 0 or negative for unrelated compositions.
//!
//! # Pixel difference
//! The mean absolute luma difference between two equally sized frames,
//! divided by 255. Luma uses the fixed-point BT.601 weights.

use crate::error::{MediaError, MediaResult};
use crate::frame::Frame;

/// Bins per color channel.
pub const BINS_PER_CHANNEL: usize = 8;

/// Total number of bins in a signature.
pub const HISTOGRAM_BINS: usize = BINS_PER_CHANNEL * BINS_PER_CHANNEL * BINS_PER_CHANNEL;

/// Right shift mapping an 8-bit channel value to its bin.
const BIN_SHIFT: u32 = 8 - BINS_PER_CHANNEL.trailing_zeros();

/// Maximum luma intensity.
const MAX_INTENSITY: f64 = 255.0;

/// Normalized 8x8x8 color histogram of a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSignature {
    bins: Vec<f64>,
}

impl HistogramSignature {
    /// Bin values; always `HISTOGRAM_BINS` long.
    pub fn bins(&self) -> &[f64] {
        &self.bins
    }

    /// Sum of all bins (1.0 for any non-empty frame).
    pub fn total(&self) -> f64 {
        self.bins.iter().sum()
    }
}

/// Capability interface for frame signatures and similarity scores.
pub trait HistogramComparator: Send + Sync {
    /// Compute the color signature of a frame.
    fn histogram(&self, frame: &Frame) -> HistogramSignature;

    /// Correlation of two signatures in [-1, 1].
    fn correlate(&self, a: &HistogramSignature, b: &HistogramSignature) -> f64;

    /// Normalized mean luma difference of two equally sized frames, in [0, 1].
    fn pixel_difference(&self, a: &Frame, b: &Frame) -> MediaResult<f64>;
}

/// Default comparator backed by the functions in this module.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorHistogram;

impl HistogramComparator for ColorHistogram {
    fn histogram(&self, frame: &Frame) -> HistogramSignature {
        histogram(frame)
    }

    fn correlate(&self, a: &HistogramSignature, b: &HistogramSignature) -> f64 {
        correlate(a, b)
    }

    fn pixel_difference(&self, a: &Frame, b: &Frame) -> MediaResult<f64> {
        pixel_difference(a, b)
    }
}

/// Compute the normalized 8x8x8 color histogram of a frame.
pub fn histogram(frame: &Frame) -> HistogramSignature {
    let mut bins = vec![0.0f64; HISTOGRAM_BINS];
    for [r, g, b] in frame.rgb_pixels() {
        let r_bin = (r >> BIN_SHIFT) as usize;
        let g_bin = (g >> BIN_SHIFT) as usize;
        let b_bin = (b >> BIN_SHIFT) as usize;
        bins[(r_bin * BINS_PER_CHANNEL + g_bin) * BINS_PER_CHANNEL + b_bin] += 1.0;
    }

    let total = frame.pixel_count() as f64;
    if total > 0.0 {
        for val in &mut bins {
            *val /= total;
        }
    }

    HistogramSignature { bins }
}

/// Pearson correlation between two signatures.
///
/// Degenerate inputs (a signature with zero variance) score 1.0, matching
/// the usual histogram-correlation convention.
pub fn correlate(a: &HistogramSignature, b: &HistogramSignature) -> f64 {
    let n = a.bins.len().min(b.bins.len());
    if n == 0 {
        return 1.0;
    }

    let mean_a = a.bins.iter().take(n).sum::<f64>() / n as f64;
    let mean_b = b.bins.iter().take(n).sum::<f64>() / n as f64;

    let mut covariance = 0.0f64;
    let mut var_a = 0.0f64;
    let mut var_b = 0.0f64;
    for (x, y) in a.bins.iter().zip(b.bins.iter()) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        covariance += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    let denominator = (var_a * var_b).sqrt();
    if denominator <= f64::EPSILON {
        return 1.0;
    }
    (covariance / denominator).clamp(-1.0, 1.0)
}

/// BT.601 luma in fixed point.
#[inline]
fn luma([r, g, b]: [u8; 3]) -> u8 {
    ((r as u32 * 4899 + g as u32 * 9617 + b as u32 * 1868 + 8192) >> 14) as u8
}

/// Mean absolute grayscale difference of two frames, normalized to [0, 1].
pub fn pixel_difference(a: &Frame, b: &Frame) -> MediaResult<f64> {
    if a.width() != b.width() || a.height() != b.height() {
        return Err(MediaError::DimensionMismatch {
            left_width: a.width(),
            left_height: a.height(),
            right_width: b.width(),
            right_height: b.height(),
        });
    }

    let total: u64 = a
        .rgb_pixels()
        .zip(b.rgb_pixels())
        .map(|(pa, pb)| (luma(pa) as i32 - luma(pb) as i32).unsigned_abs() as u64)
        .sum();

    Ok(total as f64 / a.pixel_count() as f64 / MAX_INTENSITY)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Left half one color, right half another.
    fn split_frame(left: [u8; 3], right: [u8; 3]) -> Frame {
        let mut frame = Frame::filled(16, 8, left);
        for y in 0..8 {
            for x in 8..16 {
                frame.set_rgb(x, y, right).unwrap();
            }
        }
        frame
    }

    #[test]
    fn test_histogram_sums_to_one() {
        let frame = split_frame([10, 200, 30], [250, 0, 120]);
        let hist = histogram(&frame);
        assert_eq!(hist.bins().len(), HISTOGRAM_BINS);
        assert!((hist.total() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_histogram_bin_placement() {
        let hist = histogram(&Frame::filled(4, 4, [255, 0, 32]));
        // r=7, g=0, b=1
        let idx = (7 * BINS_PER_CHANNEL) * BINS_PER_CHANNEL + 1;
        assert!((hist.bins()[idx] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_correlate_identical() {
        let frame = split_frame([10, 200, 30], [250, 0, 120]);
        let hist = histogram(&frame);
        assert!((correlate(&hist, &hist) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_correlate_disjoint_colors_is_low() {
        let black = histogram(&Frame::filled(8, 8, [0, 0, 0]));
        let white = histogram(&Frame::filled(8, 8, [255, 255, 255]));
        let score = correlate(&black, &white);
        assert!(score < 0.0);
        assert!(score >= -1.0);
    }

    #[test]
    fn test_pixel_difference_extremes() {
        let black = Frame::filled(8, 8, [0, 0, 0]);
        let white = Frame::filled(8, 8, [255, 255, 255]);
        assert_eq!(pixel_difference(&black, &black).unwrap(), 0.0);
        assert!((pixel_difference(&black, &white).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_pixel_difference_requires_equal_size() {
        let a = Frame::filled(8, 8, [0, 0, 0]);
        let b = Frame::filled(8, 4, [0, 0, 0]);
        assert!(matches!(
            pixel_difference(&a, &b),
            Err(MediaError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_rearranged_frame_differs_in_pixels_not_colors() {
        let a = split_frame([0, 0, 0], [255, 255, 255]);
        let b = split_frame([255, 255, 255], [0, 0, 0]);
        assert!((pixel_difference(&a, &b).unwrap() - 1.0).abs() < 1e-9);
        assert!((correlate(&histogram(&a), &histogram(&b)) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_comparator_delegates() {
        let comparator = ColorHistogram;
        let frame = Frame::filled(4, 4, [1, 2, 3]);
        assert_eq!(comparator.histogram(&frame), histogram(&frame));
        assert_eq!(comparator.pixel_difference(&frame, &frame).unwrap(), 0.0);
    }
}
