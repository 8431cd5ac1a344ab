//! # Comparator Module
//!
//! Decides whether two fingerprints show the same picture.
//!
//! ## How It Works
//! 1. Walk both fingerprints pixel by pixel
//! 2. Measure the perceived colour distance of each pair in YIQ space
//!    (alpha blended onto white), the same metric pixelmatch uses
//! 3. Count a pixel as different when the distance exceeds the per-pixel
//!    tolerance
//! 4. `diff_ratio = differing / total`; a match is a ratio of exactly zero or
//!    one under the threshold
//!
//! ## Tolerances
//! | Setting           | Default | Meaning                                  |
//! |-------------------|---------|------------------------------------------|
//! | `pixel_tolerance` | 0.2     | 0 = any change differs, 1 = nothing does |
//! | `threshold`       | 0.1     | share of pixels allowed to differ        |

mod traits;

pub use traits::{MatchStrategy, ThresholdStrategy};

use crate::core::fingerprint::{Fingerprint, CHANNELS};
use crate::error::CompareError;
use serde::{Deserialize, Serialize};

/// Largest possible YIQ delta between two pixels
const MAX_YIQ_DELTA: f64 = 35215.0;

/// Default per-pixel colour tolerance
pub const DEFAULT_PIXEL_TOLERANCE: f64 = 0.2;

/// Outcome of comparing two fingerprints
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub is_match: bool,
    /// Share of sampled pixels that differ, `0.0..=1.0`
    pub diff_ratio: f64,
    pub differing_pixels: usize,
}

/// Compares fingerprints against a fixed threshold and per-pixel tolerance.
///
/// Stateless; safe to share across threads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityComparator {
    strategy: ThresholdStrategy,
    pixel_tolerance: f64,
}

impl SimilarityComparator {
    pub fn new(threshold: f64, pixel_tolerance: f64) -> Result<Self, CompareError> {
        Ok(Self {
            strategy: ThresholdStrategy::new(threshold)?,
            pixel_tolerance: pixel_tolerance.clamp(0.0, 1.0),
        })
    }

    pub fn threshold(&self) -> f64 {
        self.strategy.threshold()
    }

    pub fn pixel_tolerance(&self) -> f64 {
        self.pixel_tolerance
    }

    /// Compare with the configured threshold.
    pub fn compare(&self, target: &Fingerprint, candidate: &Fingerprint) -> Result<Comparison, CompareError> {
        self.compare_with(target, candidate, &self.strategy)
    }

    /// Compare, letting `strategy` make the final call.
    pub fn compare_with<S: MatchStrategy + ?Sized>(
        &self,
        target: &Fingerprint,
        candidate: &Fingerprint,
        strategy: &S,
    ) -> Result<Comparison, CompareError> {
        if target.dimensions() != candidate.dimensions() {
            return Err(CompareError::DimensionMismatch {
                expected: target.dimensions(),
                found: candidate.dimensions(),
            });
        }

        let differing_pixels = if target.samples() == candidate.samples() {
            0
        } else {
            count_differing_pixels(target.samples(), candidate.samples(), self.pixel_tolerance)
        };

        let total = target.pixel_count();
        let diff_ratio = if total == 0 {
            0.0
        } else {
            differing_pixels as f64 / total as f64
        };

        Ok(Comparison {
            is_match: strategy.is_match(differing_pixels, diff_ratio),
            diff_ratio,
            differing_pixels,
        })
    }
}

impl Default for SimilarityComparator {
    fn default() -> Self {
        Self {
            strategy: ThresholdStrategy::default(),
            pixel_tolerance: DEFAULT_PIXEL_TOLERANCE,
        }
    }
}

/// Compare two fingerprints with the default per-pixel tolerance.
pub fn compare(target: &Fingerprint, candidate: &Fingerprint, threshold: f64) -> Result<Comparison, CompareError> {
    SimilarityComparator::new(threshold, DEFAULT_PIXEL_TOLERANCE)?.compare(target, candidate)
}

/// Count RGBA pixels whose YIQ distance exceeds `tolerance`.
///
/// Both buffers must hold the same number of pixels.
pub fn count_differing_pixels(a: &[u8], b: &[u8], tolerance: f64) -> usize {
    let max_delta = MAX_YIQ_DELTA * tolerance * tolerance;

    a.chunks_exact(CHANNELS)
        .zip(b.chunks_exact(CHANNELS))
        .filter(|(pa, pb)| pa != pb && color_delta(pa, pb) > max_delta)
        .count()
}

fn color_delta(a: &[u8], b: &[u8]) -> f64 {
    let (r1, g1, b1) = blend_on_white(a);
    let (r2, g2, b2) = blend_on_white(b);

    let y = rgb_to_y(r1, g1, b1) - rgb_to_y(r2, g2, b2);
    let i = rgb_to_i(r1, g1, b1) - rgb_to_i(r2, g2, b2);
    let q = rgb_to_q(r1, g1, b1) - rgb_to_q(r2, g2, b2);

    0.5053 * y * y + 0.299 * i * i + 0.1957 * q * q
}

fn blend_on_white(pixel: &[u8]) -> (f64, f64, f64) {
    let alpha = pixel[3] as f64 / 255.0;
    let blend = |c: u8| 255.0 + (c as f64 - 255.0) * alpha;
    (blend(pixel[0]), blend(pixel[1]), blend(pixel[2]))
}

fn rgb_to_y(r: f64, g: f64, b: f64) -> f64 {
    r * 0.298_895_31 + g * 0.586_622_47 + b * 0.114_482_23
}

fn rgb_to_i(r: f64, g: f64, b: f64) -> f64 {
    r * 0.595_977_99 - g * 0.274_176_10 - b * 0.321_801_89
}

fn rgb_to_q(r: f64, g: f64, b: f64) -> f64 {
    r * 0.211_470_17 - g * 0.522_617_11 + b * 0.311_146_94
}
