//! Match decision strategies.

use crate::error::CompareError;

/// Decides whether a difference ratio counts as a match
pub trait MatchStrategy: Send + Sync {
    /// `diff_ratio` is the share of sampled pixels that differ, in `0.0..=1.0`.
    fn is_match(&self, differing_pixels: usize, diff_ratio: f64) -> bool;

    /// Human-readable description of the strategy
    fn description(&self) -> String;
}

/// Accepts identical fingerprints, and anything whose ratio is under the threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdStrategy {
    threshold: f64,
}

impl ThresholdStrategy {
    /// Default share of differing pixels tolerated (10%)
    pub const DEFAULT_THRESHOLD: f64 = 0.1;

    pub fn new(threshold: f64) -> Result<Self, CompareError> {
        if threshold.is_nan() || threshold < 0.0 {
            return Err(CompareError::InvalidThreshold { value: threshold });
        }
        Ok(Self { threshold })
    }

    /// Only accept fingerprints with no differing pixels
    pub fn exact() -> Self {
        Self { threshold: 0.0 }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl Default for ThresholdStrategy {
    fn default() -> Self {
        Self {
            threshold: Self::DEFAULT_THRESHOLD,
        }
    }
}

impl MatchStrategy for ThresholdStrategy {
    fn is_match(&self, differing_pixels: usize, diff_ratio: f64) -> bool {
        differing_pixels == 0 || diff_ratio < self.threshold
    }

    fn description(&self) -> String {
        format!(
            "Threshold strategy: fewer than {:.1}% of sampled pixels may differ",
            self.threshold * 100.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_exclusive() {
        let strategy = ThresholdStrategy::new(0.1).unwrap();

        assert!(strategy.is_match(9, 0.09));
        assert!(!strategy.is_match(10, 0.1));
        assert!(!strategy.is_match(11, 0.11));
    }

    #[test]
    fn zero_difference_always_matches() {
        assert!(ThresholdStrategy::exact().is_match(0, 0.0));
        assert!(!ThresholdStrategy::exact().is_match(1, 0.001));
    }

    #[test]
    fn rejects_negative_and_nan_thresholds() {
        assert!(ThresholdStrategy::new(-0.5).is_err());
        assert!(ThresholdStrategy::new(f64::NAN).is_err());
    }

    #[test]
    fn description_includes_percentage() {
        let strategy = ThresholdStrategy::new(0.25).unwrap();
        assert!(strategy.description().contains("25.0%"));
    }
}
