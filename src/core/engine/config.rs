//! Run configuration for the match engine.

use crate::core::comparator::{SimilarityComparator, ThresholdStrategy, DEFAULT_PIXEL_TOLERANCE};
use crate::core::dates::{DatePolicy, DateResolver};
use crate::core::fingerprint::{FingerprintExtractor, SampleRegion, DEFAULT_CANONICAL_DIMENSION};
use crate::core::prioritizer::{CandidatePrioritizer, DEFAULT_MAX_CANDIDATES};
use crate::error::FinderError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How many accepted candidates a target keeps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Stop at the first accepted candidate
    #[default]
    FirstMatch,
    /// Try every prioritized candidate and keep all accepted ones
    AllMatches,
}

/// Settings for one matching run.
///
/// Passed explicitly to every entry point; nothing is read from global state.
/// Missing fields in a config file take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Largest allowed distance in capture time (None = unbounded)
    pub max_date_window_ms: Option<i64>,
    /// Candidates tried per target, closest first
    pub max_candidates_per_target: usize,
    /// Share of sampled pixels allowed to differ
    pub similarity_threshold: f64,
    /// Per-pixel colour tolerance, 0.0 to 1.0
    pub pixel_tolerance: f64,
    /// Side length of the square every image is stretched to
    pub canonical_dimension: u32,
    /// Rows of the canonical image kept in the fingerprint
    pub sample_region: SampleRegion,
    pub date_policy: DatePolicy,
    pub match_mode: MatchMode,
    /// List exhausted targets in the result set
    pub record_unmatched: bool,
    /// Work on several targets at once (results are unchanged)
    pub parallel_targets: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_date_window_ms: None,
            max_candidates_per_target: DEFAULT_MAX_CANDIDATES,
            similarity_threshold: ThresholdStrategy::DEFAULT_THRESHOLD,
            pixel_tolerance: DEFAULT_PIXEL_TOLERANCE,
            canonical_dimension: DEFAULT_CANONICAL_DIMENSION,
            sample_region: SampleRegion::default(),
            date_policy: DatePolicy::default(),
            match_mode: MatchMode::default(),
            record_unmatched: true,
            parallel_targets: false,
        }
    }
}

impl MatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_date_window_ms(mut self, window: Option<i64>) -> Self {
        self.max_date_window_ms = window;
        self
    }

    pub fn with_max_candidates(mut self, count: usize) -> Self {
        self.max_candidates_per_target = count;
        self
    }

    pub fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    pub fn with_pixel_tolerance(mut self, tolerance: f64) -> Self {
        self.pixel_tolerance = tolerance;
        self
    }

    pub fn with_canonical_dimension(mut self, dimension: u32) -> Self {
        self.canonical_dimension = dimension;
        self
    }

    pub fn with_sample_region(mut self, region: SampleRegion) -> Self {
        self.sample_region = region;
        self
    }

    pub fn with_date_policy(mut self, policy: DatePolicy) -> Self {
        self.date_policy = policy;
        self
    }

    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = mode;
        self
    }

    pub fn with_record_unmatched(mut self, record: bool) -> Self {
        self.record_unmatched = record;
        self
    }

    pub fn with_parallel_targets(mut self, parallel: bool) -> Self {
        self.parallel_targets = parallel;
        self
    }

    /// Parse a JSON config
    pub fn from_json_str(json: &str) -> Result<Self, FinderError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| FinderError::Config(format!("invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file
    pub fn from_json_file(path: &Path) -> Result<Self, FinderError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            FinderError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    /// Reject settings no run could use
    pub fn validate(&self) -> Result<(), FinderError> {
        if self.similarity_threshold.is_nan() || self.similarity_threshold < 0.0 {
            return Err(FinderError::Config(format!(
                "similarity_threshold must be >= 0, got {}",
                self.similarity_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.pixel_tolerance) {
            return Err(FinderError::Config(format!(
                "pixel_tolerance must be between 0 and 1, got {}",
                self.pixel_tolerance
            )));
        }
        if self.canonical_dimension == 0 {
            return Err(FinderError::Config(
                "canonical_dimension must be at least 1".to_string(),
            ));
        }
        if self.max_candidates_per_target == 0 {
            return Err(FinderError::Config(
                "max_candidates_per_target must be at least 1".to_string(),
            ));
        }
        if matches!(self.max_date_window_ms, Some(window) if window < 0) {
            return Err(FinderError::Config(
                "max_date_window_ms cannot be negative".to_string(),
            ));
        }
        Ok(())
    }

    pub fn comparator(&self) -> Result<SimilarityComparator, FinderError> {
        Ok(SimilarityComparator::new(
            self.similarity_threshold,
            self.pixel_tolerance,
        )?)
    }

    pub fn prioritizer(&self) -> CandidatePrioritizer {
        CandidatePrioritizer::new(self.max_date_window_ms, self.max_candidates_per_target)
    }

    pub fn extractor(&self) -> FingerprintExtractor {
        FingerprintExtractor::new(self.canonical_dimension, self.sample_region)
    }

    pub fn date_resolver(&self) -> DateResolver {
        DateResolver::new(self.date_policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = MatchConfig::default();

        assert_eq!(config.max_date_window_ms, None);
        assert_eq!(config.max_candidates_per_target, 100);
        assert_eq!(config.similarity_threshold, 0.1);
        assert_eq!(config.canonical_dimension, 480);
        assert_eq!(config.date_policy, DatePolicy::Strict);
        assert_eq!(config.match_mode, MatchMode::FirstMatch);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_sets_fields() {
        let config = MatchConfig::new()
            .with_max_date_window_ms(Some(86_400_000))
            .with_similarity_threshold(0.05)
            .with_match_mode(MatchMode::AllMatches)
            .with_date_policy(DatePolicy::Lenient);

        assert_eq!(config.max_date_window_ms, Some(86_400_000));
        assert_eq!(config.similarity_threshold, 0.05);
        assert_eq!(config.match_mode, MatchMode::AllMatches);
        assert_eq!(config.date_resolver().policy(), DatePolicy::Lenient);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config = MatchConfig::from_json_str(
            r#"{ "max_date_window_ms": 2592000000, "date_policy": "lenient", "sample_region": "first_row" }"#,
        )
        .unwrap();

        assert_eq!(config.max_date_window_ms, Some(2_592_000_000));
        assert_eq!(config.date_policy, DatePolicy::Lenient);
        assert_eq!(config.sample_region, SampleRegion::FirstRow);
        assert_eq!(config.max_candidates_per_target, 100);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(MatchConfig::new().with_similarity_threshold(-0.1).validate().is_err());
        assert!(MatchConfig::new().with_pixel_tolerance(1.5).validate().is_err());
        assert!(MatchConfig::new().with_canonical_dimension(0).validate().is_err());
        assert!(MatchConfig::new().with_max_candidates(0).validate().is_err());
        assert!(MatchConfig::new()
            .with_max_date_window_ms(Some(-1))
            .validate()
            .is_err());
        assert!(MatchConfig::from_json_str("{ not json").is_err());
    }

    #[test]
    fn config_file_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("finder.json");
        let config = MatchConfig::new().with_canonical_dimension(240);
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        assert_eq!(MatchConfig::from_json_file(&path).unwrap(), config);
    }
}
