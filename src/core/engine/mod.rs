//! # Engine Module
//!
//! Matches each target against the candidate pool.
//!
//! ## Per-Target Flow
//! 1. Order the pool by capture-date proximity (bounded by window and cap)
//! 2. Compare candidates strictly in that order
//! 3. Stop at the first accepted candidate and record it (first match wins),
//!    or keep going in [`MatchMode::AllMatches`]
//! 4. With nothing accepted, the target is exhausted
//!
//! The first acceptable candidate wins even when a later one would be a
//! closer visual match; date order is the tie-break.
//!
//! ## Failures
//! - A target without a fingerprint is reported and skipped; the batch goes on
//! - Fingerprints of different dimensions abort the run before any comparison
//!
//! ## Parallelism
//! With `parallel_targets`, targets are spread over rayon. Candidates for one
//! target are still tried one by one in priority order, so the result set is
//! the same as a sequential run.

mod cancellation;
mod config;
mod results;

pub use cancellation::CancellationToken;
pub use config::{MatchConfig, MatchMode};
pub use results::{CandidateMatch, MatchCollector, MatchResultSet};

use crate::core::comparator::SimilarityComparator;
use crate::core::prioritizer::CandidatePrioritizer;
use crate::core::record::ImageRecord;
use crate::error::{CompareError, FinderError, ItemFailure};
use crate::events::{null_sender, Event, EventSender, MatchEvent};
use rayon::prelude::*;
use tracing::{debug, info, warn};

/// Outcome of a matching run
#[derive(Debug, Clone)]
pub struct MatchRun {
    pub results: MatchResultSet,
    /// Per-item problems, in target order after any pool problems
    pub failures: Vec<ItemFailure>,
    /// Targets that reached a terminal state
    pub completed_targets: usize,
    /// Set when the run stopped early; results cover completed targets only
    pub cancelled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TargetOutcome {
    Matched,
    Exhausted,
    /// Same target path listed again in this run
    Duplicate,
    Unfingerprintable,
    Cancelled,
}

/// Runs targets against a candidate pool with one fixed configuration
pub struct MatchEngine {
    config: MatchConfig,
    comparator: SimilarityComparator,
    prioritizer: CandidatePrioritizer,
    cancellation: CancellationToken,
}

impl MatchEngine {
    pub fn new(config: MatchConfig) -> Result<Self, FinderError> {
        config.validate()?;
        Ok(Self {
            comparator: config.comparator()?,
            prioritizer: config.prioritizer(),
            config,
            cancellation: CancellationToken::new(),
        })
    }

    /// Stop the run when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn run(&self, targets: &[ImageRecord], candidates: &[ImageRecord]) -> Result<MatchRun, FinderError> {
        self.run_with_events(targets, candidates, &null_sender())
    }

    pub fn run_with_events(
        &self,
        targets: &[ImageRecord],
        candidates: &[ImageRecord],
        events: &EventSender,
    ) -> Result<MatchRun, FinderError> {
        let mut failures = Vec::new();
        let mut pool: Vec<&ImageRecord> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if candidate.is_fingerprinted() {
                pool.push(candidate);
            } else {
                warn!(path = %candidate.path.display(), "candidate has no fingerprint");
                failures.push(ItemFailure::UnfingerprintableCandidate {
                    path: candidate.path.clone(),
                });
            }
        }

        check_dimensions(targets, &pool)?;

        info!(
            targets = targets.len(),
            candidates = pool.len(),
            mode = ?self.config.match_mode,
            "matching started"
        );
        events.send(Event::Match(MatchEvent::Started {
            total_targets: targets.len(),
            total_candidates: pool.len(),
        }));

        let collector = MatchCollector::new(self.config.match_mode);

        let outcomes: Vec<TargetOutcome> = if self.config.parallel_targets {
            targets
                .par_iter()
                .map(|target| self.process_target(target, &pool, &collector, events))
                .collect::<Result<Vec<_>, FinderError>>()?
        } else {
            let mut outcomes = Vec::with_capacity(targets.len());
            for target in targets {
                let outcome = self.process_target(target, &pool, &collector, events)?;
                outcomes.push(outcome);
                if outcome == TargetOutcome::Cancelled {
                    break;
                }
            }
            outcomes
        };

        let mut completed_targets: usize = 0;
        let mut cancelled = false;
        for (target, outcome) in targets.iter().zip(&outcomes) {
            match outcome {
                TargetOutcome::Cancelled => cancelled = true,
                TargetOutcome::Duplicate => {}
                TargetOutcome::Unfingerprintable => {
                    failures.push(ItemFailure::UnfingerprintableTarget {
                        path: target.path.clone(),
                    });
                    completed_targets += 1;
                }
                _ => completed_targets += 1,
            }
        }

        let results = collector.into_results()?;
        let matched = results.len();
        events.send(Event::Match(MatchEvent::Completed {
            matched,
            unmatched: completed_targets.saturating_sub(matched),
        }));
        info!(
            matched,
            completed = completed_targets,
            failures = failures.len(),
            cancelled,
            "matching finished"
        );

        Ok(MatchRun {
            results,
            failures,
            completed_targets,
            cancelled,
        })
    }

    fn process_target(
        &self,
        target: &ImageRecord,
        pool: &[&ImageRecord],
        collector: &MatchCollector,
        events: &EventSender,
    ) -> Result<TargetOutcome, FinderError> {
        if self.cancellation.is_cancelled() {
            return Ok(TargetOutcome::Cancelled);
        }

        if !collector.claim(&target.path)? {
            debug!(target = %target.path.display(), "already processed");
            return Ok(TargetOutcome::Duplicate);
        }
        let first_match_only = self.config.match_mode == MatchMode::FirstMatch;

        let Some(fingerprint) = &target.fingerprint else {
            warn!(path = %target.path.display(), "target has no fingerprint");
            events.send(Event::Match(MatchEvent::TargetFailed {
                target: target.path.clone(),
                message: "target could not be fingerprinted".to_string(),
            }));
            return Ok(TargetOutcome::Unfingerprintable);
        };

        let ordered = self
            .prioritizer
            .prioritize(target.resolved_date, pool.iter().copied());
        debug!(target = %target.path.display(), candidates = ordered.len(), "searching");
        events.send(Event::Match(MatchEvent::TargetStarted {
            target: target.path.clone(),
            candidates: ordered.len(),
        }));

        let mut accepted = 0;
        for candidate in &ordered {
            let Some(candidate_fingerprint) = &candidate.record.fingerprint else {
                continue;
            };

            let comparison = self.comparator.compare(fingerprint, candidate_fingerprint)?;
            if !comparison.is_match {
                continue;
            }

            let found = CandidateMatch {
                candidate: candidate.record.path.clone(),
                diff_ratio: comparison.diff_ratio,
                date_difference_ms: candidate.date_difference_ms,
            };
            // Refused when the pool lists this candidate more than once
            if !collector.record_match(&target.path, found)? {
                continue;
            }

            accepted += 1;
            info!(
                target = %target.path.display(),
                candidate = %candidate.record.path.display(),
                diff_ratio = comparison.diff_ratio,
                "matched"
            );
            events.send(Event::Match(MatchEvent::Matched {
                target: target.path.clone(),
                candidate: candidate.record.path.clone(),
                diff_ratio: comparison.diff_ratio,
            }));

            if first_match_only {
                break;
            }
        }

        if accepted == 0 {
            debug!(target = %target.path.display(), "no match");
            if self.config.record_unmatched {
                collector.record_unmatched(&target.path)?;
            }
            events.send(Event::Match(MatchEvent::Exhausted {
                target: target.path.clone(),
            }));
            return Ok(TargetOutcome::Exhausted);
        }

        Ok(TargetOutcome::Matched)
    }
}

/// Match targets against candidates with an explicit configuration.
pub fn match_records(
    targets: &[ImageRecord],
    candidates: &[ImageRecord],
    config: &MatchConfig,
) -> Result<MatchRun, FinderError> {
    MatchEngine::new(config.clone())?.run(targets, candidates)
}

/// Every fingerprint in a run must share one shape.
fn check_dimensions(targets: &[ImageRecord], pool: &[&ImageRecord]) -> Result<(), CompareError> {
    let mut fingerprints = targets
        .iter()
        .filter_map(|t| t.fingerprint.as_ref())
        .chain(pool.iter().filter_map(|c| c.fingerprint.as_ref()));

    let Some(first) = fingerprints.next() else {
        return Ok(());
    };
    let expected = first.dimensions();

    match fingerprints.find(|f| f.dimensions() != expected) {
        Some(other) => Err(CompareError::DimensionMismatch {
            expected,
            found: other.dimensions(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fingerprint::Fingerprint;
    use crate::events::EventChannel;
    use chrono::{DateTime, TimeZone, Utc};
    use std::path::{Path, PathBuf};

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 6, d, 0, 0, 0).unwrap()
    }

    /// 10-pixel single-row fingerprint: black, with the first `white` pixels white
    fn fingerprint(white: usize) -> Fingerprint {
        let samples = (0..10)
            .flat_map(|i| if i < white { [255, 255, 255, 255] } else { [0, 0, 0, 255] })
            .collect();
        Fingerprint::from_rgba(10, 1, samples).unwrap()
    }

    fn record(path: &str, date: Option<DateTime<Utc>>, white: Option<usize>) -> ImageRecord {
        ImageRecord::new(path, date, white.map(fingerprint))
    }

    fn engine(config: MatchConfig) -> MatchEngine {
        MatchEngine::new(config).unwrap()
    }

    #[test]
    fn first_acceptable_candidate_wins_over_better_later_one() {
        // 20-pixel rows: one differing pixel is a 5% difference
        let wide = |white| {
            let samples = (0..20)
                .flat_map(|i| if i < white { [255, 255, 255, 255] } else { [0, 0, 0, 255] })
                .collect();
            Fingerprint::from_rgba(20, 1, samples)
        };
        let targets = vec![ImageRecord::new("/exports/t.jpg", Some(day(15)), wide(0))];
        let candidates = vec![
            ImageRecord::new("/roll/identical.jpg", Some(day(10)), wide(0)),
            ImageRecord::new("/roll/close.jpg", Some(day(14)), wide(1)),
        ];

        let run = engine(MatchConfig::default()).run(&targets, &candidates).unwrap();

        let found = run.results.get(Path::new("/exports/t.jpg")).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].candidate, PathBuf::from("/roll/close.jpg"));
        assert!((found[0].diff_ratio - 0.05).abs() < 1e-9);
        assert_eq!(found[0].date_difference_ms, Some(24 * 60 * 60 * 1000));
    }

    #[test]
    fn candidate_over_threshold_is_skipped() {
        let targets = vec![record("/exports/t.jpg", Some(day(15)), Some(0))];
        let candidates = vec![
            record("/roll/different.jpg", Some(day(15)), Some(5)),
            record("/roll/same.jpg", Some(day(1)), Some(0)),
        ];

        let run = engine(MatchConfig::default()).run(&targets, &candidates).unwrap();

        assert_eq!(
            run.results.first_match(Path::new("/exports/t.jpg")).unwrap().candidate,
            PathBuf::from("/roll/same.jpg")
        );
    }

    #[test]
    fn exhausted_target_is_recorded_as_unmatched() {
        let targets = vec![record("/exports/t.jpg", None, Some(0))];
        let candidates = vec![record("/roll/a.jpg", None, Some(10))];

        let run = engine(MatchConfig::default()).run(&targets, &candidates).unwrap();
        assert!(run.results.is_empty());
        assert!(run.results.unmatched().contains(Path::new("/exports/t.jpg")));

        let quiet = engine(MatchConfig::default().with_record_unmatched(false))
            .run(&targets, &candidates)
            .unwrap();
        assert!(quiet.results.unmatched().is_empty());
        assert_eq!(quiet.completed_targets, 1);
    }

    #[test]
    fn window_can_leave_nothing_to_compare() {
        let targets = vec![record("/exports/t.jpg", Some(day(15)), Some(0))];
        let candidates = vec![record("/roll/old.jpg", Some(day(1)), Some(0))];

        let config = MatchConfig::default().with_max_date_window_ms(Some(24 * 60 * 60 * 1000));
        let run = engine(config).run(&targets, &candidates).unwrap();

        assert!(run.results.is_empty());
    }

    #[test]
    fn unfingerprintable_target_does_not_stop_the_batch() {
        let targets = vec![
            record("/exports/broken.jpg", Some(day(15)), None),
            record("/exports/fine.jpg", Some(day(15)), Some(0)),
        ];
        let candidates = vec![record("/roll/a.jpg", Some(day(15)), Some(0))];

        let run = engine(MatchConfig::default()).run(&targets, &candidates).unwrap();

        assert!(run.results.is_matched(Path::new("/exports/fine.jpg")));
        assert_eq!(
            run.failures,
            vec![ItemFailure::UnfingerprintableTarget {
                path: PathBuf::from("/exports/broken.jpg")
            }]
        );
        assert_eq!(run.completed_targets, 2);
    }

    #[test]
    fn unfingerprinted_candidates_are_reported_and_skipped() {
        let targets = vec![record("/exports/t.jpg", None, Some(0))];
        let candidates = vec![
            record("/roll/broken.jpg", None, None),
            record("/roll/a.jpg", None, Some(0)),
        ];

        let run = engine(MatchConfig::default()).run(&targets, &candidates).unwrap();

        assert!(run.results.is_matched(Path::new("/exports/t.jpg")));
        assert_eq!(
            run.failures,
            vec![ItemFailure::UnfingerprintableCandidate {
                path: PathBuf::from("/roll/broken.jpg")
            }]
        );
    }

    #[test]
    fn mixed_fingerprint_sizes_abort_the_run() {
        let targets = vec![record("/exports/t.jpg", None, Some(0))];
        let candidates = vec![ImageRecord::new(
            "/roll/a.jpg",
            None,
            Fingerprint::from_rgba(5, 1, vec![0; 20]),
        )];

        let error = engine(MatchConfig::default())
            .run(&targets, &candidates)
            .unwrap_err();

        assert!(matches!(
            error,
            FinderError::Compare(CompareError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn all_matches_mode_keeps_every_accepted_candidate() {
        let targets = vec![record("/exports/t.jpg", Some(day(15)), Some(0))];
        let candidates = vec![
            record("/roll/far.jpg", Some(day(1)), Some(0)),
            record("/roll/no.jpg", Some(day(15)), Some(9)),
            record("/roll/near.jpg", Some(day(16)), Some(0)),
        ];

        let config = MatchConfig::default().with_match_mode(MatchMode::AllMatches);
        let run = engine(config).run(&targets, &candidates).unwrap();

        let found: Vec<_> = run
            .results
            .get(Path::new("/exports/t.jpg"))
            .unwrap()
            .iter()
            .map(|m| m.candidate.clone())
            .collect();
        assert_eq!(
            found,
            vec![PathBuf::from("/roll/near.jpg"), PathBuf::from("/roll/far.jpg")]
        );
    }

    #[test]
    fn duplicate_target_is_matched_once() {
        let targets = vec![
            record("/exports/t.jpg", None, Some(0)),
            record("/exports/t.jpg", None, Some(0)),
        ];
        let candidates = vec![record("/roll/a.jpg", None, Some(0))];

        let (sender, receiver) = EventChannel::new();
        let run = engine(MatchConfig::default())
            .run_with_events(&targets, &candidates, &sender)
            .unwrap();
        drop(sender);

        let matched_events = receiver
            .iter()
            .filter(|e| matches!(e, Event::Match(MatchEvent::Matched { .. })))
            .count();
        assert_eq!(matched_events, 1);
        assert_eq!(run.results.get(Path::new("/exports/t.jpg")).unwrap().len(), 1);
    }

    #[test]
    fn repeated_target_in_all_matches_mode_is_processed_once() {
        let targets = vec![
            record("/exports/t.jpg", None, Some(0)),
            record("/exports/t.jpg", None, Some(0)),
        ];
        let candidates = vec![
            record("/roll/a.jpg", None, Some(0)),
            record("/roll/b.jpg", None, Some(0)),
            record("/roll/a.jpg", None, Some(0)),
        ];

        let (sender, receiver) = EventChannel::new();
        let run = engine(MatchConfig::default().with_match_mode(MatchMode::AllMatches))
            .run_with_events(&targets, &candidates, &sender)
            .unwrap();
        drop(sender);

        let found: Vec<_> = run
            .results
            .get(Path::new("/exports/t.jpg"))
            .unwrap()
            .iter()
            .map(|m| m.candidate.clone())
            .collect();
        assert_eq!(
            found,
            vec![PathBuf::from("/roll/a.jpg"), PathBuf::from("/roll/b.jpg")]
        );
        let matched_events = receiver
            .iter()
            .filter(|e| matches!(e, Event::Match(MatchEvent::Matched { .. })))
            .count();
        assert_eq!(matched_events, 2);
        assert_eq!(run.completed_targets, 1);
    }

    #[test]
    fn repeated_and_parallel_runs_agree() {
        let targets: Vec<_> = (0..12usize)
            .map(|i| record(&format!("/exports/{}.jpg", i), Some(day(1 + i as u32)), Some(i % 4)))
            .collect();
        let candidates: Vec<_> = (0..30usize)
            .map(|i| record(&format!("/roll/{}.jpg", i), Some(day(1 + (i % 28) as u32)), Some(i % 5)))
            .collect();

        let sequential = engine(MatchConfig::default()).run(&targets, &candidates).unwrap();
        let again = engine(MatchConfig::default()).run(&targets, &candidates).unwrap();
        let parallel = engine(MatchConfig::default().with_parallel_targets(true))
            .run(&targets, &candidates)
            .unwrap();

        assert_eq!(sequential.results, again.results);
        assert_eq!(sequential.results, parallel.results);
        assert!(!sequential.results.is_empty());
    }

    #[test]
    fn cancelled_run_keeps_nothing_after_cancel() {
        let targets = vec![
            record("/exports/a.jpg", None, Some(0)),
            record("/exports/b.jpg", None, Some(0)),
        ];
        let candidates = vec![record("/roll/a.jpg", None, Some(0))];

        let token = CancellationToken::new();
        token.cancel();
        let run = engine(MatchConfig::default())
            .with_cancellation(token)
            .run(&targets, &candidates)
            .unwrap();

        assert!(run.cancelled);
        assert_eq!(run.completed_targets, 0);
        assert!(run.results.is_empty());
    }

    #[test]
    fn match_records_uses_explicit_config() {
        let targets = vec![record("/exports/t.jpg", None, Some(0))];
        let candidates = vec![record("/roll/a.jpg", None, Some(0))];

        let run = match_records(&targets, &candidates, &MatchConfig::default()).unwrap();

        assert_eq!(run.results.len(), 1);
        assert!(match_records(
            &targets,
            &candidates,
            &MatchConfig::default().with_similarity_threshold(-1.0)
        )
        .is_err());
    }
}
