//! Match results and the per-run collector that accumulates them.

use super::MatchMode;
use crate::error::MatchError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// An accepted candidate for a target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateMatch {
    pub candidate: PathBuf,
    /// Share of sampled pixels that differed
    pub diff_ratio: f64,
    /// Distance in capture time, when both dates were known
    pub date_difference_ms: Option<i64>,
}

/// Targets mapped to their accepted candidates, ordered by target path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchResultSet {
    matches: BTreeMap<PathBuf, Vec<CandidateMatch>>,
    unmatched: BTreeSet<PathBuf>,
}

impl MatchResultSet {
    /// All matched targets with their candidates in acceptance order
    pub fn matches(&self) -> &BTreeMap<PathBuf, Vec<CandidateMatch>> {
        &self.matches
    }

    pub fn get(&self, target: &Path) -> Option<&[CandidateMatch]> {
        self.matches.get(target).map(Vec::as_slice)
    }

    /// The first accepted candidate for a target
    pub fn first_match(&self, target: &Path) -> Option<&CandidateMatch> {
        self.matches.get(target).and_then(|m| m.first())
    }

    pub fn is_matched(&self, target: &Path) -> bool {
        self.matches.contains_key(target)
    }

    /// Targets that ran out of candidates. Empty unless unmatched targets are recorded.
    pub fn unmatched(&self) -> &BTreeSet<PathBuf> {
        &self.unmatched
    }

    /// Number of matched targets
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// Append-only, thread-safe result accumulator for one run.
///
/// Each target owns one slot. Entries are only ever added. In
/// [`MatchMode::FirstMatch`] the first insertion into a slot wins and later
/// ones are refused; in [`MatchMode::AllMatches`] a candidate appears at most
/// once per slot.
pub struct MatchCollector {
    mode: MatchMode,
    results: RwLock<MatchResultSet>,
    claimed: RwLock<HashSet<PathBuf>>,
}

impl MatchCollector {
    pub fn new(mode: MatchMode) -> Self {
        Self {
            mode,
            results: RwLock::new(MatchResultSet::default()),
            claimed: RwLock::new(HashSet::new()),
        }
    }

    /// Reserve a target for processing. Returns false if it was already claimed.
    pub fn claim(&self, target: &Path) -> Result<bool, MatchError> {
        let mut claimed = self
            .claimed
            .write()
            .map_err(|_| MatchError::CollectorPoisoned)?;
        Ok(claimed.insert(target.to_path_buf()))
    }

    /// Record an accepted candidate. Returns whether it was stored.
    pub fn record_match(&self, target: &Path, found: CandidateMatch) -> Result<bool, MatchError> {
        let mut results = self
            .results
            .write()
            .map_err(|_| MatchError::CollectorPoisoned)?;

        let slot = results.matches.entry(target.to_path_buf()).or_default();
        let refused = match self.mode {
            MatchMode::FirstMatch => !slot.is_empty(),
            MatchMode::AllMatches => slot.iter().any(|m| m.candidate == found.candidate),
        };
        if refused {
            return Ok(false);
        }
        slot.push(found);
        results.unmatched.remove(target);
        Ok(true)
    }

    /// Mark a target as exhausted, unless it already has a match.
    pub fn record_unmatched(&self, target: &Path) -> Result<(), MatchError> {
        let mut results = self
            .results
            .write()
            .map_err(|_| MatchError::CollectorPoisoned)?;

        if !results.matches.contains_key(target) {
            results.unmatched.insert(target.to_path_buf());
        }
        Ok(())
    }

    pub fn is_matched(&self, target: &Path) -> Result<bool, MatchError> {
        let results = self
            .results
            .read()
            .map_err(|_| MatchError::CollectorPoisoned)?;
        Ok(results.is_matched(target))
    }

    /// Copy of everything recorded so far
    pub fn snapshot(&self) -> Result<MatchResultSet, MatchError> {
        self.results
            .read()
            .map(|r| r.clone())
            .map_err(|_| MatchError::CollectorPoisoned)
    }

    pub fn into_results(self) -> Result<MatchResultSet, MatchError> {
        self.results
            .into_inner()
            .map_err(|_| MatchError::CollectorPoisoned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn found(name: &str) -> CandidateMatch {
        CandidateMatch {
            candidate: PathBuf::from(name),
            diff_ratio: 0.0,
            date_difference_ms: None,
        }
    }

    #[test]
    fn first_match_mode_keeps_only_first() {
        let collector = MatchCollector::new(MatchMode::FirstMatch);
        let target = Path::new("/exports/a.jpg");

        assert!(collector.record_match(target, found("/roll/1.jpg")).unwrap());
        assert!(!collector.record_match(target, found("/roll/2.jpg")).unwrap());

        let results = collector.into_results().unwrap();
        assert_eq!(results.get(target).unwrap().len(), 1);
        assert_eq!(
            results.first_match(target).unwrap().candidate,
            PathBuf::from("/roll/1.jpg")
        );
    }

    #[test]
    fn all_matches_mode_appends_in_order() {
        let collector = MatchCollector::new(MatchMode::AllMatches);
        let target = Path::new("/exports/a.jpg");

        collector.record_match(target, found("/roll/1.jpg")).unwrap();
        collector.record_match(target, found("/roll/2.jpg")).unwrap();

        let results = collector.into_results().unwrap();
        let candidates: Vec<_> = results
            .get(target)
            .unwrap()
            .iter()
            .map(|m| m.candidate.clone())
            .collect();
        assert_eq!(
            candidates,
            vec![PathBuf::from("/roll/1.jpg"), PathBuf::from("/roll/2.jpg")]
        );
    }

    #[test]
    fn all_matches_mode_ignores_repeated_candidate() {
        let collector = MatchCollector::new(MatchMode::AllMatches);
        let target = Path::new("/exports/a.jpg");

        assert!(collector.record_match(target, found("/roll/1.jpg")).unwrap());
        assert!(!collector.record_match(target, found("/roll/1.jpg")).unwrap());

        assert_eq!(collector.snapshot().unwrap().get(target).unwrap().len(), 1);
    }

    #[test]
    fn target_can_be_claimed_once() {
        let collector = MatchCollector::new(MatchMode::AllMatches);
        let target = Path::new("/exports/a.jpg");

        assert!(collector.claim(target).unwrap());
        assert!(!collector.claim(target).unwrap());
        assert!(collector.claim(Path::new("/exports/b.jpg")).unwrap());
    }

    #[test]
    fn matched_target_is_never_marked_unmatched() {
        let collector = MatchCollector::new(MatchMode::FirstMatch);
        let target = Path::new("/exports/a.jpg");

        collector.record_match(target, found("/roll/1.jpg")).unwrap();
        collector.record_unmatched(target).unwrap();
        collector.record_unmatched(Path::new("/exports/b.jpg")).unwrap();

        let results = collector.snapshot().unwrap();
        assert!(results.is_matched(target));
        assert!(!results.unmatched().contains(target));
        assert!(results.unmatched().contains(Path::new("/exports/b.jpg")));
    }

    #[test]
    fn concurrent_inserts_land_in_their_own_slots() {
        let collector = Arc::new(MatchCollector::new(MatchMode::FirstMatch));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let collector = Arc::clone(&collector);
                thread::spawn(move || {
                    let target = PathBuf::from(format!("/exports/{}.jpg", i));
                    collector
                        .record_match(&target, found(&format!("/roll/{}.jpg", i)))
                        .unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert_eq!(collector.snapshot().unwrap().len(), 8);
    }
}
