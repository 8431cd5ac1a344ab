//! # Prioritizer Module
//!
//! Orders the candidate pool for one target by closeness in capture time.
//!
//! ## Rules
//! - Undated target: pool order is kept, nothing is filtered
//! - Undated candidates sort after every dated one, and are dropped entirely
//!   when a date window is set
//! - Candidates further than the window (inclusive bound) are dropped
//! - The sort is stable, so equally close candidates keep pool order
//! - At most `max_count` candidates come back, whatever the target's date
//!
//! The returned list is built fresh for each target and borrows from the pool.

use crate::core::record::ImageRecord;
use chrono::{DateTime, Utc};

/// Default cap on candidates tried per target
pub const DEFAULT_MAX_CANDIDATES: usize = 100;

/// A candidate with its distance in time from the target
#[derive(Debug, Clone, Copy)]
pub struct PrioritizedCandidate<'a> {
    pub record: &'a ImageRecord,
    /// `None` when either date is unknown
    pub date_difference_ms: Option<i64>,
}

/// Orders candidates by date proximity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidatePrioritizer {
    max_window_ms: Option<i64>,
    max_count: usize,
}

impl CandidatePrioritizer {
    pub fn new(max_window_ms: Option<i64>, max_count: usize) -> Self {
        Self {
            max_window_ms,
            max_count,
        }
    }

    pub fn max_window_ms(&self) -> Option<i64> {
        self.max_window_ms
    }

    pub fn max_count(&self) -> usize {
        self.max_count
    }

    /// Order `candidates` for a target dated `target_date`.
    pub fn prioritize<'a, I>(
        &self,
        target_date: Option<DateTime<Utc>>,
        candidates: I,
    ) -> Vec<PrioritizedCandidate<'a>>
    where
        I: IntoIterator<Item = &'a ImageRecord>,
    {
        let Some(target_date) = target_date else {
            return candidates
                .into_iter()
                .take(self.max_count)
                .map(|record| PrioritizedCandidate {
                    record,
                    date_difference_ms: None,
                })
                .collect();
        };

        let mut ordered: Vec<PrioritizedCandidate<'a>> = candidates
            .into_iter()
            .map(|record| PrioritizedCandidate {
                record,
                date_difference_ms: record
                    .resolved_date
                    .map(|date| date_difference_ms(target_date, date)),
            })
            .filter(|candidate| match (self.max_window_ms, candidate.date_difference_ms) {
                (None, _) => true,
                (Some(window), Some(diff)) => diff <= window,
                (Some(_), None) => false,
            })
            .collect();

        // Vec::sort_by_key is stable
        ordered.sort_by_key(|c| (c.date_difference_ms.is_none(), c.date_difference_ms.unwrap_or(0)));
        ordered.truncate(self.max_count);
        ordered
    }
}

impl Default for CandidatePrioritizer {
    fn default() -> Self {
        Self::new(None, DEFAULT_MAX_CANDIDATES)
    }
}

/// Absolute distance between two instants in milliseconds, saturating at `i64::MAX`.
pub fn date_difference_ms(a: DateTime<Utc>, b: DateTime<Utc>) -> i64 {
    let a = a.timestamp_millis() as i128;
    let b = b.timestamp_millis() as i128;
    (a - b).unsigned_abs().min(i64::MAX as u128) as i64
}
