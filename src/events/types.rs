//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted while searching for originals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Image discovery events
    Scan(ScanEvent),
    /// Date resolution and fingerprinting events
    Extract(ExtractEvent),
    /// Matching events
    Match(MatchEvent),
    /// Run-level events
    Run(RunEvent),
}

/// Events while listing images in a directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Listing has started
    Started { paths: Vec<PathBuf> },
    /// An image file was found
    ImageFound { path: PathBuf },
    /// An error occurred but listing continues
    Error { path: PathBuf, message: String },
    /// Listing completed
    Completed { total_images: usize },
}

/// Events while building image records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExtractEvent {
    /// Extraction has started
    Started { role: RecordRole, total_images: usize },
    /// Progress update during extraction
    Progress(ExtractProgress),
    /// An image could not be fingerprinted
    Error { path: PathBuf, message: String },
    /// Extraction completed
    Completed {
        role: RecordRole,
        fingerprinted: usize,
        failed: usize,
    },
}

/// Progress information during extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractProgress {
    pub role: RecordRole,
    /// Number of images processed so far
    pub completed: usize,
    /// Total number of images to process
    pub total: usize,
    /// Image just processed
    pub current_path: PathBuf,
}

/// Which side of the search an image belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordRole {
    /// An image whose original is being looked for
    Target,
    /// An image from the search pool
    Candidate,
}

/// Events while matching targets against the pool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MatchEvent {
    /// Matching has started
    Started {
        total_targets: usize,
        total_candidates: usize,
    },
    /// Work on a target has begun
    TargetStarted { target: PathBuf, candidates: usize },
    /// A candidate cleared the similarity threshold for a target
    Matched {
        target: PathBuf,
        candidate: PathBuf,
        diff_ratio: f64,
    },
    /// All candidates were tried without an accepted match
    Exhausted { target: PathBuf },
    /// The target could not be processed
    TargetFailed { target: PathBuf, message: String },
    /// Matching completed
    Completed { matched: usize, unmatched: usize },
}

/// Run-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RunEvent {
    /// Run has started
    Started,
    /// Moving to a new phase
    PhaseChanged { phase: RunPhase },
    /// Run completed
    Completed { summary: RunSummary },
    /// Run was cancelled between targets
    Cancelled { completed_targets: usize },
    /// Run hit a fatal error
    Error { message: String },
}

/// Phases of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    Listing,
    Extracting,
    Matching,
}

/// Summary of a finished run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_targets: usize,
    pub total_candidates: usize,
    pub matched_targets: usize,
    pub failures: usize,
    pub duration_ms: u64,
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunPhase::Listing => write!(f, "Listing"),
            RunPhase::Extracting => write!(f, "Extracting"),
            RunPhase::Matching => write!(f, "Matching"),
        }
    }
}

impl std::fmt::Display for RecordRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordRole::Target => write!(f, "target"),
            RecordRole::Candidate => write!(f, "candidate"),
        }
    }
}
