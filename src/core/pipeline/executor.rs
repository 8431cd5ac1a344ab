//! Finder execution implementation.

use crate::core::engine::{CancellationToken, MatchConfig, MatchEngine, MatchResultSet};
use crate::core::record::RecordBuilder;
use crate::core::scanner::ScanConfig;
use crate::core::source::{FsImageSource, ImageSource};
use crate::error::{FinderError, ItemFailure, ScanError};
use crate::events::{
    null_sender, Event, EventSender, RecordRole, RunEvent, RunPhase, RunSummary, ScanEvent,
};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Result of a finder run
#[derive(Debug)]
pub struct FinderResult {
    /// Matched targets and, if recorded, exhausted ones
    pub results: MatchResultSet,
    /// Images found in the target directory
    pub total_targets: usize,
    /// Candidates that made it into the pool
    pub total_candidates: usize,
    /// Per-item failures (decode, date, fingerprint)
    pub failures: Vec<ItemFailure>,
    /// Unreadable search directories and entries (non-fatal)
    pub scan_errors: Vec<String>,
    /// Set when the run was stopped early
    pub cancelled: bool,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

/// Builder for a [`Finder`]
pub struct FinderBuilder {
    target_dir: Option<PathBuf>,
    search_dirs: Vec<PathBuf>,
    config: MatchConfig,
    scan_config: ScanConfig,
    source: Option<Box<dyn ImageSource>>,
    cancellation: CancellationToken,
}

impl FinderBuilder {
    pub fn new() -> Self {
        Self {
            target_dir: None,
            search_dirs: Vec::new(),
            config: MatchConfig::default(),
            scan_config: ScanConfig::default(),
            source: None,
            cancellation: CancellationToken::new(),
        }
    }

    /// Directory holding the images to trace back
    pub fn target_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.target_dir = Some(dir.into());
        self
    }

    /// Add a directory to search for originals
    pub fn search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dirs.push(dir.into());
        self
    }

    /// Replace the search directories
    pub fn search_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.search_dirs = dirs;
        self
    }

    pub fn config(mut self, config: MatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Listing options for the default filesystem source
    pub fn scan_config(mut self, config: ScanConfig) -> Self {
        self.scan_config = config;
        self
    }

    /// Descend into subdirectories
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.scan_config.max_depth = if recursive { None } else { Some(1) };
        self
    }

    /// Read images through something other than the local filesystem
    pub fn source(mut self, source: Box<dyn ImageSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn build(self) -> Result<Finder, FinderError> {
        let target_dir = self
            .target_dir
            .ok_or_else(|| FinderError::Config("target directory is required".to_string()))?;
        if self.search_dirs.is_empty() {
            return Err(FinderError::Config(
                "at least one search directory is required".to_string(),
            ));
        }
        self.config.validate()?;

        let scan_config = self.scan_config;
        Ok(Finder {
            target_dir,
            search_dirs: self.search_dirs,
            config: self.config,
            source: self
                .source
                .unwrap_or_else(|| Box::new(FsImageSource::new(scan_config))),
            cancellation: self.cancellation,
        })
    }
}

impl Default for FinderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Traces each image in a target directory back to its original
pub struct Finder {
    target_dir: PathBuf,
    search_dirs: Vec<PathBuf>,
    config: MatchConfig,
    source: Box<dyn ImageSource>,
    cancellation: CancellationToken,
}

impl Finder {
    pub fn builder() -> FinderBuilder {
        FinderBuilder::new()
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Token that stops this finder's runs
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    pub fn run(&self) -> Result<FinderResult, FinderError> {
        self.run_with_events(&null_sender())
    }

    pub fn run_with_events(&self, events: &EventSender) -> Result<FinderResult, FinderError> {
        let result = self.execute(events);
        if let Err(e) = &result {
            events.send(Event::Run(RunEvent::Error {
                message: e.to_string(),
            }));
        }
        result
    }

    fn execute(&self, events: &EventSender) -> Result<FinderResult, FinderError> {
        let start_time = Instant::now();
        let mut scan_errors = Vec::new();

        events.send(Event::Run(RunEvent::Started));

        // Phase 1: Listing
        events.send(Event::Run(RunEvent::PhaseChanged {
            phase: RunPhase::Listing,
        }));
        let mut all_dirs = vec![self.target_dir.clone()];
        all_dirs.extend(self.search_dirs.iter().cloned());
        events.send(Event::Scan(ScanEvent::Started { paths: all_dirs }));

        // Without a target directory there is nothing to do
        let target_paths = self.list(&self.target_dir, events, &mut scan_errors)?;

        let mut candidate_paths = Vec::new();
        for dir in &self.search_dirs {
            match self.list(dir, events, &mut scan_errors) {
                Ok(paths) => candidate_paths.extend(paths),
                Err(e) => {
                    warn!("{}", e);
                    events.send(Event::Scan(ScanEvent::Error {
                        path: dir.clone(),
                        message: e.to_string(),
                    }));
                    scan_errors.push(e.to_string());
                }
            }
        }
        events.send(Event::Scan(ScanEvent::Completed {
            total_images: target_paths.len() + candidate_paths.len(),
        }));
        info!(
            targets = target_paths.len(),
            candidates = candidate_paths.len(),
            "listing complete"
        );

        // Phase 2: Extracting
        events.send(Event::Run(RunEvent::PhaseChanged {
            phase: RunPhase::Extracting,
        }));
        let builder = RecordBuilder::new(
            self.source.as_ref(),
            self.config.date_resolver(),
            self.config.extractor(),
        );
        let targets = builder.build_records(&target_paths, RecordRole::Target, events);
        let candidates = builder.build_records(&candidate_paths, RecordRole::Candidate, events);

        let mut failures = targets.failures;
        failures.extend(candidates.failures);

        // Phase 3: Matching
        events.send(Event::Run(RunEvent::PhaseChanged {
            phase: RunPhase::Matching,
        }));
        let engine = MatchEngine::new(self.config.clone())?.with_cancellation(self.cancellation.clone());
        let run = engine.run_with_events(&targets.records, &candidates.records, events)?;
        failures.extend(run.failures);

        let duration_ms = start_time.elapsed().as_millis() as u64;
        if run.cancelled {
            info!(completed = run.completed_targets, "run cancelled");
            events.send(Event::Run(RunEvent::Cancelled {
                completed_targets: run.completed_targets,
            }));
        } else {
            events.send(Event::Run(RunEvent::Completed {
                summary: RunSummary {
                    total_targets: target_paths.len(),
                    total_candidates: candidates.records.len(),
                    matched_targets: run.results.len(),
                    failures: failures.len(),
                    duration_ms,
                },
            }));
        }
        info!(
            matched = run.results.len(),
            failures = failures.len(),
            duration_ms,
            "run finished"
        );

        Ok(FinderResult {
            results: run.results,
            total_targets: target_paths.len(),
            total_candidates: candidates.records.len(),
            failures,
            scan_errors,
            cancelled: run.cancelled,
            duration_ms,
        })
    }

    /// List one directory; unreadable entries go to `scan_errors`.
    fn list(
        &self,
        dir: &Path,
        events: &EventSender,
        scan_errors: &mut Vec<String>,
    ) -> Result<Vec<PathBuf>, FinderError> {
        let listed = self.source.list_images(dir)?;
        for path in &listed.images {
            events.send(Event::Scan(ScanEvent::ImageFound { path: path.clone() }));
        }
        for error in listed.errors {
            let path = match &error {
                ScanError::DirectoryNotFound { path }
                | ScanError::PermissionDenied { path }
                | ScanError::ReadDirectory { path, .. } => path.clone(),
            };
            events.send(Event::Scan(ScanEvent::Error {
                path,
                message: error.to_string(),
            }));
            scan_errors.push(error.to_string());
        }
        Ok(listed.images)
    }
}
