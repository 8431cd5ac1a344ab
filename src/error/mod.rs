//! # Error Module
//!
//! Error types for the original finder.
//!
//! ## Propagation
//! - **Per-item failures** (one image, one target) never abort a run. They are
//!   collected as [`ItemFailure`] entries and returned next to the results.
//! - **Run-level failures** (configuration drift, bad config) abort the run
//!   and surface as [`FinderError`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum FinderError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Decoding error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Comparison error: {0}")]
    Compare(#[from] CompareError),

    #[error("Matching error: {0}")]
    Match(#[from] MatchError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors that occur while listing image files
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur while decoding or resizing an image
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Failed to open image file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode image {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("Image is empty or corrupted: {path}")]
    EmptyImage { path: PathBuf },

    #[error("Failed to resize image: {reason}")]
    Resize { reason: String },
}

/// Errors that occur while comparing fingerprints
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompareError {
    #[error(
        "Fingerprint dimensions differ: expected {}x{}, found {}x{}. All images in a run must use the same fingerprint settings",
        expected.0, expected.1, found.0, found.1
    )]
    DimensionMismatch {
        expected: (u32, u32),
        found: (u32, u32),
    },

    #[error("Invalid similarity threshold: {value} (must be a non-negative number)")]
    InvalidThreshold { value: f64 },
}

/// Errors that occur while resolving a capture date
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    #[error("No capture date found for {path}")]
    NotFound { path: PathBuf },

    #[error("Date-like text '{found}' in {path} is not a valid calendar date")]
    Ambiguous { path: PathBuf, found: String },
}

/// Errors raised by the match engine itself
#[derive(Error, Debug)]
pub enum MatchError {
    #[error("Match result collector is unusable after a worker panicked")]
    CollectorPoisoned,
}

/// A failure isolated to a single image or target.
///
/// These are reported in aggregate and never stop the rest of the batch.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ItemFailure {
    #[error("Could not decode {path}: {message}")]
    Decode { path: PathBuf, message: String },

    #[error("Target {path} has no fingerprint and cannot be matched")]
    UnfingerprintableTarget { path: PathBuf },

    #[error("Candidate {path} has no fingerprint and was left out of the pool")]
    UnfingerprintableCandidate { path: PathBuf },

    #[error("Ignored invalid date '{found}' in {path}")]
    DateAmbiguous { path: PathBuf, found: String },
}

impl ItemFailure {
    /// Build a decode failure entry for a path
    pub fn decode(path: impl Into<PathBuf>, error: &DecodeError) -> Self {
        ItemFailure::Decode {
            path: path.into(),
            message: error.to_string(),
        }
    }

    /// The image this failure belongs to
    pub fn path(&self) -> &std::path::Path {
        match self {
            ItemFailure::Decode { path, .. }
            | ItemFailure::UnfingerprintableTarget { path }
            | ItemFailure::UnfingerprintableCandidate { path }
            | ItemFailure::DateAmbiguous { path, .. } => path,
        }
    }
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, FinderError>;
