//! # Core Module
//!
//! The front-end-agnostic matching engine.
//!
//! ## Modules
//! - `scanner` - Lists image files in directories
//! - `source` - Capability interface for listing, decoding and metadata
//! - `metadata` - Extracts EXIF metadata from photos
//! - `dates` - Resolves a capture date per image
//! - `fingerprint` - Decodes, resizes and samples images into fingerprints
//! - `record` - Builds one record per image
//! - `prioritizer` - Orders candidates by date proximity
//! - `comparator` - Measures how far apart two fingerprints are
//! - `engine` - Matches targets against the candidate pool
//! - `pipeline` - Orchestrates the full workflow

pub mod comparator;
pub mod dates;
pub mod engine;
pub mod fingerprint;
pub mod metadata;
pub mod pipeline;
pub mod prioritizer;
pub mod record;
pub mod scanner;
pub mod source;

// Re-export commonly used types
pub use comparator::{Comparison, SimilarityComparator};
pub use dates::{DatePolicy, DateResolver};
pub use engine::{
    match_records, CancellationToken, CandidateMatch, MatchConfig, MatchEngine, MatchMode,
    MatchResultSet, MatchRun,
};
pub use fingerprint::{Fingerprint, FingerprintExtractor, SampleRegion};
pub use metadata::PhotoMetadata;
pub use pipeline::{Finder, FinderBuilder, FinderResult};
pub use prioritizer::{CandidatePrioritizer, PrioritizedCandidate};
pub use record::{ImageRecord, RecordBuilder};
pub use source::{FsImageSource, ImageSource};
