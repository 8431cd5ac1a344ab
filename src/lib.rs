//! # Original Finder
//!
//! Traces edited or exported photos back to their originals.
//!
//! Each image in a target directory is compared against a pool of candidate
//! originals. Candidates are tried in order of capture-date proximity and the
//! first one that is visually close enough is taken as the original.
//!
//! ## Architecture
//! - `core` - The matching engine (no UI, no filesystem writes)
//! - `events` - Event-driven progress reporting
//! - `error` - Error types with the offending path attached
//!
//! ## Example
//! ```rust,no_run
//! use original_finder::{Finder, MatchConfig};
//!
//! let finder = Finder::builder()
//!     .target_dir("/photos/exports")
//!     .search_dir("/photos/camera-roll")
//!     .config(MatchConfig::default().with_max_date_window_ms(Some(30 * 86_400_000)))
//!     .build()?;
//!
//! let result = finder.run()?;
//! for (target, matches) in result.results.matches() {
//!     println!("{} <- {}", target.display(), matches[0].candidate.display());
//! }
//! # Ok::<(), original_finder::FinderError>(())
//! ```

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use crate::core::{
    match_records, CancellationToken, Finder, FinderBuilder, FinderResult, ImageRecord,
    MatchConfig, MatchEngine, MatchMode, MatchResultSet,
};
pub use error::{FinderError, ItemFailure, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point, never by the library.
/// Panics if a global subscriber is already set; see [`try_init_tracing`].
pub fn init_tracing() {
    if let Err(e) = try_init_tracing() {
        panic!("Failed to set global default tracing subscriber: {}", e);
    }
}

/// Initialize tracing, failing if a global subscriber is already installed
pub fn try_init_tracing() -> std::result::Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)
}
