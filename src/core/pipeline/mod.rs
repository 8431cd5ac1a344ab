//! # Pipeline Module
//!
//! Runs the whole original-finding workflow.
//!
//! ## Stages
//! 1. **List** - Find images in the target directory and every search directory
//! 2. **Extract** - Resolve dates and fingerprint every image
//! 3. **Match** - Trace each target back to a candidate
//!
//! ## Parallelism
//! Uses rayon for record building; matching is parallel only when configured.
//!
//! The pipeline only reads. Callers that move or copy matched files do so
//! from the `Matched` events or the returned result set.

mod executor;

pub use executor::{Finder, FinderBuilder, FinderResult};
