//! # Dates Module
//!
//! Resolves a best-effort capture date for an image.
//!
//! ## Resolution Order
//! 1. Embedded capture date (EXIF), when present and well-formed
//! 2. The last `YYYY-MM-DD` pattern in the file path, with `_` read as `-`.
//!    The rightmost match wins, so a date in the file name beats one in a
//!    parent folder.
//! 3. Nothing: `None` under [`DatePolicy::Strict`], the current time under
//!    [`DatePolicy::Lenient`]
//!
//! Path dates resolve to midnight UTC.

use crate::error::DateError;
use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

/// What to do when no capture date can be found
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatePolicy {
    /// Unknown dates stay unknown
    #[default]
    Strict,
    /// Unknown dates become "now"
    Lenient,
}

fn path_date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("static date pattern is valid"))
}

/// Resolves capture dates under a fixed policy. Pure; performs no I/O.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateResolver {
    policy: DatePolicy,
}

impl DateResolver {
    pub fn new(policy: DatePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> DatePolicy {
        self.policy
    }

    /// Resolve a date, applying the fallback policy on failure.
    pub fn resolve(&self, path: &Path, embedded: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
        match self.resolve_detailed(path, embedded) {
            Ok(date) => Some(date),
            Err(_) => self.fallback(),
        }
    }

    /// Resolve a date and explain why none was found.
    ///
    /// Does not apply the fallback policy.
    pub fn resolve_detailed(
        &self,
        path: &Path,
        embedded: Option<DateTime<Utc>>,
    ) -> Result<DateTime<Utc>, DateError> {
        if let Some(date) = embedded {
            return Ok(date);
        }
        date_from_path(path)
    }

    /// The value used when resolution fails
    pub fn fallback(&self) -> Option<DateTime<Utc>> {
        match self.policy {
            DatePolicy::Strict => None,
            DatePolicy::Lenient => Some(Utc::now()),
        }
    }
}

/// Find the rightmost `YYYY-MM-DD` (or `YYYY_MM_DD`) date in a path.
pub fn date_from_path(path: &Path) -> Result<DateTime<Utc>, DateError> {
    let normalized = path.to_string_lossy().replace('_', "-");

    let last = path_date_pattern()
        .find_iter(&normalized)
        .last()
        .ok_or_else(|| DateError::NotFound {
            path: path.to_path_buf(),
        })?;

    NaiveDate::parse_from_str(last.as_str(), "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| DateError::Ambiguous {
            path: path.to_path_buf(),
            found: last.as_str().to_string(),
        })
}
