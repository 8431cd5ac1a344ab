//! # Record Module
//!
//! Builds one [`ImageRecord`] per discovered file: resolved capture date,
//! fingerprint and pixel dimensions.
//!
//! ## Parallelism
//! Records have no ordering dependency on each other, so batches are built
//! on the rayon pool. Output order always follows input order.
//!
//! ## Failures
//! A file that cannot be decoded still gets a record, just without a
//! fingerprint. Candidate batches drop such records from the pool; target
//! batches keep them so the engine can report the target as unmatchable.
//! Either way the decode error lands in the batch's failure list.

use crate::core::dates::DateResolver;
use crate::core::fingerprint::{Fingerprint, FingerprintExtractor};
use crate::core::source::ImageSource;
use crate::error::{DateError, ItemFailure};
use crate::events::{Event, EventSender, ExtractEvent, ExtractProgress, RecordRole};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, warn};

/// Everything the matcher knows about one image. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Where the image lives; doubles as its identity
    pub path: PathBuf,
    /// Best-effort capture date
    pub resolved_date: Option<DateTime<Utc>>,
    /// `None` when the image could not be decoded
    pub fingerprint: Option<Fingerprint>,
    /// Pixel width, 0 when unknown
    pub width: u32,
    /// Pixel height, 0 when unknown
    pub height: u32,
}

impl ImageRecord {
    pub fn new(
        path: impl Into<PathBuf>,
        resolved_date: Option<DateTime<Utc>>,
        fingerprint: Option<Fingerprint>,
    ) -> Self {
        Self {
            path: path.into(),
            resolved_date,
            fingerprint,
            width: 0,
            height: 0,
        }
    }

    /// Set the original pixel dimensions
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn is_fingerprinted(&self) -> bool {
        self.fingerprint.is_some()
    }
}

/// A record plus whatever went wrong while building it
#[derive(Debug, Clone)]
pub struct BuiltRecord {
    pub record: ImageRecord,
    pub failures: Vec<ItemFailure>,
}

/// Records built from a list of files
#[derive(Debug, Clone, Default)]
pub struct RecordBatch {
    /// Usable records, in input order
    pub records: Vec<ImageRecord>,
    /// Per-file problems; none of them stopped the batch
    pub failures: Vec<ItemFailure>,
}

/// Composes date resolution, decoding and fingerprinting
pub struct RecordBuilder<'a> {
    source: &'a dyn ImageSource,
    resolver: DateResolver,
    extractor: FingerprintExtractor,
}

impl<'a> RecordBuilder<'a> {
    pub fn new(
        source: &'a dyn ImageSource,
        resolver: DateResolver,
        extractor: FingerprintExtractor,
    ) -> Self {
        Self {
            source,
            resolver,
            extractor,
        }
    }

    pub fn extractor(&self) -> &FingerprintExtractor {
        &self.extractor
    }

    /// Build a record, discarding the failure details
    pub fn build_record(&self, path: &Path) -> ImageRecord {
        self.build(path).record
    }

    /// Build a record and collect anything that went wrong
    pub fn build(&self, path: &Path) -> BuiltRecord {
        let mut failures = Vec::new();
        let metadata = self.source.read_metadata(path);

        let resolved_date = match self.resolver.resolve_detailed(path, metadata.date_taken) {
            Ok(date) => Some(date),
            Err(DateError::Ambiguous { path, found }) => {
                warn!(path = %path.display(), found = %found, "ignoring invalid date in path");
                failures.push(ItemFailure::DateAmbiguous { path, found });
                self.resolver.fallback()
            }
            Err(DateError::NotFound { .. }) => {
                debug!(path = %path.display(), "no capture date");
                self.resolver.fallback()
            }
        };

        let (fingerprint, decoded_size) = match self.source.decode(path) {
            Ok(image) => {
                let size = (image.width(), image.height());
                match self.extractor.extract_image(&image) {
                    Ok(fingerprint) => (Some(fingerprint), Some(size)),
                    Err(e) => {
                        warn!(path = %path.display(), "fingerprinting failed: {}", e);
                        failures.push(ItemFailure::decode(path, &e));
                        (None, Some(size))
                    }
                }
            }
            Err(e) => {
                warn!(path = %path.display(), "decoding failed: {}", e);
                failures.push(ItemFailure::decode(path, &e));
                (None, None)
            }
        };

        let (decoded_width, decoded_height) = decoded_size.unwrap_or((0, 0));
        let record = ImageRecord {
            path: path.to_path_buf(),
            resolved_date,
            fingerprint,
            width: metadata.width.unwrap_or(decoded_width),
            height: metadata.height.unwrap_or(decoded_height),
        };

        BuiltRecord { record, failures }
    }

    /// Build records for many files in parallel.
    ///
    /// Unfingerprinted candidates are left out of the returned records.
    pub fn build_records(&self, paths: &[PathBuf], role: RecordRole, events: &EventSender) -> RecordBatch {
        let total = paths.len();
        events.send(Event::Extract(ExtractEvent::Started {
            role,
            total_images: total,
        }));

        let completed = AtomicUsize::new(0);
        let built: Vec<BuiltRecord> = paths
            .par_iter()
            .map(|path| {
                let built = self.build(path);
                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;

                if !built.record.is_fingerprinted() {
                    events.send(Event::Extract(ExtractEvent::Error {
                        path: path.clone(),
                        message: built
                            .failures
                            .iter()
                            .map(|f| f.to_string())
                            .collect::<Vec<_>>()
                            .join("; "),
                    }));
                }
                events.send(Event::Extract(ExtractEvent::Progress(ExtractProgress {
                    role,
                    completed: done,
                    total,
                    current_path: path.clone(),
                })));

                built
            })
            .collect();

        let mut batch = RecordBatch::default();
        let mut failed = 0;
        for BuiltRecord { record, failures } in built {
            batch.failures.extend(failures);
            if !record.is_fingerprinted() {
                failed += 1;
                if role == RecordRole::Candidate {
                    continue;
                }
            }
            batch.records.push(record);
        }

        events.send(Event::Extract(ExtractEvent::Completed {
            role,
            fingerprinted: total - failed,
            failed,
        }));
        debug!(%role, total, failed, "built records");

        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dates::DatePolicy;
    use crate::core::fingerprint::SampleRegion;
    use crate::core::metadata::PhotoMetadata;
    use crate::core::scanner::ScanResult;
    use crate::error::{DecodeError, ScanError};
    use crate::events::null_sender;
    use chrono::TimeZone;
    use image::{DynamicImage, Rgba, RgbaImage};
    use std::collections::HashMap;

    /// In-memory source: known paths decode to a solid image, others fail
    struct FakeSource {
        images: HashMap<PathBuf, [u8; 4]>,
        dates: HashMap<PathBuf, DateTime<Utc>>,
    }

    impl ImageSource for FakeSource {
        fn list_images(&self, _directory: &Path) -> Result<ScanResult, ScanError> {
            Ok(ScanResult {
                images: self.images.keys().cloned().collect(),
                errors: Vec::new(),
            })
        }

        fn decode(&self, path: &Path) -> Result<DynamicImage, DecodeError> {
            self.images
                .get(path)
                .map(|rgba| DynamicImage::ImageRgba8(RgbaImage::from_pixel(40, 20, Rgba(*rgba))))
                .ok_or_else(|| DecodeError::Corrupt {
                    path: path.to_path_buf(),
                    reason: "unknown".to_string(),
                })
        }

        fn read_metadata(&self, path: &Path) -> PhotoMetadata {
            PhotoMetadata {
                date_taken: self.dates.get(path).copied(),
                ..PhotoMetadata::default()
            }
        }
    }

    fn source() -> FakeSource {
        let mut images = HashMap::new();
        images.insert(PathBuf::from("/roll/2020-06-14/a.jpg"), [10, 20, 30, 255]);
        images.insert(PathBuf::from("/roll/b.jpg"), [200, 20, 30, 255]);
        let mut dates = HashMap::new();
        dates.insert(
            PathBuf::from("/roll/b.jpg"),
            Utc.with_ymd_and_hms(2020, 6, 16, 8, 0, 0).unwrap(),
        );
        FakeSource { images, dates }
    }

    fn builder(source: &FakeSource) -> RecordBuilder<'_> {
        RecordBuilder::new(
            source,
            DateResolver::new(DatePolicy::Strict),
            FingerprintExtractor::new(16, SampleRegion::KeyRows),
        )
    }

    #[test]
    fn record_uses_path_date_and_decoded_size() {
        let source = source();
        let record = builder(&source).build_record(Path::new("/roll/2020-06-14/a.jpg"));

        assert_eq!(
            record.resolved_date,
            Some(Utc.with_ymd_and_hms(2020, 6, 14, 0, 0, 0).unwrap())
        );
        assert_eq!((record.width, record.height), (40, 20));
        assert_eq!(record.fingerprint.unwrap().dimensions(), (16, 3));
    }

    #[test]
    fn embedded_date_wins_over_path() {
        let source = source();
        let record = builder(&source).build_record(Path::new("/roll/b.jpg"));

        assert_eq!(
            record.resolved_date,
            Some(Utc.with_ymd_and_hms(2020, 6, 16, 8, 0, 0).unwrap())
        );
    }

    #[test]
    fn undecodable_image_keeps_record_without_fingerprint() {
        let source = source();
        let built = builder(&source).build(Path::new("/roll/2019-13-45_broken.jpg"));

        assert!(!built.record.is_fingerprinted());
        assert_eq!(built.record.resolved_date, None);
        assert_eq!(built.failures.len(), 2);
        assert!(matches!(built.failures[0], ItemFailure::DateAmbiguous { .. }));
        assert!(matches!(built.failures[1], ItemFailure::Decode { .. }));
    }

    #[test]
    fn candidate_batch_drops_unfingerprinted_records() {
        let source = source();
        let paths = vec![
            PathBuf::from("/roll/2020-06-14/a.jpg"),
            PathBuf::from("/roll/missing.jpg"),
            PathBuf::from("/roll/b.jpg"),
        ];

        let batch = builder(&source).build_records(&paths, RecordRole::Candidate, &null_sender());

        let kept: Vec<_> = batch.records.iter().map(|r| r.path.clone()).collect();
        assert_eq!(kept, vec![paths[0].clone(), paths[2].clone()]);
        assert_eq!(batch.failures.len(), 1);
    }

    #[test]
    fn target_batch_keeps_unfingerprinted_records() {
        let source = source();
        let paths = vec![PathBuf::from("/roll/missing.jpg")];

        let batch = builder(&source).build_records(&paths, RecordRole::Target, &null_sender());

        assert_eq!(batch.records.len(), 1);
        assert!(!batch.records[0].is_fingerprinted());
    }
}
