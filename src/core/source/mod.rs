//! # Source Module
//!
//! The narrow capability interface through which the core reaches images.
//!
//! Everything the matcher needs from the outside world is listing, decoding
//! and reading embedded metadata. [`FsImageSource`] does this against the
//! local filesystem; tests and other front ends can supply their own.

use crate::core::fingerprint::FastDecoder;
use crate::core::metadata::{extract_metadata, PhotoMetadata};
use crate::core::scanner::{ScanConfig, ScanResult, WalkDirScanner};
use crate::error::{DecodeError, ScanError};
use chrono::{DateTime, Utc};
use image::DynamicImage;
use std::path::Path;

/// Access to image files
pub trait ImageSource: Send + Sync {
    /// List image files in a directory.
    ///
    /// A missing directory is an error. Entries that could not be read come
    /// back in [`ScanResult::errors`] next to the images that could.
    fn list_images(&self, directory: &Path) -> Result<ScanResult, ScanError>;

    /// Decode an image into pixels
    fn decode(&self, path: &Path) -> Result<DynamicImage, DecodeError>;

    /// Read embedded metadata. Missing or unreadable metadata is empty, not an error.
    fn read_metadata(&self, path: &Path) -> PhotoMetadata;

    /// Read the embedded capture date
    fn read_embedded_date(&self, path: &Path) -> Option<DateTime<Utc>> {
        self.read_metadata(path).date_taken
    }
}

/// Filesystem-backed image source
pub struct FsImageSource {
    scanner: WalkDirScanner,
}

impl FsImageSource {
    pub fn new(scan_config: ScanConfig) -> Self {
        Self {
            scanner: WalkDirScanner::new(scan_config),
        }
    }
}

impl Default for FsImageSource {
    fn default() -> Self {
        Self::new(ScanConfig::default())
    }
}

impl ImageSource for FsImageSource {
    fn list_images(&self, directory: &Path) -> Result<ScanResult, ScanError> {
        self.scanner.list_directory(directory)
    }

    fn decode(&self, path: &Path) -> Result<DynamicImage, DecodeError> {
        FastDecoder::decode(path)
    }

    fn read_metadata(&self, path: &Path) -> PhotoMetadata {
        extract_metadata(path)
    }
}
