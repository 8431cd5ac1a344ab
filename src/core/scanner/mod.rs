//! # Scanner Module
//!
//! Lists image files in target and search directories.
//!
//! By default only a directory's own files are listed, the way a
//! `dir/*.jpg` glob would. Use [`ScanConfig::recursive`] to descend.
//!
//! ## Example
//! ```rust,ignore
//! use original_finder::core::scanner::{ScanConfig, WalkDirScanner};
//!
//! let scanner = WalkDirScanner::new(ScanConfig::recursive());
//! let result = scanner.list_directory(Path::new("/Volumes/Backup/Camera Uploads"))?;
//! for error in &result.errors {
//!     eprintln!("skipped: {}", error);
//! }
//! ```

mod filter;
mod walker;

pub use filter::{ImageFilter, DEFAULT_EXTENSIONS};
pub use walker::{ScanConfig, WalkDirScanner};

use crate::error::ScanError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Image formats recognised by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Jpeg,
    Png,
    WebP,
    Gif,
    Bmp,
    Tiff,
    Unknown,
}

impl ImageFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => ImageFormat::Jpeg,
            "png" => ImageFormat::Png,
            "webp" => ImageFormat::WebP,
            "gif" => ImageFormat::Gif,
            "bmp" => ImageFormat::Bmp,
            "tiff" | "tif" => ImageFormat::Tiff,
            _ => ImageFormat::Unknown,
        }
    }

    /// Detect format from a path's extension
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(ImageFormat::Unknown)
    }
}

/// Result of listing a directory
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Image files, sorted by name within each directory
    pub images: Vec<PathBuf>,
    /// Non-fatal errors met along the way
    pub errors: Vec<ScanError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension_ignores_case() {
        assert_eq!(ImageFormat::from_extension("JPG"), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_extension("jpeg"), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_extension("Tif"), ImageFormat::Tiff);
    }

    #[test]
    fn format_from_path_without_extension() {
        assert_eq!(
            ImageFormat::from_path(Path::new("/photos/README")),
            ImageFormat::Unknown
        );
        assert_eq!(
            ImageFormat::from_path(Path::new("/photos/IMG_0001.png")),
            ImageFormat::Png
        );
    }
}
