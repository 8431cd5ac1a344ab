//! # Fingerprint Module
//!
//! Reduces an image to a small, fixed-size visual signature.
//!
//! ## How It Works
//! 1. Decode the file (zune-jpeg for JPEG, image crate otherwise)
//! 2. Stretch it to a `canonical x canonical` RGBA square (no aspect ratio
//!    preservation, so crops and re-exports land on the same grid)
//! 3. Keep a fixed set of rows chosen by [`SampleRegion`]
//!
//! A few horizontal slices are enough to tell most originals apart from
//! unrelated photos, at a fraction of the comparison cost of the whole image.
//!
//! Fingerprints are only comparable when both were built with the same
//! canonical dimension and region; the comparator rejects anything else.

pub mod decode;
pub mod resize;

pub use decode::FastDecoder;
pub use resize::{resize_rgba, FastResizer};

use crate::error::DecodeError;
use image::{DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Bytes per sample (RGBA)
pub const CHANNELS: usize = 4;

/// Default side length of the canonical square
pub const DEFAULT_CANONICAL_DIMENSION: u32 = 480;

/// Which rows of the canonical image make up the fingerprint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleRegion {
    /// Only the top row
    FirstRow,
    /// Top, middle and bottom rows
    #[default]
    KeyRows,
    /// Every row
    FullImage,
}

impl SampleRegion {
    /// Row indices to sample from an image `height` rows tall, top to bottom.
    pub fn rows(&self, height: u32) -> Vec<u32> {
        if height == 0 {
            return Vec::new();
        }
        match self {
            SampleRegion::FirstRow => vec![0],
            SampleRegion::KeyRows => {
                let mut rows = vec![0, height / 2, height - 1];
                rows.dedup();
                rows
            }
            SampleRegion::FullImage => (0..height).collect(),
        }
    }
}

/// A compact RGBA signature of an image.
///
/// `samples` always holds `width * height` pixels of 4 bytes each.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint {
    width: u32,
    height: u32,
    samples: Vec<u8>,
}

impl Fingerprint {
    /// Wrap raw RGBA samples. Returns `None` if the length doesn't fit the size.
    pub fn from_rgba(width: u32, height: u32, samples: Vec<u8>) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(CHANNELS)?;
        (samples.len() == expected).then_some(Self {
            width,
            height,
            samples,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Raw RGBA bytes
    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    /// Number of pixels in the signature
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Builds fingerprints with one fixed configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FingerprintExtractor {
    canonical_dimension: u32,
    region: SampleRegion,
}

impl FingerprintExtractor {
    pub fn new(canonical_dimension: u32, region: SampleRegion) -> Self {
        Self {
            canonical_dimension,
            region,
        }
    }

    pub fn canonical_dimension(&self) -> u32 {
        self.canonical_dimension
    }

    pub fn region(&self) -> SampleRegion {
        self.region
    }

    /// Dimensions every fingerprint from this extractor will have
    pub fn fingerprint_dimensions(&self) -> (u32, u32) {
        let rows = self.region.rows(self.canonical_dimension).len() as u32;
        (self.canonical_dimension, rows)
    }

    /// Fingerprint a decoded RGBA pixel buffer of the given size.
    pub fn extract(&self, pixels: &[u8], width: u32, height: u32) -> Result<Fingerprint, DecodeError> {
        let image = RgbaImage::from_raw(width, height, pixels.to_vec()).ok_or_else(|| {
            DecodeError::Resize {
                reason: format!(
                    "{} bytes is not a {}x{} RGBA buffer",
                    pixels.len(),
                    width,
                    height
                ),
            }
        })?;
        self.extract_rgba(image)
    }

    /// Fingerprint an already decoded image
    pub fn extract_image(&self, image: &DynamicImage) -> Result<Fingerprint, DecodeError> {
        self.extract_rgba(image.to_rgba8())
    }

    /// Decode a file and fingerprint it
    pub fn extract_file(&self, path: &Path) -> Result<Fingerprint, DecodeError> {
        let image = FastDecoder::decode(path)?;
        self.extract_image(&image)
    }

    fn extract_rgba(&self, image: RgbaImage) -> Result<Fingerprint, DecodeError> {
        let side = self.canonical_dimension;
        let canonical = resize_rgba(image, side, side)?;

        let row_bytes = side as usize * CHANNELS;
        let raw = canonical.as_raw();
        let rows = self.region.rows(side);

        let mut samples = Vec::with_capacity(rows.len() * row_bytes);
        for row in &rows {
            let start = *row as usize * row_bytes;
            samples.extend_from_slice(&raw[start..start + row_bytes]);
        }

        Fingerprint::from_rgba(side, rows.len() as u32, samples).ok_or_else(|| DecodeError::Resize {
            reason: "sampled rows do not fill the fingerprint".to_string(),
        })
    }
}

impl Default for FingerprintExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_CANONICAL_DIMENSION, SampleRegion::default())
    }
}
