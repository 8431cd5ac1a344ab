//! # Metadata Module
//!
//! Reads embedded EXIF metadata from photo files.
//!
//! ## Extracted Fields
//! - Capture date (DateTimeOriginal, falling back to DateTime)
//! - Image dimensions (PixelXDimension/PixelYDimension, falling back to
//!   ImageWidth/ImageLength)
//!
//! Files without EXIF, or with malformed tags, yield empty fields rather than
//! errors. Capture dates are then resolved from the file path instead.

use chrono::{DateTime, NaiveDateTime, Utc};
use exif::{Exif, In, Reader, Tag, Value};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// EXIF date format: "YYYY:MM:DD HH:MM:SS"
const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Embedded photo metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhotoMetadata {
    /// Original capture date/time
    pub date_taken: Option<DateTime<Utc>>,
    /// Image width in pixels
    pub width: Option<u32>,
    /// Image height in pixels
    pub height: Option<u32>,
}

impl PhotoMetadata {
    /// Check if any metadata was extracted
    pub fn has_data(&self) -> bool {
        self.date_taken.is_some() || self.width.is_some() || self.height.is_some()
    }
}

/// Read EXIF metadata from a photo file
pub fn extract_metadata(path: &Path) -> PhotoMetadata {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(_) => return PhotoMetadata::default(),
    };

    let mut bufreader = BufReader::new(file);
    match Reader::new().read_from_container(&mut bufreader) {
        Ok(exif) => metadata_from_exif(&exif),
        Err(_) => PhotoMetadata::default(),
    }
}

/// Read only the embedded capture date of a photo file
pub fn read_embedded_date(path: &Path) -> Option<DateTime<Utc>> {
    extract_metadata(path).date_taken
}

fn metadata_from_exif(exif: &Exif) -> PhotoMetadata {
    let date_taken = [Tag::DateTimeOriginal, Tag::DateTime]
        .iter()
        .filter_map(|tag| exif.get_field(*tag, In::PRIMARY))
        .find_map(|field| get_string_value(&field.value).and_then(|s| parse_exif_date(&s)));

    let dimension = |primary: Tag, fallback: Tag| {
        exif.get_field(primary, In::PRIMARY)
            .and_then(|f| get_u32_value(&f.value))
            .or_else(|| {
                exif.get_field(fallback, In::PRIMARY)
                    .and_then(|f| get_u32_value(&f.value))
            })
    };

    PhotoMetadata {
        date_taken,
        width: dimension(Tag::PixelXDimension, Tag::ImageWidth),
        height: dimension(Tag::PixelYDimension, Tag::ImageLength),
    }
}

/// Parse an EXIF timestamp. Malformed values (e.g. "0000:00:00 00:00:00") give `None`.
pub fn parse_exif_date(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value.trim(), EXIF_DATE_FORMAT)
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

/// Helper to extract u32 from various EXIF value types
fn get_u32_value(value: &Value) -> Option<u32> {
    match value {
        Value::Long(vec) => vec.first().copied(),
        Value::Short(vec) => vec.first().map(|v| *v as u32),
        _ => None,
    }
}

/// Helper to extract string from EXIF ASCII value
fn get_string_value(value: &Value) -> Option<String> {
    if let Value::Ascii(ref vec) = value {
        let bytes = vec.first()?;
        let s = std::str::from_utf8(bytes).ok()?;
        let trimmed = s.trim_end_matches('\0').trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }
    None
}
