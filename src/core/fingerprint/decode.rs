//! Image decoding with format-specific fast paths.
//!
//! JPEG goes through zune-jpeg (1.5-2x faster than the image crate) and falls
//! back to the image crate if zune-jpeg rejects the file. Everything else uses
//! the image crate directly.

use crate::core::scanner::ImageFormat;
use crate::error::DecodeError;
use image::{DynamicImage, ImageBuffer, Luma, Rgb, Rgba};
use std::fs;
use std::path::Path;
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_jpeg::JpegDecoder;

/// Decoder that picks the fastest available path per format
pub struct FastDecoder;

impl FastDecoder {
    /// Decode an image file into pixels.
    ///
    /// Images with a zero dimension are rejected as [`DecodeError::EmptyImage`].
    pub fn decode(path: &Path) -> Result<DynamicImage, DecodeError> {
        let image = match ImageFormat::from_path(path) {
            ImageFormat::Jpeg => Self::decode_jpeg(path).or_else(|_| Self::decode_fallback(path))?,
            _ => Self::decode_fallback(path)?,
        };

        if image.width() == 0 || image.height() == 0 {
            return Err(DecodeError::EmptyImage {
                path: path.to_path_buf(),
            });
        }

        Ok(image)
    }

    fn decode_jpeg(path: &Path) -> Result<DynamicImage, DecodeError> {
        let file_bytes = fs::read(path).map_err(|e| DecodeError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let options = DecoderOptions::new_fast().jpeg_set_out_colorspace(ColorSpace::RGB);
        let mut decoder = JpegDecoder::new_with_options(&file_bytes, options);

        let pixels = decoder.decode().map_err(|e| DecodeError::Corrupt {
            path: path.to_path_buf(),
            reason: format!("zune-jpeg decode failed: {:?}", e),
        })?;

        let info = decoder.info().ok_or_else(|| DecodeError::Corrupt {
            path: path.to_path_buf(),
            reason: "missing JPEG frame header".to_string(),
        })?;

        let width = info.width as u32;
        let height = info.height as u32;
        let buffer_error = || DecodeError::Corrupt {
            path: path.to_path_buf(),
            reason: "pixel buffer does not match frame size".to_string(),
        };

        match decoder.get_output_colorspace().unwrap_or(ColorSpace::RGB) {
            ColorSpace::RGB => {
                let buffer: ImageBuffer<Rgb<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(width, height, pixels).ok_or_else(buffer_error)?;
                Ok(DynamicImage::ImageRgb8(buffer))
            }
            ColorSpace::RGBA => {
                let buffer: ImageBuffer<Rgba<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(width, height, pixels).ok_or_else(buffer_error)?;
                Ok(DynamicImage::ImageRgba8(buffer))
            }
            ColorSpace::Luma => {
                let buffer: ImageBuffer<Luma<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(width, height, pixels).ok_or_else(buffer_error)?;
                Ok(DynamicImage::ImageLuma8(buffer))
            }
            _ => Self::decode_fallback(path),
        }
    }

    fn decode_fallback(path: &Path) -> Result<DynamicImage, DecodeError> {
        image::open(path).map_err(|e| match e {
            image::ImageError::IoError(source) => DecodeError::Io {
                path: path.to_path_buf(),
                source,
            },
            other => DecodeError::Corrupt {
                path: path.to_path_buf(),
                reason: other.to_string(),
            },
        })
    }
}
