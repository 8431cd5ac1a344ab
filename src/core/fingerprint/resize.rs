//! SIMD-accelerated resizing via fast_image_resize.
//!
//! Resizes fill the destination exactly; the aspect ratio is not kept, so
//! every image lands on the same square grid.

use crate::error::DecodeError;
use fast_image_resize::{images::Image, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::RgbaImage;

/// Reusable RGBA resizer
pub struct FastResizer {
    resizer: Resizer,
}

impl FastResizer {
    pub fn new() -> Self {
        Self {
            resizer: Resizer::new(),
        }
    }

    /// Stretch an RGBA image to exactly `width` x `height`.
    pub fn resize_rgba(
        &mut self,
        image: RgbaImage,
        width: u32,
        height: u32,
    ) -> Result<RgbaImage, DecodeError> {
        let (src_width, src_height) = image.dimensions();

        if src_width == 0 || src_height == 0 {
            return Err(DecodeError::Resize {
                reason: "source image has no pixels".to_string(),
            });
        }
        if width == 0 || height == 0 {
            return Err(DecodeError::Resize {
                reason: format!("invalid destination size {}x{}", width, height),
            });
        }

        if (src_width, src_height) == (width, height) {
            return Ok(image);
        }

        let src_image = Image::from_vec_u8(src_width, src_height, image.into_raw(), PixelType::U8x4)
            .map_err(|e| DecodeError::Resize {
                reason: format!("failed to wrap source pixels: {}", e),
            })?;
        let mut dst_image = Image::new(width, height, PixelType::U8x4);

        let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear));

        self.resizer
            .resize(&src_image, &mut dst_image, &options)
            .map_err(|e| DecodeError::Resize {
                reason: e.to_string(),
            })?;

        RgbaImage::from_raw(width, height, dst_image.into_vec()).ok_or_else(|| DecodeError::Resize {
            reason: "resized buffer has the wrong length".to_string(),
        })
    }
}

impl Default for FastResizer {
    fn default() -> Self {
        Self::new()
    }
}

/// One-off resize
pub fn resize_rgba(image: RgbaImage, width: u32, height: u32) -> Result<RgbaImage, DecodeError> {
    FastResizer::new().resize_rgba(image, width, height)
}
