//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::ImageReader::into_dimensions` (header only) |
//! | Decode (JPEG, PNG, GIF, BMP, TIFF, WebP) | `image::ImageReader` with content sniffing |
//! | Resize | `image::DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` with quality |
//! | Encode → GIF, BMP, TIFF, WebP | `DynamicImage::write_to`, encoder defaults |
//!
//! The decoder ignores the entry's extension and sniffs the actual format
//! from the bytes, so a mislabelled page still decodes. The *output* family
//! is decided by the caller from the extension.
//!
//! WebP output is lossless: the `image` crate only ships a lossless WebP
//! encoder, so quality does not apply there. Animated GIFs keep only their
//! first frame.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::{OutputFormat, Quality, ResizeParams};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, Rgb, RgbImage};
use std::io::Cursor;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn reader(data: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, BackendError> {
    ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| BackendError::Decode(e.to_string()))
}

/// Composite any alpha channel onto white, producing an image the JPEG
/// encoder accepts. Grayscale stays grayscale.
fn flatten_for_jpeg(img: &DynamicImage) -> DynamicImage {
    let color = img.color();
    if !color.has_alpha() {
        return if color.has_color() {
            DynamicImage::ImageRgb8(img.to_rgb8())
        } else {
            DynamicImage::ImageLuma8(img.to_luma8())
        };
    }

    let rgba = img.to_rgba8();
    let mut flat = RgbImage::new(rgba.width(), rgba.height());
    for (src, dst) in rgba.pixels().zip(flat.pixels_mut()) {
        let alpha = src[3] as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        *dst = Rgb([blend(src[0]), blend(src[1]), blend(src[2])]);
    }
    DynamicImage::ImageRgb8(flat)
}

/// Reduce to 8-bit RGB or RGBA, the layouts every non-JPEG encoder accepts.
fn to_8bit(img: &DynamicImage, keep_alpha: bool) -> DynamicImage {
    if keep_alpha && img.color().has_alpha() {
        DynamicImage::ImageRgba8(img.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    }
}

/// Encode a decoded page in the requested family.
fn encode(img: &DynamicImage, format: OutputFormat, quality: Quality) -> Result<Vec<u8>, BackendError> {
    let mut buf = Cursor::new(Vec::new());
    let result = match format {
        OutputFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut buf, quality.value() as u8);
            flatten_for_jpeg(img).write_with_encoder(encoder)
        }
        // The GIF encoder wants RGBA regardless of source transparency.
        OutputFormat::Gif => {
            DynamicImage::ImageRgba8(img.to_rgba8()).write_to(&mut buf, format.image_format())
        }
        OutputFormat::Bmp | OutputFormat::Tiff | OutputFormat::WebP => {
            to_8bit(img, true).write_to(&mut buf, format.image_format())
        }
    };
    result.map_err(|e| BackendError::Encode(e.to_string()))?;
    Ok(buf.into_inner())
}

impl ImageBackend for RustBackend {
    fn identify(&self, data: &[u8]) -> Result<Dimensions, BackendError> {
        let (width, height) = reader(data)?
            .into_dimensions()
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(Dimensions { width, height })
    }

    fn resize(&self, data: &[u8], params: &ResizeParams) -> Result<Vec<u8>, BackendError> {
        let img = reader(data)?
            .decode()
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        let resized = if img.width() == params.width && img.height() == params.height {
            img
        } else {
            img.resize_exact(params.width, params.height, FilterType::Lanczos3)
        };

        encode(&resized, params.format, params.quality)
    }
}
