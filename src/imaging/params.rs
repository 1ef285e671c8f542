//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which applies the format policy and sizing rules) and the
//! [`backend`](super::backend) (which does the actual pixel work). Keeping
//! them separate lets pipeline tests run against a mock backend.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100). Clamped on construction.
//! - [`OutputFormat`]: Encoding family of a re-encoded page.
//! - [`ResizeParams`]: Target dimensions, output format, and quality for one page.

use crate::classify::ImageKind;
use image::ImageFormat;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    /// Convert a `(0.0, 1.0]` quality factor to the 1-100 encoder scale.
    pub fn from_fraction(fraction: f32) -> Self {
        Self::new((fraction * 100.0).round().max(0.0) as u32)
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

/// Encoding family for a re-encoded raster page.
///
/// There is no PNG variant: PNG pages are always re-encoded as JPEG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Gif,
    Bmp,
    WebP,
    Tiff,
}

impl OutputFormat {
    /// Output family for a raster source kind, or `None` for vector input.
    pub fn for_source(kind: ImageKind) -> Option<Self> {
        match kind {
            ImageKind::Jpeg | ImageKind::Png => Some(OutputFormat::Jpeg),
            ImageKind::Gif => Some(OutputFormat::Gif),
            ImageKind::Bmp => Some(OutputFormat::Bmp),
            ImageKind::WebP => Some(OutputFormat::WebP),
            ImageKind::Tiff => Some(OutputFormat::Tiff),
            ImageKind::Svg => None,
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            OutputFormat::Jpeg => ImageFormat::Jpeg,
            OutputFormat::Gif => ImageFormat::Gif,
            OutputFormat::Bmp => ImageFormat::Bmp,
            OutputFormat::WebP => ImageFormat::WebP,
            OutputFormat::Tiff => ImageFormat::Tiff,
        }
    }

    /// Whether the encoder takes a quality parameter. The others are
    /// re-encoded at their default settings.
    pub fn supports_quality(self) -> bool {
        matches!(self, OutputFormat::Jpeg)
    }
}

/// Parameters for a resize + re-encode of one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeParams {
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    pub quality: Quality,
}
