//! Shared test utilities for the comic-shrink test suite.
//!
//! Builds in-memory archives and synthetic images so tests never depend on
//! fixture files.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let page = encode_test_image(&gradient_rgb(200, 300), ImageFormat::Png);
//! let zip = build_zip(&[
//!     ("book/", None),
//!     ("book/001.png", Some(&page)),
//! ]);
//! ```

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::{Cursor, Write};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

// =========================================================================
// Archives
// =========================================================================

/// Build a zip in memory. `None` data adds a directory record.
pub fn build_zip(entries: &[(&str, Option<&[u8]>)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (path, data) in entries {
        match data {
            Some(bytes) => {
                writer.start_file(*path, options).unwrap();
                writer.write_all(bytes).unwrap();
            }
            None => {
                writer.add_directory(*path, options).unwrap();
            }
        }
    }
    writer.finish().unwrap().into_inner()
}

// =========================================================================
// Images
// =========================================================================

/// Opaque RGB image with a smooth gradient, so encoders have real detail.
pub fn gradient_rgb(width: u32, height: u32) -> DynamicImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            ((x + y) % 256) as u8,
        ])
    });
    DynamicImage::ImageRgb8(img)
}

/// RGBA image whose left half is fully transparent.
pub fn transparent_rgba(width: u32, height: u32) -> DynamicImage {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        let alpha = if x < width / 2 { 0 } else { 255 };
        Rgba([(x % 256) as u8, (y % 256) as u8, 128, alpha])
    });
    DynamicImage::ImageRgba8(img)
}

/// Encode a test image in `format`.
pub fn encode_test_image(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    match format {
        ImageFormat::Gif => DynamicImage::ImageRgba8(img.to_rgba8())
            .write_to(&mut buf, format)
            .unwrap(),
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8())
            .write_to(&mut buf, format)
            .unwrap(),
        _ => img.write_to(&mut buf, format).unwrap(),
    }
    buf.into_inner()
}
