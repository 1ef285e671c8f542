//! Image processing in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **Resize** | Lanczos3 via `resize_exact` |
//! | **Encode** | JPEG with quality; GIF/BMP/TIFF/WebP at encoder defaults |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: Format policy and the per-page [`transcode`] entry point

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::fit_long_edge;
pub use operations::{Geometry, ProcessedImage, output_filename, transcode};
pub use params::{OutputFormat, Quality, ResizeParams};
pub use rust_backend::RustBackend;
