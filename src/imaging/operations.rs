//! High-level image operations.
//!
//! [`transcode`] is the per-page entry point the pipeline calls. It applies
//! the format policy, computes target dimensions, and drives the backend:
//!
//! | Source extension | Output | Filename |
//! |---|---|---|
//! | `.png` (any case) | JPEG at `quality`, transparency flattened | extension replaced with `.jpg` |
//! | `.jpg` / `.jpeg` | JPEG at `quality` | unchanged |
//! | `.gif`, `.bmp`, `.tif(f)`, `.webp` | same family, encoder defaults | unchanged |
//! | `.svg` | bytes copied through after validation | unchanged |

use super::backend::{BackendError, ImageBackend};
use super::calculations::fit_long_edge;
use super::params::{OutputFormat, Quality, ResizeParams};
use crate::classify::ImageKind;
use crate::config::ResizeConfig;
use serde::Serialize;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// One transcoded page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedImage {
    pub data: Vec<u8>,
    /// Output basename; differs from the input only for PNG sources.
    pub filename: String,
    /// Raster geometry, absent for vector pages.
    pub geometry: Option<Geometry>,
}

/// Source and output pixel dimensions of a raster page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Geometry {
    pub source: (u32, u32),
    pub output: (u32, u32),
}

/// Output basename for a source basename under the format policy.
///
/// Only PNG sources are renamed: the trailing `.png` (any case) becomes
/// `.jpg`. Every other name is returned unchanged.
pub fn output_filename(filename: &str) -> String {
    let lower = filename.to_ascii_lowercase();
    if lower.ends_with(".png") {
        format!("{}.jpg", &filename[..filename.len() - 4])
    } else {
        filename.to_string()
    }
}

/// Plan the backend call for a raster page without executing it.
pub fn plan_resize(
    kind: ImageKind,
    source: (u32, u32),
    config: &ResizeConfig,
) -> Option<ResizeParams> {
    let format = OutputFormat::for_source(kind)?;
    let (width, height) = fit_long_edge(source, config.max_long_edge);
    let quality = if format.supports_quality() {
        Quality::from_fraction(config.quality)
    } else {
        Quality::default()
    };
    Some(ResizeParams {
        width,
        height,
        format,
        quality,
    })
}

/// Decode, resize, and re-encode one page.
///
/// `filename` is the entry's basename; its extension selects the output
/// family. Fails with [`BackendError::Decode`] if the bytes are not a
/// readable image and [`BackendError::Encode`] if re-encoding fails.
///
/// SVG pages are the exception to the size cap: after a check for an
/// `<svg` element their bytes are returned unchanged, whatever their
/// declared size, and the result carries no geometry.
pub fn transcode(
    backend: &impl ImageBackend,
    data: &[u8],
    filename: &str,
    config: &ResizeConfig,
) -> Result<ProcessedImage> {
    let kind = ImageKind::from_path(filename)
        .ok_or_else(|| BackendError::Decode(format!("unsupported image type: {filename}")))?;

    if !kind.is_raster() {
        validate_svg(data)?;
        return Ok(ProcessedImage {
            data: data.to_vec(),
            filename: filename.to_string(),
            geometry: None,
        });
    }

    let dims = backend.identify(data)?;
    let source = (dims.width, dims.height);
    let params = plan_resize(kind, source, config)
        .ok_or_else(|| BackendError::Decode(format!("no raster encoder for {filename}")))?;
    let encoded = backend.resize(data, &params)?;
    if encoded.is_empty() {
        return Err(BackendError::Encode(format!("{filename}: encoder produced no data")));
    }

    Ok(ProcessedImage {
        data: encoded,
        filename: output_filename(filename),
        geometry: Some(Geometry {
            source,
            output: (params.width, params.height),
        }),
    })
}

/// Vector pages have no pixels to resize; just make sure they look like SVG.
fn validate_svg(data: &[u8]) -> Result<()> {
    let text = std::str::from_utf8(data)
        .map_err(|_| BackendError::Decode("SVG is not valid UTF-8".to_string()))?;
    if text.contains("<svg") {
        Ok(())
    } else {
        Err(BackendError::Decode("no <svg> element found".to_string()))
    }
}
