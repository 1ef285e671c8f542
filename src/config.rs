//! Tool configuration.
//!
//! Handles loading and validating the optional `config.toml`. Every key has a
//! default, command-line flags override file values, and the merged result
//! is validated once before any archive is submitted.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [resize]
//! max_long_edge = 1200      # Cap on the larger of width/height, in pixels
//! quality = 0.8             # Re-encode quality factor, (0.0, 1.0]
//!
//! [archive]
//! compression = "stored"    # "stored" or "deflated"
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::archive::Compression;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default cap on the long edge, in pixels.
pub const DEFAULT_MAX_LONG_EDGE: u32 = 1200;
/// Default re-encode quality factor.
pub const DEFAULT_QUALITY: f32 = 0.8;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Per-run resize settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeConfig {
    /// Cap on the larger of width and height, in pixels. Must be positive.
    pub max_long_edge: u32,
    /// Re-encode quality factor in `(0.0, 1.0]`.
    pub quality: f32,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            max_long_edge: DEFAULT_MAX_LONG_EDGE,
            quality: DEFAULT_QUALITY,
        }
    }
}

impl ResizeConfig {
    /// Validate values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_long_edge == 0 {
            return Err(ConfigError::Validation(
                "resize.max_long_edge must be a positive number of pixels".into(),
            ));
        }
        // Written so that NaN fails too.
        if !(self.quality > 0.0 && self.quality <= 1.0) {
            return Err(ConfigError::Validation(format!(
                "resize.quality must be in (0.0, 1.0], got {}",
                self.quality
            )));
        }
        Ok(())
    }
}

/// Output container settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArchiveConfig {
    pub compression: Compression,
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective worker count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)`, and at least 1
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// Full tool configuration as loaded from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub resize: ResizeConfig,
    pub archive: ArchiveConfig,
    pub processing: ProcessingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.resize.validate()?;
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Parse a config from TOML text. Missing keys take defaults.
pub fn parse_config(text: &str) -> Result<AppConfig, ConfigError> {
    Ok(toml::from_str(text)?)
}

/// Load a config file, or stock defaults if `path` is `None`.
///
/// The result is not validated yet: command-line overrides are applied on
/// top first, then the caller validates.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match path {
        Some(path) => parse_config(&fs::read_to_string(path)?),
        None => Ok(AppConfig::default()),
    }
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# comic-shrink configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Command-line flags override them.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Resizing
# ---------------------------------------------------------------------------
[resize]
# Cap on the longer edge (width or height) of every page, in pixels.
# Pages already within the cap keep their size; nothing is upscaled.
max_long_edge = 1200

# Re-encode quality factor, greater than 0.0 and at most 1.0.
# Applied to JPEG output (including PNG pages, which are converted to JPEG).
# GIF, BMP, TIFF and WebP pages are re-encoded at encoder defaults.
quality = 0.8

# ---------------------------------------------------------------------------
# Output archive
# ---------------------------------------------------------------------------
[archive]
# "stored" writes pages as-is; "deflated" compresses them again.
# Pages are already compressed images, so "stored" is usually just as small.
compression = "stored"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum number of pages transcoded in parallel.
# Omit to use all CPU cores. Values above the core count are clamped.
# max_processes = 4
"##
}
