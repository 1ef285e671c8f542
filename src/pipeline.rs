//! The archive-to-archive transform.
//!
//! [`run_pipeline`] executes one run start to finish on the calling thread:
//!
//! ```text
//! 1. Extract    bytes    →  SourceArchive      (parse container, list entries)
//! 2. Classify   entries  →  eligible pages     (name-based filter)
//! 3. Process    pages    →  ProcessedEntry[]   (transcode + path rewrite)
//! 4. Compress   entries  →  output bytes       (new container)
//! ```
//!
//! Progress is reported through a callback as [`PipelineEvent`]s. The
//! callback's return value doubles as the cancellation signal: returning
//! `false` means the run has been superseded, and the pipeline unwinds with
//! [`PipelineError::Cancelled`] at the next reporting point. The stateful
//! wrapper around this function lives in [`crate::processor`].
//!
//! ## All-or-Nothing
//!
//! Any failure aborts the whole run. Processed pages live only in this
//! function's locals, so an error drops them; there is no partial archive.
//!
//! ## Parallel Windows
//!
//! Pages are transcoded in windows of `workers` pages on the rayon pool.
//! Within a window, results are collected in listed order and reported one
//! at a time, so progress and the current file advance exactly as they would
//! sequentially. A failure in a window is reported for the first failing page
//! in listed order. With `workers == 1` the pipeline is strictly sequential.

use crate::archive::{ArchiveError, Compression, ProcessedEntry, SourceArchive, write_archive};
use crate::classify::is_eligible_image;
use crate::config::{AppConfig, ConfigError, ResizeConfig, effective_threads};
use crate::imaging::{
    BackendError, Geometry, ImageBackend, ProcessedImage, output_filename, transcode,
};
use crate::naming::{OutputPaths, entry_basename, output_archive_name, rewrite_path};
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid settings: {0}")]
    InvalidConfig(#[from] ConfigError),
    #[error("The file is not a readable archive: {0}")]
    CorruptArchive(String),
    #[error("No images found in the archive. Please ensure the ZIP contains image files.")]
    EmptyArchive,
    #[error("Could not read image {path}: {reason}")]
    Decode { path: String, reason: String },
    #[error("Could not encode image {path}: {reason}")]
    Encode { path: String, reason: String },
    #[error("Failed to write the output archive: {0}")]
    Io(String),
    #[error("Run was cancelled")]
    Cancelled,
}

impl PipelineError {
    fn from_backend(path: &str, err: BackendError) -> Self {
        match err {
            BackendError::Decode(reason) => PipelineError::Decode {
                path: path.to_string(),
                reason,
            },
            BackendError::Encode(reason) => PipelineError::Encode {
                path: path.to_string(),
                reason,
            },
        }
    }
}

/// Settings for one run, resolved from [`AppConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineOptions {
    pub resize: ResizeConfig,
    pub compression: Compression,
    /// Pages transcoded concurrently; 1 means sequential.
    pub workers: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl PipelineOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            resize: config.resize,
            compression: config.archive.compression,
            workers: effective_threads(&config.processing),
        }
    }

    /// Sequential options with the given resize settings.
    pub fn sequential(resize: ResizeConfig) -> Self {
        Self {
            resize,
            compression: Compression::default(),
            workers: 1,
        }
    }
}

/// Progress notifications, in the order a run produces them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    /// Container parsing has started. `file_name` is the derived output name.
    Extracting { file_name: String },
    /// Classification found `total` eligible pages.
    Processing { total: usize },
    /// Work on page `index` (1-based) has started; `name` is its basename.
    EntryStarted {
        index: usize,
        total: usize,
        name: String,
    },
    /// Page finished and was accepted into the output.
    EntryFinished {
        processed: usize,
        total: usize,
        progress: u8,
        source_path: String,
        output_path: String,
    },
    /// All pages processed; the output container is being written.
    Compressing { entries: usize },
}

/// Per-page record of what a run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryReport {
    pub source_path: String,
    pub output_path: String,
    pub source_bytes: usize,
    pub output_bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineOutput {
    /// Derived output filename, e.g. `book_resized.zip`.
    pub file_name: String,
    /// Number of pages written.
    pub file_count: usize,
    pub output_bytes: usize,
    pub entries: Vec<EntryReport>,
    #[serde(skip)]
    pub data: Vec<u8>,
}

/// Percentage of `processed` over `total`, rounded to the nearest integer.
pub fn calculate_progress(processed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((processed as f64 / total as f64) * 100.0).round() as u8
}

/// Paths of all eligible pages, in stored order.
pub fn eligible_entries(archive: &SourceArchive) -> Vec<&str> {
    archive
        .list_entries()
        .into_iter()
        .filter(|path| is_eligible_image(path))
        .collect()
}

/// Output path for each eligible entry, in the same order.
///
/// Entries the format policy does not rename keep their exact path. A renamed
/// entry that lands on a kept path, or on another renamed entry, is suffixed.
pub fn plan_output_paths(eligible: &[&str]) -> Vec<String> {
    let renamed: Vec<Option<String>> = eligible
        .iter()
        .map(|path| {
            let basename = entry_basename(path);
            let filename = output_filename(basename);
            (filename != basename).then(|| rewrite_path(path, &filename))
        })
        .collect();

    let kept = eligible
        .iter()
        .zip(&renamed)
        .filter(|(_, renamed)| renamed.is_none())
        .map(|(path, _)| *path);
    let mut paths = OutputPaths::reserving(kept);

    eligible
        .iter()
        .zip(renamed)
        .map(|(path, renamed)| match renamed {
            None => path.to_string(),
            Some(rewritten) => {
                let claimed = paths.claim(rewritten.clone());
                if claimed != rewritten {
                    warn!(from = %rewritten, to = %claimed, "output path collision renamed");
                }
                claimed
            }
        })
        .collect()
}

fn transcode_entry(
    backend: &impl ImageBackend,
    archive: &SourceArchive,
    path: &str,
    resize: &ResizeConfig,
) -> Result<ProcessedImage, PipelineError> {
    let data = archive
        .get(path)
        .ok_or_else(|| PipelineError::CorruptArchive(format!("missing entry {path}")))?;
    debug!(path, bytes = data.len(), "transcoding");
    transcode(backend, data, entry_basename(path), resize)
        .map_err(|e| PipelineError::from_backend(path, e))
}

/// Run the full pipeline over an in-memory archive.
///
/// `input_name` is only used to derive the output filename. `report` is
/// called for every [`PipelineEvent`]; returning `false` cancels the run.
pub fn run_pipeline(
    backend: &impl ImageBackend,
    source: &[u8],
    input_name: &str,
    options: &PipelineOptions,
    mut report: impl FnMut(PipelineEvent) -> bool,
) -> Result<PipelineOutput, PipelineError> {
    options.resize.validate()?;

    let mut emit = |event: PipelineEvent| {
        if report(event) {
            Ok(())
        } else {
            Err(PipelineError::Cancelled)
        }
    };

    // ===== Stage 1: Extract =====
    let file_name = output_archive_name(input_name);
    emit(PipelineEvent::Extracting {
        file_name: file_name.clone(),
    })?;

    let archive = SourceArchive::load(source).map_err(|e| match e {
        ArchiveError::Corrupt(msg) => PipelineError::CorruptArchive(msg),
        other => PipelineError::CorruptArchive(other.to_string()),
    })?;
    let eligible = eligible_entries(&archive);
    info!(
        records = archive.records().len(),
        eligible = eligible.len(),
        "archive extracted"
    );
    if eligible.is_empty() {
        return Err(PipelineError::EmptyArchive);
    }

    // ===== Stage 2: Process =====
    let total = eligible.len();
    emit(PipelineEvent::Processing { total })?;

    let workers = options.workers.max(1);
    let mut processed: Vec<ProcessedEntry> = Vec::with_capacity(total);
    let mut reports: Vec<EntryReport> = Vec::with_capacity(total);
    let output_paths = plan_output_paths(&eligible);

    for (window_idx, window) in eligible.chunks(workers).enumerate() {
        let first_index = window_idx * workers + 1;
        emit(PipelineEvent::EntryStarted {
            index: first_index,
            total,
            name: entry_basename(window[0]).to_string(),
        })?;

        let results: Vec<Result<ProcessedImage, PipelineError>> = if window.len() == 1 {
            vec![transcode_entry(backend, &archive, window[0], &options.resize)]
        } else {
            window
                .par_iter()
                .map(|path| transcode_entry(backend, &archive, path, &options.resize))
                .collect()
        };

        for (offset, (path, result)) in window.iter().zip(results).enumerate() {
            if offset > 0 {
                emit(PipelineEvent::EntryStarted {
                    index: first_index + offset,
                    total,
                    name: entry_basename(path).to_string(),
                })?;
            }
            let image = result?;
            let output_path = output_paths[processed.len()].clone();

            reports.push(EntryReport {
                source_path: path.to_string(),
                output_path: output_path.clone(),
                source_bytes: archive.get(path).map_or(0, <[u8]>::len),
                output_bytes: image.data.len(),
                geometry: image.geometry,
            });
            processed.push(ProcessedEntry {
                path: output_path.clone(),
                data: image.data,
            });

            emit(PipelineEvent::EntryFinished {
                processed: processed.len(),
                total,
                progress: calculate_progress(processed.len(), total),
                source_path: path.to_string(),
                output_path,
            })?;
        }
    }

    // ===== Stage 3: Compress =====
    emit(PipelineEvent::Compressing {
        entries: processed.len(),
    })?;
    let data = write_archive(&processed, options.compression)
        .map_err(|e| PipelineError::Io(e.to_string()))?;
    info!(file_name = %file_name, bytes = data.len(), pages = processed.len(), "archive written");

    Ok(PipelineOutput {
        file_name,
        file_count: processed.len(),
        output_bytes: data.len(),
        entries: reports,
        data,
    })
}
