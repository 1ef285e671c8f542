//! Container reading and writing.
//!
//! Both directions work entirely in memory: the whole input archive is
//! decompressed up front into a [`SourceArchive`], and the output is built
//! into a `Vec<u8>`. Archives larger than available memory are out of scope.
//!
//! Reading is eager on purpose: a truncated or otherwise damaged entry
//! surfaces as [`ArchiveError::Corrupt`] at load time, before any image work
//! starts, rather than halfway through a run.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use thiserror::Error;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("not a readable archive: {0}")]
    Corrupt(String),
    #[error("failed to write entry '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: ZipError,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Compression applied to entries of the output archive.
///
/// Pages are already compressed images, so deflating them again rarely wins
/// more than a few bytes; `Stored` is the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    Stored,
    Deflated,
}

impl Compression {
    fn method(self) -> CompressionMethod {
        match self {
            Compression::Stored => CompressionMethod::Stored,
            Compression::Deflated => CompressionMethod::Deflated,
        }
    }
}

/// One record of the input container.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub path: String,
    pub is_dir: bool,
    pub data: Vec<u8>,
}

/// An input archive decoded into memory, entries in central-directory order.
#[derive(Debug)]
pub struct SourceArchive {
    entries: Vec<ArchiveEntry>,
    by_path: HashMap<String, usize>,
}

impl SourceArchive {
    /// Parse a container from raw bytes.
    ///
    /// Every entry is decompressed immediately. Duplicate record names keep
    /// the first occurrence.
    pub fn load(bytes: &[u8]) -> Result<Self, ArchiveError> {
        let mut zip =
            ZipArchive::new(Cursor::new(bytes)).map_err(|e| ArchiveError::Corrupt(e.to_string()))?;

        let mut entries = Vec::with_capacity(zip.len());
        let mut by_path = HashMap::with_capacity(zip.len());

        for i in 0..zip.len() {
            let mut file = zip
                .by_index(i)
                .map_err(|e| ArchiveError::Corrupt(format!("entry #{i}: {e}")))?;
            let path = file.name().to_string();
            let is_dir = file.is_dir();

            let mut data = Vec::new();
            if !is_dir {
                file.read_to_end(&mut data)
                    .map_err(|e| ArchiveError::Corrupt(format!("{path}: {e}")))?;
            }

            if by_path.contains_key(&path) {
                tracing::warn!(path = %path, "duplicate archive record ignored");
                continue;
            }
            by_path.insert(path.clone(), entries.len());
            entries.push(ArchiveEntry { path, is_dir, data });
        }

        tracing::debug!(records = entries.len(), "archive loaded");
        Ok(Self { entries, by_path })
    }

    /// Paths of all non-directory entries, in stored order.
    pub fn list_entries(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| !e.is_dir)
            .map(|e| e.path.as_str())
            .collect()
    }

    /// Raw bytes of a non-directory entry.
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.by_path
            .get(path)
            .map(|&i| &self.entries[i])
            .filter(|e| !e.is_dir)
            .map(|e| e.data.as_slice())
    }

    /// All records, directories included.
    pub fn records(&self) -> &[ArchiveEntry] {
        &self.entries
    }
}

/// A page ready to be written into the output archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedEntry {
    pub path: String,
    pub data: Vec<u8>,
}

/// Serialize entries into a new container, one record per entry, in order.
///
/// No deduplication happens here. The underlying writer refuses a repeated
/// record name, so duplicate paths surface as [`ArchiveError::Write`]; the
/// pipeline makes paths unique before calling this.
pub fn write_archive(
    entries: &[ProcessedEntry],
    compression: Compression,
) -> Result<Vec<u8>, ArchiveError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(compression.method());

    for entry in entries {
        writer
            .start_file(entry.path.as_str(), options)
            .map_err(|source| ArchiveError::Write {
                path: entry.path.clone(),
                source,
            })?;
        writer.write_all(&entry.data)?;
    }

    let cursor = writer.finish().map_err(|source| ArchiveError::Write {
        path: String::from("<central directory>"),
        source,
    })?;
    Ok(cursor.into_inner())
}
