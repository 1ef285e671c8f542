//! # Comic Shrink
//!
//! Shrinks comic and photo archives. Takes a `.zip` / `.cbz`, downscales every
//! page so its longer edge fits a cap, re-encodes it, and writes a new
//! `<name>_resized.zip` with the same directory layout.
//!
//! # Architecture: Three-Stage Pipeline
//!
//! Every run goes through the same stages, all in memory:
//!
//! ```text
//! 1. Extract    book.cbz  →  entries            (parse container, classify pages)
//! 2. Process    entries   →  processed pages    (resize, re-encode, rewrite paths)
//! 3. Compress   pages     →  book_resized.zip   (new container, listed order)
//! ```
//!
//! [`pipeline::run_pipeline`] runs the stages on the calling thread and
//! reports progress through a callback. [`processor::Processor`] wraps it in
//! an observable state machine with cancellation, which is what the binary
//! drives.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`archive`] | Reads the source container and writes the output container (`zip` crate) |
//! | [`classify`] | Decides which entries are pages by extension; skips OS metadata |
//! | [`imaging`] | Pure-Rust page transcoding: geometry, format policy, `image` backend |
//! | [`naming`] | Entry path rewriting, output archive name, collision renaming |
//! | [`pipeline`] | The extract → process → compress run with progress events |
//! | [`processor`] | Run state machine: submit, reset, snapshots, subscribers |
//! | [`config`] | `config.toml` loading, defaults, and validation |
//! | [`output`] | CLI output formatting for check, progress, and summaries |
//!
//! # Design Decisions
//!
//! ## All-or-Nothing
//!
//! A single unreadable page fails the whole run and no archive is produced.
//! A half-converted book is worse than an error message: readers would not
//! notice the missing pages until they hit them.
//!
//! ## PNG Becomes JPEG
//!
//! Scanned pages are photographic; PNG is almost always the wrong container
//! for them. PNG pages are re-encoded as JPEG (transparency flattened onto
//! white) and renamed `.jpg`. Every other format keeps its family and name.
//!
//! ## Pure-Rust Imaging
//!
//! The [`imaging`] module uses the `image` crate for decoding, Lanczos3
//! resampling, and encoding. No system libraries, so the binary is fully
//! self-contained.

pub mod archive;
pub mod classify;
pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod processor;

#[cfg(test)]
pub(crate) mod test_helpers;
