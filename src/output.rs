//! CLI output formatting.
//!
//! # Page-First Display
//!
//! Every page is shown by its positional index and entry path, with the
//! rewritten path after an arrow when the transcoder renamed it. Geometry and
//! sizes are indented context lines underneath.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Pages
//! 001 book/page1.png → book/page1.jpg
//! 002 book/page2.jpg
//!
//! Skipped
//!     book/ComicInfo.xml
//!     __MACOSX/book/._page1.png
//!
//! 2 pages, 2 skipped
//! ```
//!
//! ## Run progress
//!
//! ```text
//! Extracting → book_resized.zip
//! Processing 2 pages
//!     [ 50%] page1.png
//!     [100%] page2.jpg
//! Compressing 2 pages
//! ```
//!
//! ## Run summary
//!
//! ```text
//! 001 book/page1.png → book/page1.jpg
//!     2000x3000 → 800x1200
//! 002 book/page2.jpg
//!     800x600
//!
//! Wrote book_resized.zip (2 pages, 91.40 KiB)
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for
//! testability. Format functions are pure: no I/O, no side effects.

use crate::archive::SourceArchive;
use crate::classify::is_eligible_image;
use crate::pipeline::{EntryReport, PipelineOutput, plan_output_paths};
use crate::processor::{Snapshot, Stage};

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Page header line: index + source path, with the output path when it
/// differs.
///
/// ```text
/// 001 book/page1.png → book/page1.jpg
/// 002 book/page2.jpg
/// ```
fn page_line(index: usize, source: &str, output: &str) -> String {
    if source == output {
        format!("{} {}", format_index(index), source)
    } else {
        format!("{} {} → {}", format_index(index), source, output)
    }
}

/// Human-readable byte count in binary units.
fn format_bytes(bytes: usize) -> String {
    humansize::format_size(bytes as u64, humansize::BINARY)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

// ============================================================================
// Check
// ============================================================================

/// Format the dry-run listing of an archive: which entries would be
/// processed and under what name, and which are skipped.
pub fn format_check_output(archive: &SourceArchive) -> Vec<String> {
    let mut pages = Vec::new();
    let mut skipped = Vec::new();
    for path in archive.list_entries() {
        if is_eligible_image(path) {
            pages.push(path);
        } else {
            skipped.push(path);
        }
    }

    let mut lines = Vec::new();
    if !pages.is_empty() {
        lines.push("Pages".to_string());
        let outputs = plan_output_paths(&pages);
        for (i, (path, output)) in pages.iter().zip(&outputs).enumerate() {
            lines.push(page_line(i + 1, path, output));
        }
        lines.push(String::new());
    }
    if !skipped.is_empty() {
        lines.push("Skipped".to_string());
        for path in &skipped {
            lines.push(format!("{}{}", indent(1), path));
        }
        lines.push(String::new());
    }
    lines.push(format!(
        "{}, {} skipped",
        plural(pages.len(), "page"),
        skipped.len()
    ));
    lines
}

// ============================================================================
// Run progress
// ============================================================================

/// Format the lines a state change adds to the progress display.
///
/// `prev` is the last snapshot printed, if any. Only what changed between
/// the two is printed, so feeding every published snapshot in order yields
/// one line per stage transition and one per finished page.
pub fn format_progress(prev: Option<&Snapshot>, next: &Snapshot) -> Vec<String> {
    let stage_changed = prev.is_none_or(|p| p.stage != next.stage || p.generation != next.generation);
    let mut lines = Vec::new();

    if stage_changed {
        match next.stage {
            Stage::Extracting => lines.push(format!("Extracting → {}", next.file_name)),
            Stage::Processing => {
                lines.push(format!("Processing {}", plural(next.total_count, "page")))
            }
            Stage::Compressing => {
                lines.push(format!("Compressing {}", plural(next.processed_count, "page")))
            }
            Stage::Error => lines.push(format!(
                "Error: {}",
                next.error.as_deref().unwrap_or("unknown failure")
            )),
            Stage::Idle | Stage::Done => {}
        }
    }

    let prev_processed = prev
        .filter(|p| p.generation == next.generation)
        .map_or(0, |p| p.processed_count);
    if next.stage == Stage::Processing && next.processed_count > prev_processed {
        lines.push(format!(
            "{}[{:>3}%] {}",
            indent(1),
            next.progress,
            next.current_file
        ));
    }
    lines
}

// ============================================================================
// Run summary
// ============================================================================

fn entry_lines(index: usize, entry: &EntryReport) -> Vec<String> {
    let mut lines = vec![page_line(index, &entry.source_path, &entry.output_path)];
    if let Some(geometry) = &entry.geometry {
        let (sw, sh) = geometry.source;
        let (ow, oh) = geometry.output;
        if geometry.source == geometry.output {
            lines.push(format!("{}{}x{}", indent(1), sw, sh));
        } else {
            lines.push(format!("{}{}x{} → {}x{}", indent(1), sw, sh, ow, oh));
        }
    }
    lines
}

/// Format a finished run: one entry per page, then a totals line.
pub fn format_run_summary(output: &PipelineOutput) -> Vec<String> {
    let mut lines: Vec<String> = output
        .entries
        .iter()
        .enumerate()
        .flat_map(|(i, entry)| entry_lines(i + 1, entry))
        .collect();
    lines.push(String::new());
    lines.push(format!(
        "Wrote {} ({}, {})",
        output.file_name,
        plural(output.file_count, "page"),
        format_bytes(output.output_bytes)
    ));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Geometry;
    use crate::test_helpers::build_zip;

    // =========================================================================
    // Helpers
    // =========================================================================

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1234), "1234");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn page_line_renamed_and_unchanged() {
        assert_eq!(page_line(1, "a/1.png", "a/1.jpg"), "001 a/1.png → a/1.jpg");
        assert_eq!(page_line(2, "a/2.jpg", "a/2.jpg"), "002 a/2.jpg");
    }

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.50 KiB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3 MiB");
    }

    // =========================================================================
    // Check
    // =========================================================================

    #[test]
    fn check_lists_pages_and_skipped() {
        let zip = build_zip(&[
            ("book/", None),
            ("book/page1.png", Some(b"x".as_slice())),
            ("book/page2.jpg", Some(b"x".as_slice())),
            ("book/ComicInfo.xml", Some(b"x".as_slice())),
        ]);
        let archive = SourceArchive::load(&zip).unwrap();
        let lines = format_check_output(&archive);

        assert_eq!(
            lines,
            vec![
                "Pages",
                "001 book/page1.png → book/page1.jpg",
                "002 book/page2.jpg",
                "",
                "Skipped",
                "    book/ComicInfo.xml",
                "",
                "2 pages, 1 skipped",
            ]
        );
    }

    #[test]
    fn check_shows_collision_suffix() {
        let zip = build_zip(&[
            ("p1.png", Some(b"x".as_slice())),
            ("p1.jpg", Some(b"x".as_slice())),
        ]);
        let archive = SourceArchive::load(&zip).unwrap();
        let lines = format_check_output(&archive);
        assert_eq!(lines[1], "001 p1.png → p1-2.jpg");
        assert_eq!(lines[2], "002 p1.jpg");
    }

    #[test]
    fn check_without_pages() {
        let zip = build_zip(&[("notes.txt", Some(b"x".as_slice()))]);
        let archive = SourceArchive::load(&zip).unwrap();
        let lines = format_check_output(&archive);
        assert_eq!(lines.first().map(String::as_str), Some("Skipped"));
        assert_eq!(lines.last().map(String::as_str), Some("0 pages, 1 skipped"));
    }

    // =========================================================================
    // Progress
    // =========================================================================

    fn snapshot(stage: Stage, processed: usize, progress: u8, file: &str) -> Snapshot {
        Snapshot {
            generation: 1,
            stage,
            progress,
            processed_count: processed,
            total_count: 4,
            current_file: file.to_string(),
            file_name: "book_resized.zip".to_string(),
            ..Snapshot::default()
        }
    }

    #[test]
    fn progress_stage_headers() {
        let extracting = snapshot(Stage::Extracting, 0, 0, "");
        assert_eq!(
            format_progress(None, &extracting),
            vec!["Extracting → book_resized.zip"]
        );

        let processing = snapshot(Stage::Processing, 0, 0, "");
        assert_eq!(
            format_progress(Some(&extracting), &processing),
            vec!["Processing 4 pages"]
        );

        let compressing = snapshot(Stage::Compressing, 4, 100, "4.jpg");
        let last = snapshot(Stage::Processing, 4, 100, "4.jpg");
        assert_eq!(
            format_progress(Some(&last), &compressing),
            vec!["Compressing 4 pages"]
        );
    }

    #[test]
    fn progress_line_per_finished_page() {
        let started = snapshot(Stage::Processing, 0, 0, "1.jpg");
        let finished = snapshot(Stage::Processing, 1, 25, "1.jpg");
        assert_eq!(
            format_progress(Some(&started), &finished),
            vec!["    [ 25%] 1.jpg"]
        );

        let next_started = snapshot(Stage::Processing, 1, 25, "2.jpg");
        assert!(format_progress(Some(&finished), &next_started).is_empty());
    }

    #[test]
    fn progress_error_line() {
        let mut failed = snapshot(Stage::Error, 1, 25, "2.jpg");
        failed.error = Some("Could not read image 2.jpg: bad".to_string());
        let prev = snapshot(Stage::Processing, 1, 25, "2.jpg");
        assert_eq!(
            format_progress(Some(&prev), &failed),
            vec!["Error: Could not read image 2.jpg: bad"]
        );
    }

    // =========================================================================
    // Summary
    // =========================================================================

    #[test]
    fn run_summary_lines() {
        let output = PipelineOutput {
            file_name: "book_resized.zip".to_string(),
            file_count: 2,
            output_bytes: 1536,
            entries: vec![
                EntryReport {
                    source_path: "page1.png".to_string(),
                    output_path: "page1.jpg".to_string(),
                    source_bytes: 10,
                    output_bytes: 5,
                    geometry: Some(Geometry {
                        source: (2000, 3000),
                        output: (800, 1200),
                    }),
                },
                EntryReport {
                    source_path: "page2.jpg".to_string(),
                    output_path: "page2.jpg".to_string(),
                    source_bytes: 10,
                    output_bytes: 5,
                    geometry: Some(Geometry {
                        source: (800, 600),
                        output: (800, 600),
                    }),
                },
            ],
            data: Vec::new(),
        };

        assert_eq!(
            format_run_summary(&output),
            vec![
                "001 page1.png → page1.jpg",
                "    2000x3000 → 800x1200",
                "002 page2.jpg",
                "    800x600",
                "",
                "Wrote book_resized.zip (2 pages, 1.50 KiB)",
            ]
        );
    }
}
