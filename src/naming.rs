//! Archive path and filename handling.
//!
//! Archive entry paths are always forward-slash separated strings, never
//! platform paths, so everything here works on `&str` directly.
//!
//! ## Path Rewriting
//!
//! When the transcoder changes a page's extension (`.png` → `.jpg`) the entry
//! keeps its directory prefix and only the basename is replaced:
//!
//! - `vol1/ch02/010.png` + `010.jpg` → `vol1/ch02/010.jpg`
//! - `cover.png` + `cover.jpg` → `cover.jpg`
//!
//! ## Output Archive Name
//!
//! The produced container is named after the input with a trailing `.zip` or
//! `.cbz` (any case) removed and `_resized.zip` appended:
//!
//! - `book.cbz` → `book_resized.zip`
//! - `Vol.01.ZIP` → `Vol.01_resized.zip`
//! - `notes.rar` → `notes.rar_resized.zip`

use std::collections::HashSet;

/// Suffix appended to the input archive's stem.
pub const OUTPUT_SUFFIX: &str = "_resized.zip";

/// Split an entry path into directory prefix (including the trailing `/`)
/// and basename. The prefix is empty for root-level entries.
pub fn split_entry_path(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(pos) => path.split_at(pos + 1),
        None => ("", path),
    }
}

/// Basename of an entry path: `"vol1/001.jpg"` → `"001.jpg"`.
pub fn entry_basename(path: &str) -> &str {
    split_entry_path(path).1
}

/// Replace the basename of `original_path` with `new_filename`, keeping the
/// directory prefix exactly as it was.
pub fn rewrite_path(original_path: &str, new_filename: &str) -> String {
    let (prefix, _) = split_entry_path(original_path);
    format!("{prefix}{new_filename}")
}

/// Derive the output archive filename from the input archive filename.
pub fn output_archive_name(input_name: &str) -> String {
    let lower = input_name.to_ascii_lowercase();
    let stem = if lower.ends_with(".zip") || lower.ends_with(".cbz") {
        &input_name[..input_name.len() - 4]
    } else {
        input_name
    };
    format!("{stem}{OUTPUT_SUFFIX}")
}

/// Tracks output paths already handed out within one run and renames
/// collisions.
///
/// Only entries whose name the transcoder changed can collide: `p1.png`
/// becomes `p1.jpg`, which may already exist as a real entry. Entries that
/// keep their name are reserved up front and never move. A rewritten path
/// that hits a reserved or earlier claimed path gets `-2`, `-3`, ...
/// inserted before the extension. Comparison is exact, so `A.jpg` and
/// `a.jpg` are distinct paths, as they are in the container.
#[derive(Debug, Default)]
pub struct OutputPaths {
    taken: HashSet<String>,
}

impl OutputPaths {
    /// Start with `paths` already taken.
    pub fn reserving<'a>(paths: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            taken: paths.into_iter().map(str::to_string).collect(),
        }
    }

    /// Claim a rewritten `path`, returning it unchanged or a suffixed
    /// variant if it is already taken.
    pub fn claim(&mut self, path: String) -> String {
        if self.taken.insert(path.clone()) {
            return path;
        }
        let (prefix, filename) = split_entry_path(&path);
        let (stem, ext) = match filename.rfind('.') {
            Some(pos) if pos > 0 => (&filename[..pos], &filename[pos..]),
            _ => (filename, ""),
        };
        let mut n = 2;
        loop {
            let candidate = format!("{prefix}{stem}-{n}{ext}");
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Splitting and rewriting
    // =========================================================================

    #[test]
    fn split_nested_path() {
        assert_eq!(split_entry_path("vol1/ch02/010.png"), ("vol1/ch02/", "010.png"));
    }

    #[test]
    fn split_root_level_path() {
        assert_eq!(split_entry_path("cover.png"), ("", "cover.png"));
    }

    #[test]
    fn split_leading_slash() {
        assert_eq!(split_entry_path("/folder/image.jpg"), ("/folder/", "image.jpg"));
    }

    #[test]
    fn rewrite_keeps_directory_prefix() {
        assert_eq!(rewrite_path("vol1/ch02/010.png", "010.jpg"), "vol1/ch02/010.jpg");
    }

    #[test]
    fn rewrite_root_level_entry() {
        assert_eq!(rewrite_path("cover.png", "cover.jpg"), "cover.jpg");
    }

    #[test]
    fn rewrite_with_unchanged_name_is_identity() {
        let path = "chapter 1/page 03.jpeg";
        assert_eq!(rewrite_path(path, entry_basename(path)), path);
    }

    // =========================================================================
    // Output archive name
    // =========================================================================

    #[test]
    fn output_name_strips_cbz() {
        assert_eq!(output_archive_name("book.cbz"), "book_resized.zip");
    }

    #[test]
    fn output_name_strips_zip_any_case() {
        assert_eq!(output_archive_name("manga.zip"), "manga_resized.zip");
        assert_eq!(output_archive_name("Vol.01.ZIP"), "Vol.01_resized.zip");
        assert_eq!(output_archive_name("Vol.02.CbZ"), "Vol.02_resized.zip");
    }

    #[test]
    fn output_name_keeps_other_extensions() {
        assert_eq!(output_archive_name("notes.rar"), "notes.rar_resized.zip");
        assert_eq!(output_archive_name("book"), "book_resized.zip");
    }

    #[test]
    fn output_name_only_strips_trailing_extension() {
        assert_eq!(output_archive_name("book.cbz.bak"), "book.cbz.bak_resized.zip");
    }

    // =========================================================================
    // Collision handling
    // =========================================================================

    #[test]
    fn claim_unique_paths_unchanged() {
        let mut paths = OutputPaths::default();
        assert_eq!(paths.claim("a/001.jpg".into()), "a/001.jpg");
        assert_eq!(paths.claim("b/001.jpg".into()), "b/001.jpg");
    }

    #[test]
    fn claim_collision_gets_suffix() {
        let mut paths = OutputPaths::default();
        assert_eq!(paths.claim("ch1/001.jpg".into()), "ch1/001.jpg");
        assert_eq!(paths.claim("ch1/001.jpg".into()), "ch1/001-2.jpg");
        assert_eq!(paths.claim("ch1/001.jpg".into()), "ch1/001-3.jpg");
    }

    #[test]
    fn claim_against_reserved_path() {
        let mut paths = OutputPaths::reserving(["p1.jpg"]);
        assert_eq!(paths.claim("p1.jpg".into()), "p1-2.jpg");
    }

    #[test]
    fn claim_is_case_sensitive() {
        let mut paths = OutputPaths::reserving(["001.jpg"]);
        assert_eq!(paths.claim("001.JPG".into()), "001.JPG");
    }

    #[test]
    fn claim_suffix_skips_reserved_names() {
        let mut paths = OutputPaths::reserving(["001.jpg", "001-2.jpg"]);
        assert_eq!(paths.claim("001.jpg".into()), "001-3.jpg");
    }
}
