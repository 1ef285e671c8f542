//! Entry classification: which archive entries are pages worth processing.
//!
//! Classification is purely name-based. Nothing here looks at entry bytes;
//! an entry named `page.jpg` that actually holds a PNG is still a JPEG page
//! as far as the rest of the pipeline is concerned (the decoder sniffs the
//! real format later).
//!
//! Two filters apply, in order:
//!
//! 1. **System artifacts**: anything whose path contains a known marker
//!    (`__MACOSX` resource-fork folders, `.DS_Store` desktop metadata) is
//!    rejected, even if it carries an image extension. Matching is
//!    case-sensitive substring matching, because that is how these
//!    artifacts are actually named.
//! 2. **Extension allow-list**: the remaining path must end in one of the
//!    [`ImageKind`] extensions, compared case-insensitively.

/// Substrings that mark an entry as an OS-generated artifact.
const SYSTEM_ARTIFACT_MARKERS: &[&str] = &["__MACOSX", ".DS_Store"];

/// Image families recognized by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
    Bmp,
    WebP,
    Tiff,
    Svg,
}

const EXTENSIONS: &[(&str, ImageKind)] = &[
    ("jpg", ImageKind::Jpeg),
    ("jpeg", ImageKind::Jpeg),
    ("png", ImageKind::Png),
    ("gif", ImageKind::Gif),
    ("bmp", ImageKind::Bmp),
    ("webp", ImageKind::WebP),
    ("tiff", ImageKind::Tiff),
    ("tif", ImageKind::Tiff),
    ("svg", ImageKind::Svg),
];

impl ImageKind {
    /// Look up the image family for a bare extension (no dot), ignoring case.
    pub fn from_extension(ext: &str) -> Option<Self> {
        EXTENSIONS
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(ext))
            .map(|(_, kind)| *kind)
    }

    /// Image family of an entry path or bare filename.
    ///
    /// Unlike `Path::extension`, a dotfile such as `.png` counts as having
    /// the extension `png`.
    pub fn from_path(path: &str) -> Option<Self> {
        match path.rsplit_once('.') {
            Some((_, ext)) if !ext.contains('/') => Self::from_extension(ext),
            _ => None,
        }
    }

    /// Whether the family is raster (has pixels we can resize).
    pub fn is_raster(self) -> bool {
        !matches!(self, ImageKind::Svg)
    }
}

/// True if the path contains a known OS artifact marker.
pub fn is_system_artifact(path: &str) -> bool {
    SYSTEM_ARTIFACT_MARKERS
        .iter()
        .any(|marker| path.contains(marker))
}

/// Decide whether an entry path is an image the pipeline should process.
pub fn is_eligible_image(path: &str) -> bool {
    !is_system_artifact(path) && ImageKind::from_path(path).is_some()
}
