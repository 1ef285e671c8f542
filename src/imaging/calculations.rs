//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Scale factor that brings the long edge down to `max_long_edge`.
///
/// Never greater than 1.0: images already within bounds are not upscaled.
fn long_edge_scale(source: (u32, u32), max_long_edge: u32) -> f64 {
    let long_edge = source.0.max(source.1);
    if long_edge == 0 {
        return 1.0;
    }
    (max_long_edge as f64 / long_edge as f64).min(1.0)
}

/// Calculate output dimensions under a long-edge cap.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `max_long_edge` - Cap on the larger of width and height
///
/// # Returns
/// * `(width, height)` - `round(w * s)` × `round(h * s)`, at least 1×1
///
/// # Examples
/// ```
/// # use comic_shrink::imaging::fit_long_edge;
/// // 2000x3000 portrait capped at 1200 → 800x1200
/// assert_eq!(fit_long_edge((2000, 3000), 1200), (800, 1200));
///
/// // Already small enough: unchanged
/// assert_eq!(fit_long_edge((800, 600), 1200), (800, 600));
/// ```
pub fn fit_long_edge(source: (u32, u32), max_long_edge: u32) -> (u32, u32) {
    let scale = long_edge_scale(source, max_long_edge);
    if scale >= 1.0 {
        return source;
    }
    let (w, h) = source;
    let out_w = ((w as f64 * scale).round() as u32).max(1);
    let out_h = ((h as f64 * scale).round() as u32).max(1);
    (out_w, out_h)
}
