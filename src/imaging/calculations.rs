//! Pure calculation functions for image dimensions, sizes and transform
//! parameters.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::{CropRect, Rotation};

/// Scale a single dimension by `factor`, flooring to an integer.
///
/// # Examples
/// ```
/// # use imgpress::imaging::calculations::scale_dimension;
/// assert_eq!(scale_dimension(1920, 0.9), 1728);
/// assert_eq!(scale_dimension(1, 0.9), 0);
/// ```
pub fn scale_dimension(value: u32, factor: f64) -> u32 {
    (value as f64 * factor).floor() as u32
}

/// Scale both dimensions by the same factor.
pub fn scale_dimensions(dims: (u32, u32), factor: f64) -> (u32, u32) {
    (scale_dimension(dims.0, factor), scale_dimension(dims.1, factor))
}

/// Byte length expressed in whole kilobytes, rounded to nearest.
pub fn size_kb(bytes: u64) -> u64 {
    (bytes + 512) / 1024
}

/// Whether `bytes` fits a budget of `target_kb` kilobytes.
pub fn within_budget(bytes: u64, target_kb: u64) -> bool {
    bytes <= target_kb.saturating_mul(1024)
}

/// Map an angle in degrees onto a clockwise quarter turn.
///
/// Negative angles rotate counter-clockwise (`-90` is the same as `270`).
/// Returns `None` for angles that are not a multiple of 90.
pub fn normalize_rotation(degrees: i64) -> Option<Rotation> {
    if degrees % 90 != 0 {
        return None;
    }
    match degrees.rem_euclid(360) {
        0 => Some(Rotation::None),
        90 => Some(Rotation::Cw90),
        180 => Some(Rotation::Cw180),
        270 => Some(Rotation::Cw270),
        _ => None,
    }
}

/// Check that a crop rectangle is non-empty and lies inside the image.
pub fn crop_within_bounds(rect: &CropRect, image: (u32, u32)) -> bool {
    let (img_w, img_h) = image;
    if rect.width == 0 || rect.height == 0 {
        return false;
    }
    let right = rect.left as u64 + rect.width as u64;
    let bottom = rect.top as u64 + rect.height as u64;
    right <= img_w as u64 && bottom <= img_h as u64
}
