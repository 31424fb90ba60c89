//! High-level image operations.
//!
//! These functions validate caller-supplied parameters, build the params
//! structs, and call the backend. Each is a single decode → transform →
//! encode → write pass; the iterative compressor lives in [`crate::compress`].

use super::backend::{BackendError, ImageBackend};
use super::calculations::{crop_within_bounds, normalize_rotation};
use super::params::{CropParams, CropRect, EncodeParams, Quality, ResizeParams, RotateParams};
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<(u32, u32)> {
    let bytes = std::fs::read(path)?;
    let dims = backend.identify(&bytes)?;
    Ok((dims.width, dims.height))
}

fn positive(name: &str, value: i64) -> Result<u32> {
    if value <= 0 || value > u32::MAX as i64 {
        return Err(BackendError::InvalidParameters(format!(
            "{} must be a positive integer, got {}",
            name, value
        )));
    }
    Ok(value as u32)
}

fn non_negative(name: &str, value: i64) -> Result<u32> {
    if value < 0 || value > u32::MAX as i64 {
        return Err(BackendError::InvalidParameters(format!(
            "{} must be a non-negative integer, got {}",
            name, value
        )));
    }
    Ok(value as u32)
}

/// Resize `source` to exactly `width` × `height` and write it to `output`.
///
/// The codec allocates the whole output buffer up front, so outputs larger
/// than `max_pixels` are rejected before the backend is called.
pub fn resize_image(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    width: i64,
    height: i64,
    max_pixels: u64,
) -> Result<()> {
    let width = positive("width", width)?;
    let height = positive("height", height)?;
    let pixels = width as u64 * height as u64;
    if pixels > max_pixels {
        return Err(BackendError::InvalidParameters(format!(
            "output {}x{} is {} pixels, limit is {}",
            width, height, pixels, max_pixels
        )));
    }

    let params = ResizeParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        width,
        height,
        quality: Quality::default(),
    };
    backend.resize(&params)
}

/// Rotate `source` by `degrees` (a multiple of 90) and write it to `output`.
pub fn rotate_image(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    degrees: i64,
) -> Result<()> {
    let rotation = normalize_rotation(degrees).ok_or_else(|| {
        BackendError::InvalidParameters(format!(
            "angle must be a multiple of 90 degrees, got {}",
            degrees
        ))
    })?;
    backend.rotate(&RotateParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        rotation,
        quality: Quality::default(),
    })
}

/// Crop `source` to the given rectangle and write it to `output`.
///
/// The rectangle must lie entirely inside the image.
pub fn crop_image(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    left: i64,
    top: i64,
    width: i64,
    height: i64,
) -> Result<()> {
    let rect = CropRect {
        left: non_negative("left", left)?,
        top: non_negative("top", top)?,
        width: positive("width", width)?,
        height: positive("height", height)?,
    };

    let dims = get_dimensions(backend, source)?;
    if !crop_within_bounds(&rect, dims) {
        return Err(BackendError::InvalidParameters(format!(
            "crop {}x{}+{}+{} exceeds image bounds {}x{}",
            rect.width, rect.height, rect.left, rect.top, dims.0, dims.1
        )));
    }

    backend.crop(&CropParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        rect,
        quality: Quality::default(),
    })
}

/// Outcome of a single-pass quality compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityCompression {
    pub quality: Quality,
    pub width: u32,
    pub height: u32,
    pub bytes: u64,
}

/// Re-encode `source` once at `quality` (clamped to 1–100) at its natural
/// dimensions and write the result to `output`.
pub fn compress_with_quality(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    quality: i64,
) -> Result<QualityCompression> {
    let quality = Quality::from_request(quality);
    let bytes = std::fs::read(source)?;
    let dims = backend.identify(&bytes)?;
    let encoded = backend.encode(
        &bytes,
        &EncodeParams {
            width: dims.width,
            height: dims.height,
            quality,
        },
    )?;
    std::fs::write(output, &encoded)?;
    Ok(QualityCompression {
        quality,
        width: dims.width,
        height: dims.height,
        bytes: encoded.len() as u64,
    })
}
