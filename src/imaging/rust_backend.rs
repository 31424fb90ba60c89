//! Pure Rust image codec backend built on the `image` crate.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `ImageReader::with_guessed_format` + `into_dimensions` (header only) |
//! | Decode (JPEG, PNG, TIFF, WebP, GIF, BMP) | `image` crate decoders, format sniffed from content |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode → JPEG | `JpegEncoder::new_with_quality` |
//! | Encode → other formats | `DynamicImage::write_to` (quality ignored) |
//! | Rotate | `rotate90` / `rotate180` / `rotate270` |
//! | Crop | `DynamicImage::crop_imm` |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::{CropParams, EncodeParams, ResizeParams, RotateParams, Rotation};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::Path;

/// Pure Rust backend using the `image` crate.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk, sniffing the format from its content.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .with_guessed_format()
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

fn guess_format(bytes: &[u8]) -> Result<ImageFormat, BackendError> {
    image::guess_format(bytes)
        .map_err(|e| BackendError::ProcessingFailed(format!("Unrecognized image data: {}", e)))
}

/// Encode into `format`. Quality only applies to JPEG.
fn encode_image(
    img: &DynamicImage,
    format: ImageFormat,
    quality: u32,
) -> Result<Vec<u8>, BackendError> {
    let mut buf = Vec::new();
    match format {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality as u8);
            rgb.write_with_encoder(encoder)
                .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {}", e)))?;
        }
        other => {
            img.write_to(&mut Cursor::new(&mut buf), other).map_err(|e| {
                BackendError::ProcessingFailed(format!("{:?} encode failed: {}", other, e))
            })?;
        }
    }
    Ok(buf)
}

/// Save a DynamicImage to the given path, inferring format from extension.
fn save_image(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let format = ImageFormat::from_path(path).map_err(|e| {
        BackendError::ProcessingFailed(format!(
            "Unsupported output format for {}: {}",
            path.display(),
            e
        ))
    })?;
    let bytes = encode_image(img, format, quality)?;
    std::fs::write(path, bytes).map_err(BackendError::Io)
}

impl ImageBackend for RustBackend {
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, BackendError> {
        let (width, height) = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(BackendError::Io)?
            .into_dimensions()
            .map_err(|e| {
                BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
            })?;
        Ok(Dimensions { width, height })
    }

    fn encode(&self, bytes: &[u8], params: &EncodeParams) -> Result<Vec<u8>, BackendError> {
        let format = guess_format(bytes)?;
        let img = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| BackendError::ProcessingFailed(format!("Failed to decode: {}", e)))?;

        let img = if img.width() == params.width && img.height() == params.height {
            img
        } else {
            img.resize_exact(params.width, params.height, FilterType::Lanczos3)
        };

        encode_image(&img, format, params.quality.value())
    }

    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        let resized = img.resize_exact(params.width, params.height, FilterType::Lanczos3);
        save_image(&resized, &params.output, params.quality.value())
    }

    fn rotate(&self, params: &RotateParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        let rotated = match params.rotation {
            Rotation::None => img,
            Rotation::Cw90 => img.rotate90(),
            Rotation::Cw180 => img.rotate180(),
            Rotation::Cw270 => img.rotate270(),
        };
        save_image(&rotated, &params.output, params.quality.value())
    }

    fn crop(&self, params: &CropParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        let r = params.rect;
        let cropped = img.crop_imm(r.left, r.top, r.width, r.height);
        save_image(&cropped, &params.output, params.quality.value())
    }
}
