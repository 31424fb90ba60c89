//! Shared test utilities: synthetic image fixtures.
//!
//! Images are generated in memory with the `image` crate so the suite has
//! no binary fixtures. "Noisy" images use a deterministic xorshift pattern
//! so that JPEG size actually reacts to quality and dimensions; a flat
//! gradient compresses too well to exercise the compression loop.

use image::{ImageEncoder, RgbImage};
use std::path::Path;

/// Deterministic pseudo-random RGB image.
pub fn noisy_rgb(width: u32, height: u32) -> RgbImage {
    let mut state: u32 = 0x9E37_79B9;
    RgbImage::from_fn(width, height, |x, y| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let noise = (state & 0x3F) as u8;
        image::Rgb([
            ((x * 255) / width.max(1)) as u8 ^ noise,
            ((y * 255) / height.max(1)) as u8 ^ noise,
            128u8.wrapping_add(noise),
        ])
    })
}

/// Encode a noisy image as JPEG bytes at the given quality.
pub fn noisy_jpeg(width: u32, height: u32, quality: u8) -> Vec<u8> {
    let img = noisy_rgb(width, height);
    let mut buf = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    buf
}

/// Encode a noisy image as PNG bytes.
pub fn noisy_png(width: u32, height: u32) -> Vec<u8> {
    let img = noisy_rgb(width, height);
    let mut buf = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buf)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    buf
}

/// Write a noisy JPEG file to `path`.
pub fn write_jpeg(path: &Path, width: u32, height: u32) {
    std::fs::write(path, noisy_jpeg(width, height, 90)).unwrap();
}
