//! Image processing in pure Rust, `image` crate underneath.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `ImageReader::into_dimensions` |
//! | **Re-encode** | `resize_exact` (Lanczos3) + format-preserving encoder |
//! | **Resize / Rotate / Crop** | `resize_exact`, `rotate90..270`, `crop_imm` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension and size math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: Validating wrappers that turn request values into backend calls

pub mod backend;
pub mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use operations::{
    QualityCompression, compress_with_quality, crop_image, get_dimensions, resize_image,
    rotate_image,
};
pub use params::{
    CropParams, CropRect, EncodeParams, Quality, ResizeParams, RotateParams, Rotation,
};
pub use rust_backend::RustBackend;
