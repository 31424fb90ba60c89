//! Image codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the narrow codec capability the rest of the
//! crate is written against:
//!
//! | Operation | Input | Output |
//! |---|---|---|
//! | `identify` | encoded bytes | [`Dimensions`] |
//! | `encode` | encoded bytes + [`EncodeParams`] | re-encoded bytes |
//! | `resize` / `rotate` / `crop` | file paths + params | file written |
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests use the recording `MockBackend` below, which lets the
//! compression loop run against a deterministic size model.

use super::params::{CropParams, EncodeParams, ResizeParams, RotateParams};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image codec backends.
///
/// `identify` and `encode` work on in-memory buffers and drive the
/// compression loop; the file-to-file transforms back the thin HTTP
/// handlers.
pub trait ImageBackend: Sync {
    /// Decode just enough of `bytes` to report the pixel dimensions.
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, BackendError>;

    /// Decode `bytes`, resize to exactly `params.width` × `params.height`,
    /// and re-encode in the source's own format at `params.quality`.
    fn encode(&self, bytes: &[u8], params: &EncodeParams) -> Result<Vec<u8>, BackendError>;

    /// Resize a file to exact dimensions.
    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError>;

    /// Rotate a file by a quarter turn.
    fn rotate(&self, params: &RotateParams) -> Result<(), BackendError>;

    /// Crop a file to a rectangle already validated against its bounds.
    fn crop(&self, params: &CropParams) -> Result<(), BackendError>;
}
