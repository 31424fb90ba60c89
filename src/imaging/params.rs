//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which validates requests and decides output paths) and the
//! [`backend`](super::backend) (which does the actual pixel work). The
//! compressor in [`crate::compress`] only ever builds [`EncodeParams`].
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`EncodeParams`]: In-memory re-encode: target dimensions and quality.
//! - [`ResizeParams`]: File-to-file resize to exact dimensions.
//! - [`RotateParams`]: File-to-file rotation by a quarter-turn [`Rotation`].
//! - [`CropParams`]: File-to-file crop of a [`CropRect`].

use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    /// Build from an unvalidated client value, clamping into 1–100.
    pub fn from_request(value: i64) -> Self {
        Self(value.clamp(1, 100) as u32)
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Parameters for an in-memory re-encode (decode → resize → encode).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeParams {
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}

/// Parameters for a resize operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}

/// Clockwise quarter-turn rotations supported by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    None,
    Cw90,
    Cw180,
    Cw270,
}

impl Rotation {
    pub fn degrees(self) -> u32 {
        match self {
            Rotation::None => 0,
            Rotation::Cw90 => 90,
            Rotation::Cw180 => 180,
            Rotation::Cw270 => 270,
        }
    }
}

/// Parameters for a rotate operation.
#[derive(Debug, Clone, PartialEq)]
pub struct RotateParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub rotation: Rotation,
    pub quality: Quality,
}

/// A crop rectangle in source pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

/// Parameters for a crop operation.
#[derive(Debug, Clone, PartialEq)]
pub struct CropParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub rect: CropRect,
    pub quality: Quality,
}
