//! # imgpress
//!
//! A small HTTP service for uploading images and transforming them: resize,
//! rotate, crop, and compress. Files live in one flat upload directory; every
//! transform reads a stored file and writes a new, prefixed one next to it.
//!
//! # Architecture
//!
//! ```text
//! HTTP (axum)  →  handlers  →  store (files on disk)
//!                           →  imaging / compress (pure Rust codecs)
//! ```
//!
//! The image code never touches HTTP and the HTTP code never touches pixels.
//! Codec calls sit behind the [`imaging::ImageBackend`] trait, so the
//! compression loop and transform handlers are tested with a recording mock
//! instead of real JPEG encoding.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`compress`] | Target-size compression loop: lower quality and shrink dimensions until the result fits |
//! | [`imaging`] | Codec backend, transform handlers, pure dimension and size math |
//! | [`store`] | Upload directory: timestamp-named uploads, safe name resolution |
//! | [`naming`] | Stored and derived file names (`resized-…`, `compressed-…`) |
//! | [`server`] | axum router, request handlers, JSON error mapping |
//! | [`config`] | `imgpress.toml` loading, merging over stock defaults, validation |
//! | [`telemetry`] | `tracing` subscriber setup |
//! | [`output`] | CLI report for `imgpress compress` |
//!
//! # Design Decisions
//!
//! ## Target Size by Iteration
//!
//! There is no closed-form way to pick a JPEG quality for a byte budget, so
//! [`compress::compress_to_target`] searches: quality 90 down to 5 in steps
//! of 5, width and height ×0.9 each pass. Each pass re-encodes the previous
//! pass's output, not the original, so artifacts compound. When the budget
//! can't be met the smallest attempt is returned rather than an error.
//!
//! ## Pure-Rust Imaging
//!
//! The `image` crate handles decoding, Lanczos3 resampling and encoding. No
//! ImageMagick, no system libraries: the binary is self-contained.
//!
//! ## Blocking Work Off the Runtime
//!
//! Codec calls are synchronous and CPU-bound. Handlers run them with
//! `tokio::task::spawn_blocking` so a slow compression never stalls other
//! requests on the async workers.

pub mod compress;
pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod server;
pub mod store;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod test_helpers;
