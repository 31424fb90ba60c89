//! Iterative size-bounded compression.
//!
//! Given an encoded image and a budget in kilobytes, re-encode at
//! decreasing quality and shrinking dimensions until the output fits or the
//! quality floor is reached:
//!
//! ```text
//! pass 1   quality 90   1920×1080   (natural size, from the source bytes)
//! pass 2   quality 85   1728×972    (from pass 1's bytes)
//! pass 3   quality 80   1555×874    (from pass 2's bytes)
//! ...
//! pass 18  quality 5                (floor: stop, best effort)
//! ```
//!
//! Each pass re-encodes the *previous pass's output*, not the original
//! source. Quality and both dimensions are monotonically non-increasing, so
//! the loop always terminates within [`CompressionSettings::max_passes`].
//!
//! Missing the target is not an error. When the floor (or the minimum
//! dimension) is reached first, the smallest encoding produced by any pass
//! is returned with `target_met == false`.
//!
//! The loop is split so it can be tested against a stub codec:
//! [`next_step`] is a pure planning function over an immutable
//! [`CompressionState`], [`advance`] applies a plan through the
//! [`ImageBackend`], and [`compress_to_target`] drives the two.

use crate::imaging::calculations::{scale_dimensions, size_kb, within_budget};
use crate::imaging::{BackendError, EncodeParams, ImageBackend, Quality};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum CompressError {
    #[error("Target size must be a positive number of kilobytes, got {0}")]
    InvalidTarget(i64),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Tuning for the compression loop.
///
/// Defaults: start at quality 90, step down by 5 to a floor of 5, scale by
/// 0.9 per pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressionSettings {
    /// Quality of the first pass.
    pub start_quality: u32,
    /// The loop stops once a pass has been encoded at this quality.
    pub quality_floor: u32,
    /// Quality decrease per pass.
    pub quality_step: u32,
    /// Width/height multiplier per pass, in (0, 1].
    pub scale_factor: f64,
    /// Smallest width or height a pass may be encoded at.
    pub min_dimension: u32,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self {
            start_quality: 90,
            quality_floor: 5,
            quality_step: 5,
            scale_factor: 0.9,
            min_dimension: 1,
        }
    }
}

impl CompressionSettings {
    /// Upper bound on encoding passes: `ceil((start - floor) / step) + 1`.
    pub fn max_passes(&self) -> u32 {
        let span = self.start_quality.saturating_sub(self.quality_floor);
        span.div_ceil(self.quality_step.max(1)) + 1
    }
}

/// One immutable point of the loop: an encoding and how it was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionState {
    pub bytes: Vec<u8>,
    pub quality: Quality,
    pub width: u32,
    pub height: u32,
}

/// Parameters of the next pass, computed by [`next_step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPlan {
    pub quality: Quality,
    pub width: u32,
    pub height: u32,
}

/// A record of one encoding pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    pub quality: u32,
    pub width: u32,
    pub height: u32,
    pub bytes: u64,
}

impl Attempt {
    fn of(state: &CompressionState) -> Self {
        Self {
            quality: state.quality.value(),
            width: state.width,
            height: state.height,
            bytes: state.bytes.len() as u64,
        }
    }
}

/// Outcome of [`compress_to_target`].
#[derive(Debug, Clone)]
pub struct CompressionResult {
    pub bytes: Vec<u8>,
    pub quality: u32,
    pub width: u32,
    pub height: u32,
    /// Encoded size rounded to whole kilobytes.
    pub size_kb: u64,
    /// Whether `bytes` fits the requested budget.
    pub target_met: bool,
    /// Every pass in order, including ones not returned.
    pub attempts: Vec<Attempt>,
}

impl CompressionResult {
    pub fn passes(&self) -> usize {
        self.attempts.len()
    }

    fn from_state(state: CompressionState, target_met: bool, attempts: Vec<Attempt>) -> Self {
        Self {
            size_kb: size_kb(state.bytes.len() as u64),
            quality: state.quality.value(),
            width: state.width,
            height: state.height,
            bytes: state.bytes,
            target_met,
            attempts,
        }
    }
}

/// Plan the pass after `state`, or `None` if the loop must stop.
///
/// Stops when `state` is already at the quality floor, or when scaling
/// would take either dimension below `min_dimension`.
pub fn next_step(state: &CompressionState, settings: &CompressionSettings) -> Option<StepPlan> {
    if state.quality.value() <= settings.quality_floor {
        return None;
    }
    let quality = state
        .quality
        .value()
        .saturating_sub(settings.quality_step)
        .max(settings.quality_floor);
    let (width, height) = scale_dimensions((state.width, state.height), settings.scale_factor);
    let min = settings.min_dimension.max(1);
    if width < min || height < min {
        return None;
    }
    Some(StepPlan {
        quality: Quality::new(quality),
        width,
        height,
    })
}

/// Re-encode `state.bytes` according to `plan`, producing the next state.
pub fn advance(
    backend: &impl ImageBackend,
    state: &CompressionState,
    plan: &StepPlan,
) -> Result<CompressionState, BackendError> {
    let bytes = backend.encode(
        &state.bytes,
        &EncodeParams {
            width: plan.width,
            height: plan.height,
            quality: plan.quality,
        },
    )?;
    Ok(CompressionState {
        bytes,
        quality: plan.quality,
        width: plan.width,
        height: plan.height,
    })
}

/// Compress `source` until it fits in `target_kb` kilobytes.
///
/// Rejects a non-positive target before touching the codec.
pub fn compress_to_target(
    backend: &impl ImageBackend,
    source: &[u8],
    target_kb: i64,
    settings: &CompressionSettings,
) -> Result<CompressionResult, CompressError> {
    if target_kb <= 0 {
        return Err(CompressError::InvalidTarget(target_kb));
    }
    let target_kb = target_kb as u64;

    let dims = backend.identify(source)?;
    let quality = Quality::new(settings.start_quality);
    let bytes = backend.encode(
        source,
        &EncodeParams {
            width: dims.width,
            height: dims.height,
            quality,
        },
    )?;
    let mut state = CompressionState {
        bytes,
        quality,
        width: dims.width,
        height: dims.height,
    };
    let mut attempts = vec![Attempt::of(&state)];
    let mut best: Option<CompressionState> = None;

    loop {
        debug!(
            pass = attempts.len(),
            quality = state.quality.value(),
            width = state.width,
            height = state.height,
            bytes = state.bytes.len(),
            "compression pass"
        );

        if within_budget(state.bytes.len() as u64, target_kb) {
            info!(
                passes = attempts.len(),
                quality = state.quality.value(),
                size_kb = size_kb(state.bytes.len() as u64),
                target_kb,
                "compression target met"
            );
            return Ok(CompressionResult::from_state(state, true, attempts));
        }

        let Some(plan) = next_step(&state, settings) else {
            break;
        };
        let next = advance(backend, &state, &plan)?;
        attempts.push(Attempt::of(&next));

        let previous = std::mem::replace(&mut state, next);
        if best
            .as_ref()
            .is_none_or(|b| previous.bytes.len() < b.bytes.len())
        {
            best = Some(previous);
        }
    }

    let result = match best {
        Some(b) if b.bytes.len() < state.bytes.len() => b,
        _ => state,
    };
    info!(
        passes = attempts.len(),
        quality = result.quality.value(),
        size_kb = size_kb(result.bytes.len() as u64),
        target_kb,
        "compression target not reachable, returning best effort"
    );
    Ok(CompressionResult::from_state(result, false, attempts))
}
