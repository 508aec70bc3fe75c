//! Channel normalization and repetition-matching.
//!
//! Every channel is zero-meaned and scaled by its maximum absolute value so
//! the result lies in `[-1, 1]`, then multiplied by a role-dependent factor:
//! the primary channel keeps unit amplitude, noise channels scale by the
//! configured noise level, accelerometer channels by its square root.
//!
//! Channels shorter than the primary signal are tiled by a whole number of
//! repeats; a non-integer ratio is a hard precondition failure, never
//! rounded.

use ndarray::{Array1, ArrayView1};

use crate::error::{PipelineError, Result};
use crate::signal::ChannelRole;

/// Zero-mean and amplitude-scale a channel.
///
/// The input is never mutated; a freshly owned array is returned.
///
/// # Errors
///
/// - [`PipelineError::InvalidInput`] for an empty channel.
/// - [`PipelineError::ConstantChannel`] when the mean-removed channel has a
///   zero peak (all-zero or constant input), which would otherwise produce
///   `NaN`/`Inf` silently.
pub fn normalize(
    channel: ArrayView1<'_, f64>,
    role: ChannelRole,
    noise_level: f64,
) -> Result<Array1<f64>> {
    if channel.is_empty() {
        return Err(PipelineError::invalid_input(
            "cannot normalize an empty channel",
        ));
    }

    let mean = channel.sum() / channel.len() as f64;
    let centered = channel.mapv(|v| v - mean);
    let peak = centered.iter().fold(0.0_f64, |acc, &v| acc.max(v.abs()));
    if peak == 0.0 {
        return Err(PipelineError::constant_channel(format!(
            "{role:?} channel has zero amplitude after mean removal"
        )));
    }

    let scale = match role {
        ChannelRole::Primary => 1.0,
        ChannelRole::Noise => noise_level,
        ChannelRole::Accelerometer => noise_level.sqrt(),
    };

    Ok(centered.mapv(|v| v / peak * scale))
}

/// Tile a channel to `target_len` samples by whole-number repetition.
///
/// # Errors
///
/// - [`PipelineError::InvalidInput`] for an empty channel.
/// - [`PipelineError::TilingMismatch`] when `target_len` is not an exact
///   multiple of the channel length.
pub fn tile(channel: ArrayView1<'_, f64>, target_len: usize) -> Result<Array1<f64>> {
    let len = channel.len();
    if len == 0 {
        return Err(PipelineError::invalid_input("cannot tile an empty channel"));
    }
    if target_len % len != 0 {
        return Err(PipelineError::tiling_mismatch(target_len, len));
    }
    Ok(Array1::from_shape_fn(target_len, |i| channel[i % len]))
}
