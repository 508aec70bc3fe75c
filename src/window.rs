//! Reversible windowing between flat multi-channel series and fixed-length
//! training windows.
//!
//! [`reformat`] and [`undo_reformat`] are mutual inverses for any input whose
//! sample-axis length is an exact multiple of `feature_len`. Both are pure
//! index permutations, so the round trip is bit-exact for floating data.
//! Downstream evaluation relies on this to compare model output against the
//! raw time series.
//!
//! # Layouts
//!
//! - [`WindowLayout::Flat`]: `(channels, total)` ⇄ `(windows, channels, 1, feature_len)`
//! - [`WindowLayout::Stacked`]: `(channels, total)` ⇄ `(windows, 1, channels, feature_len)`

use ndarray::{concatenate, Array2, Array4, Axis};

use crate::config::WindowLayout;
use crate::error::{PipelineError, Result};

/// Cut a flat `(channels, total)` array into fixed-length windows.
///
/// # Errors
///
/// - [`PipelineError::InvalidInput`] for an empty array or zero `feature_len`.
/// - [`PipelineError::WindowRemainder`] when the sample count is not an
///   exact multiple of `feature_len`. The remainder is never truncated.
pub fn reformat(
    data: &Array2<f64>,
    feature_len: usize,
    layout: WindowLayout,
) -> Result<Array4<f64>> {
    let (channels, total_len) = data.dim();
    if channels == 0 || total_len == 0 {
        return Err(PipelineError::invalid_input("cannot reformat an empty array"));
    }
    if feature_len == 0 {
        return Err(PipelineError::invalid_input("feature_len must be at least 1"));
    }
    if total_len % feature_len != 0 {
        return Err(PipelineError::window_remainder(total_len, feature_len));
    }

    let windows = total_len / feature_len;
    let windowed = match layout {
        WindowLayout::Flat => Array4::from_shape_fn(
            (windows, channels, 1, feature_len),
            |(w, c, _, j)| data[[c, w * feature_len + j]],
        ),
        WindowLayout::Stacked => Array4::from_shape_fn(
            (windows, 1, channels, feature_len),
            |(w, _, c, j)| data[[c, w * feature_len + j]],
        ),
    };
    Ok(windowed)
}

/// Exact structural inverse of [`reformat`] for the same layout.
///
/// The window length is recovered from the array shape; the layout must
/// match the one used at creation time.
///
/// # Errors
///
/// - [`PipelineError::InvalidInput`] for an empty array.
/// - [`PipelineError::ShapeMismatch`] when the array shape does not match
///   the given layout.
pub fn undo_reformat(windowed: &Array4<f64>, layout: WindowLayout) -> Result<Array2<f64>> {
    let (windows, axis1, axis2, feature_len) = windowed.dim();
    if windows == 0 || feature_len == 0 {
        return Err(PipelineError::invalid_input(
            "cannot undo reformat of an empty array",
        ));
    }

    let flat = match layout {
        WindowLayout::Flat => {
            if axis2 != 1 {
                return Err(PipelineError::shape_mismatch(format!(
                    "flat layout expects group axis 1, got shape ({windows}, {axis1}, {axis2}, {feature_len})"
                )));
            }
            let channels = axis1;
            Array2::from_shape_fn((channels, windows * feature_len), |(c, t)| {
                windowed[[t / feature_len, c, 0, t % feature_len]]
            })
        }
        WindowLayout::Stacked => {
            if axis1 != 1 {
                return Err(PipelineError::shape_mismatch(format!(
                    "stacked layout expects role axis 1, got shape ({windows}, {axis1}, {axis2}, {feature_len})"
                )));
            }
            let channels = axis2;
            Array2::from_shape_fn((channels, windows * feature_len), |(c, t)| {
                windowed[[t / feature_len, 0, c, t % feature_len]]
            })
        }
    };
    Ok(flat)
}

/// Pair input and label window sets along the role axis.
///
/// Both sets must be in [`WindowLayout::Stacked`] form with identical
/// shapes; the result is `(windows, 2, channels, feature_len)` with role 0
/// holding the input windows and role 1 the labels.
///
/// # Errors
///
/// Returns [`PipelineError::ShapeMismatch`] when the shapes differ or either
/// set is not in stacked form.
pub fn stack_pairs(input: &Array4<f64>, label: &Array4<f64>) -> Result<Array4<f64>> {
    if input.dim() != label.dim() {
        return Err(PipelineError::shape_mismatch(format!(
            "input windows {:?} vs label windows {:?}",
            input.dim(),
            label.dim()
        )));
    }
    if input.dim().1 != 1 {
        return Err(PipelineError::shape_mismatch(
            "paired extraction requires the stacked layout".to_string(),
        ));
    }
    concatenate(Axis(1), &[input.view(), label.view()])
        .map_err(|e| PipelineError::shape_mismatch(e.to_string()))
}
