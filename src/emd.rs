//! Empirical Mode Decomposition of windowed signal pairs.
//!
//! Each window's input and label channels are decomposed independently into
//! Intrinsic Mode Functions via the sifting process: extract local extrema,
//! interpolate cubic-spline upper/lower envelopes, subtract the envelope
//! mean, and repeat until the Cauchy convergence criterion (normalized
//! squared difference between successive iterates) falls below threshold.
//! IMFs are ordered highest-frequency first; the terminal residue is
//! appended as the last component.
//!
//! The decomposition is consolidated to a fixed five-slot representation so
//! every window contributes the same channel count to the output tensor:
//! components of order five and above, residue included, are summed into
//! slot four. Windows producing fewer than five true components are
//! zero-padded and flagged with a [`ShortSampleRecord`] — a quality-audit
//! artifact, never an error.
//!
//! Per-window sifting shares no state, so extraction runs as a parallel map
//! over the window axis with results accumulated after the map.

use ndarray::{s, Array2, Array3, Array4, ArrayView1, Axis};
use rayon::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::{IMF_SLOTS, TENSOR_CHANNELS};

/// Tuning parameters for the sifting process.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SiftSettings {
    /// Iteration cap per IMF; the only bound preventing non-termination.
    pub max_sift_iterations: usize,
    /// Cauchy stopping threshold on the normalized squared difference
    /// between successive sifting iterates.
    pub sd_threshold: f64,
    /// Cap on extracted modes per channel, residue excluded.
    pub max_modes: usize,
    /// Mean-energy floor below which the residue is treated as exhausted.
    pub residual_energy_eps: f64,
}

impl Default for SiftSettings {
    fn default() -> Self {
        Self {
            max_sift_iterations: 100,
            sd_threshold: 0.2,
            max_modes: 16,
            residual_energy_eps: 1e-10,
        }
    }
}

/// Bookkeeping entry for a window whose decomposition produced fewer than
/// [`IMF_SLOTS`] true components for either channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ShortSampleRecord {
    /// Window index within the dataset the record was emitted for.
    pub window: usize,
    /// Component count (IMFs + residue) of the input channel.
    pub input_modes: usize,
    /// Component count (IMFs + residue) of the label channel.
    pub label_modes: usize,
}

/// Consolidated decomposition of one dataset: the fixed-shape IMF tensor
/// plus the short-sample audit trail.
#[derive(Debug, Clone)]
pub struct EmdDataset {
    /// Shape `(windows, 10, 1, feature_len)`: slots 0–4 hold the input
    /// channel's consolidated components, slots 5–9 the label channel's.
    pub tensors: Array4<f64>,
    /// One record per window with a short decomposition, in window order.
    pub short_samples: Vec<ShortSampleRecord>,
}

/// Sifting-based decomposer for windowed signal pairs.
#[derive(Debug, Clone, Default)]
pub struct EmdExtractor {
    settings: SiftSettings,
}

impl EmdExtractor {
    /// Create an extractor with explicit sift settings.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] for a non-positive threshold
    /// or zero iteration/mode caps.
    pub fn new(settings: SiftSettings) -> Result<Self> {
        if settings.max_sift_iterations == 0 {
            return Err(PipelineError::invalid_config(
                "max_sift_iterations must be at least 1",
            ));
        }
        if !(settings.sd_threshold > 0.0) {
            return Err(PipelineError::invalid_config(
                "sd_threshold must be positive",
            ));
        }
        if settings.max_modes == 0 {
            return Err(PipelineError::invalid_config("max_modes must be at least 1"));
        }
        Ok(Self { settings })
    }

    /// The active sift settings.
    #[must_use]
    pub const fn settings(&self) -> &SiftSettings {
        &self.settings
    }

    /// Decompose a signal into IMFs plus terminal residue.
    ///
    /// The returned components sum to the input exactly (each is subtracted
    /// from the running residue as extracted). Signals too short or with no
    /// interior extrema come back as a single residue entry.
    #[must_use]
    pub fn decompose(&self, signal: &[f64]) -> Vec<Vec<f64>> {
        let n = signal.len();
        if n < 4 {
            return vec![signal.to_vec()];
        }

        let mut modes: Vec<Vec<f64>> = Vec::new();
        let mut residue = signal.to_vec();

        while modes.len() < self.settings.max_modes {
            let energy = residue.iter().map(|v| v * v).sum::<f64>() / n as f64;
            if energy < self.settings.residual_energy_eps {
                break;
            }
            if interior_extrema(&residue) < 2 {
                break;
            }

            let imf = self.sift(&residue);
            for (r, h) in residue.iter_mut().zip(imf.iter()) {
                *r -= h;
            }
            modes.push(imf);
        }

        modes.push(residue);
        modes
    }

    /// Extract one IMF candidate from the current residue.
    fn sift(&self, residue: &[f64]) -> Vec<f64> {
        let n = residue.len();
        let mut h = residue.to_vec();

        for _ in 0..self.settings.max_sift_iterations {
            let maxima = local_maxima(&h);
            let minima = local_minima(&h);
            if maxima.len() < 2 || minima.len() < 2 {
                break;
            }

            let upper = spline_envelope(&maxima, n);
            let lower = spline_envelope(&minima, n);

            let prev = h.clone();
            for i in 0..n {
                h[i] -= 0.5 * (upper[i] + lower[i]);
            }

            if cauchy_sd(&prev, &h) < self.settings.sd_threshold {
                break;
            }
        }
        h
    }

    /// Decompose one window's input and label channels into a fixed-shape
    /// `(10, 1, feature_len)` block.
    ///
    /// Pure per-window function: a degenerate decomposition yields a
    /// [`ShortSampleRecord`], never a failure, so one bad window cannot
    /// abort a batch.
    #[must_use]
    pub fn decompose_window(
        &self,
        window: usize,
        input: ArrayView1<'_, f64>,
        label: ArrayView1<'_, f64>,
    ) -> (Array3<f64>, Option<ShortSampleRecord>) {
        debug_assert_eq!(input.len(), label.len());
        let feature_len = input.len();

        let input_modes = self.decompose(&input.to_vec());
        let label_modes = self.decompose(&label.to_vec());

        let mut tensor = Array3::zeros((TENSOR_CHANNELS, 1, feature_len));
        tensor
            .slice_mut(s![0..IMF_SLOTS, 0, ..])
            .assign(&consolidate_modes(&input_modes, feature_len));
        tensor
            .slice_mut(s![IMF_SLOTS..TENSOR_CHANNELS, 0, ..])
            .assign(&consolidate_modes(&label_modes, feature_len));

        let record = (input_modes.len() < IMF_SLOTS || label_modes.len() < IMF_SLOTS).then(|| {
            ShortSampleRecord {
                window,
                input_modes: input_modes.len(),
                label_modes: label_modes.len(),
            }
        });
        (tensor, record)
    }

    /// Decompose every window of a paired dataset.
    ///
    /// Expects the `(windows, roles, groups, feature_len)` shape produced by
    /// [`crate::window::stack_pairs`]: role 0 carries the input channel in
    /// group 0, role 1 the label channel.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::InvalidInput`] when the dataset has no windows.
    /// - [`PipelineError::ShapeMismatch`] when the role axis is missing the
    ///   label channel.
    pub fn extract(&self, dataset: &Array4<f64>) -> Result<EmdDataset> {
        let (windows, roles, _groups, feature_len) = dataset.dim();
        if windows == 0 {
            return Err(PipelineError::invalid_input("no windows to decompose"));
        }
        if roles < 2 {
            return Err(PipelineError::shape_mismatch(format!(
                "paired dataset needs input and label roles, got {roles} role(s)"
            )));
        }

        let per_window: Vec<(Array3<f64>, Option<ShortSampleRecord>)> = (0..windows)
            .into_par_iter()
            .map(|i| {
                let input = dataset.slice(s![i, 0, 0, ..]);
                let label = dataset.slice(s![i, 1, 0, ..]);
                self.decompose_window(i, input, label)
            })
            .collect();

        let mut tensors = Array4::zeros((windows, TENSOR_CHANNELS, 1, feature_len));
        let mut short_samples = Vec::new();
        for (i, (tensor, record)) in per_window.into_iter().enumerate() {
            tensors.index_axis_mut(Axis(0), i).assign(&tensor);
            if let Some(r) = record {
                debug!(
                    window = r.window,
                    input_modes = r.input_modes,
                    label_modes = r.label_modes,
                    "short decomposition"
                );
                short_samples.push(r);
            }
        }

        info!(
            windows,
            short_samples = short_samples.len(),
            feature_len,
            "EMD extraction complete"
        );
        Ok(EmdDataset {
            tensors,
            short_samples,
        })
    }
}

/// Consolidate a decomposition to exactly [`IMF_SLOTS`] rows.
///
/// With more than five components, everything from the fifth onward
/// (residue included) is summed into slot four, so the component sum is
/// conserved. With five or fewer, the produced entries are written in order
/// and the remaining slots stay zero.
#[must_use]
pub fn consolidate_modes(modes: &[Vec<f64>], feature_len: usize) -> Array2<f64> {
    let mut slots = Array2::zeros((IMF_SLOTS, feature_len));
    for (slot, mode) in modes.iter().take(IMF_SLOTS).enumerate() {
        for (j, &v) in mode.iter().enumerate() {
            slots[[slot, j]] = v;
        }
    }
    for mode in modes.iter().skip(IMF_SLOTS) {
        for (j, &v) in mode.iter().enumerate() {
            slots[[IMF_SLOTS - 1, j]] += v;
        }
    }
    slots
}

/// Local maxima as `(position, value)` knots, with boundary samples included
/// when they dominate their neighbor so the envelope spans the full window.
fn local_maxima(signal: &[f64]) -> Vec<(f64, f64)> {
    let n = signal.len();
    let mut knots = Vec::new();
    if n >= 2 && signal[0] > signal[1] {
        knots.push((0.0, signal[0]));
    }
    for i in 1..n.saturating_sub(1) {
        if signal[i] > signal[i - 1] && signal[i] >= signal[i + 1] {
            knots.push((i as f64, signal[i]));
        }
    }
    if n >= 2 && signal[n - 1] > signal[n - 2] {
        knots.push(((n - 1) as f64, signal[n - 1]));
    }
    knots
}

/// Local minima as `(position, value)` knots; mirror of [`local_maxima`].
fn local_minima(signal: &[f64]) -> Vec<(f64, f64)> {
    let n = signal.len();
    let mut knots = Vec::new();
    if n >= 2 && signal[0] < signal[1] {
        knots.push((0.0, signal[0]));
    }
    for i in 1..n.saturating_sub(1) {
        if signal[i] < signal[i - 1] && signal[i] <= signal[i + 1] {
            knots.push((i as f64, signal[i]));
        }
    }
    if n >= 2 && signal[n - 1] < signal[n - 2] {
        knots.push(((n - 1) as f64, signal[n - 1]));
    }
    knots
}

/// Count interior turning points. Fewer than two means the residue is
/// monotonic/trivial and decomposition terminates.
fn interior_extrema(signal: &[f64]) -> usize {
    let mut count = 0;
    for i in 1..signal.len().saturating_sub(1) {
        let rising = signal[i] > signal[i - 1] && signal[i] >= signal[i + 1];
        let falling = signal[i] < signal[i - 1] && signal[i] <= signal[i + 1];
        if rising || falling {
            count += 1;
        }
    }
    count
}

/// Cauchy-type convergence measure: squared difference between successive
/// sifting iterates, normalized by the squared magnitude of the prior one.
fn cauchy_sd(prev: &[f64], curr: &[f64]) -> f64 {
    let diff: f64 = prev
        .iter()
        .zip(curr.iter())
        .map(|(p, c)| (p - c).powi(2))
        .sum();
    let norm: f64 = prev.iter().map(|p| p * p).sum();
    if norm < 1e-30 {
        0.0
    } else {
        diff / norm
    }
}

/// Natural cubic spline through the extrema knots, evaluated at every
/// integer sample position and clamped to the outermost knot values beyond
/// the knot range.
fn spline_envelope(knots: &[(f64, f64)], n: usize) -> Vec<f64> {
    let m = knots.len();
    if m == 0 {
        return vec![0.0; n];
    }
    if m == 1 {
        return vec![knots[0].1; n];
    }
    if m == 2 {
        let (x0, y0) = knots[0];
        let (x1, y1) = knots[1];
        let dx = (x1 - x0).max(1e-10);
        return (0..n)
            .map(|i| {
                let t = ((i as f64 - x0) / dx).clamp(0.0, 1.0);
                y0 + t * (y1 - y0)
            })
            .collect();
    }

    // Second derivatives from the tridiagonal system (Thomas algorithm).
    let segs = m - 1;
    let mut widths = vec![0.0; segs];
    for i in 0..segs {
        widths[i] = (knots[i + 1].0 - knots[i].0).max(1e-10);
    }

    let mut rhs = vec![0.0; segs];
    for i in 1..segs {
        rhs[i] = 3.0 / widths[i] * (knots[i + 1].1 - knots[i].1)
            - 3.0 / widths[i - 1] * (knots[i].1 - knots[i - 1].1);
    }

    let mut diag = vec![1.0; m];
    let mut upper = vec![0.0; m];
    let mut scratch = vec![0.0; m];
    for i in 1..segs {
        diag[i] = 2.0 * (knots[i + 1].0 - knots[i - 1].0) - widths[i - 1] * upper[i - 1];
        if diag[i].abs() < 1e-30 {
            diag[i] = 1e-30;
        }
        upper[i] = widths[i] / diag[i];
        scratch[i] = (rhs[i] - widths[i - 1] * scratch[i - 1]) / diag[i];
    }

    let mut curv = vec![0.0; m];
    let mut lin = vec![0.0; segs];
    let mut cubic = vec![0.0; segs];
    for i in (0..segs).rev() {
        curv[i] = scratch[i] - upper[i] * curv[i + 1];
        lin[i] = (knots[i + 1].1 - knots[i].1) / widths[i]
            - widths[i] * (curv[i + 1] + 2.0 * curv[i]) / 3.0;
        cubic[i] = (curv[i + 1] - curv[i]) / (3.0 * widths[i]);
    }

    let mut env = vec![0.0; n];
    let mut seg = 0;
    for (i, out) in env.iter_mut().enumerate() {
        let x = i as f64;
        if x <= knots[0].0 {
            *out = knots[0].1;
            continue;
        }
        if x >= knots[m - 1].0 {
            *out = knots[m - 1].1;
            continue;
        }
        while seg < segs - 1 && x > knots[seg + 1].0 {
            seg += 1;
        }
        let dx = x - knots[seg].0;
        *out = knots[seg].1 + dx * (lin[seg] + dx * (curv[seg] + dx * cubic[seg]));
    }
    env
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;
    use std::f64::consts::PI;

    fn sine(n: usize, cycles: f64) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * PI * cycles * i as f64 / n as f64).sin())
            .collect()
    }

    fn two_tone(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let t = i as f64 / n as f64;
                (2.0 * PI * 3.0 * t).sin() + 0.5 * (2.0 * PI * 30.0 * t).sin()
            })
            .collect()
    }

    #[test]
    fn test_decompose_single_sine() {
        let extractor = EmdExtractor::default();
        let modes = extractor.decompose(&sine(256, 5.0));
        // At least one IMF plus the residue.
        assert!(modes.len() >= 2, "modes={}", modes.len());
    }

    #[test]
    fn test_decompose_two_tone_separates() {
        let extractor = EmdExtractor::default();
        let modes = extractor.decompose(&two_tone(512));
        assert!(modes.len() >= 3, "modes={}", modes.len());
    }

    #[test]
    fn test_components_sum_to_signal() {
        let extractor = EmdExtractor::default();
        let signal = two_tone(512);
        let modes = extractor.decompose(&signal);

        let mut sum = vec![0.0; signal.len()];
        for mode in &modes {
            for (s, v) in sum.iter_mut().zip(mode.iter()) {
                *s += v;
            }
        }
        for (i, (&s, &x)) in sum.iter().zip(signal.iter()).enumerate() {
            assert!((s - x).abs() < 1e-9, "i={i}: {s} vs {x}");
        }
    }

    #[test]
    fn test_monotone_signal_is_residue_only() {
        let extractor = EmdExtractor::default();
        let ramp: Vec<f64> = (0..300).map(|i| i as f64 * 0.01).collect();
        let modes = extractor.decompose(&ramp);
        assert_eq!(modes.len(), 1);
        assert_eq!(modes[0], ramp);
    }

    #[test]
    fn test_too_short_signal_is_passed_through() {
        let extractor = EmdExtractor::default();
        let modes = extractor.decompose(&[1.0, 2.0, 3.0]);
        assert_eq!(modes, vec![vec![1.0, 2.0, 3.0]]);
    }

    #[test]
    fn test_mode_cap_bounds_output() {
        let settings = SiftSettings {
            max_modes: 3,
            ..SiftSettings::default()
        };
        let extractor = EmdExtractor::new(settings).unwrap();
        let modes = extractor.decompose(&two_tone(512));
        assert!(modes.len() <= 4); // max_modes + residue
    }

    #[test]
    fn test_settings_validation() {
        let bad = SiftSettings {
            sd_threshold: 0.0,
            ..SiftSettings::default()
        };
        assert!(EmdExtractor::new(bad).is_err());

        let bad = SiftSettings {
            max_sift_iterations: 0,
            ..SiftSettings::default()
        };
        assert!(EmdExtractor::new(bad).is_err());
    }

    #[test]
    fn test_cauchy_sd() {
        let a = vec![1.0, 2.0, 3.0];
        assert!(cauchy_sd(&a, &a).abs() < 1e-12);
        assert!(cauchy_sd(&a, &[2.0, 3.0, 4.0]) > 0.0);
        assert_eq!(cauchy_sd(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_local_extrema() {
        let signal = [0.0, 1.0, 0.0, 2.0, 0.0];
        let maxima = local_maxima(&signal);
        assert_eq!(maxima, vec![(1.0, 1.0), (3.0, 2.0)]);

        let signal = [1.0, 0.0, 1.0, -1.0, 1.0];
        let minima = local_minima(&signal);
        assert_eq!(minima, vec![(1.0, 0.0), (3.0, -1.0)]);
    }

    #[test]
    fn test_spline_through_linear_knots() {
        let knots = vec![(0.0, 0.0), (4.0, 4.0), (9.0, 9.0)];
        let env = spline_envelope(&knots, 10);
        for (i, &v) in env.iter().enumerate() {
            assert!((v - i as f64).abs() < 0.5, "i={i}: {v}");
        }
    }

    #[test]
    fn test_consolidate_short_zero_pads() {
        let modes = vec![vec![1.0, 1.0], vec![2.0, 2.0], vec![3.0, 3.0]];
        let slots = consolidate_modes(&modes, 2);
        assert_eq!(slots.dim(), (IMF_SLOTS, 2));
        assert_eq!(slots[[0, 0]], 1.0);
        assert_eq!(slots[[2, 1]], 3.0);
        assert_eq!(slots[[3, 0]], 0.0);
        assert_eq!(slots[[4, 1]], 0.0);
    }

    #[test]
    fn test_consolidate_sums_high_orders_into_slot_four() {
        let modes: Vec<Vec<f64>> = (1..=7).map(|k| vec![k as f64; 3]).collect();
        let slots = consolidate_modes(&modes, 3);
        // Slots 0-3 hold components 1-4 unchanged.
        for k in 0..4 {
            assert_eq!(slots[[k, 0]], (k + 1) as f64);
        }
        // Slot 4 = component 5 + component 6 + residue (7).
        assert_eq!(slots[[4, 0]], 5.0 + 6.0 + 7.0);
    }

    #[test]
    fn test_consolidation_conserves_component_sum() {
        let extractor = EmdExtractor::default();
        let signal = two_tone(512);
        let modes = extractor.decompose(&signal);
        let slots = consolidate_modes(&modes, signal.len());

        for j in 0..signal.len() {
            let full: f64 = modes.iter().map(|m| m[j]).sum();
            let kept: f64 = (0..IMF_SLOTS).map(|k| slots[[k, j]]).sum();
            assert!((full - kept).abs() < 1e-9, "j={j}");
        }
    }

    #[test]
    fn test_decompose_window_flags_short_samples() {
        let extractor = EmdExtractor::default();
        let ramp = Array1::from_shape_fn(300, |i| i as f64 * 0.01);
        let (tensor, record) = extractor.decompose_window(7, ramp.view(), ramp.view());

        assert_eq!(tensor.dim(), (TENSOR_CHANNELS, 1, 300));
        let record = record.expect("monotone window must be flagged");
        assert_eq!(record.window, 7);
        assert_eq!(record.input_modes, 1);
        assert_eq!(record.label_modes, 1);

        // The single residue lands in slot 0 of each channel block.
        assert_eq!(tensor[[0, 0, 10]], ramp[10]);
        assert_eq!(tensor[[IMF_SLOTS, 0, 10]], ramp[10]);
        assert_eq!(tensor[[1, 0, 10]], 0.0);
    }

    #[test]
    fn test_extract_shape_and_errors() {
        let extractor = EmdExtractor::default();
        let dataset = Array4::from_shape_fn((3, 2, 4, 128), |(w, r, _, j)| {
            let t = j as f64 / 128.0;
            (2.0 * PI * (w + r + 2) as f64 * t).sin()
        });
        let out = extractor.extract(&dataset).unwrap();
        assert_eq!(out.tensors.dim(), (3, TENSOR_CHANNELS, 1, 128));

        let empty = Array4::<f64>::zeros((0, 2, 4, 128));
        assert!(extractor.extract(&empty).is_err());

        let unpaired = Array4::<f64>::zeros((3, 1, 4, 128));
        assert!(extractor.extract(&unpaired).is_err());
    }
}
