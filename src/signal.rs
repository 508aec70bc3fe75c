//! Raw signal ownership and synthetic channel generation.
//!
//! A [`SignalStore`] owns the per-channel recordings of one logical
//! recording-set: a primary ECG channel, an EMG noise channel, and a
//! three-axis accelerometer block. It is constructed once at pipeline start
//! and read-only thereafter; every transformation produces a new array.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::error::{PipelineError, Result};

/// Number of accelerometer axes in a recording-set.
pub const ACC_AXES: usize = 3;

/// Standard deviation of the synthetic resting-accelerometer noise used as
/// the label-side accelerometer channels.
pub const REST_ACC_SIGMA: f64 = 0.05;

/// Role a channel plays in the dataset, selecting its normalization scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelRole {
    /// The clean ECG channel. Normalized to `[-1, 1]`.
    Primary,
    /// The EMG noise channel. Normalized then scaled by the noise level.
    Noise,
    /// An accelerometer axis. Normalized then scaled by the square root of
    /// the noise level.
    Accelerometer,
}

/// Owns the raw per-channel signal arrays of one recording-set.
#[derive(Debug, Clone)]
pub struct SignalStore {
    ecg: Array1<f64>,
    emg: Array1<f64>,
    acc: Array2<f64>,
}

impl SignalStore {
    /// Build a store from raw channel arrays.
    ///
    /// `acc` must have exactly [`ACC_AXES`] rows; its column count and the
    /// EMG length may be shorter than the ECG (they are tiled later), but no
    /// channel may be empty.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidInput`] for an empty channel and
    /// [`PipelineError::ShapeMismatch`] for a wrong accelerometer row count.
    pub fn new(ecg: Array1<f64>, emg: Array1<f64>, acc: Array2<f64>) -> Result<Self> {
        if ecg.is_empty() {
            return Err(PipelineError::invalid_input("ECG channel is empty"));
        }
        if emg.is_empty() {
            return Err(PipelineError::invalid_input("EMG channel is empty"));
        }
        if acc.nrows() != ACC_AXES {
            return Err(PipelineError::shape_mismatch(format!(
                "expected {ACC_AXES} accelerometer axes, got {}",
                acc.nrows()
            )));
        }
        if acc.ncols() == 0 {
            return Err(PipelineError::invalid_input(
                "accelerometer channels are empty",
            ));
        }
        Ok(Self { ecg, emg, acc })
    }

    /// The primary ECG channel.
    #[must_use]
    pub fn ecg(&self) -> ArrayView1<'_, f64> {
        self.ecg.view()
    }

    /// The EMG noise channel.
    #[must_use]
    pub fn emg(&self) -> ArrayView1<'_, f64> {
        self.emg.view()
    }

    /// The accelerometer block, one axis per row.
    #[must_use]
    pub fn acc(&self) -> ArrayView2<'_, f64> {
        self.acc.view()
    }

    /// Total sample count of the recording-set, defined by the primary
    /// channel.
    #[must_use]
    pub fn samples(&self) -> usize {
        self.ecg.len()
    }

    /// Generate the synthetic resting-accelerometer block used as the
    /// label-side accelerometer channels: `rows × len` samples drawn from
    /// `N(0, sigma)` with an explicit seed.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if `sigma` is not a valid
    /// standard deviation.
    pub fn clean_accelerometer(
        rows: usize,
        len: usize,
        sigma: f64,
        seed: u64,
    ) -> Result<Array2<f64>> {
        let normal = Normal::new(0.0, sigma).map_err(|e| {
            PipelineError::invalid_config(format!("invalid accelerometer noise sigma: {e}"))
        })?;
        let mut rng = StdRng::seed_from_u64(seed);
        Ok(Array2::from_shape_simple_fn((rows, len), || {
            normal.sample(&mut rng)
        }))
    }
}
