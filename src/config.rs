//! Experiment configuration for the extraction pipeline.
//!
//! This module provides the [`DatasetConfig`] struct which centralizes every
//! tunable parameter of a pipeline run. A config is constructed once per
//! experiment and passed by reference into every stage, so the windowing
//! transform and its inverse are guaranteed to use the same parameters.
//!
//! # Example
//!
//! ```
//! use ecg_emd::{DatasetConfig, Motion, WindowLayout};
//!
//! let config = DatasetConfig::default()
//!     .with_noise_level(2.0)
//!     .with_motion(Motion::Walking);
//!
//! assert!(config.validate().is_ok());
//! assert_eq!(config.feature_len, 300);
//! assert_eq!(config.layout, WindowLayout::Stacked);
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Default window length in samples.
pub const DEFAULT_FEATURE_LEN: usize = 300;

/// Default train/validation ratio (4 training windows per validation window).
pub const DEFAULT_SPLIT_RATIO: usize = 4;

/// Default seed for shuffling and synthetic noise generation.
pub const DEFAULT_SEED: u64 = 42;

/// Denoising model family the dataset is being prepared for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ModelKind {
    /// Two-layer convolutional denoising autoencoder.
    #[default]
    ConvAutoencoder,
    /// Ensemble of convolutional autoencoders with shared input.
    EnsembleConvAutoencoder,
    /// Fully-connected autoencoder (flat windows).
    DenseAutoencoder,
}

/// Motion condition of the EMG/accelerometer noise recordings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Motion {
    /// All motion conditions pooled together.
    #[default]
    Mixed,
    /// Subject at rest.
    Stationary,
    /// Walking pace.
    Walking,
    /// Running pace.
    Running,
}

/// Window packing layout used by the reformat transform.
///
/// The two layouts are distinct enumerated configurations dispatched by
/// exhaustive matching, not a type hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum WindowLayout {
    /// 1-D packing: one channel group per window, shape
    /// `(windows, channels, 1, feature_len)`. Suited to dense models.
    Flat,
    /// 2-D packing: channel roles stacked per window, shape
    /// `(windows, 1, channels, feature_len)`. Suited to convolutional
    /// models; required for paired input/label extraction.
    #[default]
    Stacked,
}

/// Immutable description of one dataset-preparation experiment.
///
/// # Parameters
///
/// - `noise_level`: amplitude of the injected EMG noise relative to the
///   normalized ECG. Accelerometer channels scale by its square root.
/// - `feature_len`: window length in samples. The total signal length must
///   be an exact multiple; the pipeline errors rather than truncating.
/// - `split_ratio`: ratio `r` giving `|val| = windows / (r + 1)`.
/// - `seed`: seeds both the split shuffle and the synthetic resting
///   accelerometer noise, making runs reproducible.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DatasetConfig {
    /// Target model family.
    pub model: ModelKind,

    /// Motion condition of the noise recordings.
    pub motion: Motion,

    /// Synthetic noise amplitude. Non-negative.
    pub noise_level: f64,

    /// Window length in samples.
    pub feature_len: usize,

    /// Window packing layout.
    pub layout: WindowLayout,

    /// Train/validation ratio. Must be at least 1.
    pub split_ratio: usize,

    /// Whether to permute window order before splitting.
    pub shuffle: bool,

    /// Seed for all randomness in the run.
    pub seed: u64,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            model: ModelKind::ConvAutoencoder,
            motion: Motion::Mixed,
            noise_level: 1.0,
            feature_len: DEFAULT_FEATURE_LEN,
            layout: WindowLayout::Stacked,
            split_ratio: DEFAULT_SPLIT_RATIO,
            shuffle: true,
            seed: DEFAULT_SEED,
        }
    }
}

impl DatasetConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if any parameter is out of
    /// its valid range.
    pub fn validate(&self) -> Result<()> {
        if !self.noise_level.is_finite() || self.noise_level < 0.0 {
            return Err(PipelineError::invalid_config(
                "noise_level must be a non-negative finite number",
            ));
        }
        if self.feature_len == 0 {
            return Err(PipelineError::invalid_config(
                "feature_len must be at least 1",
            ));
        }
        if self.split_ratio == 0 {
            return Err(PipelineError::invalid_config(
                "split_ratio must be at least 1",
            ));
        }
        Ok(())
    }

    /// Set the model family.
    #[must_use]
    pub const fn with_model(mut self, model: ModelKind) -> Self {
        self.model = model;
        self
    }

    /// Set the motion condition.
    #[must_use]
    pub const fn with_motion(mut self, motion: Motion) -> Self {
        self.motion = motion;
        self
    }

    /// Set the noise level.
    #[must_use]
    pub const fn with_noise_level(mut self, noise_level: f64) -> Self {
        self.noise_level = noise_level;
        self
    }

    /// Set the window length.
    #[must_use]
    pub const fn with_feature_len(mut self, feature_len: usize) -> Self {
        self.feature_len = feature_len;
        self
    }

    /// Set the window layout.
    #[must_use]
    pub const fn with_layout(mut self, layout: WindowLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Set the train/validation ratio.
    #[must_use]
    pub const fn with_split_ratio(mut self, split_ratio: usize) -> Self {
        self.split_ratio = split_ratio;
        self
    }

    /// Enable or disable shuffling before the split.
    #[must_use]
    pub const fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Set the seed for shuffling and synthetic noise.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
