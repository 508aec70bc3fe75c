//! End-to-end orchestration of the extraction pipeline.
//!
//! Each stage is a pure transformation over the previous stage's output:
//! normalize → tile → noise injection → channel stacking → reformat →
//! input/label pairing → train/validation split → per-window EMD →
//! artifact persistence. The driver is fully non-interactive; every
//! parameter comes from the [`DatasetConfig`] supplied at construction.

use std::path::{Path, PathBuf};

use ndarray::{stack, Array2, Array4, Axis};
use tracing::info;

use crate::config::{DatasetConfig, WindowLayout};
use crate::emd::{EmdDataset, EmdExtractor, SiftSettings};
use crate::error::{PipelineError, Result};
use crate::normalize::{normalize, tile};
use crate::signal::{ChannelRole, SignalStore, ACC_AXES, REST_ACC_SIGMA};
use crate::split::split;
use crate::store::ArtifactStore;
use crate::window::{reformat, stack_pairs};
use crate::TENSOR_CHANNELS;

/// The paired, windowed datasets produced by the conditioning stages.
#[derive(Debug, Clone)]
pub struct PreparedSets {
    /// Training windows, shape `(train_windows, 2, channels, feature_len)`.
    pub train: Array4<f64>,
    /// Validation windows, same trailing shape.
    pub val: Array4<f64>,
}

/// Non-interactive pipeline driver.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: DatasetConfig,
    sift: SiftSettings,
}

impl Pipeline {
    /// Create a pipeline for one experiment configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] for an invalid config.
    pub fn new(config: DatasetConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            sift: SiftSettings::default(),
        })
    }

    /// Override the sift settings used during extraction.
    #[must_use]
    pub const fn with_sift_settings(mut self, sift: SiftSettings) -> Self {
        self.sift = sift;
        self
    }

    /// The experiment configuration this pipeline was built with.
    #[must_use]
    pub const fn config(&self) -> &DatasetConfig {
        &self.config
    }

    /// Run the conditioning stages: normalize every channel, tile the noise
    /// channels up to the primary length, inject the EMG noise into the
    /// ECG, pair input and label windows, and split.
    ///
    /// # Errors
    ///
    /// Any stage-boundary failure (constant channel, fractional tiling
    /// ratio, window remainder, bad split) aborts the run.
    pub fn prepare(&self, signals: &SignalStore) -> Result<PreparedSets> {
        if self.config.layout != WindowLayout::Stacked {
            return Err(PipelineError::invalid_config(
                "paired input/label preparation requires the stacked layout",
            ));
        }

        let noise_level = self.config.noise_level;
        let total = signals.samples();

        let clean_ecg = normalize(signals.ecg(), ChannelRole::Primary, noise_level)?;
        let emg = tile(
            normalize(signals.emg(), ChannelRole::Noise, noise_level)?.view(),
            total,
        )?;

        let mut acc_rows = Vec::with_capacity(ACC_AXES);
        for axis in signals.acc().rows() {
            let normalized = normalize(axis, ChannelRole::Accelerometer, noise_level)?;
            acc_rows.push(tile(normalized.view(), total)?);
        }

        // Label-side accelerometer is synthetic resting noise, seeded off
        // the run seed so prepare() is reproducible.
        let clean_acc = SignalStore::clean_accelerometer(
            ACC_AXES,
            total,
            REST_ACC_SIGMA,
            self.config.seed.wrapping_add(1),
        )?;

        let noisy_ecg = &clean_ecg + &emg;

        let input: Array2<f64> = stack(
            Axis(0),
            &[
                noisy_ecg.view(),
                acc_rows[0].view(),
                acc_rows[1].view(),
                acc_rows[2].view(),
            ],
        )
        .map_err(|e| PipelineError::shape_mismatch(e.to_string()))?;
        let label: Array2<f64> = stack(
            Axis(0),
            &[
                clean_ecg.view(),
                clean_acc.row(0),
                clean_acc.row(1),
                clean_acc.row(2),
            ],
        )
        .map_err(|e| PipelineError::shape_mismatch(e.to_string()))?;

        let input_windows = reformat(&input, self.config.feature_len, self.config.layout)?;
        let label_windows = reformat(&label, self.config.feature_len, self.config.layout)?;
        let paired = stack_pairs(&input_windows, &label_windows)?;
        info!(shape = ?paired.dim(), noise_level, "windowed dataset assembled");

        let (train, val) = split(
            &paired,
            self.config.split_ratio,
            self.config.shuffle,
            self.config.seed,
        )?;
        info!(
            train = train.dim().0,
            val = val.dim().0,
            "train/validation split done"
        );
        Ok(PreparedSets { train, val })
    }

    /// Run the full pipeline and persist the four artifacts under
    /// `out_root`. Returns the artifact directory.
    ///
    /// # Errors
    ///
    /// Propagates conditioning failures from [`Pipeline::prepare`] and
    /// filesystem failures from [`ArtifactStore::save`].
    pub fn run(&self, signals: &SignalStore, out_root: &Path) -> Result<PathBuf> {
        let sets = self.prepare(signals)?;

        let extractor = EmdExtractor::new(self.sift)?;
        let train = extractor.extract(&sets.train)?;
        // A small dataset can leave the validation split empty; persist an
        // empty artifact rather than aborting the run.
        let val = if sets.val.len_of(Axis(0)) == 0 {
            EmdDataset {
                tensors: Array4::zeros((0, TENSOR_CHANNELS, 1, self.config.feature_len)),
                short_samples: Vec::new(),
            }
        } else {
            extractor.extract(&sets.val)?
        };

        ArtifactStore::new(out_root).save(self.config.noise_level, &train, &val)
    }
}
