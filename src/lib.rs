//! ECG-EMD Dataset Pipeline
//!
//! Prepares physiological time-series (an ECG channel, EMG noise, and
//! accelerometer channels) into fixed-shape tensors for training a denoising
//! model, and decomposes each training window into a bounded set of
//! Intrinsic Mode Functions via Empirical Mode Decomposition.
//!
//! # Features
//!
//! - **Reversible windowing**: `reformat`/`undo_reformat` round-trip
//!   bit-exactly, so predictions can be compared against raw time series
//! - **Fixed-shape output**: every window contributes a `(10, 1,
//!   feature_len)` block regardless of how many IMFs sifting found
//! - **Degenerate-case bookkeeping**: windows with fewer than five true
//!   components are zero-padded and flagged, never dropped or fatal
//! - **Reproducible**: shuffling and synthetic noise are explicitly seeded
//! - **Parallel extraction**: per-window sifting runs as a rayon map
//!
//! # Quick Start
//!
//! ```no_run
//! use ecg_emd::{DatasetConfig, Pipeline, SignalStore, ACC_AXES};
//! use ndarray::{Array1, Array2};
//!
//! let ecg = Array1::from_shape_fn(240_000, |i| (i as f64 * 0.01).sin());
//! let emg = Array1::from_shape_fn(10_000, |i| (i as f64 * 0.7).sin());
//! let acc = Array2::from_shape_fn((ACC_AXES, 10_000), |(a, i)| {
//!     ((a + 1) as f64 * i as f64 * 0.3).sin()
//! });
//! let signals = SignalStore::new(ecg, emg, acc)?;
//!
//! let config = DatasetConfig::default().with_noise_level(1.0);
//! let artifact_dir = Pipeline::new(config)?.run(&signals, "Trained_Params".as_ref())?;
//! # Ok::<(), ecg_emd::PipelineError>(())
//! ```
//!
//! # Output contract
//!
//! The training collaborator receives tensors of shape `(windows, 10, 1,
//! feature_len)` — slots 0–4 hold the input channel's consolidated IMFs,
//! slots 5–9 the label channel's — and must apply [`undo_reformat`] with
//! the creation-time `feature_len`/layout to recover time-domain signals.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

pub mod config;
pub mod emd;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod signal;
pub mod split;
pub mod store;
pub mod window;

// Re-exports for convenient access
pub use config::{
    DatasetConfig, ModelKind, Motion, WindowLayout, DEFAULT_FEATURE_LEN, DEFAULT_SEED,
    DEFAULT_SPLIT_RATIO,
};
pub use emd::{consolidate_modes, EmdDataset, EmdExtractor, ShortSampleRecord, SiftSettings};
pub use error::{PipelineError, Result};
pub use normalize::{normalize, tile};
pub use pipeline::{Pipeline, PreparedSets};
pub use signal::{ChannelRole, SignalStore, ACC_AXES, REST_ACC_SIGMA};
pub use split::split;
pub use store::{ArtifactStore, Subset};
pub use window::{reformat, stack_pairs, undo_reformat};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// IMF slots per channel; higher orders are consolidated into the last slot.
pub const IMF_SLOTS: usize = 5;

/// Channel count of each output tensor entry (input + label slot blocks).
pub const TENSOR_CHANNELS: usize = 2 * IMF_SLOTS;
