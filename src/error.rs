//! Error types for the EMD extraction pipeline.
//!
//! Stage-boundary failures (configuration, shape preconditions, filesystem)
//! abort the run. Degenerate per-window decompositions are *not* errors; they
//! are recorded as [`crate::emd::ShortSampleRecord`]s and processing continues.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for pipeline operations.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Input validation errors.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A channel is all-zero or constant, so amplitude scaling would divide
    /// by zero.
    #[error("Constant channel: {context}")]
    ConstantChannel { context: String },

    /// A noise channel cannot be tiled to the primary signal length by a
    /// whole number of repeats.
    #[error("Cannot tile channel of {secondary} samples to {primary} (ratio is not an integer)")]
    TilingMismatch { primary: usize, secondary: usize },

    /// The sample count is not an exact multiple of the window length.
    #[error("Signal length {total_len} is not a multiple of feature_len {feature_len}")]
    WindowRemainder { total_len: usize, feature_len: usize },

    /// An array has a shape incompatible with the requested operation.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Filesystem access failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Writing an `.npy` artifact failed.
    #[error("Artifact write failed: {0}")]
    ArtifactWrite(#[from] ndarray_npy::WriteNpyError),

    /// Reading an `.npy` artifact failed.
    #[error("Artifact read failed: {0}")]
    ArtifactRead(#[from] ndarray_npy::ReadNpyError),
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    /// Create an invalid input error.
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a constant channel error.
    #[must_use]
    pub fn constant_channel(context: impl Into<String>) -> Self {
        Self::ConstantChannel {
            context: context.into(),
        }
    }

    /// Create a tiling mismatch error.
    #[must_use]
    pub const fn tiling_mismatch(primary: usize, secondary: usize) -> Self {
        Self::TilingMismatch { primary, secondary }
    }

    /// Create a window remainder error.
    #[must_use]
    pub const fn window_remainder(total_len: usize, feature_len: usize) -> Self {
        Self::WindowRemainder {
            total_len,
            feature_len,
        }
    }

    /// Create a shape mismatch error.
    #[must_use]
    pub fn shape_mismatch(msg: impl Into<String>) -> Self {
        Self::ShapeMismatch(msg.into())
    }

    /// Create an I/O error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
