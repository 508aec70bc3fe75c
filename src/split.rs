//! Train/validation partitioning of windowed datasets.
//!
//! For ratio `r` and `n` windows, the validation set receives `n / (r + 1)`
//! windows (integer floor) and the training set the rest. With shuffling the
//! window order is permuted by a seeded RNG before slicing, so a given seed
//! always reproduces the same partition; without it the split is a
//! contiguous prefix/suffix.

use ndarray::{Array4, Axis};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use tracing::debug;

use crate::error::{PipelineError, Result};

/// Partition a windowed dataset into `(train, val)` along the window axis.
///
/// # Errors
///
/// - [`PipelineError::InvalidConfig`] when `ratio < 1`.
/// - [`PipelineError::InvalidInput`] when the dataset has no windows.
pub fn split(
    windowed: &Array4<f64>,
    ratio: usize,
    shuffle: bool,
    seed: u64,
) -> Result<(Array4<f64>, Array4<f64>)> {
    if ratio == 0 {
        return Err(PipelineError::invalid_config("split ratio must be at least 1"));
    }
    let n = windowed.len_of(Axis(0));
    if n == 0 {
        return Err(PipelineError::invalid_input("cannot split an empty dataset"));
    }

    let mut order: Vec<usize> = (0..n).collect();
    if shuffle {
        let mut rng = StdRng::seed_from_u64(seed);
        order.shuffle(&mut rng);
    }

    let val_len = n / (ratio + 1);
    let (train_idx, val_idx) = order.split_at(n - val_len);
    debug!(
        windows = n,
        train = train_idx.len(),
        val = val_idx.len(),
        shuffle,
        "split dataset"
    );

    let train = windowed.select(Axis(0), train_idx);
    let val = windowed.select(Axis(0), val_idx);
    Ok((train, val))
}
