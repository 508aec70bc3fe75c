//! Durable persistence of extraction results.
//!
//! Each noise-level configuration gets its own directory under the store
//! root, holding four `.npy` artifacts: the train/validation IMF tensors and
//! their paired short-sample lists. File names and the `EMDs_<noiselevel>`
//! key match what the downstream training stage expects. Saving the same
//! key twice overwrites the previous artifacts.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use ndarray::{Array2, Array4};
use ndarray_npy::{ReadNpyExt, WriteNpyExt};
use tracing::info;

use crate::emd::{EmdDataset, ShortSampleRecord};
use crate::error::{PipelineError, Result};

/// Which half of the split an artifact belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subset {
    Train,
    Validation,
}

impl Subset {
    /// File name of the IMF tensor artifact.
    #[must_use]
    pub const fn tensor_file(self) -> &'static str {
        match self {
            Self::Train => "EMDs_train.npy",
            Self::Validation => "EMDs_val.npy",
        }
    }

    /// File name of the short-sample list artifact.
    #[must_use]
    pub const fn short_list_file(self) -> &'static str {
        match self {
            Self::Train => "short_list_train.npy",
            Self::Validation => "short_list_val.npy",
        }
    }
}

/// Writes and reads extraction artifacts under a root directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Create a store rooted at `root`. Nothing is touched on disk until
    /// the first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the artifacts for one noise-level key.
    #[must_use]
    pub fn artifact_dir(&self, noise_level: f64) -> PathBuf {
        self.root.join(format!("EMDs_{noise_level}"))
    }

    /// Persist the four artifacts of one run and return the artifact
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Io`] when the directory cannot be created or
    /// a file cannot be opened, and [`PipelineError::ArtifactWrite`] for
    /// `.npy` encoding failures. No partial artifact set is valid.
    pub fn save(
        &self,
        noise_level: f64,
        train: &EmdDataset,
        val: &EmdDataset,
    ) -> Result<PathBuf> {
        let dir = self.artifact_dir(noise_level);
        fs::create_dir_all(&dir).map_err(|e| PipelineError::io(&dir, e))?;

        write_tensor(&dir.join(Subset::Train.tensor_file()), &train.tensors)?;
        write_short_list(
            &dir.join(Subset::Train.short_list_file()),
            &train.short_samples,
        )?;
        write_tensor(&dir.join(Subset::Validation.tensor_file()), &val.tensors)?;
        write_short_list(
            &dir.join(Subset::Validation.short_list_file()),
            &val.short_samples,
        )?;

        info!(
            dir = %dir.display(),
            train_windows = train.tensors.dim().0,
            val_windows = val.tensors.dim().0,
            "EMD artifacts saved"
        );
        Ok(dir)
    }

    /// Load a saved IMF tensor back from disk.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Io`] for a missing file and
    /// [`PipelineError::ArtifactRead`] for a malformed one.
    pub fn load_tensors(&self, noise_level: f64, subset: Subset) -> Result<Array4<f64>> {
        let path = self.artifact_dir(noise_level).join(subset.tensor_file());
        let file = File::open(&path).map_err(|e| PipelineError::io(&path, e))?;
        Ok(Array4::read_npy(file)?)
    }

    /// Load a saved short-sample list back from disk.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`ArtifactStore::load_tensors`], plus
    /// [`PipelineError::ShapeMismatch`] for a record array without three
    /// columns.
    pub fn load_short_list(
        &self,
        noise_level: f64,
        subset: Subset,
    ) -> Result<Vec<ShortSampleRecord>> {
        let path = self
            .artifact_dir(noise_level)
            .join(subset.short_list_file());
        let file = File::open(&path).map_err(|e| PipelineError::io(&path, e))?;
        let rows: Array2<u64> = Array2::read_npy(file)?;
        if rows.ncols() != 3 {
            return Err(PipelineError::shape_mismatch(format!(
                "short-sample list expects 3 columns, got {}",
                rows.ncols()
            )));
        }
        Ok(rows
            .rows()
            .into_iter()
            .map(|row| ShortSampleRecord {
                window: row[0] as usize,
                input_modes: row[1] as usize,
                label_modes: row[2] as usize,
            })
            .collect())
    }
}

fn write_tensor(path: &Path, tensors: &Array4<f64>) -> Result<()> {
    let file = File::create(path).map_err(|e| PipelineError::io(path, e))?;
    tensors.write_npy(file)?;
    Ok(())
}

fn write_short_list(path: &Path, records: &[ShortSampleRecord]) -> Result<()> {
    let mut rows = Array2::<u64>::zeros((records.len(), 3));
    for (i, r) in records.iter().enumerate() {
        rows[[i, 0]] = r.window as u64;
        rows[[i, 1]] = r.input_modes as u64;
        rows[[i, 2]] = r.label_modes as u64;
    }
    let file = File::create(path).map_err(|e| PipelineError::io(path, e))?;
    rows.write_npy(file)?;
    Ok(())
}
