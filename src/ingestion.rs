//! Data ingestion stage: one seeded train/test split of a raw CSV

use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::PipelineConfig;
use crate::error::{GradecastError, Result};
use crate::utils::{DataLoader, DataSaver};

#[derive(Debug, Clone)]
pub struct IngestionOutput {
    pub raw_path: PathBuf,
    pub train_path: PathBuf,
    pub test_path: PathBuf,
    pub n_train: usize,
    pub n_test: usize,
}

/// Row indices of the train and test parts, shuffled with `seed`.
///
/// The test part holds `ceil(n * test_size)` rows; both parts are non-empty
/// whenever `n >= 2`.
pub fn train_test_indices(n: usize, test_size: f64, seed: u64) -> Result<(Vec<IdxSize>, Vec<IdxSize>)> {
    if n < 2 {
        return Err(GradecastError::DataError(format!(
            "need at least 2 rows to split, got {}",
            n
        )));
    }
    let n_test = ((n as f64 * test_size).ceil() as usize).clamp(1, n - 1);

    let mut indices: Vec<IdxSize> = (0..n as IdxSize).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test = indices.split_off(n - n_test);
    Ok((indices, test))
}

pub struct DataIngestion {
    config: PipelineConfig,
    loader: DataLoader,
}

impl DataIngestion {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            loader: DataLoader::new(),
        }
    }

    /// Split an in-memory table into train and test tables
    pub fn split(&self, df: &DataFrame) -> Result<(DataFrame, DataFrame)> {
        let (train_idx, test_idx) = train_test_indices(
            df.height(),
            self.config.ingestion.test_size,
            self.config.ingestion.random_state,
        )?;
        let train = df.take(&IdxCa::from_vec("idx".into(), train_idx))?;
        let test = df.take(&IdxCa::from_vec("idx".into(), test_idx))?;
        Ok((train, test))
    }

    /// Read `raw_path`, then write raw, train and test CSVs under the artifacts directory
    pub fn initiate(&self, raw_path: impl AsRef<Path>) -> Result<IngestionOutput> {
        let mut raw = self.loader.load_csv(raw_path.as_ref())?;
        info!(path = %raw_path.as_ref().display(), rows = raw.height(), "Read raw dataset");

        let (mut train, mut test) = self.split(&raw)?;

        let raw_out = self.config.raw_data_path();
        let train_out = self.config.train_data_path();
        let test_out = self.config.test_data_path();
        DataSaver::save_csv(&mut raw, &raw_out)?;
        DataSaver::save_csv(&mut train, &train_out)?;
        DataSaver::save_csv(&mut test, &test_out)?;

        info!(n_train = train.height(), n_test = test.height(), "Ingestion complete");
        Ok(IngestionOutput {
            raw_path: raw_out,
            train_path: train_out,
            test_path: test_out,
            n_train: train.height(),
            n_test: test.height(),
        })
    }
}
