//! End-to-end training run with all-or-nothing artifacts

use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::export::ArtifactStore;
use crate::ingestion::{DataIngestion, IngestionOutput};
use crate::training::{ModelTrainer, TrainingSummary};
use crate::transformation::{DataTransformation, TransformationOutput};

/// Everything a successful run produced
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub preprocessor_path: PathBuf,
    pub n_features: usize,
    pub summary: TrainingSummary,
}

/// Runs transformation then training, committing both artifacts only when both succeed
pub struct TrainingPipeline {
    config: PipelineConfig,
}

impl TrainingPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Split a raw CSV into train and test CSVs
    pub fn ingest(&self, raw_path: impl AsRef<Path>) -> Result<IngestionOutput> {
        DataIngestion::new(self.config.clone()).initiate(raw_path)
    }

    /// Run the transformation stage alone and commit the preprocessor
    pub fn transform(
        &self,
        train_path: impl AsRef<Path>,
        test_path: impl AsRef<Path>,
    ) -> Result<TransformationOutput> {
        let mut store = ArtifactStore::new();
        let output = DataTransformation::new(self.config.clone()).initiate(train_path, test_path, &mut store)?;
        store.commit()?;
        Ok(output)
    }

    /// Transform and train. On any failure, including the quality gate,
    /// neither artifact is written and earlier artifacts stay in place.
    pub fn run(&self, train_path: impl AsRef<Path>, test_path: impl AsRef<Path>) -> Result<PipelineOutput> {
        let mut store = ArtifactStore::new();

        let transformed = DataTransformation::new(self.config.clone()).initiate(train_path, test_path, &mut store)?;
        let summary = ModelTrainer::new(self.config.clone()).initiate(
            &transformed.train_array,
            &transformed.test_array,
            &mut store,
        )?;

        store.commit()?;
        info!(best_model = %summary.best_model, test_r2 = summary.test_r2, "Pipeline finished");

        Ok(PipelineOutput {
            preprocessor_path: transformed.preprocessor_path,
            n_features: transformed.preprocessor.n_features_out(),
            summary,
        })
    }

    /// Ingest a raw CSV, then [`run`](Self::run) on the split it produced
    pub fn run_from_raw(&self, raw_path: impl AsRef<Path>) -> Result<PipelineOutput> {
        let ingested = self.ingest(raw_path)?;
        self.run(&ingested.train_path, &ingested.test_path)
    }
}
