//! Pipeline configuration
//!
//! One [`PipelineConfig`] is built (from defaults, a JSON file, or CLI flags)
//! and handed to each stage. Stages never read global state.

use crate::error::{GradecastError, Result};
use crate::preprocessing::PreprocessingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which columns the pipeline reads and what it predicts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureSchema {
    pub numerical_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
    pub target_column: String,
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self {
            numerical_columns: vec!["reading_score".to_string(), "writing_score".to_string()],
            categorical_columns: vec![
                "gender".to_string(),
                "race_ethnicity".to_string(),
                "parental_level_of_education".to_string(),
                "lunch".to_string(),
                "test_preparation_course".to_string(),
            ],
            target_column: "math_score".to_string(),
        }
    }
}

impl FeatureSchema {
    pub fn new(
        numerical_columns: Vec<String>,
        categorical_columns: Vec<String>,
        target_column: impl Into<String>,
    ) -> Self {
        Self {
            numerical_columns,
            categorical_columns,
            target_column: target_column.into(),
        }
    }

    /// Numerical columns followed by categorical columns
    pub fn feature_columns(&self) -> Vec<&str> {
        self.numerical_columns
            .iter()
            .chain(self.categorical_columns.iter())
            .map(|s| s.as_str())
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.target_column.is_empty() {
            return Err(GradecastError::ConfigError("target column must be named".to_string()));
        }
        if self.feature_columns().contains(&self.target_column.as_str()) {
            return Err(GradecastError::ConfigError(format!(
                "target column '{}' is also listed as a feature",
                self.target_column
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataIngestionConfig {
    /// Fraction of rows held out for testing
    pub test_size: f64,
    pub random_state: u64,
    pub raw_file: String,
    pub train_file: String,
    pub test_file: String,
}

impl Default for DataIngestionConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            random_state: 42,
            raw_file: "raw.csv".to_string(),
            train_file: "train.csv".to_string(),
            test_file: "test.csv".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataTransformationConfig {
    pub preprocessor_file: String,
    pub preprocessing: PreprocessingConfig,
}

impl Default for DataTransformationConfig {
    fn default() -> Self {
        Self {
            preprocessor_file: "preprocessor.json".to_string(),
            preprocessing: PreprocessingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelTrainerConfig {
    pub model_file: String,
    /// Minimum test R² the best candidate must reach
    pub min_r2: f64,
    /// Seed shared by every randomized candidate
    pub random_state: u64,
    /// Evaluate candidates on the rayon pool
    pub parallel: bool,
}

impl Default for ModelTrainerConfig {
    fn default() -> Self {
        Self {
            model_file: "model.json".to_string(),
            min_r2: 0.6,
            random_state: 42,
            parallel: true,
        }
    }
}

/// Configuration for a whole pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub artifacts_dir: PathBuf,
    pub schema: FeatureSchema,
    pub ingestion: DataIngestionConfig,
    pub transformation: DataTransformationConfig,
    pub trainer: ModelTrainerConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            artifacts_dir: PathBuf::from("artifacts"),
            schema: FeatureSchema::default(),
            ingestion: DataIngestionConfig::default(),
            transformation: DataTransformationConfig::default(),
            trainer: ModelTrainerConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_artifacts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifacts_dir = dir.into();
        self
    }

    pub fn with_schema(mut self, schema: FeatureSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_preprocessing(mut self, preprocessing: PreprocessingConfig) -> Self {
        self.transformation.preprocessing = preprocessing;
        self
    }

    pub fn with_min_r2(mut self, min_r2: f64) -> Self {
        self.trainer.min_r2 = min_r2;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.trainer.parallel = parallel;
        self
    }

    /// Seed for both the train/test split and the candidate models
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.ingestion.random_state = seed;
        self.trainer.random_state = seed;
        self
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.ingestion.test_size = test_size;
        self
    }

    pub fn preprocessor_path(&self) -> PathBuf {
        self.artifacts_dir.join(&self.transformation.preprocessor_file)
    }

    pub fn model_path(&self) -> PathBuf {
        self.artifacts_dir.join(&self.trainer.model_file)
    }

    pub fn raw_data_path(&self) -> PathBuf {
        self.artifacts_dir.join(&self.ingestion.raw_file)
    }

    pub fn train_data_path(&self) -> PathBuf {
        self.artifacts_dir.join(&self.ingestion.train_file)
    }

    pub fn test_data_path(&self) -> PathBuf {
        self.artifacts_dir.join(&self.ingestion.test_file)
    }

    pub fn validate(&self) -> Result<()> {
        self.schema.validate()?;
        if !(self.ingestion.test_size > 0.0 && self.ingestion.test_size < 1.0) {
            return Err(GradecastError::ConfigError(format!(
                "test_size must be in (0, 1), got {}",
                self.ingestion.test_size
            )));
        }
        if !self.trainer.min_r2.is_finite() {
            return Err(GradecastError::ConfigError("min_r2 must be finite".to_string()));
        }
        Ok(())
    }

    /// Read a JSON config; missing fields take their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            GradecastError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&json)
            .map_err(|e| GradecastError::ConfigError(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
