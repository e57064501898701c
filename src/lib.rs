//! gradecast - exam-score regression training pipeline
//!
//! This crate provides a batch pipeline that:
//! - splits a raw table into train and test parts
//! - builds and fits a column-wise preprocessor (impute, scale, one-hot)
//! - trains a fixed set of candidate regressors and keeps the best by R²
//! - persists the fitted preprocessor and model as JSON artifacts
//!
//! # Modules
//!
//! - [`preprocessing`] - Imputation, scaling, one-hot encoding
//! - [`transformation`] - The data transformation stage
//! - [`training`] - Candidate regressors, evaluation and the training stage
//! - [`ingestion`] - Seeded train/test split of a raw CSV
//! - [`pipeline`] - End-to-end run with transactional artifacts
//! - [`export`] - Artifact persistence
//! - [`config`] - Pipeline configuration
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Configuration
pub mod config;

// Stages
pub mod preprocessing;
pub mod transformation;
pub mod training;
pub mod ingestion;
pub mod pipeline;

// Persistence
pub mod export;

// Services
pub mod cli;

// Utilities
pub mod utils;

pub use error::{GradecastError, Result};
pub use config::{FeatureSchema, PipelineConfig};
pub use pipeline::{PipelineOutput, TrainingPipeline};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Commonly used items
pub mod prelude {
    pub use crate::config::{FeatureSchema, PipelineConfig};
    pub use crate::error::{GradecastError, Result};
    pub use crate::export::{ArtifactStore, ModelArtifact};
    pub use crate::ingestion::DataIngestion;
    pub use crate::pipeline::{PipelineOutput, TrainingPipeline};
    pub use crate::preprocessing::{build_preprocessor, DataPreprocessor, PreprocessingConfig, UnknownCategory};
    pub use crate::training::{
        evaluate_models, ModelReport, ModelTrainer, Regressor, TrainedModel, TrainingSummary,
    };
    pub use crate::transformation::DataTransformation;
}
