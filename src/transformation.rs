//! Data transformation stage
//!
//! Loads the train and test tables, fits a fresh preprocessor on the
//! training features only, and returns both tables as numeric arrays with
//! the target appended as the last column.

use ndarray::{concatenate, Array1, Array2, Axis};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::{FeatureSchema, PipelineConfig};
use crate::error::{GradecastError, Result};
use crate::export::ArtifactStore;
use crate::preprocessing::{build_preprocessor, numeric_values, DataPreprocessor};
use crate::utils::{DataLoader, Timer};

/// What the transformation stage hands to the trainer
#[derive(Debug, Clone)]
pub struct TransformationOutput {
    /// `[features..., target]` for the training rows
    pub train_array: Array2<f64>,
    /// `[features..., target]` for the test rows
    pub test_array: Array2<f64>,
    /// Where the fitted preprocessor is staged
    pub preprocessor_path: PathBuf,
    pub preprocessor: DataPreprocessor,
}

/// Separate a table into its feature columns and its numeric target.
///
/// Every declared column must be present and every target value set.
pub fn split_features_target(df: &DataFrame, schema: &FeatureSchema) -> Result<(DataFrame, Array1<f64>)> {
    let feature_columns = schema.feature_columns();
    for name in &feature_columns {
        if df.column(name).is_err() {
            return Err(GradecastError::schema(*name, "feature column not found"));
        }
    }

    let target = df
        .column(&schema.target_column)
        .map_err(|_| GradecastError::schema(&schema.target_column, "target column not found"))?;
    let target = numeric_values(target.as_materialized_series())?
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.ok_or_else(|| {
                GradecastError::schema(&schema.target_column, format!("missing target value at row {}", row))
            })
        })
        .collect::<Result<Array1<f64>>>()?;

    let features = df.select(feature_columns)?;
    Ok((features, target))
}

/// Append `target` to `features` as the final column
pub fn append_target(features: &Array2<f64>, target: &Array1<f64>) -> Result<Array2<f64>> {
    if features.nrows() != target.len() {
        return Err(GradecastError::ShapeError {
            expected: format!("{} target values", features.nrows()),
            actual: format!("{} target values", target.len()),
        });
    }
    let target_column = target.view().insert_axis(Axis(1));
    Ok(concatenate(Axis(1), &[features.view(), target_column])?)
}

/// The transformation stage
pub struct DataTransformation {
    config: PipelineConfig,
    loader: DataLoader,
}

impl DataTransformation {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            loader: DataLoader::new(),
        }
    }

    /// Unfitted preprocessor for the configured schema
    pub fn get_preprocessor(&self) -> Result<DataPreprocessor> {
        build_preprocessor(
            &self.config.schema.numerical_columns,
            &self.config.schema.categorical_columns,
            self.config.transformation.preprocessing.clone(),
        )
    }

    /// Transform already loaded tables; the preprocessor is fitted on `train_df` only
    pub fn transform_frames(
        &self,
        train_df: &DataFrame,
        test_df: &DataFrame,
    ) -> Result<(Array2<f64>, Array2<f64>, DataPreprocessor)> {
        let schema = &self.config.schema;
        let (train_features, train_target) = split_features_target(train_df, schema)?;
        let (test_features, test_target) = split_features_target(test_df, schema)?;

        let mut preprocessor = self.get_preprocessor()?;
        let train_x = preprocessor.fit_transform(&train_features)?;
        let test_x = preprocessor.transform(&test_features)?;

        let train_array = append_target(&train_x, &train_target)?;
        let test_array = append_target(&test_x, &test_target)?;
        Ok((train_array, test_array, preprocessor))
    }

    /// Run the stage on two CSV files, staging the fitted preprocessor in `store`
    pub fn initiate(
        &self,
        train_path: impl AsRef<Path>,
        test_path: impl AsRef<Path>,
        store: &mut ArtifactStore,
    ) -> Result<TransformationOutput> {
        let timer = Timer::new("data_transformation");

        let train_df = self.loader.load_csv(train_path.as_ref())?;
        let test_df = self.loader.load_csv(test_path.as_ref())?;
        info!(train_rows = train_df.height(), test_rows = test_df.height(), "Read train and test data");

        let (train_array, test_array, preprocessor) = self.transform_frames(&train_df, &test_df)?;

        let preprocessor_path = store.stage(self.config.preprocessor_path(), &preprocessor)?;
        info!(
            path = %preprocessor_path.display(),
            n_features = preprocessor.n_features_out(),
            elapsed_secs = timer.elapsed_secs(),
            "Data transformation complete"
        );

        Ok(TransformationOutput {
            train_array,
            test_array,
            preprocessor_path,
            preprocessor,
        })
    }
}
