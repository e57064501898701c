//! Column-wise preprocessing pipeline

use crate::error::{GradecastError, Result};
use super::{
    config::PreprocessingConfig,
    imputer::{Imputer, ImputeStrategy},
    scaler::Scaler,
    encoder::Encoder,
    FeatureStats, ColumnType,
};
use ndarray::{concatenate, Array2, Axis};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Build an unfitted preprocessor for the declared feature lists.
///
/// Numeric columns are median-imputed and standardized; categorical columns
/// are imputed with their most frequent value and one-hot encoded. The output
/// of `transform` is `[numeric..., one-hot blocks in declared order...]`.
pub fn build_preprocessor(
    numeric_columns: &[String],
    categorical_columns: &[String],
    config: PreprocessingConfig,
) -> Result<DataPreprocessor> {
    if numeric_columns.is_empty() {
        return Err(GradecastError::ConfigError("no numerical columns declared".to_string()));
    }
    if categorical_columns.is_empty() {
        return Err(GradecastError::ConfigError("no categorical columns declared".to_string()));
    }

    let mut seen_numeric = HashSet::new();
    for name in numeric_columns {
        if !seen_numeric.insert(name.as_str()) {
            return Err(GradecastError::ConfigError(format!(
                "numerical column '{}' declared twice",
                name
            )));
        }
    }

    let mut seen_categorical = HashSet::new();
    for name in categorical_columns {
        if !seen_categorical.insert(name.as_str()) {
            return Err(GradecastError::ConfigError(format!(
                "categorical column '{}' declared twice",
                name
            )));
        }
        if seen_numeric.contains(name.as_str()) {
            return Err(GradecastError::ConfigError(format!(
                "column '{}' declared both numerical and categorical",
                name
            )));
        }
    }

    if config.categorical_impute_strategy != ImputeStrategy::MostFrequent {
        return Err(GradecastError::ConfigError(format!(
            "{:?} imputation is not defined for categorical columns",
            config.categorical_impute_strategy
        )));
    }

    Ok(DataPreprocessor::with_columns(
        config,
        numeric_columns.to_vec(),
        categorical_columns.to_vec(),
    ))
}

/// Fitted column-wise preprocessor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPreprocessor {
    config: PreprocessingConfig,
    numeric_columns: Vec<String>,
    categorical_columns: Vec<String>,
    numeric_imputer: Imputer,
    categorical_imputer: Imputer,
    scaler: Scaler,
    encoder: Encoder,
    feature_stats: Vec<FeatureStats>,
    is_fitted: bool,
    /// Seconds spent in the fit call
    fit_time: Option<f64>,
    samples_fitted: usize,
}

impl DataPreprocessor {
    fn with_columns(
        config: PreprocessingConfig,
        numeric_columns: Vec<String>,
        categorical_columns: Vec<String>,
    ) -> Self {
        Self {
            numeric_imputer: Imputer::new(config.numeric_impute_strategy.clone()),
            categorical_imputer: Imputer::new(config.categorical_impute_strategy.clone()),
            scaler: Scaler::new(),
            encoder: Encoder::new(config.unknown_category),
            config,
            numeric_columns,
            categorical_columns,
            feature_stats: Vec::new(),
            is_fitted: false,
            fit_time: None,
            samples_fitted: 0,
        }
    }

    /// Learn every column statistic from the training features.
    ///
    /// A preprocessor is fitted once; a second call is an error.
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        if self.is_fitted {
            return Err(GradecastError::PreprocessingError(
                "preprocessor is already fitted".to_string(),
            ));
        }
        if df.height() == 0 {
            return Err(GradecastError::PreprocessingError(
                "cannot fit on an empty table".to_string(),
            ));
        }

        let start = Instant::now();
        let numeric = Self::as_strs(&self.numeric_columns);
        let categorical = Self::as_strs(&self.categorical_columns);

        let mut feature_stats = Vec::with_capacity(numeric.len() + categorical.len());
        for name in &numeric {
            feature_stats.push(FeatureStats::from_column(df, name, ColumnType::Numeric)?);
        }
        for name in &categorical {
            feature_stats.push(FeatureStats::from_column(df, name, ColumnType::Categorical)?);
        }

        let imputed = self.numeric_imputer.fit_transform(df, &numeric)?;
        self.scaler.fit(&imputed, &numeric)?;

        let imputed = self.categorical_imputer.fit_transform(df, &categorical)?;
        self.encoder.fit(&imputed, &categorical)?;

        self.feature_stats = feature_stats;
        self.is_fitted = true;
        self.samples_fitted = df.height();
        self.fit_time = Some(start.elapsed().as_secs_f64());

        info!(
            rows = df.height(),
            n_features = self.n_features_out(),
            "Fitted preprocessor"
        );
        Ok(self)
    }

    /// Apply the fitted statistics to a table, returning the feature matrix
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(GradecastError::ModelNotFitted);
        }

        let numeric = self.scaler.transform(&self.numeric_imputer.transform(df)?)?;
        let categorical = self.encoder.transform(&self.categorical_imputer.transform(df)?)?;

        let out = concatenate(Axis(1), &[numeric.view(), categorical.view()])?;
        debug!(rows = out.nrows(), cols = out.ncols(), "Transformed table");
        Ok(out)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<Array2<f64>> {
        self.fit(df)?;
        self.transform(df)
    }

    /// Output column names in matrix order
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = self.numeric_columns.clone();
        names.extend(self.encoder.feature_names());
        names
    }

    /// Width of the transformed matrix
    pub fn n_features_out(&self) -> usize {
        self.numeric_columns.len() + self.encoder.n_outputs()
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    pub fn config(&self) -> &PreprocessingConfig {
        &self.config
    }

    /// Get numeric column names
    pub fn numeric_columns(&self) -> &[String] {
        &self.numeric_columns
    }

    /// Get categorical column names
    pub fn categorical_columns(&self) -> &[String] {
        &self.categorical_columns
    }

    pub fn numeric_imputer(&self) -> &Imputer {
        &self.numeric_imputer
    }

    pub fn scaler(&self) -> &Scaler {
        &self.scaler
    }

    pub fn encoder(&self) -> &Encoder {
        &self.encoder
    }

    /// Row and null counts of the training table
    pub fn feature_stats(&self) -> &[FeatureStats] {
        &self.feature_stats
    }

    pub fn fit_time(&self) -> Option<f64> {
        self.fit_time
    }

    pub fn samples_fitted(&self) -> usize {
        self.samples_fitted
    }

    /// Load a preprocessor from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let preprocessor: Self = serde_json::from_str(&json)?;
        Ok(preprocessor)
    }

    fn as_strs(columns: &[String]) -> Vec<&str> {
        columns.iter().map(|s| s.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|s| s.to_string()).collect()
    }

    fn create_test_dataframe() -> DataFrame {
        df!(
            "reading_score" => &[Some(70.0), Some(80.0), None],
            "writing_score" => &[Some(60.0), Some(90.0), Some(75.0)],
            "gender" => &["female", "male", "female"],
            "lunch" => &[Some("standard"), None, Some("free/reduced")]
        )
        .unwrap()
    }

    fn build() -> DataPreprocessor {
        build_preprocessor(
            &names(&["reading_score", "writing_score"]),
            &names(&["gender", "lunch"]),
            PreprocessingConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_build_rejects_empty_lists() {
        let err = build_preprocessor(&[], &names(&["gender"]), PreprocessingConfig::default())
            .unwrap_err();
        assert!(matches!(err, GradecastError::ConfigError(_)));

        let err = build_preprocessor(&names(&["a"]), &[], PreprocessingConfig::default())
            .unwrap_err();
        assert!(matches!(err, GradecastError::ConfigError(_)));
    }

    #[test]
    fn test_build_rejects_duplicates_and_overlap() {
        let dup = build_preprocessor(
            &names(&["a", "a"]),
            &names(&["b"]),
            PreprocessingConfig::default(),
        );
        assert!(dup.is_err());

        let overlap = build_preprocessor(
            &names(&["a"]),
            &names(&["a"]),
            PreprocessingConfig::default(),
        );
        assert!(overlap.is_err());
    }

    #[test]
    fn test_build_rejects_median_for_categorical() {
        let mut config = PreprocessingConfig::default();
        config.categorical_impute_strategy = ImputeStrategy::Median;
        let err = build_preprocessor(&names(&["a"]), &names(&["b"]), config).unwrap_err();
        assert!(matches!(err, GradecastError::ConfigError(_)));
    }

    #[test]
    fn test_fit_transform_layout() {
        let df = create_test_dataframe();
        let mut preprocessor = build();
        let result = preprocessor.fit_transform(&df).unwrap();

        assert_eq!(
            preprocessor.feature_names(),
            vec![
                "reading_score",
                "writing_score",
                "gender_female",
                "gender_male",
                "lunch_free/reduced",
                "lunch_standard",
            ]
        );
        assert_eq!(result.shape(), &[3, 6]);
        assert!(result.iter().all(|v| v.is_finite()));
        // row 1 lunch is imputed to the tie-broken mode "free/reduced"
        assert_eq!(result[[1, 4]], 1.0);
    }

    #[test]
    fn test_fit_twice_is_rejected() {
        let df = create_test_dataframe();
        let mut preprocessor = build();
        preprocessor.fit(&df).unwrap();
        assert!(preprocessor.fit(&df).is_err());
    }

    #[test]
    fn test_transform_before_fit() {
        let preprocessor = build();
        let err = preprocessor.transform(&create_test_dataframe()).unwrap_err();
        assert!(matches!(err, GradecastError::ModelNotFitted));
    }

    #[test]
    fn test_feature_statistics() {
        let df = create_test_dataframe();
        let mut preprocessor = build();
        preprocessor.fit(&df).unwrap();

        let stats = preprocessor.feature_stats();
        assert_eq!(stats.len(), 4);
        assert_eq!(stats[0].name, "reading_score");
        assert_eq!(stats[0].null_count, 1);
        assert_eq!(stats[3].dtype, ColumnType::Categorical);
        assert_eq!(preprocessor.samples_fitted(), 3);
    }

    #[test]
    fn test_unknown_category_fails_by_default() {
        let df = create_test_dataframe();
        let mut preprocessor = build_preprocessor(
            &names(&["reading_score", "writing_score"]),
            &names(&["gender", "lunch"]),
            PreprocessingConfig::default(),
        )
        .unwrap();
        preprocessor.fit(&df).unwrap();

        let test = df!(
            "reading_score" => &[70.0],
            "writing_score" => &[70.0],
            "gender" => &["other"],
            "lunch" => &["standard"]
        )
        .unwrap();
        let err = preprocessor.transform(&test).unwrap_err();
        assert!(matches!(err, GradecastError::UnknownCategory { .. }));
    }
}
