//! Data preprocessing module
//!
//! Column-wise preprocessing for mixed tabular data:
//! - Missing value imputation (median for numeric, most frequent for categorical)
//! - Standard scaling of numeric features
//! - One-hot encoding of categorical features
//!
//! The fitted [`DataPreprocessor`] is the artifact persisted by the
//! transformation stage and reloaded for later use.

mod config;
mod imputer;
mod scaler;
mod encoder;
mod pipeline;

pub use config::{PreprocessingConfig, UnknownCategory};
pub use imputer::{Imputer, ImputeStrategy, ImputeValue};
pub use scaler::Scaler;
pub use encoder::{Encoder, CategoryVocabulary};
pub use pipeline::{build_preprocessor, DataPreprocessor};

use crate::error::{GradecastError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Column data type for preprocessing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnType {
    Numeric,
    Categorical,
}

/// Feature statistics recorded during fit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureStats {
    pub name: String,
    pub dtype: ColumnType,
    pub count: usize,
    pub null_count: usize,
}

impl FeatureStats {
    /// Record row and null counts for a column of the training table
    pub fn from_column(df: &DataFrame, name: &str, dtype: ColumnType) -> Result<Self> {
        let column = df
            .column(name)
            .map_err(|_| GradecastError::schema(name, "column not found"))?;
        let series = column.as_materialized_series();

        let null_count = match dtype {
            ColumnType::Numeric => numeric_values(series)?
                .iter()
                .filter(|v| v.is_none())
                .count(),
            ColumnType::Categorical => series.null_count(),
        };

        Ok(Self {
            name: name.to_string(),
            dtype,
            count: series.len(),
            null_count,
        })
    }
}

/// Read a column as `f64`, mapping nulls and NaN to `None`
pub(crate) fn numeric_values(series: &Series) -> Result<Vec<Option<f64>>> {
    let casted = series.cast(&DataType::Float64)?;
    let values = casted
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect();
    Ok(values)
}

/// Read a column as strings, mapping nulls to `None`
pub(crate) fn string_values(series: &Series) -> Result<Vec<Option<String>>> {
    let casted = series.cast(&DataType::String)?;
    let values = casted
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect();
    Ok(values)
}
