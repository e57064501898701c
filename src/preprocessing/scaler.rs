//! Standard scaling of numeric features

use crate::error::{GradecastError, Result};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::numeric_values;

/// Parameters for one fitted column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub column: String,
    /// Column mean
    pub center: f64,
    /// Population standard deviation, or 1 for a constant column
    pub scale: f64,
}

/// Z-score scaler: (x - mean) / std
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scaler {
    params: Vec<ScalerParams>,
    is_fitted: bool,
}

impl Scaler {
    /// Create a new scaler
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit the scaler to fully imputed columns
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        let params = columns
            .iter()
            .map(|col_name| {
                let column = df
                    .column(col_name)
                    .map_err(|_| GradecastError::schema(*col_name, "column not found"))?;
                Self::compute_params(col_name, column.as_materialized_series())
            })
            .collect::<Result<Vec<_>>>()?;

        self.params = params;
        self.is_fitted = true;
        Ok(self)
    }

    /// Scale the fitted columns into a dense block, one output column per input
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(GradecastError::ModelNotFitted);
        }

        let mut out = Array2::zeros((df.height(), self.params.len()));

        for (j, params) in self.params.iter().enumerate() {
            let column = df
                .column(&params.column)
                .map_err(|_| GradecastError::schema(params.column.as_str(), "column not found"))?;

            for (i, value) in numeric_values(column.as_materialized_series())?
                .into_iter()
                .enumerate()
            {
                let v = value.ok_or_else(|| {
                    GradecastError::PreprocessingError(format!(
                        "missing value in '{}' reached the scaler",
                        params.column
                    ))
                })?;
                out[[i, j]] = (v - params.center) / params.scale;
            }
        }

        Ok(out)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<Array2<f64>> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    pub fn params(&self) -> &[ScalerParams] {
        &self.params
    }

    fn compute_params(name: &str, series: &Series) -> Result<ScalerParams> {
        let values: Vec<f64> = numeric_values(series)?.into_iter().flatten().collect();
        if values.is_empty() {
            return Err(GradecastError::PreprocessingError(format!(
                "cannot scale empty column '{}'",
                name
            )));
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std = var.sqrt();

        Ok(ScalerParams {
            column: name.to_string(),
            center: mean,
            scale: if std <= f64::EPSILON { 1.0 } else { std },
        })
    }
}
