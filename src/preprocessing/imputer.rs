//! Missing value imputation strategies

use crate::error::{GradecastError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{numeric_values, string_values};

/// Strategy for imputing missing values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImputeStrategy {
    /// Replace with mean (numeric only)
    Mean,
    /// Replace with median (numeric only)
    Median,
    /// Replace with mode / most frequent value
    MostFrequent,
}

/// Imputer for handling missing values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Imputer {
    strategy: ImputeStrategy,
    columns: Vec<String>,
    fill_values: BTreeMap<String, ImputeValue>,
    is_fitted: bool,
}

/// Learned fill value for one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImputeValue {
    Numeric(f64),
    String(String),
}

impl Imputer {
    /// Create a new imputer with the specified strategy
    pub fn new(strategy: ImputeStrategy) -> Self {
        Self {
            strategy,
            columns: Vec::new(),
            fill_values: BTreeMap::new(),
            is_fitted: false,
        }
    }

    /// Fit the imputer to the given columns of `df`
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        let mut fill_values = BTreeMap::new();

        for col_name in columns {
            let column = df
                .column(col_name)
                .map_err(|_| GradecastError::schema(*col_name, "column not found"))?;

            let fill_value = self.compute_fill_value(col_name, column.as_materialized_series())?;
            fill_values.insert(col_name.to_string(), fill_value);
        }

        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self.fill_values = fill_values;
        self.is_fitted = true;
        Ok(self)
    }

    /// Replace missing values in every fitted column
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(GradecastError::ModelNotFitted);
        }

        let mut result = df.clone();

        for col_name in &self.columns {
            let column = df
                .column(col_name)
                .map_err(|_| GradecastError::schema(col_name.as_str(), "column not found"))?;
            let fill_value = self.fill_values.get(col_name).ok_or_else(|| {
                GradecastError::PreprocessingError(format!("no fill value for '{}'", col_name))
            })?;

            let filled = Self::fill_series(column.as_materialized_series(), fill_value)?;
            result.with_column(filled)?;
        }

        Ok(result)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Learned fill value for a column
    pub fn fill_value(&self, column: &str) -> Option<&ImputeValue> {
        self.fill_values.get(column)
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    fn compute_fill_value(&self, name: &str, series: &Series) -> Result<ImputeValue> {
        match self.strategy {
            ImputeStrategy::Mean => {
                let values = Self::present_numeric(name, series)?;
                let mean = values.iter().sum::<f64>() / values.len() as f64;
                Ok(ImputeValue::Numeric(mean))
            }
            ImputeStrategy::Median => {
                let mut values = Self::present_numeric(name, series)?;
                values.sort_by(|a, b| a.total_cmp(b));
                let mid = values.len() / 2;
                let median = if values.len() % 2 == 0 {
                    (values[mid - 1] + values[mid]) / 2.0
                } else {
                    values[mid]
                };
                Ok(ImputeValue::Numeric(median))
            }
            ImputeStrategy::MostFrequent => {
                if series.dtype().is_primitive_numeric() {
                    Self::compute_mode_numeric(name, series).map(ImputeValue::Numeric)
                } else {
                    Self::compute_mode_string(name, series).map(ImputeValue::String)
                }
            }
        }
    }

    fn present_numeric(name: &str, series: &Series) -> Result<Vec<f64>> {
        let values: Vec<f64> = numeric_values(series)?.into_iter().flatten().collect();
        if values.is_empty() {
            return Err(GradecastError::PreprocessingError(format!(
                "column '{}' has no observed values to impute from",
                name
            )));
        }
        Ok(values)
    }

    /// Most frequent value; ties go to the smallest value
    fn compute_mode_numeric(name: &str, series: &Series) -> Result<f64> {
        let mut values = Self::present_numeric(name, series)?;
        values.sort_by(|a, b| a.total_cmp(b));

        let mut best = values[0];
        let mut best_count = 0;
        let mut i = 0;
        while i < values.len() {
            let mut j = i;
            while j < values.len() && values[j] == values[i] {
                j += 1;
            }
            if j - i > best_count {
                best_count = j - i;
                best = values[i];
            }
            i = j;
        }

        Ok(best)
    }

    /// Most frequent string; ties go to the lexicographically smallest value
    fn compute_mode_string(name: &str, series: &Series) -> Result<String> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for val in string_values(series)?.into_iter().flatten() {
            *counts.entry(val).or_insert(0) += 1;
        }

        let mut mode: Option<(String, usize)> = None;
        for (value, count) in counts {
            match &mode {
                Some((_, best)) if count <= *best => {}
                _ => mode = Some((value, count)),
            }
        }

        mode.map(|(value, _)| value).ok_or_else(|| {
            GradecastError::PreprocessingError(format!(
                "column '{}' has no observed values to impute from",
                name
            ))
        })
    }

    fn fill_series(series: &Series, fill_value: &ImputeValue) -> Result<Series> {
        match fill_value {
            ImputeValue::Numeric(val) => {
                let filled: Float64Chunked = numeric_values(series)?
                    .into_iter()
                    .map(|opt| Some(opt.unwrap_or(*val)))
                    .collect();

                Ok(filled.with_name(series.name().clone()).into_series())
            }
            ImputeValue::String(val) => {
                let filled: StringChunked = string_values(series)?
                    .into_iter()
                    .map(|opt| Some(opt.unwrap_or_else(|| val.clone())))
                    .collect();

                Ok(filled.with_name(series.name().clone()).into_series())
            }
        }
    }
}
