//! One-hot encoding of categorical columns

use crate::error::{GradecastError, Result};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{string_values, UnknownCategory};

/// Sorted category vocabulary learned for one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryVocabulary {
    pub column: String,
    pub categories: Vec<String>,
}

impl CategoryVocabulary {
    fn index_of(&self, value: &str) -> Option<usize> {
        self.categories
            .binary_search_by(|c| c.as_str().cmp(value))
            .ok()
    }
}

/// One-hot encoder over a sorted vocabulary per column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Encoder {
    unknown: UnknownCategory,
    vocabularies: Vec<CategoryVocabulary>,
    is_fitted: bool,
}

impl Encoder {
    /// Create a new encoder
    pub fn new(unknown: UnknownCategory) -> Self {
        Self {
            unknown,
            vocabularies: Vec::new(),
            is_fitted: false,
        }
    }

    /// Learn the vocabulary of each column, in declared column order
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        let vocabularies = columns
            .iter()
            .map(|col_name| {
                let column = df
                    .column(col_name)
                    .map_err(|_| GradecastError::schema(*col_name, "column not found"))?;

                let categories: BTreeSet<String> = string_values(column.as_materialized_series())?
                    .into_iter()
                    .flatten()
                    .collect();

                Ok(CategoryVocabulary {
                    column: col_name.to_string(),
                    categories: categories.into_iter().collect(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        self.vocabularies = vocabularies;
        self.is_fitted = true;
        Ok(self)
    }

    /// Encode the fitted columns into a dense indicator block
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(GradecastError::ModelNotFitted);
        }

        let mut out = Array2::zeros((df.height(), self.n_outputs()));
        let mut offset = 0;

        for vocab in &self.vocabularies {
            let column = df
                .column(&vocab.column)
                .map_err(|_| GradecastError::schema(vocab.column.as_str(), "column not found"))?;

            for (i, value) in string_values(column.as_materialized_series())?
                .into_iter()
                .enumerate()
            {
                let value = value.ok_or_else(|| {
                    GradecastError::PreprocessingError(format!(
                        "missing value in '{}' reached the encoder",
                        vocab.column
                    ))
                })?;

                match vocab.index_of(&value) {
                    Some(k) => out[[i, offset + k]] = 1.0,
                    None => {
                        if self.unknown == UnknownCategory::Error {
                            return Err(GradecastError::UnknownCategory {
                                column: vocab.column.clone(),
                                value,
                            });
                        }
                    }
                }
            }

            offset += vocab.categories.len();
        }

        Ok(out)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<Array2<f64>> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Total number of indicator columns
    pub fn n_outputs(&self) -> usize {
        self.vocabularies.iter().map(|v| v.categories.len()).sum()
    }

    /// Output column names as `<column>_<category>`
    pub fn feature_names(&self) -> Vec<String> {
        self.vocabularies
            .iter()
            .flat_map(|v| {
                v.categories
                    .iter()
                    .map(move |c| format!("{}_{}", v.column, c))
            })
            .collect()
    }

    pub fn vocabularies(&self) -> &[CategoryVocabulary] {
        &self.vocabularies
    }
}
