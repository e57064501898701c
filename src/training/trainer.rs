//! Model training stage
//!
//! Evaluates the fixed candidate set on the transformed arrays, selects the
//! best test R², applies the quality gate and stages the winning model.

use ndarray::{s, Array1, Array2};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

use super::evaluator::{evaluate_candidates, ModelReport};
use super::metrics::RegressionMetrics;
use super::models::{default_candidates, Candidate, Regressor};
use crate::config::PipelineConfig;
use crate::error::{GradecastError, Result};
use crate::export::{ArtifactStore, ModelArtifact};
use crate::utils::Timer;

/// Outcome of a successful training stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub best_model: String,
    pub test_r2: f64,
    /// Test-split metrics of the selected model
    pub metrics: RegressionMetrics,
    pub report: ModelReport,
    pub model_path: PathBuf,
}

/// Split `[features..., target]` into its features and target
pub fn split_xy(array: &Array2<f64>) -> Result<(Array2<f64>, Array1<f64>)> {
    if array.ncols() < 2 {
        return Err(GradecastError::ShapeError {
            expected: "at least 2 columns (features and target)".to_string(),
            actual: format!("{} columns", array.ncols()),
        });
    }
    let last = array.ncols() - 1;
    Ok((array.slice(s![.., ..last]).to_owned(), array.column(last).to_owned()))
}

pub struct ModelTrainer {
    config: PipelineConfig,
    candidates: Option<Vec<Candidate>>,
}

impl ModelTrainer {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config, candidates: None }
    }

    /// Replace the fixed candidate set
    pub fn with_candidates(mut self, candidates: Vec<Candidate>) -> Self {
        self.candidates = Some(candidates);
        self
    }

    fn candidates(&self) -> Vec<Candidate> {
        self.candidates
            .clone()
            .unwrap_or_else(|| default_candidates(self.config.trainer.random_state))
    }

    /// Train, select and stage the best model.
    ///
    /// Fails with [`GradecastError::QualityGate`] when the best test R² is
    /// below the configured minimum; nothing is staged in that case.
    pub fn initiate(
        &self,
        train_array: &Array2<f64>,
        test_array: &Array2<f64>,
        store: &mut ArtifactStore,
    ) -> Result<TrainingSummary> {
        let timer = Timer::new("model_training");

        if train_array.ncols() != test_array.ncols() {
            return Err(GradecastError::ShapeError {
                expected: format!("{} test columns", train_array.ncols()),
                actual: format!("{} test columns", test_array.ncols()),
            });
        }
        let (x_train, y_train) = split_xy(train_array)?;
        let (x_test, y_test) = split_xy(test_array)?;
        info!(
            train_rows = x_train.nrows(),
            test_rows = x_test.nrows(),
            n_features = x_train.ncols(),
            "Split training and test arrays"
        );

        let evaluated = evaluate_candidates(
            &x_train,
            &y_train,
            &x_test,
            &y_test,
            self.candidates(),
            self.config.trainer.parallel,
        )?;
        let report: ModelReport = evaluated.iter().map(|e| (e.name.clone(), e.test_r2)).collect();

        for (name, score) in report.entries() {
            info!(candidate = %name, test_r2 = *score, "Candidate score");
        }

        // a report whose scores are all undefined falls through to the gate
        let (best_name, best_score) = report
            .best()
            .or_else(|| report.entries().first().map(|(name, score)| (name.as_str(), *score)))
            .map(|(name, score)| (name.to_string(), score))
            .ok_or_else(|| GradecastError::TrainingError("no candidate models to evaluate".to_string()))?;

        let threshold = self.config.trainer.min_r2;
        if !(best_score >= threshold) {
            warn!(best_model = %best_name, best_score, threshold, "No candidate passed the quality gate");
            return Err(GradecastError::QualityGate {
                best_model: best_name,
                best_score,
                threshold,
            });
        }

        let winner = evaluated
            .into_iter()
            .find(|e| e.name == best_name)
            .ok_or_else(|| GradecastError::TrainingError(format!("lost fitted model '{}'", best_name)))?;

        let metrics = RegressionMetrics::compute(&y_test, &winner.model.predict(&x_test)?)?;
        let test_r2 = metrics.r2;
        let artifact = ModelArtifact::new(&winner.name, winner.model, test_r2, x_train.ncols());
        let model_path = store.stage(self.config.model_path(), &artifact)?;

        info!(
            best_model = %best_name,
            test_r2,
            mse = metrics.mse,
            rmse = metrics.rmse,
            mae = metrics.mae,
            path = %model_path.display(),
            elapsed_secs = timer.elapsed_secs(),
            "Model training complete"
        );

        Ok(TrainingSummary {
            best_model: best_name,
            test_r2,
            metrics,
            report,
            model_path,
        })
    }
}
