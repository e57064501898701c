//! Candidate evaluation on a single train/test split

use crate::error::{GradecastError, Result};
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

use super::metrics::r2_score;
use super::models::{Candidate, Regressor, TrainedModel};

/// Test R² per candidate, in candidate order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelReport {
    entries: Vec<(String, f64)>,
}

impl ModelReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, score: f64) {
        self.entries.push((name.into(), score));
    }

    /// Highest finite score; the earliest entry wins a tie.
    ///
    /// Returns `None` when no entry has a finite score.
    pub fn best(&self) -> Option<(&str, f64)> {
        self.entries
            .iter()
            .filter(|(_, score)| score.is_finite())
            .fold(None, |best: Option<(&str, f64)>, (name, score)| match best {
                Some((_, b)) if b >= *score => best,
                _ => Some((name.as_str(), *score)),
            })
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, s)| *s)
    }

    pub fn entries(&self) -> &[(String, f64)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, f64)> for ModelReport {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}

/// A candidate after fitting, together with its test score
#[derive(Debug, Clone)]
pub struct EvaluatedCandidate {
    pub name: String,
    pub model: TrainedModel,
    pub test_r2: f64,
    pub fit_time_secs: f64,
}

fn evaluate_one(
    candidate: Candidate,
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    x_test: &Array2<f64>,
    y_test: &Array1<f64>,
) -> Result<EvaluatedCandidate> {
    let Candidate { name, mut model } = candidate;
    let start = Instant::now();

    let scored = model
        .fit(x_train, y_train)
        .and_then(|_| model.predict(x_test))
        .and_then(|predictions| r2_score(y_test, &predictions));

    match scored {
        Ok(test_r2) => {
            let fit_time_secs = start.elapsed().as_secs_f64();
            debug!(candidate = %name, test_r2, fit_time_secs, "Evaluated candidate");
            Ok(EvaluatedCandidate { name, model, test_r2, fit_time_secs })
        }
        Err(e) => Err(GradecastError::fit(name, e)),
    }
}

/// Fit and score every candidate, keeping the fitted models.
///
/// With `parallel` the candidates run on the rayon pool; results come back
/// in candidate order either way. The first failing candidate (in candidate
/// order) aborts the evaluation.
pub fn evaluate_candidates(
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    x_test: &Array2<f64>,
    y_test: &Array1<f64>,
    candidates: Vec<Candidate>,
    parallel: bool,
) -> Result<Vec<EvaluatedCandidate>> {
    let n_candidates = candidates.len();
    let start = Instant::now();

    let evaluated = if parallel {
        let results: Vec<Result<EvaluatedCandidate>> = candidates
            .into_par_iter()
            .map(|c| evaluate_one(c, x_train, y_train, x_test, y_test))
            .collect();
        results.into_iter().collect::<Result<Vec<_>>>()?
    } else {
        candidates
            .into_iter()
            .map(|c| evaluate_one(c, x_train, y_train, x_test, y_test))
            .collect::<Result<Vec<_>>>()?
    };

    info!(
        n_candidates,
        parallel,
        elapsed_secs = start.elapsed().as_secs_f64(),
        "Evaluated candidate models"
    );
    Ok(evaluated)
}

/// Fit each candidate on the training split and report its R² on the test split
pub fn evaluate_models(
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    x_test: &Array2<f64>,
    y_test: &Array1<f64>,
    candidates: Vec<Candidate>,
    parallel: bool,
) -> Result<ModelReport> {
    let evaluated = evaluate_candidates(x_train, y_train, x_test, y_test, candidates, parallel)?;
    Ok(evaluated.into_iter().map(|e| (e.name, e.test_r2)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::decision_tree::DecisionTree;
    use crate::training::knn::KNNRegressor;
    use crate::training::linear_models::LinearRegression;

    fn split_data() -> (Array2<f64>, Array1<f64>, Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((50, 2), |(i, j)| ((i * (j + 3)) % 17) as f64);
        let y = Array1::from_shape_fn(50, |i| x[[i, 0]] * 1.5 + x[[i, 1]] - 2.0);
        let x_train = x.slice(ndarray::s![..40, ..]).to_owned();
        let y_train = y.slice(ndarray::s![..40]).to_owned();
        let x_test = x.slice(ndarray::s![40.., ..]).to_owned();
        let y_test = y.slice(ndarray::s![40..]).to_owned();
        (x_train, y_train, x_test, y_test)
    }

    fn small_candidates() -> Vec<Candidate> {
        vec![
            Candidate::new("lr", TrainedModel::LinearRegression(LinearRegression::new())),
            Candidate::new("tree", TrainedModel::DecisionTree(DecisionTree::new())),
            Candidate::new("knn", TrainedModel::KNeighbors(KNNRegressor::with_k(3))),
        ]
    }

    #[test]
    fn test_best_ties_to_first() {
        let report: ModelReport = vec![
            ("A".to_string(), 0.9),
            ("B".to_string(), 0.5),
            ("C".to_string(), 0.9),
        ]
        .into_iter()
        .collect();

        assert_eq!(report.best(), Some(("A", 0.9)));
    }

    #[test]
    fn test_best_skips_undefined_scores() {
        let report: ModelReport = vec![
            ("A".to_string(), 0.9),
            ("B".to_string(), f64::NAN),
            ("C".to_string(), f64::INFINITY),
        ]
        .into_iter()
        .collect();
        assert_eq!(report.best(), Some(("A", 0.9)));

        let undefined: ModelReport = vec![("B".to_string(), f64::NAN)].into_iter().collect();
        assert_eq!(undefined.best(), None);
    }

    #[test]
    fn test_empty_report_has_no_best() {
        assert_eq!(ModelReport::new().best(), None);
    }

    #[test]
    fn test_report_keeps_candidate_order() {
        let (xtr, ytr, xte, yte) = split_data();
        let report = evaluate_models(&xtr, &ytr, &xte, &yte, small_candidates(), true).unwrap();

        let names: Vec<&str> = report.entries().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["lr", "tree", "knn"]);
        assert!(report.get("lr").unwrap() > 0.999);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let (xtr, ytr, xte, yte) = split_data();
        let par = evaluate_models(&xtr, &ytr, &xte, &yte, small_candidates(), true).unwrap();
        let seq = evaluate_models(&xtr, &ytr, &xte, &yte, small_candidates(), false).unwrap();
        assert_eq!(par, seq);
    }

    #[test]
    fn test_failure_names_candidate() {
        let (xtr, ytr, xte, yte) = split_data();
        let bad_test = xte.slice(ndarray::s![.., ..1]).to_owned();

        let err = evaluate_models(&xtr, &ytr, &bad_test, &yte, small_candidates(), false).unwrap_err();
        match err {
            GradecastError::FitError { candidate, source } => {
                assert_eq!(candidate, "lr");
                assert!(matches!(*source, GradecastError::ShapeError { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
