//! Ordinary least squares

use crate::error::{GradecastError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Relative tolerance below which a Cholesky pivot counts as aliased
const ALIAS_TOL: f64 = 1e-9;

/// Solve the normal equations `A x = b` for a symmetric positive
/// semi-definite `A` with a column-dropping Cholesky decomposition.
///
/// Columns are taken in order; a column whose remaining pivot is within
/// `ALIAS_TOL` of zero (relative to the largest diagonal entry) is a linear
/// combination of earlier columns and gets a zero coefficient. Returns the
/// solution and the mask of columns kept.
fn cholesky_solve_aliased(a: &Array2<f64>, b: &Array1<f64>) -> Option<(Array1<f64>, Vec<bool>)> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }

    let max_diag = a.diag().iter().fold(0.0f64, |m, v| m.max(v.abs()));
    let tol = ALIAS_TOL * max_diag.max(f64::MIN_POSITIVE);

    let mut l = Array2::<f64>::zeros((n, n));
    let mut active = vec![false; n];

    for j in 0..n {
        let mut diag = a[[j, j]];
        for k in 0..j {
            diag -= l[[j, k]] * l[[j, k]];
        }

        if diag <= tol {
            continue;
        }

        active[j] = true;
        let pivot = diag.sqrt();
        l[[j, j]] = pivot;

        for i in (j + 1)..n {
            let mut sum = a[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }
            l[[i, j]] = sum / pivot;
        }
    }

    // Forward substitution: L * y = b over the active columns
    let mut y = Array1::zeros(n);
    for i in (0..n).filter(|&i| active[i]) {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[[i, j]] * y[j];
        }
        y[i] = sum / l[[i, i]];
    }

    // Backward substitution: L^T * x = y over the active columns
    let mut x = Array1::zeros(n);
    for i in (0..n).rev().filter(|&i| active[i]) {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[[j, i]] * x[j];
        }
        x[i] = sum / l[[i, i]];
    }

    if x.iter().any(|v: &f64| !v.is_finite()) {
        return None;
    }

    Some((x, active))
}

/// Linear regression fitted by ordinary least squares
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegression {
    /// Fitted coefficients (weights)
    pub coefficients: Option<Array1<f64>>,
    /// Fitted intercept (bias)
    pub intercept: Option<f64>,
    /// Whether to fit intercept
    pub fit_intercept: bool,
    /// Columns found to be linear combinations of earlier ones
    aliased: Vec<usize>,
    /// Whether model is fitted
    pub is_fitted: bool,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearRegression {
    /// Create a new linear regression model
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: None,
            fit_intercept: true,
            aliased: Vec::new(),
            is_fitted: false,
        }
    }

    /// Enable/disable fitting intercept
    pub fn with_fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    /// Fit the model to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();

        if n_samples != y.len() {
            return Err(GradecastError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }

        let (x_mean, y_mean) = if self.fit_intercept {
            match (x.mean_axis(Axis(0)), y.mean()) {
                (Some(xm), Some(ym)) => (Some(xm), ym),
                _ => {
                    return Err(GradecastError::TrainingError(
                        "cannot fit a linear model on zero samples".to_string(),
                    ));
                }
            }
        } else {
            (None, 0.0)
        };

        // Center data if fitting intercept
        let (x_centered, y_centered) = match &x_mean {
            Some(xm) => (x - &xm.view().insert_axis(Axis(0)), y - y_mean),
            None => (x.clone(), y.clone()),
        };

        // Normal equations: (X^T X) w = X^T y
        let xtx = x_centered.t().dot(&x_centered);
        let xty = x_centered.t().dot(&y_centered);

        let (coefficients, active) = cholesky_solve_aliased(&xtx, &xty).ok_or_else(|| {
            GradecastError::ComputationError("normal equations could not be solved".to_string())
        })?;

        let intercept = match &x_mean {
            Some(xm) => y_mean - coefficients.dot(xm),
            None => 0.0,
        };

        self.aliased = active
            .iter()
            .enumerate()
            .filter(|(_, keep)| !**keep)
            .map(|(i, _)| i)
            .collect();
        self.coefficients = Some(coefficients);
        self.intercept = Some(intercept);
        self.is_fitted = true;

        Ok(self)
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = match (&self.coefficients, self.is_fitted) {
            (Some(c), true) => c,
            _ => return Err(GradecastError::ModelNotFitted),
        };

        if x.ncols() != coefficients.len() {
            return Err(GradecastError::ShapeError {
                expected: format!("{} features", coefficients.len()),
                actual: format!("{} features", x.ncols()),
            });
        }

        Ok(x.dot(coefficients) + self.intercept.unwrap_or(0.0))
    }

    /// Indices of columns that received a zero coefficient because they were collinear
    pub fn aliased_columns(&self) -> &[usize] {
        &self.aliased
    }
}
