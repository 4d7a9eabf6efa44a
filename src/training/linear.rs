//! Linear and logistic regression

use std::time::Instant;

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{ArenaError, Result};

use super::params::{ProgressFn, TrainingProgress};
use super::trainer::check_deadline;

/// Ordinary least squares with optional L2 regularization.
///
/// Solved in closed form via the normal equations; no iteration, so training
/// is deterministic regardless of seed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegression {
    pub coefficients: Option<Array1<f64>>,
    pub intercept: f64,
    pub l2: f64,
    pub is_fitted: bool,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl LinearRegression {
    pub fn new(l2: f64) -> Self {
        Self {
            coefficients: None,
            intercept: 0.0,
            l2,
            is_fitted: false,
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();
        if n_samples != y.len() {
            return Err(ArenaError::ShapeMismatch {
                expected: format!("{} labels", n_samples),
                actual: format!("{} labels", y.len()),
            });
        }

        // Center features and target so the intercept falls out of the solve.
        let x_mean = x.mean_axis(Axis(0)).unwrap();
        let y_mean = y.mean().unwrap_or(0.0);
        let x_c = x - &x_mean.clone().insert_axis(Axis(0));
        let y_c = y - y_mean;

        let mut xtx = x_c.t().dot(&x_c);
        for i in 0..n_features {
            xtx[[i, i]] += self.l2;
        }
        let xty = x_c.t().dot(&y_c);

        let coefficients = solve_linear_system(&xtx, &xty).ok_or_else(|| {
            ArenaError::InsufficientData(
                "normal equations are singular; features may be collinear".to_string(),
            )
        })?;

        self.intercept = y_mean - coefficients.dot(&x_mean);
        self.coefficients = Some(coefficients);
        self.is_fitted = true;
        Ok(self)
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self
            .coefficients
            .as_ref()
            .ok_or_else(|| ArenaError::InsufficientData("model not fitted".to_string()))?;
        Ok(x.dot(coefficients) + self.intercept)
    }
}

/// Binary logistic regression trained by gradient descent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub coefficients: Option<Array1<f64>>,
    pub intercept: f64,
    pub learning_rate: f64,
    pub epochs: usize,
    pub l2: f64,
    pub tol: f64,
    pub is_fitted: bool,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self {
            coefficients: None,
            intercept: 0.0,
            learning_rate: 0.1,
            epochs: 300,
            l2: 0.0,
            tol: 1e-6,
            is_fitted: false,
        }
    }
}

impl LogisticRegression {
    pub fn new(learning_rate: f64, epochs: usize, l2: f64) -> Self {
        Self {
            learning_rate,
            epochs,
            l2,
            ..Default::default()
        }
    }

    /// Fit with gradient descent. Reports log-loss through `progress` at
    /// each epoch; a non-finite loss or weight aborts with
    /// [`ArenaError::TrainingDiverged`].
    pub fn fit(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        mut progress: Option<&mut ProgressFn<'_>>,
        deadline: Option<(Instant, std::time::Duration)>,
    ) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();
        if n_samples != y.len() {
            return Err(ArenaError::ShapeMismatch {
                expected: format!("{} labels", n_samples),
                actual: format!("{} labels", y.len()),
            });
        }

        let mut weights: Array1<f64> = Array1::zeros(n_features);
        let mut bias = 0.0;
        let n = n_samples as f64;

        for epoch in 0..self.epochs {
            check_deadline(deadline)?;

            let linear = x.dot(&weights) + bias;
            let predicted = linear.mapv(sigmoid);
            let errors = &predicted - y;

            let grad_w = (x.t().dot(&errors) / n) + &(self.l2 * &weights);
            let grad_b = errors.mean().unwrap_or(0.0);

            weights = weights - self.learning_rate * &grad_w;
            bias -= self.learning_rate * grad_b;

            let loss = log_loss(y, &predicted);
            if !loss.is_finite() || weights.iter().any(|w| !w.is_finite()) {
                return Err(ArenaError::TrainingDiverged { epoch });
            }
            if let Some(cb) = progress.as_deref_mut() {
                cb(&TrainingProgress {
                    epoch,
                    total_epochs: self.epochs,
                    loss,
                    metric: None,
                });
            }

            let grad_norm = (grad_w.mapv(|g| g * g).sum() + grad_b * grad_b).sqrt();
            if grad_norm < self.tol {
                break;
            }
        }

        self.coefficients = Some(weights);
        self.intercept = bias;
        self.is_fitted = true;
        Ok(self)
    }

    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self
            .coefficients
            .as_ref()
            .ok_or_else(|| ArenaError::InsufficientData("model not fitted".to_string()))?;
        Ok((x.dot(coefficients) + self.intercept).mapv(sigmoid))
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        Ok(self
            .predict_proba(x)?
            .mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 }))
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn log_loss(y: &Array1<f64>, predicted: &Array1<f64>) -> f64 {
    let n = y.len() as f64;
    y.iter()
        .zip(predicted.iter())
        .map(|(&t, &p)| -(t * p.ln() + (1.0 - t) * (1.0 - p).ln()))
        .sum::<f64>()
        / n
}

/// Solve `A x = b` by Gaussian elimination with partial pivoting. Returns
/// `None` for singular systems.
fn solve_linear_system(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }

    let mut aug = Array2::zeros((n, n + 1));
    for i in 0..n {
        for j in 0..n {
            aug[[i, j]] = a[[i, j]];
        }
        aug[[i, n]] = b[i];
    }

    for col in 0..n {
        let pivot_row = (col..n).max_by(|&r1, &r2| {
            aug[[r1, col]]
                .abs()
                .total_cmp(&aug[[r2, col]].abs())
        })?;
        if aug[[pivot_row, col]].abs() < 1e-12 {
            return None;
        }
        if pivot_row != col {
            for j in 0..=n {
                let tmp = aug[[col, j]];
                aug[[col, j]] = aug[[pivot_row, j]];
                aug[[pivot_row, j]] = tmp;
            }
        }

        let pivot = aug[[col, col]];
        for j in col..=n {
            aug[[col, j]] /= pivot;
        }
        for row in 0..n {
            if row != col {
                let factor = aug[[row, col]];
                if factor != 0.0 {
                    for j in col..=n {
                        aug[[row, j]] -= factor * aug[[col, j]];
                    }
                }
            }
        }
    }

    Some(Array1::from_iter((0..n).map(|i| aug[[i, n]])))
}
