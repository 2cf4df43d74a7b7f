//! Logistic Regression
//!
//! L2-regularized logistic regression fitted with damped Newton-Raphson
//! (iteratively reweighted least squares). The intercept is not penalized.
use crate::classifier::{check_binary_target, BinaryClassifier};
use crate::constants::{LOGISTIC_C, LOGISTIC_MAX_ITER, LOGISTIC_TOLERANCE};
use crate::data::Matrix;
use crate::errors::OwlError;
use crate::metrics::classification::log_loss;
use crate::utils::{cholesky_solve, sigmoid, validate_positive_float_parameter};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

// Keeps the Hessian positive definite when every probability saturates.
const HESSIAN_RIDGE: f64 = 1e-10;
const ARMIJO: f64 = 1e-4;
const MIN_STEP: f64 = 1e-10;

/// Probabilistic binary classifier.
///
/// Minimizes $\frac{1}{2}\lVert w \rVert^2 + C \sum_i s_i \ell(y_i, b + w^T x_i)$
/// where $\ell$ is the logistic loss and $s_i$ the sample weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Inverse regularization strength.
    pub c: f64,
    /// Maximum number of Newton iterations.
    pub max_iter: usize,
    /// Convergence tolerance on the Newton step.
    pub tol: f64,
    /// Fitted coefficients, one per feature.
    pub coefficients: Vec<f64>,
    /// Fitted intercept.
    pub intercept: f64,
    /// Number of iterations used by the last fit.
    pub n_iter: usize,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        LogisticRegression {
            c: LOGISTIC_C,
            max_iter: LOGISTIC_MAX_ITER,
            tol: LOGISTIC_TOLERANCE,
            coefficients: Vec::new(),
            intercept: 0.0,
            n_iter: 0,
        }
    }
}

#[inline]
fn softplus(z: f64) -> f64 {
    z.max(0.0) + (-z.abs()).exp().ln_1p()
}

impl LogisticRegression {
    /// Create an unfitted model.
    ///
    /// * `c` - Inverse regularization strength, must be positive.
    /// * `max_iter` - Maximum number of Newton iterations.
    pub fn new(c: f64, max_iter: usize) -> Result<Self, OwlError> {
        validate_positive_float_parameter(c, "c")?;
        Ok(LogisticRegression {
            c,
            max_iter,
            ..Default::default()
        })
    }

    fn linear_predictor(data: &Matrix<f64>, intercept: f64, coefficients: &[f64]) -> Vec<f64> {
        let mut z = vec![intercept; data.rows];
        for (j, w) in coefficients.iter().enumerate() {
            for (z_, x) in z.iter_mut().zip(data.get_col(j)) {
                *z_ += w * x;
            }
        }
        z
    }

    fn objective(&self, data: &Matrix<f64>, y: &[f64], s: &[f64], theta: &[f64]) -> f64 {
        let z = Self::linear_predictor(data, theta[0], &theta[1..]);
        let penalty = 0.5 * theta[1..].iter().map(|w| w * w).sum::<f64>();
        let loss = z
            .iter()
            .zip(y)
            .zip(s)
            .map(|((z_, y_), s_)| s_ * (softplus(*z_) - y_ * z_))
            .sum::<f64>();
        penalty + self.c * loss
    }

    /// Fit the model.
    ///
    /// * `data` - Feature matrix.
    /// * `y` - Binary target coded 0/1.
    /// * `sample_weight` - Optional per-sample weights.
    pub fn fit(&mut self, data: &Matrix<f64>, y: &[f64], sample_weight: Option<&[f64]>) -> Result<(), OwlError> {
        check_binary_target(y, data.rows, "logistic regression target")?;
        let s = match sample_weight {
            Some(w) if w.len() != y.len() => {
                return Err(OwlError::InvalidInput(format!(
                    "{} sample weights passed for {} rows",
                    w.len(),
                    y.len()
                )))
            }
            Some(w) => w.to_vec(),
            None => vec![1.0; y.len()],
        };

        let p = data.cols;
        let n_par = p + 1;
        let mut theta = vec![0.0; n_par];
        let mut current = self.objective(data, y, &s, &theta);
        let mut converged = false;
        let mut iter = 0;

        while iter < self.max_iter {
            iter += 1;
            let z = Self::linear_predictor(data, theta[0], &theta[1..]);
            let prob: Vec<f64> = z.iter().map(|z_| sigmoid(*z_)).collect();

            let mut grad = vec![0.0; n_par];
            let mut hess = vec![0.0; n_par * n_par];
            for j in 1..n_par {
                grad[j] = theta[j];
                hess[j * n_par + j] = 1.0;
            }
            hess[0] = HESSIAN_RIDGE;

            let mut row = vec![0.0; n_par];
            row[0] = 1.0;
            for i in 0..data.rows {
                for j in 0..p {
                    row[j + 1] = *data.get(i, j);
                }
                let r = self.c * s[i] * (prob[i] - y[i]);
                let h = self.c * s[i] * prob[i] * (1.0 - prob[i]);
                for a in 0..n_par {
                    grad[a] += r * row[a];
                    for b in 0..=a {
                        hess[a * n_par + b] += h * row[a] * row[b];
                    }
                }
            }
            for a in 0..n_par {
                for b in 0..a {
                    hess[b * n_par + a] = hess[a * n_par + b];
                }
            }

            let step = cholesky_solve(&hess, &grad, n_par).ok_or_else(|| {
                OwlError::InsufficientData("logistic regression Hessian is not positive definite".to_string())
            })?;
            let decrease: f64 = grad.iter().zip(&step).map(|(g, d)| g * d).sum();

            let mut t = 1.0;
            let mut candidate: Vec<f64>;
            let mut value;
            loop {
                candidate = theta.iter().zip(&step).map(|(th, d)| th - t * d).collect();
                value = self.objective(data, y, &s, &candidate);
                if value <= current - ARMIJO * t * decrease || t < MIN_STEP {
                    break;
                }
                t *= 0.5;
            }

            let max_change = step.iter().map(|d| (t * d).abs()).fold(0.0, f64::max);
            theta = candidate;
            current = value;
            if max_change < self.tol {
                converged = true;
                break;
            }
        }

        if !converged {
            warn!(
                "Logistic regression reached the iteration limit ({}) before converging.",
                self.max_iter
            );
        }
        self.intercept = theta[0];
        self.coefficients = theta[1..].to_vec();
        self.n_iter = iter;
        debug!(
            "Logistic regression fitted in {} iterations, log loss {:.5}.",
            iter,
            log_loss(y, &self.predict_proba(data), &s)
        );
        Ok(())
    }

    /// Predicted probability of the positive class.
    pub fn predict_proba(&self, data: &Matrix<f64>) -> Vec<f64> {
        self.decision_function(data).into_iter().map(sigmoid).collect()
    }
}

impl BinaryClassifier for LogisticRegression {
    fn decision_function(&self, data: &Matrix<f64>) -> Vec<f64> {
        Self::linear_predictor(data, self.intercept, &self.coefficients)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::precision_round;

    fn separable_data() -> (Vec<f64>, Vec<f64>) {
        let x: Vec<f64> = (0..40).map(|i| i as f64 / 10.0).collect();
        let y: Vec<f64> = x.iter().map(|v| if *v > 2.0 { 1.0 } else { 0.0 }).collect();
        (x, y)
    }

    #[test]
    fn test_logistic_fits_monotone_signal() {
        let (x, y) = separable_data();
        let m = Matrix::new(&x, x.len(), 1);
        let mut model = LogisticRegression::default();
        model.fit(&m, &y, None).unwrap();
        assert!(model.coefficients[0] > 0.0);
        let proba = model.predict_proba(&m);
        assert!(proba.iter().all(|p| (0.0..=1.0).contains(p)));
        assert!(proba[0] < 0.5);
        assert!(proba[39] > 0.5);
        assert!(model.n_iter < model.max_iter);
    }

    #[test]
    fn test_logistic_intercept_only() {
        // No features: intercept is the log odds of the base rate.
        let data: Vec<f64> = Vec::new();
        let m = Matrix::new(&data, 4, 0);
        let y = vec![1.0, 0.0, 0.0, 0.0];
        let mut model = LogisticRegression::default();
        model.fit(&m, &y, None).unwrap();
        assert_eq!(precision_round(model.intercept, 5), precision_round((1.0_f64 / 3.0).ln(), 5));
    }

    #[test]
    fn test_logistic_sample_weight() {
        let data: Vec<f64> = Vec::new();
        let m = Matrix::new(&data, 2, 0);
        let y = vec![1.0, 0.0];
        let mut model = LogisticRegression::default();
        model.fit(&m, &y, Some(&[3.0, 1.0])).unwrap();
        assert_eq!(precision_round(model.predict_proba(&m)[0], 5), 0.75);
    }

    #[test]
    fn test_logistic_rejects_single_class() {
        let (x, _) = separable_data();
        let m = Matrix::new(&x, x.len(), 1);
        let y = vec![1.0; x.len()];
        let mut model = LogisticRegression::default();
        assert!(matches!(model.fit(&m, &y, None), Err(OwlError::InsufficientData(_))));
        assert!(LogisticRegression::new(0.0, 10).is_err());
    }
}
