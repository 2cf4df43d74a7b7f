//! Support Vector Classifier
//!
//! A C-SVC solved in the dual with sequential minimal optimization, using
//! second-order working set selection (Fan, Chen & Lin, 2005). Sample weights
//! scale the box constraint of each sample, $0 \le \alpha_i \le C s_i$, so a
//! heavily weighted subject costs more to misclassify.
use crate::classifier::kernel::{Kernel, KernelFunction};
use crate::classifier::platt::PlattScaling;
use crate::classifier::{check_binary_target, BinaryClassifier};
use crate::constants::{SVM_MIN_MAX_ITER, SVM_TAU, SVM_TOLERANCE};
use crate::data::Matrix;
use crate::errors::OwlError;
use crate::utils::validate_positive_float_parameter;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Parameters of the support vector classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SvcParams {
    /// Kernel choice.
    pub kernel: Kernel,
    /// Regularization strength, the box constraint before sample weighting.
    pub c: f64,
    /// Tolerance on the maximal KKT violation.
    pub tol: f64,
    /// Iteration cap, defaults to max(10^7, 100 n).
    pub max_iter: Option<usize>,
}

impl Default for SvcParams {
    fn default() -> Self {
        SvcParams {
            kernel: Kernel::Linear,
            c: 1.0,
            tol: SVM_TOLERANCE,
            max_iter: None,
        }
    }
}

/// Fitted support vector classifier.
///
/// The decision function is $f(x) = \sum_i \alpha_i y_i K(x_i, x) - \rho$, with
/// the sum taken over the support vectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportVectorClassifier {
    pub params: SvcParams,
    pub kernel: KernelFunction,
    /// Support vectors, one row each.
    pub support_vectors: Vec<Vec<f64>>,
    /// $\alpha_i y_i$ for each support vector.
    pub dual_coef: Vec<f64>,
    pub rho: f64,
    /// Number of SMO iterations used.
    pub n_iter: usize,
    /// Optional probability calibration of the decision values.
    pub platt: Option<PlattScaling>,
}

struct Problem<'a> {
    x: &'a [Vec<f64>],
    y: &'a [f64],
    c: &'a [f64],
    kernel: &'a KernelFunction,
}

impl Problem<'_> {
    #[inline]
    fn is_upper_bound(&self, alpha: &[f64], t: usize) -> bool {
        alpha[t] >= self.c[t]
    }

    #[inline]
    fn is_lower_bound(&self, alpha: &[f64], t: usize) -> bool {
        alpha[t] <= 0.0
    }

    // Indices whose alpha may move up along y.
    #[inline]
    fn in_up(&self, alpha: &[f64], t: usize) -> bool {
        if self.y[t] > 0.0 {
            !self.is_upper_bound(alpha, t)
        } else {
            !self.is_lower_bound(alpha, t)
        }
    }

    #[inline]
    fn in_low(&self, alpha: &[f64], t: usize) -> bool {
        if self.y[t] > 0.0 {
            !self.is_lower_bound(alpha, t)
        } else {
            !self.is_upper_bound(alpha, t)
        }
    }

    // Row i of Q, Q_it = y_i y_t K(x_i, x_t).
    fn q_row(&self, i: usize) -> Vec<f64> {
        self.x
            .iter()
            .zip(self.y)
            .map(|(xt, yt)| self.y[i] * yt * self.kernel.compute(&self.x[i], xt))
            .collect()
    }
}

impl SupportVectorClassifier {
    /// Fit the classifier.
    ///
    /// * `params` - Kernel, C and solver settings.
    /// * `data` - Feature matrix, usually standardized.
    /// * `y` - Binary target coded 0/1.
    /// * `sample_weight` - Optional non-negative per-sample importance.
    pub fn fit(
        params: &SvcParams,
        data: &Matrix<f64>,
        y: &[f64],
        sample_weight: Option<&[f64]>,
    ) -> Result<Self, OwlError> {
        validate_positive_float_parameter(params.c, "svm_c")?;
        validate_positive_float_parameter(params.tol, "tol")?;
        check_binary_target(y, data.rows, "support vector classifier target")?;
        let n = data.rows;
        let c: Vec<f64> = match sample_weight {
            Some(w) => {
                if w.len() != n {
                    return Err(OwlError::InvalidInput(format!(
                        "{} sample weights passed for {} rows",
                        w.len(),
                        n
                    )));
                }
                if let Some(v) = w.iter().find(|v| !(v.is_finite() && **v >= 0.0)) {
                    return Err(OwlError::InvalidInput(format!(
                        "sample weights must be finite and non-negative, found {}",
                        v
                    )));
                }
                w.iter().map(|w_| params.c * w_).collect()
            }
            None => vec![params.c; n],
        };

        let kernel = params.kernel.resolve(data)?;
        let x = data.to_rows();
        let ys: Vec<f64> = y.iter().map(|v| if *v == 1.0 { 1.0 } else { -1.0 }).collect();
        let problem = Problem {
            x: &x,
            y: &ys,
            c: &c,
            kernel: &kernel,
        };
        let diag: Vec<f64> = x.iter().map(|r| kernel.compute(r, r)).collect();

        let mut alpha = vec![0.0; n];
        let mut grad = vec![-1.0; n];
        let max_iter = params.max_iter.unwrap_or_else(|| SVM_MIN_MAX_ITER.max(100 * n));
        let mut iter = 0;
        let mut converged = false;

        while iter < max_iter {
            // First index: maximal violation in the up set.
            let mut g_max = f64::NEG_INFINITY;
            let mut sel_i = None;
            for t in 0..n {
                if problem.in_up(&alpha, t) {
                    let v = -ys[t] * grad[t];
                    if v >= g_max {
                        g_max = v;
                        sel_i = Some(t);
                    }
                }
            }
            let Some(i) = sel_i else {
                converged = true;
                break;
            };
            let q_i = problem.q_row(i);

            // Second index: largest second-order decrease in the low set.
            let mut g_min = f64::INFINITY;
            let mut obj_min = f64::INFINITY;
            let mut sel_j = None;
            for t in 0..n {
                if problem.in_low(&alpha, t) {
                    let v = -ys[t] * grad[t];
                    g_min = g_min.min(v);
                    let b = g_max - v;
                    if b > 0.0 {
                        let mut a = diag[i] + diag[t] - 2.0 * ys[i] * ys[t] * q_i[t];
                        if a <= 0.0 {
                            a = SVM_TAU;
                        }
                        let obj = -(b * b) / a;
                        if obj <= obj_min {
                            obj_min = obj;
                            sel_j = Some(t);
                        }
                    }
                }
            }
            if g_max - g_min < params.tol {
                converged = true;
                break;
            }
            let Some(j) = sel_j else {
                converged = true;
                break;
            };
            iter += 1;

            let q_j = problem.q_row(j);
            let (c_i, c_j) = (c[i], c[j]);
            let (old_i, old_j) = (alpha[i], alpha[j]);

            if ys[i] != ys[j] {
                let mut quad = diag[i] + diag[j] + 2.0 * q_i[j];
                if quad <= 0.0 {
                    quad = SVM_TAU;
                }
                let delta = (-grad[i] - grad[j]) / quad;
                let diff = alpha[i] - alpha[j];
                alpha[i] += delta;
                alpha[j] += delta;
                if diff > 0.0 {
                    if alpha[j] < 0.0 {
                        alpha[j] = 0.0;
                        alpha[i] = diff;
                    }
                } else if alpha[i] < 0.0 {
                    alpha[i] = 0.0;
                    alpha[j] = -diff;
                }
                if diff > c_i - c_j {
                    if alpha[i] > c_i {
                        alpha[i] = c_i;
                        alpha[j] = c_i - diff;
                    }
                } else if alpha[j] > c_j {
                    alpha[j] = c_j;
                    alpha[i] = c_j + diff;
                }
            } else {
                let mut quad = diag[i] + diag[j] - 2.0 * q_i[j];
                if quad <= 0.0 {
                    quad = SVM_TAU;
                }
                let delta = (grad[i] - grad[j]) / quad;
                let sum = alpha[i] + alpha[j];
                alpha[i] -= delta;
                alpha[j] += delta;
                if sum > c_i {
                    if alpha[i] > c_i {
                        alpha[i] = c_i;
                        alpha[j] = sum - c_i;
                    }
                } else if alpha[j] < 0.0 {
                    alpha[j] = 0.0;
                    alpha[i] = sum;
                }
                if sum > c_j {
                    if alpha[j] > c_j {
                        alpha[j] = c_j;
                        alpha[i] = sum - c_j;
                    }
                } else if alpha[i] < 0.0 {
                    alpha[i] = 0.0;
                    alpha[j] = sum;
                }
            }

            let (d_i, d_j) = (alpha[i] - old_i, alpha[j] - old_j);
            for ((g, qi), qj) in grad.iter_mut().zip(&q_i).zip(&q_j) {
                *g += qi * d_i + qj * d_j;
            }
        }

        if !converged {
            warn!(
                "Support vector classifier reached the iteration limit ({}) before converging.",
                max_iter
            );
        }

        let rho = Self::calculate_rho(&problem, &alpha, &grad);
        let mut support_vectors = Vec::new();
        let mut dual_coef = Vec::new();
        for ((a, row), y_t) in alpha.iter().zip(&x).zip(&ys) {
            if *a > 0.0 {
                support_vectors.push(row.clone());
                dual_coef.push(a * y_t);
            }
        }
        debug!(
            "Support vector classifier fitted in {} iterations with {} support vectors.",
            iter,
            support_vectors.len()
        );

        Ok(SupportVectorClassifier {
            params: *params,
            kernel,
            support_vectors,
            dual_coef,
            rho,
            n_iter: iter,
            platt: None,
        })
    }

    fn calculate_rho(problem: &Problem, alpha: &[f64], grad: &[f64]) -> f64 {
        let mut ub = f64::INFINITY;
        let mut lb = f64::NEG_INFINITY;
        let mut n_free = 0;
        let mut sum_free = 0.0;
        for t in 0..alpha.len() {
            let yg = problem.y[t] * grad[t];
            if problem.is_upper_bound(alpha, t) {
                if problem.y[t] < 0.0 {
                    ub = ub.min(yg);
                } else {
                    lb = lb.max(yg);
                }
            } else if problem.is_lower_bound(alpha, t) {
                if problem.y[t] > 0.0 {
                    ub = ub.min(yg);
                } else {
                    lb = lb.max(yg);
                }
            } else {
                n_free += 1;
                sum_free += yg;
            }
        }
        if n_free > 0 {
            sum_free / n_free as f64
        } else {
            (ub + lb) / 2.0
        }
    }

    /// Number of support vectors.
    pub fn n_support(&self) -> usize {
        self.support_vectors.len()
    }

    /// Fit a Platt sigmoid on the decision values of `data`, enabling
    /// [`SupportVectorClassifier::predict_proba`].
    ///
    /// The sigmoid is fitted directly on the decision values of the rows it is
    /// given, usually the training rows, without internal cross-validation
    /// folds. Probabilities on the training rows are therefore optimistic.
    pub fn calibrate(&mut self, data: &Matrix<f64>, y: &[f64]) -> Result<(), OwlError> {
        let decision = self.decision_function(data);
        self.platt = Some(PlattScaling::fit(&decision, y)?);
        Ok(())
    }

    /// Calibrated probability of the positive class.
    pub fn predict_proba(&self, data: &Matrix<f64>) -> Result<Vec<f64>, OwlError> {
        let platt = self.platt.as_ref().ok_or_else(|| {
            OwlError::InvalidConfiguration(
                "probability".to_string(),
                "true when fitting".to_string(),
                "false".to_string(),
            )
        })?;
        Ok(platt.transform(&self.decision_function(data)))
    }
}

impl BinaryClassifier for SupportVectorClassifier {
    fn decision_function(&self, data: &Matrix<f64>) -> Vec<f64> {
        (0..data.rows)
            .map(|r| {
                let row = data.get_row(r);
                self.support_vectors
                    .iter()
                    .zip(&self.dual_coef)
                    .map(|(sv, coef)| coef * self.kernel.compute(sv, &row))
                    .sum::<f64>()
                    - self.rho
            })
            .collect()
    }
}
