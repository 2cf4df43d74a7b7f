//! Platt Scaling
//!
//! Maps decision values to probabilities with a fitted sigmoid
//! $P(y = 1 \mid f) = 1 / (1 + \exp(A f + B))$, following the Newton method
//! with backtracking of Lin, Lin & Weng (2007).
use crate::classifier::check_binary_target;
use crate::constants::{PLATT_MAX_ITER, PLATT_MIN_STEP, PLATT_SIGMA};
use crate::errors::OwlError;
use log::warn;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlattScaling {
    pub a: f64,
    pub b: f64,
}

// log(1 + exp(-|z|)) style evaluation of the cross entropy at f*A + B.
fn objective(decision: &[f64], target: &[f64], a: f64, b: f64) -> f64 {
    decision
        .iter()
        .zip(target)
        .map(|(d, t)| {
            let f_apb = d * a + b;
            if f_apb >= 0.0 {
                t * f_apb + (-f_apb).exp().ln_1p()
            } else {
                (t - 1.0) * f_apb + f_apb.exp().ln_1p()
            }
        })
        .sum()
}

impl PlattScaling {
    /// Fit the sigmoid.
    ///
    /// * `decision` - Decision values of the classifier.
    /// * `y` - Binary labels coded 0/1.
    pub fn fit(decision: &[f64], y: &[f64]) -> Result<Self, OwlError> {
        check_binary_target(y, decision.len(), "Platt scaling target")?;
        let prior1 = y.iter().filter(|v| **v == 1.0).count() as f64;
        let prior0 = y.len() as f64 - prior1;
        let hi_target = (prior1 + 1.0) / (prior1 + 2.0);
        let lo_target = 1.0 / (prior0 + 2.0);
        let target: Vec<f64> = y.iter().map(|v| if *v == 1.0 { hi_target } else { lo_target }).collect();

        let mut a = 0.0;
        let mut b = ((prior0 + 1.0) / (prior1 + 1.0)).ln();
        let mut fval = objective(decision, &target, a, b);

        for _ in 0..PLATT_MAX_ITER {
            let (mut h11, mut h22, mut h21) = (PLATT_SIGMA, PLATT_SIGMA, 0.0);
            let (mut g1, mut g2) = (0.0, 0.0);
            for (d, t) in decision.iter().zip(&target) {
                let f_apb = d * a + b;
                let (p, q) = if f_apb >= 0.0 {
                    let e = (-f_apb).exp();
                    (e / (1.0 + e), 1.0 / (1.0 + e))
                } else {
                    let e = f_apb.exp();
                    (1.0 / (1.0 + e), e / (1.0 + e))
                };
                let d2 = p * q;
                h11 += d * d * d2;
                h22 += d2;
                h21 += d * d2;
                let d1 = t - p;
                g1 += d * d1;
                g2 += d1;
            }
            if g1.abs() < 1e-5 && g2.abs() < 1e-5 {
                break;
            }

            let det = h11 * h22 - h21 * h21;
            let d_a = -(h22 * g1 - h21 * g2) / det;
            let d_b = -(-h21 * g1 + h11 * g2) / det;
            let gd = g1 * d_a + g2 * d_b;

            let mut step = 1.0;
            while step >= PLATT_MIN_STEP {
                let (new_a, new_b) = (a + step * d_a, b + step * d_b);
                let new_f = objective(decision, &target, new_a, new_b);
                if new_f < fval + 1e-4 * step * gd {
                    a = new_a;
                    b = new_b;
                    fval = new_f;
                    break;
                }
                step /= 2.0;
            }
            if step < PLATT_MIN_STEP {
                warn!("Platt scaling line search failed, keeping the current sigmoid.");
                break;
            }
        }
        Ok(PlattScaling { a, b })
    }

    /// Probability of the positive class for each decision value.
    pub fn transform(&self, decision: &[f64]) -> Vec<f64> {
        decision
            .iter()
            .map(|d| {
                let f_apb = d * self.a + self.b;
                if f_apb >= 0.0 {
                    let e = (-f_apb).exp();
                    e / (1.0 + e)
                } else {
                    1.0 / (1.0 + f_apb.exp())
                }
            })
            .collect()
    }
}
