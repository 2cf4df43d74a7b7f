//! Kernels
//!
//! Kernel functions for the support vector classifier, with scikit-learn's
//! `scale` and `auto` heuristics for the kernel coefficient.
use crate::data::Matrix;
use crate::errors::OwlError;
use crate::utils::{dot, items_to_strings, variance};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Kernel coefficient for the `rbf`, `poly` and `sigmoid` kernels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum Gamma {
    /// 1 / (n_features * Var(X)).
    #[default]
    Scale,
    /// 1 / n_features.
    Auto,
    /// A fixed value.
    Value(f64),
}

/// Kernel choice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum Kernel {
    /// $\langle x, x' \rangle$
    #[default]
    Linear,
    /// $\exp(-\gamma \lVert x - x' \rVert^2)$
    Rbf { gamma: Gamma },
    /// $(\gamma \langle x, x' \rangle + c_0)^d$
    Poly { degree: u32, gamma: Gamma, coef0: f64 },
    /// $\tanh(\gamma \langle x, x' \rangle + c_0)$
    Sigmoid { gamma: Gamma, coef0: f64 },
}

fn get_parse_error(s: &str) -> OwlError {
    OwlError::ParseString(
        s.to_string(),
        "Kernel".to_string(),
        items_to_strings(vec!["linear", "rbf", "poly", "sigmoid"]),
    )
}

impl FromStr for Kernel {
    type Err = OwlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linear" => Ok(Kernel::Linear),
            "rbf" => Ok(Kernel::Rbf { gamma: Gamma::Scale }),
            "poly" => Ok(Kernel::Poly {
                degree: 3,
                gamma: Gamma::Scale,
                coef0: 0.0,
            }),
            "sigmoid" => Ok(Kernel::Sigmoid {
                gamma: Gamma::Scale,
                coef0: 0.0,
            }),
            _ => Err(get_parse_error(s)),
        }
    }
}

/// A kernel with its coefficient resolved against training data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KernelFunction {
    pub kernel: Kernel,
    pub gamma: f64,
}

impl Kernel {
    /// Resolve the kernel coefficient on the training data.
    pub fn resolve(&self, data: &Matrix<f64>) -> Result<KernelFunction, OwlError> {
        let gamma = match self {
            Kernel::Linear => return Ok(KernelFunction { kernel: *self, gamma: 0.0 }),
            Kernel::Rbf { gamma } | Kernel::Poly { gamma, .. } | Kernel::Sigmoid { gamma, .. } => *gamma,
        };
        let n_features = data.cols.max(1) as f64;
        let g = match gamma {
            Gamma::Scale => {
                let var = variance(data.data);
                if var > 0.0 {
                    1.0 / (n_features * var)
                } else {
                    1.0
                }
            }
            Gamma::Auto => 1.0 / n_features,
            Gamma::Value(v) => {
                if !(v.is_finite() && v > 0.0) {
                    return Err(OwlError::InvalidConfiguration(
                        "gamma".to_string(),
                        "a finite value greater than 0".to_string(),
                        v.to_string(),
                    ));
                }
                v
            }
        };
        Ok(KernelFunction { kernel: *self, gamma: g })
    }
}

impl KernelFunction {
    #[inline]
    pub fn compute(&self, a: &[f64], b: &[f64]) -> f64 {
        match self.kernel {
            Kernel::Linear => dot(a, b),
            Kernel::Rbf { .. } => {
                let sq: f64 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
                (-self.gamma * sq).exp()
            }
            Kernel::Poly { degree, coef0, .. } => (self.gamma * dot(a, b) + coef0).powi(degree as i32),
            Kernel::Sigmoid { coef0, .. } => (self.gamma * dot(a, b) + coef0).tanh(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::precision_round;

    #[test]
    fn test_parse_kernel() {
        assert_eq!(Kernel::from_str("linear").unwrap(), Kernel::Linear);
        assert_eq!(Kernel::from_str("RBF").unwrap(), Kernel::Rbf { gamma: Gamma::Scale });
        assert!(matches!(Kernel::from_str("cubic"), Err(OwlError::ParseString(..))));
    }

    #[test]
    fn test_kernel_values() {
        let data = vec![0.0, 2.0, 0.0, 2.0];
        let m = Matrix::new(&data, 2, 2);
        let a = [1.0, 2.0];
        let b = [3.0, 4.0];

        let lin = Kernel::Linear.resolve(&m).unwrap();
        assert_eq!(lin.compute(&a, &b), 11.0);

        let rbf = Kernel::Rbf {
            gamma: Gamma::Value(0.5),
        }
        .resolve(&m)
        .unwrap();
        assert_eq!(precision_round(rbf.compute(&a, &b), 10), precision_round((-4.0_f64).exp(), 10));

        let poly = Kernel::Poly {
            degree: 2,
            gamma: Gamma::Auto,
            coef0: 1.0,
        }
        .resolve(&m)
        .unwrap();
        assert_eq!(poly.gamma, 0.5);
        assert_eq!(poly.compute(&a, &b), 42.25);
    }

    #[test]
    fn test_gamma_scale() {
        // Variance over all entries is 1.0, two features.
        let data = vec![0.0, 2.0, 0.0, 2.0];
        let m = Matrix::new(&data, 2, 2);
        let k = Kernel::Rbf { gamma: Gamma::Scale }.resolve(&m).unwrap();
        assert_eq!(k.gamma, 0.5);
        assert!(Kernel::Rbf {
            gamma: Gamma::Value(-1.0)
        }
        .resolve(&m)
        .is_err());
    }
}
