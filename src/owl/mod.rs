//! Outcome Weighted Learning
//!
//! The OWL pipeline: cost assignment, risk and propensity nuisance models,
//! the risk/cost trade-off weights, the weighted support vector classifier
//! for the treatment rule, and the frontier sweep over the trade-off `k`.
use crate::classifier::kernel::Kernel;
use crate::classifier::svc::SvcParams;
use crate::constants::{DEFAULT_EPSILON, LOGISTIC_C, LOGISTIC_MAX_ITER, SVM_TOLERANCE};
use crate::errors::OwlError;
use crate::utils::{validate_float_parameter, validate_positive_float_parameter};
use serde::{Deserialize, Serialize};

pub mod cost;
pub mod estimator;
pub mod frontier;
pub mod trainer;
pub mod weights;

mod tests;

pub use cost::{assign_cost, CostConfig};
pub use estimator::{NuisanceFit, RiskPropensityEstimator};
pub use frontier::{FrontierRow, FrontierSweep, FrontierTable};
pub use trainer::{train_owl_svm, OwlFit};
pub use weights::{calculate_owl_weights, owl_weights, WeightParams};

/// Names of the cohort columns the pipeline reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OwlColumns {
    /// Covariates used by every model.
    pub features: Vec<String>,
    /// Observed binary treatment.
    pub treatment: String,
    /// Cost per subject.
    pub cost: String,
    /// Observed binary outcome, e.g. readmission.
    pub outcome: String,
}

impl Default for OwlColumns {
    fn default() -> Self {
        OwlColumns {
            features: Vec::new(),
            treatment: "Tx".to_string(),
            cost: "cost".to_string(),
            outcome: "Readmit".to_string(),
        }
    }
}

impl OwlColumns {
    pub fn new(features: Vec<String>, treatment: &str, cost: &str, outcome: &str) -> Self {
        OwlColumns {
            features,
            treatment: treatment.to_string(),
            cost: cost.to_string(),
            outcome: outcome.to_string(),
        }
    }

    /// Default column names with features `x0..x{n_features - 1}`.
    pub fn synthetic(n_features: usize) -> Self {
        OwlColumns {
            features: (0..n_features).map(|i| format!("x{}", i)).collect(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), OwlError> {
        if self.features.is_empty() {
            return Err(OwlError::InvalidInput("at least one feature is required".to_string()));
        }
        for role in [&self.treatment, &self.outcome, &self.cost] {
            if self.features.contains(role) {
                return Err(OwlError::InvalidInput(format!(
                    "column `{}` cannot be both a feature and the treatment, outcome or cost",
                    role
                )));
            }
        }
        Ok(())
    }
}

/// One OWL run: trade-off, amplification, classifier and nuisance settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OwlConfig {
    /// Risk/cost trade-off in [0, 1].
    pub k: f64,
    /// Amplification strength.
    pub alpha: f64,
    /// Added to the risk before inversion.
    pub epsilon: f64,
    /// Kernel of the support vector classifier.
    pub kernel: Kernel,
    /// Regularization of the support vector classifier.
    pub svm_c: f64,
    /// Stopping tolerance of the support vector solver.
    pub svm_tol: f64,
    /// Fit Platt scaling so the classifier can output probabilities.
    pub probability: bool,
    /// Inverse regularization of the nuisance logistic regressions.
    pub logistic_c: f64,
    /// Iteration cap of the nuisance logistic regressions.
    pub logistic_max_iter: usize,
    /// Where the nuisance models are fitted.
    pub nuisance: NuisanceFit,
    /// Cost used to price the predicted treatment assignment.
    pub cost: CostConfig,
}

impl Default for OwlConfig {
    fn default() -> Self {
        OwlConfig {
            k: 0.5,
            alpha: 0.0,
            epsilon: DEFAULT_EPSILON,
            kernel: Kernel::Linear,
            svm_c: 1.0,
            svm_tol: SVM_TOLERANCE,
            probability: false,
            logistic_c: LOGISTIC_C,
            logistic_max_iter: LOGISTIC_MAX_ITER,
            nuisance: NuisanceFit::PerCohort,
            cost: CostConfig::default(),
        }
    }
}

impl OwlConfig {
    pub fn validate(&self) -> Result<(), OwlError> {
        self.weight_params().validate()?;
        validate_positive_float_parameter(self.svm_c, "svm_c")?;
        validate_positive_float_parameter(self.svm_tol, "svm_tol")?;
        validate_positive_float_parameter(self.logistic_c, "logistic_c")?;
        validate_float_parameter(self.logistic_max_iter as f64, 1.0, f64::MAX, "logistic_max_iter")?;
        self.cost.validate()
    }

    /// A copy of this configuration with a different trade-off.
    pub fn with_k(&self, k: f64) -> Self {
        OwlConfig { k, ..self.clone() }
    }

    pub fn weight_params(&self) -> WeightParams {
        WeightParams {
            k: self.k,
            alpha: self.alpha,
            epsilon: self.epsilon,
        }
    }

    pub fn svc_params(&self) -> SvcParams {
        SvcParams {
            kernel: self.kernel,
            c: self.svm_c,
            tol: self.svm_tol,
            max_iter: None,
        }
    }
}
