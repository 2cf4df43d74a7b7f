//! Classifier
//!
//! The models behind the OWL pipeline: logistic regression for the risk and
//! propensity nuisance models, and a weighted kernel support vector
//! classifier (with feature standardization and optional Platt scaling) for
//! the treatment rule.
use crate::data::Matrix;
use crate::errors::OwlError;

pub mod kernel;
pub mod logistic;
pub mod platt;
pub mod scaler;
pub mod svc;

/// A fitted binary classifier scoring rows of a feature matrix.
pub trait BinaryClassifier {
    /// Raw score for each row, positive for the positive class.
    fn decision_function(&self, data: &Matrix<f64>) -> Vec<f64>;

    /// Hard 0/1 predictions.
    fn predict(&self, data: &Matrix<f64>) -> Vec<f64> {
        self.decision_function(data)
            .into_iter()
            .map(|d| if d > 0.0 { 1.0 } else { 0.0 })
            .collect()
    }
}

/// Check a target is coded {0, 1}, matches the row count, and has both classes.
pub(crate) fn check_binary_target(y: &[f64], rows: usize, what: &str) -> Result<(), OwlError> {
    if y.len() != rows {
        return Err(OwlError::InvalidInput(format!(
            "{} has {} values for {} rows",
            what,
            y.len(),
            rows
        )));
    }
    if y.is_empty() {
        return Err(OwlError::InsufficientData(format!("{} is empty", what)));
    }
    if let Some(v) = y.iter().find(|v| **v != 0.0 && **v != 1.0) {
        return Err(OwlError::InvalidInput(format!("{} must be coded {{0, 1}}, found {}", what, v)));
    }
    let positives = y.iter().filter(|v| **v == 1.0).count();
    if positives == 0 || positives == y.len() {
        return Err(OwlError::InsufficientData(format!(
            "{} contains a single class, cannot fit a classifier",
            what
        )));
    }
    Ok(())
}
