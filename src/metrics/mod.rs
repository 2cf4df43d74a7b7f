//! Metrics
//!
//! Evaluation metrics for binary classification, used to score the predicted
//! treatment assignment and to report on the nuisance models.
pub mod classification;
