//! Errors
//!
//! Custom error types used throughout the `owl_frontier` crate.
use thiserror::Error;

/// Errors that can occur while weighting, training or sweeping.
#[derive(Debug, Error)]
pub enum OwlError {
    /// Missing or malformed column, or a value outside its coding.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// First value is the name of the parameter, second is expected, third is what was passed.
    #[error("Invalid parameter value passed for {0}, expected {1} but {2} provided.")]
    InvalidConfiguration(String, String, String),
    /// Not enough rows, or not enough classes, to fit a model.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),
    /// A single k value of the frontier sweep failed.
    #[error("Frontier sweep failed at k = {k}: {source}")]
    SweepFailed {
        k: f64,
        #[source]
        source: Box<OwlError>,
    },
    /// Unable to write a configuration or table.
    #[error("Unable to write: {0}")]
    UnableToWrite(String),
    /// Unable to read a configuration or table.
    #[error("Unable to read: {0}")]
    UnableToRead(String),
    /// Invalid value parsing.
    #[error("Invalid value {0} passed for {1}, expected one of {2}.")]
    ParseString(String, String, String),
}

impl OwlError {
    /// Shorthand for a missing column.
    pub(crate) fn missing_column(name: &str) -> Self {
        OwlError::InvalidInput(format!("column `{}` not found in cohort", name))
    }
}
