//! Frontier Sweep
//!
//! Refit the OWL rule over a grid of trade-off values `k` and collect one
//! row of evaluation statistics per value. Plotting `total_cost` against
//! `total_inverse_R` (and `num_treated`) traces the risk/cost frontier.
use crate::data::Cohort;
use crate::errors::OwlError;
use crate::owl::trainer::train_owl_svm;
use crate::owl::{OwlColumns, OwlConfig};
use crate::utils::validate_float_parameter;
use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Evaluation statistics of one trade-off value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrontierRow {
    pub k: f64,
    pub test_accuracy: f64,
    #[serde(rename = "total_inverse_R")]
    pub total_inverse_risk: f64,
    pub total_cost: f64,
    pub num_treated: usize,
}

/// Frontier rows in the order of the sweep grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrontierTable {
    pub rows: Vec<FrontierRow>,
}

impl FrontierTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FrontierRow> {
        self.rows.iter()
    }

    pub fn k_values(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.k).collect()
    }

    pub fn costs(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.total_cost).collect()
    }

    pub fn inverse_risks(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.total_inverse_risk).collect()
    }

    pub fn treated_counts(&self) -> Vec<usize> {
        self.rows.iter().map(|r| r.num_treated).collect()
    }

    /// Write the table as CSV with the header
    /// `k,test_accuracy,total_inverse_R,total_cost,num_treated`.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), OwlError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for row in &self.rows {
            csv_writer
                .serialize(row)
                .map_err(|e| OwlError::UnableToWrite(e.to_string()))?;
        }
        csv_writer.flush().map_err(|e| OwlError::UnableToWrite(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, OwlError> {
        serde_json::to_string(&self.rows).map_err(|e| OwlError::UnableToWrite(e.to_string()))
    }
}

/// Grid of trade-off values to sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontierSweep {
    /// Trade-off values, swept in this order.
    pub k_values: Vec<f64>,
    /// Fit the grid points on the rayon thread pool.
    pub parallel: bool,
}

impl Default for FrontierSweep {
    /// k = 0.0, 0.1, ..., 1.0.
    fn default() -> Self {
        FrontierSweep {
            k_values: (0..=10).map(|i| i as f64 / 10.0).collect(),
            parallel: false,
        }
    }
}

impl FrontierSweep {
    pub fn new(k_values: Vec<f64>) -> Self {
        FrontierSweep {
            k_values,
            parallel: false,
        }
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn validate(&self) -> Result<(), OwlError> {
        for k in &self.k_values {
            validate_float_parameter(*k, 0.0, 1.0, "k")?;
        }
        Ok(())
    }

    fn run_one(
        k: f64,
        train: &Cohort,
        test: &Cohort,
        columns: &OwlColumns,
        config: &OwlConfig,
    ) -> Result<FrontierRow, OwlError> {
        train_owl_svm(train, test, columns, &config.with_k(k))
            .map(|fit| fit.summary())
            .map_err(|e| OwlError::SweepFailed {
                k,
                source: Box::new(e),
            })
    }

    /// Fit one OWL rule per grid value and collect the frontier.
    ///
    /// A failing grid value aborts the sweep and its error is returned wrapped
    /// with that `k`. No partial table is returned.
    ///
    /// * `train` - Training split.
    /// * `test` - Evaluation split.
    /// * `columns` - Feature, treatment, cost and outcome column names.
    /// * `config` - Settings shared by every grid value; its `k` is replaced.
    pub fn run(
        &self,
        train: &Cohort,
        test: &Cohort,
        columns: &OwlColumns,
        config: &OwlConfig,
    ) -> Result<FrontierTable, OwlError> {
        info!(
            "Sweeping {} trade-off values{}.",
            self.k_values.len(),
            if self.parallel { " in parallel" } else { "" }
        );
        let rows = if self.parallel {
            self.k_values
                .par_iter()
                .map(|k| Self::run_one(*k, train, test, columns, config))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            self.k_values
                .iter()
                .map(|k| Self::run_one(*k, train, test, columns, config))
                .collect::<Result<Vec<_>, _>>()?
        };
        Ok(FrontierTable { rows })
    }
}
