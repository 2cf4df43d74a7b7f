//! Cost Assigner
//!
//! Maps a binary treatment-like indicator to a scalar cost per subject.
use crate::constants::{DEFAULT_HIGH_COST, DEFAULT_LOW_COST};
use crate::data::Cohort;
use crate::errors::OwlError;
use crate::utils::validate_positive_float_parameter;
use serde::{Deserialize, Serialize};

/// Cost of an untreated (`low_cost`) and a treated (`high_cost`) subject.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostConfig {
    pub low_cost: f64,
    pub high_cost: f64,
}

impl Default for CostConfig {
    fn default() -> Self {
        CostConfig {
            low_cost: DEFAULT_LOW_COST,
            high_cost: DEFAULT_HIGH_COST,
        }
    }
}

impl CostConfig {
    /// Costs are later used as power bases in a denominator, so both must be positive.
    pub fn validate(&self) -> Result<(), OwlError> {
        validate_positive_float_parameter(self.low_cost, "low_cost")?;
        validate_positive_float_parameter(self.high_cost, "high_cost")
    }
}

/// Cost per subject for an already validated 0/1 indicator.
pub fn cost_of(indicator: &[u8], config: &CostConfig) -> Vec<f64> {
    indicator
        .iter()
        .map(|v| if *v == 1 { config.high_cost } else { config.low_cost })
        .collect()
}

/// Add (or overwrite) `cost_column` with the cost implied by `indicator_column`.
///
/// * `cohort` - Cohort to update.
/// * `indicator_column` - Name of a column coded {0, 1}.
/// * `cost_column` - Name of the cost column to write.
/// * `config` - Low and high cost.
pub fn assign_cost(
    cohort: &mut Cohort,
    indicator_column: &str,
    cost_column: &str,
    config: &CostConfig,
) -> Result<(), OwlError> {
    config.validate()?;
    let indicator = cohort.binary_column(indicator_column)?;
    cohort.insert_column(cost_column, cost_of(&indicator, config))
}
