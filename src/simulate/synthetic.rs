//! Synthetic cohorts with a known outcome mechanism.
use crate::data::Cohort;
use crate::errors::OwlError;
use crate::owl::cost::{assign_cost, CostConfig};
use crate::utils::{sigmoid, validate_float_parameter};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

/// Generator of a trial-like cohort.
///
/// Features `x0..x{n_features - 1}` are standard normal. Exactly
/// `round(n_subjects * treatment_rate)` subjects are treated (`Tx`), chosen at
/// random. Readmission (`Readmit`) is Bernoulli with log-odds
/// `baseline_logit + outcome_signal * x0`. A `cost` column is priced from `Tx`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticCohort {
    pub n_subjects: usize,
    pub n_features: usize,
    pub treatment_rate: f64,
    pub outcome_signal: f64,
    pub baseline_logit: f64,
    pub seed: u64,
    pub cost: CostConfig,
}

impl Default for SyntheticCohort {
    fn default() -> Self {
        SyntheticCohort {
            n_subjects: 100,
            n_features: 5,
            treatment_rate: 0.5,
            outcome_signal: 1.0,
            baseline_logit: 0.0,
            seed: 42,
            cost: CostConfig::default(),
        }
    }
}

impl SyntheticCohort {
    pub fn generate(&self) -> Result<Cohort, OwlError> {
        if self.n_subjects < 2 {
            return Err(OwlError::InsufficientData(format!(
                "a synthetic cohort needs at least 2 subjects, {} requested",
                self.n_subjects
            )));
        }
        if self.n_features == 0 {
            return Err(OwlError::InvalidConfiguration(
                "n_features".to_string(),
                "at least 1".to_string(),
                "0".to_string(),
            ));
        }
        validate_float_parameter(self.treatment_rate, 0.0, 1.0, "treatment_rate")?;

        let mut rng = StdRng::seed_from_u64(self.seed);
        let n = self.n_subjects;
        let mut cohort = Cohort::new((0..n as u64).collect());

        let mut signal = Vec::new();
        for j in 0..self.n_features {
            let values: Vec<f64> = (0..n).map(|_| rng.sample::<f64, _>(StandardNormal)).collect();
            if j == 0 {
                signal = values.clone();
            }
            cohort.insert_column(&format!("x{}", j), values)?;
        }

        let n_treated = (n as f64 * self.treatment_rate).round() as usize;
        let mut treatment: Vec<f64> = (0..n).map(|i| if i < n_treated { 1.0 } else { 0.0 }).collect();
        treatment.shuffle(&mut rng);
        cohort.insert_column("Tx", treatment)?;

        let outcome: Vec<f64> = signal
            .iter()
            .map(|x| {
                let p = sigmoid(self.baseline_logit + self.outcome_signal * x);
                if rng.gen::<f64>() < p {
                    1.0
                } else {
                    0.0
                }
            })
            .collect();
        cohort.insert_column("Readmit", outcome)?;
        assign_cost(&mut cohort, "Tx", "cost", &self.cost)?;
        Ok(cohort)
    }
}
