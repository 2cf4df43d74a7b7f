//! Pipeline configuration
//!
//! Everything needed to go from a raw cohort to a frontier table, loadable
//! from and savable to json.
use crate::constants::DEFAULT_SEED;
use crate::data::Cohort;
use crate::errors::OwlError;
use crate::owl::cost::{assign_cost, CostConfig};
use crate::owl::frontier::{FrontierSweep, FrontierTable};
use crate::owl::{OwlColumns, OwlConfig};
use log::info;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Train/evaluation split of the cohort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Share of subjects held out for evaluation, in (0, 1).
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        SplitConfig {
            test_fraction: 0.2,
            seed: DEFAULT_SEED,
        }
    }
}

impl SplitConfig {
    pub fn validate(&self) -> Result<(), OwlError> {
        if self.test_fraction <= 0.0 || self.test_fraction >= 1.0 || self.test_fraction.is_nan() {
            return Err(OwlError::InvalidConfiguration(
                "test_fraction".to_string(),
                "a value in (0, 1)".to_string(),
                self.test_fraction.to_string(),
            ));
        }
        Ok(())
    }
}

/// A complete frontier run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub columns: OwlColumns,
    pub owl: OwlConfig,
    /// Cost assigned to the observed treatment before splitting.
    pub cost: CostConfig,
    pub sweep: FrontierSweep,
    pub split: SplitConfig,
}

impl PipelineConfig {
    /// Check every setting before any model is fitted.
    pub fn validate(&self) -> Result<(), OwlError> {
        self.columns.validate()?;
        self.owl.validate()?;
        self.cost.validate()?;
        self.sweep.validate()?;
        self.split.validate()
    }

    /// Price the observed treatment, split the cohort and sweep the frontier.
    ///
    /// The caller's cohort is left untouched.
    pub fn run(&self, cohort: &Cohort) -> Result<FrontierTable, OwlError> {
        self.validate()?;
        let mut priced = cohort.clone();
        assign_cost(&mut priced, &self.columns.treatment, &self.columns.cost, &self.cost)?;
        let (train, test) = priced.train_test_split(self.split.test_fraction, self.split.seed)?;
        info!(
            "Split {} subjects into {} training and {} evaluation subjects.",
            priced.len(),
            train.len(),
            test.len()
        );
        self.sweep.run(&train, &test, &self.columns, &self.owl)
    }
}

/// Json persistence for configuration objects.
pub trait ConfigIO: Serialize + DeserializeOwned + Sized {
    /// Save as a json object to a file.
    ///
    /// * `path` - Path to save the configuration.
    fn save_config<P: AsRef<Path>>(&self, path: P) -> Result<(), OwlError> {
        fs::write(path, self.json_dump()?).map_err(|e| OwlError::UnableToWrite(e.to_string()))
    }

    /// Dump as a json object.
    fn json_dump(&self) -> Result<String, OwlError> {
        serde_json::to_string(self).map_err(|e| OwlError::UnableToWrite(e.to_string()))
    }

    /// Load from a json string.
    ///
    /// * `json_str` - String object, which can be serialized to json.
    fn from_json(json_str: &str) -> Result<Self, OwlError> {
        serde_json::from_str::<Self>(json_str).map_err(|e| OwlError::UnableToRead(e.to_string()))
    }

    /// Load from a path to a json object.
    ///
    /// * `path` - Path to load the configuration from.
    fn load_config<P: AsRef<Path>>(path: P) -> Result<Self, OwlError> {
        let json_str = fs::read_to_string(path).map_err(|e| OwlError::UnableToRead(e.to_string()))?;
        Self::from_json(&json_str)
    }
}

impl ConfigIO for PipelineConfig {}
impl ConfigIO for OwlConfig {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::kernel::{Gamma, Kernel};
    use crate::simulate::synthetic::SyntheticCohort;
    use crate::owl::estimator::NuisanceFit;
    use tempfile::tempdir;

    #[test]
    fn test_pipeline_config_default() {
        let config = PipelineConfig::default();
        assert_eq!(config.owl.k, 0.5);
        assert_eq!(config.cost.high_cost, 40.0);
        assert_eq!(config.sweep.k_values.len(), 11);
        assert_eq!(config.split.test_fraction, 0.2);
        assert_eq!(config.columns.treatment, "Tx");
    }

    #[test]
    fn test_config_io_json() {
        let mut config = PipelineConfig::default();
        config.columns = OwlColumns::synthetic(3);
        config.owl.kernel = Kernel::Rbf { gamma: Gamma::Scale };
        config.owl.nuisance = NuisanceFit::TrainOnly;
        let json = config.json_dump().unwrap();
        let config2 = PipelineConfig::from_json(&json).unwrap();
        assert_eq!(config, config2);
    }

    #[test]
    fn test_config_partial_json_uses_defaults() {
        let config = PipelineConfig::from_json(r#"{"owl": {"k": 0.3}, "split": {"seed": 7}}"#).unwrap();
        assert_eq!(config.owl.k, 0.3);
        assert_eq!(config.owl.svm_c, 1.0);
        assert_eq!(config.split.seed, 7);
        assert_eq!(config.split.test_fraction, 0.2);
    }

    #[test]
    fn test_config_io_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("pipeline.json");
        let config = PipelineConfig {
            columns: OwlColumns::synthetic(2),
            ..Default::default()
        };
        config.save_config(&file_path).unwrap();
        let config2 = PipelineConfig::load_config(&file_path).unwrap();
        assert_eq!(config, config2);
        assert!(matches!(
            PipelineConfig::load_config(dir.path().join("missing.json")),
            Err(OwlError::UnableToRead(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = PipelineConfig {
            columns: OwlColumns::synthetic(2),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        config.split.test_fraction = 1.0;
        assert!(config.validate().is_err());
        config.split.test_fraction = 0.3;
        config.sweep.k_values.push(1.5);
        assert!(config.validate().is_err());
        config.sweep = FrontierSweep::default();
        config.cost.low_cost = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pipeline_run() {
        let cohort = SyntheticCohort::default().generate().unwrap();
        let before = cohort.clone();
        let config = PipelineConfig {
            columns: OwlColumns::synthetic(5),
            sweep: FrontierSweep::new(vec![0.0, 0.5, 1.0]),
            ..Default::default()
        };
        let table = config.run(&cohort).unwrap();
        assert_eq!(table.k_values(), vec![0.0, 0.5, 1.0]);
        for row in table.iter() {
            assert!(row.num_treated <= 20);
            assert_eq!(row.total_cost, 40.0 * row.num_treated as f64);
        }
        assert_eq!(cohort, before);

        let mut bad = cohort.clone();
        let tx: Vec<f64> = cohort.column("Tx").unwrap().iter().map(|t| t * 2.0).collect();
        bad.insert_column("Tx", tx).unwrap();
        assert!(matches!(config.run(&bad), Err(OwlError::InvalidInput(_))));
    }
}
