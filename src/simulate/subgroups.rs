//! Risk subgroups from a baseline outcome model.
use crate::classifier::logistic::LogisticRegression;
use crate::data::{Cohort, Matrix};
use crate::errors::OwlError;
use crate::utils::{quantile, validate_float_parameter};
use serde::{Deserialize, Serialize};

/// Quantile cut points and output columns of the subgroup assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubgroupConfig {
    /// Lower quantile of predicted risk, start of subgroup 1.
    pub lower: f64,
    /// Upper quantile of predicted risk, end of subgroup 1 and start of subgroup 2.
    pub upper: f64,
    pub preds_column: String,
    pub subgroup_column: String,
}

impl Default for SubgroupConfig {
    fn default() -> Self {
        SubgroupConfig {
            lower: 0.6,
            upper: 0.8,
            preds_column: "preds".to_string(),
            subgroup_column: "subgroup".to_string(),
        }
    }
}

/// Assign subjects to risk subgroups.
///
/// A logistic regression of `outcome` on `features` gives a predicted risk per
/// subject. Subjects between the `lower` and `upper` risk quantiles (inclusive)
/// form subgroup 1, those above the `upper` quantile subgroup 2, the rest
/// subgroup 0. Returns a copy of the cohort with the prediction and subgroup
/// columns added.
pub fn assign_subgroups(
    cohort: &Cohort,
    features: &[String],
    outcome: &str,
    config: &SubgroupConfig,
) -> Result<Cohort, OwlError> {
    validate_float_parameter(config.lower, 0.0, 1.0, "lower")?;
    validate_float_parameter(config.upper, config.lower, 1.0, "upper")?;
    let y: Vec<f64> = cohort.binary_column(outcome)?.into_iter().map(f64::from).collect();
    let data = cohort.feature_matrix(features)?;
    let matrix = Matrix::new(&data, cohort.len(), features.len());
    let mut model = LogisticRegression::default();
    model.fit(&matrix, &y, None)?;
    let preds = model.predict_proba(&matrix);

    let q_lower = quantile(&preds, config.lower);
    let q_upper = quantile(&preds, config.upper);
    let subgroup: Vec<f64> = preds
        .iter()
        .map(|p| {
            if *p >= q_lower && *p <= q_upper {
                1.0
            } else if *p > q_upper {
                2.0
            } else {
                0.0
            }
        })
        .collect();

    let mut out = cohort.clone();
    out.insert_column(&config.preds_column, preds)?;
    out.insert_column(&config.subgroup_column, subgroup)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulate::synthetic::SyntheticCohort;

    #[test]
    fn test_subgroup_shares() {
        let cohort = SyntheticCohort {
            n_subjects: 200,
            ..Default::default()
        }
        .generate()
        .unwrap();
        let features: Vec<String> = vec!["x0".into(), "x1".into(), "x2".into(), "Tx".into()];
        let out = assign_subgroups(&cohort, &features, "Readmit", &SubgroupConfig::default()).unwrap();
        let sg = out.column("subgroup").unwrap();
        let count = |g: f64| sg.iter().filter(|v| **v == g).count();
        // Continuous predictions: 60% / 20% / 20% up to the boundary rows.
        assert!((118..=121).contains(&count(0.0)));
        assert!((39..=42).contains(&count(1.0)));
        assert!((38..=41).contains(&count(2.0)));
        assert_eq!(count(0.0) + count(1.0) + count(2.0), 200);

        // Subgroup 2 has the highest predicted risk.
        let preds = out.column("preds").unwrap();
        let min_top = preds
            .iter()
            .zip(sg)
            .filter(|(_, g)| **g == 2.0)
            .map(|(p, _)| *p)
            .fold(f64::INFINITY, f64::min);
        let max_bottom = preds
            .iter()
            .zip(sg)
            .filter(|(_, g)| **g == 0.0)
            .map(|(p, _)| *p)
            .fold(f64::NEG_INFINITY, f64::max);
        assert!(min_top > max_bottom);
    }

    #[test]
    fn test_subgroup_config_checked() {
        let cohort = SyntheticCohort::default().generate().unwrap();
        let config = SubgroupConfig {
            lower: 0.9,
            upper: 0.5,
            ..Default::default()
        };
        assert!(assign_subgroups(&cohort, &["x0".to_string()], "Readmit", &config).is_err());
    }
}
