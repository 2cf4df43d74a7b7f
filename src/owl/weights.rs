//! Weight Calculator
//!
//! Per-subject OWL importance weights. With risk $R$, cost $C$, propensity
//! $p$ and trade-off $k$:
//!
//! * transformed risk $\tilde R = 1 / (R + \epsilon)$, so low risk scores high,
//! * amplified risk $A_R = (\tilde R^{1 + \alpha \hat R})^k$ with $\hat R$ the
//!   min-max normalized $\tilde R$,
//! * amplified cost $A_C = (C^{1 - \alpha \hat C})^{1-k}$ with $\hat C$ the
//!   min-max normalized cost,
//! * weight $w = (A_R / A_C) / p$ for treated subjects and
//!   $(A_R / A_C) / (1 - p)$ for untreated ones.
use crate::classifier::logistic::LogisticRegression;
use crate::constants::{
    AMPLIFIED_COST_COLUMN, AMPLIFIED_RISK_COLUMN, NORM_TRANS_COST_COLUMN, NORM_TRANS_RISK_COLUMN,
    PROPENSITY_CLIP, PROPENSITY_COLUMN, RISK_COLUMN, RISK_FLOOR, TRANSFORMED_RISK_COLUMN, WEIGHT_COLUMN,
};
use crate::data::Cohort;
use crate::errors::OwlError;
use crate::owl::estimator::{NuisancePredictions, RiskPropensityEstimator};
use crate::owl::{OwlColumns, OwlConfig};
use crate::utils::{min_max_normalize, validate_float_parameter};
use serde::{Deserialize, Serialize};

/// The knobs of the weight formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightParams {
    /// Risk/cost trade-off exponent in [0, 1]; 1 weighs only risk, 0 only cost.
    pub k: f64,
    /// Amplification strength, non-negative.
    pub alpha: f64,
    /// Added to the risk before inversion, non-negative.
    pub epsilon: f64,
}

impl WeightParams {
    pub fn validate(&self) -> Result<(), OwlError> {
        validate_float_parameter(self.k, 0.0, 1.0, "k")?;
        validate_float_parameter(self.alpha, 0.0, f64::MAX, "alpha")?;
        validate_float_parameter(self.epsilon, 0.0, f64::MAX, "epsilon")
    }
}

/// Every derived quantity of the weight formula, one value per subject.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightComponents {
    pub transformed_risk: Vec<f64>,
    pub norm_trans_risk: Vec<f64>,
    pub amplified_risk: Vec<f64>,
    pub norm_trans_cost: Vec<f64>,
    pub amplified_cost: Vec<f64>,
    pub weight: Vec<f64>,
}

fn check_len(name: &str, len: usize, n: usize) -> Result<(), OwlError> {
    if len != n {
        Err(OwlError::InvalidInput(format!("{} has {} values, expected {}", name, len, n)))
    } else {
        Ok(())
    }
}

/// Compute the OWL weights from nuisance predictions, cost and treatment.
///
/// * `risk` - Predicted outcome probability per subject.
/// * `propensity` - Predicted treatment probability per subject.
/// * `cost` - Positive cost per subject.
/// * `treatment` - Observed treatment, 0 or 1.
/// * `params` - Trade-off, amplification and epsilon.
pub fn owl_weights(
    risk: &[f64],
    propensity: &[f64],
    cost: &[f64],
    treatment: &[u8],
    params: &WeightParams,
) -> Result<WeightComponents, OwlError> {
    params.validate()?;
    let n = treatment.len();
    if n == 0 {
        return Err(OwlError::InsufficientData("cannot weight an empty cohort".to_string()));
    }
    check_len("risk", risk.len(), n)?;
    check_len("propensity", propensity.len(), n)?;
    check_len("cost", cost.len(), n)?;
    if let Some(r) = risk.iter().find(|r| !(0.0..=1.0).contains(*r)) {
        return Err(OwlError::InvalidInput(format!("risk must lie in [0, 1], found {}", r)));
    }
    if let Some(p) = propensity.iter().find(|p| !(0.0..=1.0).contains(*p)) {
        return Err(OwlError::InvalidInput(format!("propensity must lie in [0, 1], found {}", p)));
    }
    if let Some(c) = cost.iter().find(|c| !(c.is_finite() && **c > 0.0)) {
        return Err(OwlError::InvalidInput(format!("cost must be finite and positive, found {}", c)));
    }
    if let Some(t) = treatment.iter().find(|t| **t > 1) {
        return Err(OwlError::InvalidInput(format!("treatment must be coded {{0, 1}}, found {}", t)));
    }

    let WeightParams { k, alpha, epsilon } = *params;

    let transformed_risk: Vec<f64> = risk.iter().map(|r| 1.0 / (r + epsilon).max(RISK_FLOOR)).collect();
    let norm_trans_risk = min_max_normalize(&transformed_risk, TRANSFORMED_RISK_COLUMN);
    let amplified_risk: Vec<f64> = transformed_risk
        .iter()
        .zip(&norm_trans_risk)
        .map(|(tr, nr)| tr.powf(1.0 + alpha * nr).powf(k))
        .collect();

    let norm_trans_cost = min_max_normalize(cost, "cost");
    let amplified_cost: Vec<f64> = cost
        .iter()
        .zip(&norm_trans_cost)
        .map(|(c, nc)| c.powf(1.0 - alpha * nc).powf(1.0 - k))
        .collect();

    let mut weight = Vec::with_capacity(n);
    for (i, (((prop, ar), ac), t)) in propensity
        .iter()
        .zip(&amplified_risk)
        .zip(&amplified_cost)
        .zip(treatment)
        .enumerate()
    {
        let p = prop.clamp(PROPENSITY_CLIP, 1.0 - PROPENSITY_CLIP);
        let ratio = ar / ac;
        let w = if *t == 1 { ratio / p } else { ratio / (1.0 - p) };
        if !(w.is_finite() && w > 0.0) {
            return Err(OwlError::InvalidConfiguration(
                "alpha".to_string(),
                "an amplification that keeps weights finite and positive".to_string(),
                format!("{} (weight {} for subject {})", alpha, w, i),
            ));
        }
        weight.push(w);
    }

    Ok(WeightComponents {
        transformed_risk,
        norm_trans_risk,
        amplified_risk,
        norm_trans_cost,
        amplified_cost,
        weight,
    })
}

/// Weight a copy of `cohort` using already fitted nuisance models.
///
/// Returns the copy with the `risk`, `propensity`, transformed, normalized and
/// amplified columns and the `weight` column added.
pub fn apply_owl_weights(
    cohort: &Cohort,
    columns: &OwlColumns,
    estimator: &RiskPropensityEstimator,
    params: &WeightParams,
) -> Result<Cohort, OwlError> {
    let predictions = estimator.predict(cohort)?;
    weight_with_predictions(cohort, columns, predictions, params)
}

/// Fit the nuisance models on `cohort` itself and weight a copy of it.
pub fn calculate_owl_weights(cohort: &Cohort, columns: &OwlColumns, config: &OwlConfig) -> Result<Cohort, OwlError> {
    let template = LogisticRegression::new(config.logistic_c, config.logistic_max_iter)?;
    let (_, predictions) = RiskPropensityEstimator::fit_predict(cohort, columns, &template)?;
    weight_with_predictions(cohort, columns, predictions, &config.weight_params())
}

fn weight_with_predictions(
    cohort: &Cohort,
    columns: &OwlColumns,
    predictions: NuisancePredictions,
    params: &WeightParams,
) -> Result<Cohort, OwlError> {
    let treatment = cohort.binary_column(&columns.treatment)?;
    let cost = cohort.column(&columns.cost)?;
    let components = owl_weights(&predictions.risk, &predictions.propensity, cost, &treatment, params)?;

    let mut out = cohort.clone();
    out.insert_column(RISK_COLUMN, predictions.risk)?;
    out.insert_column(PROPENSITY_COLUMN, predictions.propensity)?;
    out.insert_column(TRANSFORMED_RISK_COLUMN, components.transformed_risk)?;
    out.insert_column(NORM_TRANS_RISK_COLUMN, components.norm_trans_risk)?;
    out.insert_column(AMPLIFIED_RISK_COLUMN, components.amplified_risk)?;
    out.insert_column(NORM_TRANS_COST_COLUMN, components.norm_trans_cost)?;
    out.insert_column(AMPLIFIED_COST_COLUMN, components.amplified_cost)?;
    out.insert_column(WEIGHT_COLUMN, components.weight)?;
    Ok(out)
}
