pub const DEFAULT_EPSILON: f64 = 1e-8;
pub const DEFAULT_LOW_COST: f64 = 1.0;
pub const DEFAULT_HIGH_COST: f64 = 40.0;
pub const DEFAULT_SEED: u64 = 42;

// Smallest denominator allowed in 1 / (risk + epsilon), even when epsilon is 0.
pub const RISK_FLOOR: f64 = 1e-12;
// Propensities are clipped into [PROPENSITY_CLIP, 1 - PROPENSITY_CLIP] before inversion.
pub const PROPENSITY_CLIP: f64 = 1e-6;

pub const LOGISTIC_MAX_ITER: usize = 1000;
pub const LOGISTIC_TOLERANCE: f64 = 1e-8;
pub const LOGISTIC_C: f64 = 1.0;

pub const SVM_TOLERANCE: f64 = 1e-3;
pub const SVM_MIN_MAX_ITER: usize = 10_000_000;
pub const SVM_TAU: f64 = 1e-12;

pub const PLATT_MAX_ITER: usize = 100;
pub const PLATT_MIN_STEP: f64 = 1e-10;
pub const PLATT_SIGMA: f64 = 1e-12;

// Derived cohort columns.
pub const RISK_COLUMN: &str = "risk";
pub const PROPENSITY_COLUMN: &str = "propensity";
pub const TRANSFORMED_RISK_COLUMN: &str = "transformed_risk";
pub const NORM_TRANS_RISK_COLUMN: &str = "norm_trans_risk";
pub const AMPLIFIED_RISK_COLUMN: &str = "amplified_risk";
pub const NORM_TRANS_COST_COLUMN: &str = "norm_trans_cost";
pub const AMPLIFIED_COST_COLUMN: &str = "amplified_cost";
pub const WEIGHT_COLUMN: &str = "weight";
pub const PREDICTED_TREATMENT_COLUMN: &str = "pred_tx";
pub const PREDICTED_COST_COLUMN: &str = "pred_cost";
