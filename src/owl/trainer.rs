//! Weighted Classifier Trainer
//!
//! Fits the OWL treatment rule on the training split and scores the
//! recommended assignment on the evaluation split.
use crate::classifier::logistic::LogisticRegression;
use crate::classifier::scaler::StandardScaler;
use crate::classifier::svc::SupportVectorClassifier;
use crate::classifier::BinaryClassifier;
use crate::constants::{PREDICTED_COST_COLUMN, PREDICTED_TREATMENT_COLUMN, TRANSFORMED_RISK_COLUMN, WEIGHT_COLUMN};
use crate::data::{Cohort, Matrix};
use crate::errors::OwlError;
use crate::metrics::classification::accuracy_score;
use crate::owl::cost::cost_of;
use crate::owl::estimator::{NuisanceFit, RiskPropensityEstimator};
use crate::owl::frontier::FrontierRow;
use crate::owl::weights::{apply_owl_weights, calculate_owl_weights};
use crate::owl::{OwlColumns, OwlConfig};
use crate::utils::{fmt_vec_output, mean};
use log::{debug, info};

/// A fitted treatment rule and its evaluation-split statistics.
#[derive(Debug, Clone)]
pub struct OwlFit {
    /// Trade-off the rule was fitted with.
    pub k: f64,
    /// Weighted classifier predicting the treatment decision.
    pub classifier: SupportVectorClassifier,
    /// Feature standardization fitted on the training split.
    pub scaler: StandardScaler,
    /// Accuracy of the predicted against the observed treatment.
    pub test_accuracy: f64,
    /// Sum of `transformed_risk` over subjects predicted to be treated.
    pub total_inverse_risk: f64,
    /// Sum of the cost of the predicted assignment over subjects predicted to be treated.
    pub total_cost: f64,
    /// Number of subjects predicted to be treated.
    pub num_treated: usize,
    /// Weighted evaluation split with `pred_tx` and `pred_cost` added.
    pub evaluation: Cohort,
    features: Vec<String>,
}

impl OwlFit {
    /// Recommended treatment (0 or 1) for each subject of `cohort`.
    pub fn recommend(&self, cohort: &Cohort) -> Result<Vec<u8>, OwlError> {
        let data = cohort.feature_matrix(&self.features)?;
        let scaled = self
            .scaler
            .transform(&Matrix::new(&data, cohort.len(), self.features.len()))?;
        let matrix = Matrix::new(&scaled, cohort.len(), self.features.len());
        Ok(self
            .classifier
            .predict(&matrix)
            .into_iter()
            .map(|v| v as u8)
            .collect())
    }

    /// The frontier row summarizing this fit.
    pub fn summary(&self) -> FrontierRow {
        FrontierRow {
            k: self.k,
            test_accuracy: self.test_accuracy,
            total_inverse_risk: self.total_inverse_risk,
            total_cost: self.total_cost,
            num_treated: self.num_treated,
        }
    }
}

fn check_split(cohort: &Cohort, treatment: &str, split: &str) -> Result<(), OwlError> {
    if cohort.is_empty() {
        return Err(OwlError::InsufficientData(format!("the {} split is empty", split)));
    }
    let tx = cohort.binary_column(treatment)?;
    let treated = tx.iter().filter(|t| **t == 1).count();
    if treated == 0 || treated == tx.len() {
        return Err(OwlError::InsufficientData(format!(
            "the {} split contains a single treatment class",
            split
        )));
    }
    Ok(())
}

/// Fit an OWL treatment rule.
///
/// Weights are computed separately on both splits. The scaler and the
/// classifier are fitted on the training split only; every reported
/// statistic is computed on the evaluation split.
///
/// * `train` - Training split.
/// * `test` - Evaluation split.
/// * `columns` - Feature, treatment, cost and outcome column names.
/// * `config` - Trade-off, amplification and classifier settings.
pub fn train_owl_svm(
    train: &Cohort,
    test: &Cohort,
    columns: &OwlColumns,
    config: &OwlConfig,
) -> Result<OwlFit, OwlError> {
    config.validate()?;
    columns.validate()?;
    check_split(train, &columns.treatment, "training")?;
    check_split(test, &columns.treatment, "evaluation")?;
    info!("Starting OWL fit with k={}, SVM C={}", config.k, config.svm_c);

    let (weighted_train, weighted_test) = match config.nuisance {
        NuisanceFit::PerCohort => (
            calculate_owl_weights(train, columns, config)?,
            calculate_owl_weights(test, columns, config)?,
        ),
        NuisanceFit::TrainOnly => {
            let template = LogisticRegression::new(config.logistic_c, config.logistic_max_iter)?;
            let estimator = RiskPropensityEstimator::fit(train, columns, &template)?;
            let params = config.weight_params();
            (
                apply_owl_weights(train, columns, &estimator, &params)?,
                apply_owl_weights(test, columns, &estimator, &params)?,
            )
        }
    };

    let test_tx = weighted_test.column(&columns.treatment)?;
    let test_weight = weighted_test.column(WEIGHT_COLUMN)?;
    let (treated_w, untreated_w): (Vec<(f64, f64)>, Vec<(f64, f64)>) = test_tx
        .iter()
        .copied()
        .zip(test_weight.iter().copied())
        .partition(|(t, _)| *t == 1.0);
    debug!(
        "Mean evaluation weight, treated: {:.6}, untreated: {:.6}",
        mean(&treated_w.iter().map(|(_, w)| *w).collect::<Vec<_>>()),
        mean(&untreated_w.iter().map(|(_, w)| *w).collect::<Vec<_>>()),
    );

    let n_features = columns.features.len();
    let train_data = weighted_train.feature_matrix(&columns.features)?;
    let (scaler, train_scaled) =
        StandardScaler::fit_transform(&Matrix::new(&train_data, weighted_train.len(), n_features))?;
    debug!(
        "Scaler fitted on training split, means: [{}]",
        fmt_vec_output(&scaler.mean)
    );
    let train_matrix = Matrix::new(&train_scaled, weighted_train.len(), n_features);
    let y_train = weighted_train.column(&columns.treatment)?;
    let weights = weighted_train.column(WEIGHT_COLUMN)?;

    let mut classifier = SupportVectorClassifier::fit(&config.svc_params(), &train_matrix, y_train, Some(weights))?;
    if config.probability {
        classifier.calibrate(&train_matrix, y_train)?;
    }

    let test_data = weighted_test.feature_matrix(&columns.features)?;
    let test_scaled = scaler.transform(&Matrix::new(&test_data, weighted_test.len(), n_features))?;
    let pred_tx = classifier.predict(&Matrix::new(&test_scaled, weighted_test.len(), n_features));
    let pred_indicator: Vec<u8> = pred_tx.iter().map(|v| *v as u8).collect();
    let pred_cost = cost_of(&pred_indicator, &config.cost);

    let transformed_risk = weighted_test.column(TRANSFORMED_RISK_COLUMN)?;
    let mut num_treated = 0;
    let mut total_inverse_risk = 0.0;
    let mut total_cost = 0.0;
    for ((pred, tr), cost) in pred_indicator.iter().zip(transformed_risk).zip(&pred_cost) {
        if *pred == 1 {
            num_treated += 1;
            total_inverse_risk += tr;
            total_cost += cost;
        }
    }
    let test_accuracy = accuracy_score(test.column(&columns.treatment)?, &pred_tx);

    let mut evaluation = weighted_test;
    evaluation.insert_column(PREDICTED_TREATMENT_COLUMN, pred_tx)?;
    evaluation.insert_column(PREDICTED_COST_COLUMN, pred_cost)?;

    let n_test = evaluation.len();
    info!("Test set size: {}", n_test);
    info!(
        "Predicted treated: {} ({:.2}%)",
        num_treated,
        num_treated as f64 / n_test as f64 * 100.0
    );
    info!("Total Inverse R: {:.2}", total_inverse_risk);
    info!("Total Cost: {:.2}", total_cost);
    info!("Test accuracy: {:.4}", test_accuracy);

    Ok(OwlFit {
        k: config.k,
        classifier,
        scaler,
        test_accuracy,
        total_inverse_risk,
        total_cost,
        num_treated,
        evaluation,
        features: columns.features.clone(),
    })
}
