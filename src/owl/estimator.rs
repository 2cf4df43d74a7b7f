//! Risk/Propensity Estimator
//!
//! Nuisance models of the OWL weights: the outcome risk given covariates and
//! the observed treatment, and the treatment propensity given covariates.
use crate::classifier::logistic::LogisticRegression;
use crate::data::{Cohort, Matrix};
use crate::errors::OwlError;
use crate::metrics::classification::roc_auc_score;
use crate::owl::OwlColumns;
use log::debug;
use serde::{Deserialize, Serialize};

/// Which cohort the nuisance models are fitted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum NuisanceFit {
    /// Refit both models on every cohort that is weighted, the evaluation
    /// split included.
    #[default]
    PerCohort,
    /// Fit both models on the training split only and reuse them to predict
    /// on the evaluation split.
    TrainOnly,
}

/// Per-subject nuisance predictions.
#[derive(Debug, Clone, PartialEq)]
pub struct NuisancePredictions {
    /// $P(Y = 1 \mid X, T)$ under the observed treatment.
    pub risk: Vec<f64>,
    /// $P(T = 1 \mid X)$.
    pub propensity: Vec<f64>,
}

/// Fitted risk and propensity models.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskPropensityEstimator {
    pub risk_model: LogisticRegression,
    pub propensity_model: LogisticRegression,
    features: Vec<String>,
    treatment: String,
}

impl RiskPropensityEstimator {
    fn risk_columns(features: &[String], treatment: &str) -> Vec<String> {
        let mut cols = features.to_vec();
        cols.push(treatment.to_string());
        cols
    }

    /// Fit both models on `cohort`.
    ///
    /// * `cohort` - Subjects to fit on.
    /// * `columns` - Feature, treatment and outcome column names.
    /// * `template` - Unfitted logistic regression carrying the regularization settings.
    pub fn fit(cohort: &Cohort, columns: &OwlColumns, template: &LogisticRegression) -> Result<Self, OwlError> {
        let n = cohort.len();
        let treatment: Vec<f64> = cohort
            .binary_column(&columns.treatment)?
            .into_iter()
            .map(f64::from)
            .collect();
        let outcome: Vec<f64> = cohort
            .binary_column(&columns.outcome)?
            .into_iter()
            .map(f64::from)
            .collect();

        let risk_cols = Self::risk_columns(&columns.features, &columns.treatment);
        let risk_data = cohort.feature_matrix(&risk_cols)?;
        let risk_matrix = Matrix::new(&risk_data, n, risk_cols.len());
        let mut risk_model = template.clone();
        risk_model.fit(&risk_matrix, &outcome, None)?;

        let prop_data = cohort.feature_matrix(&columns.features)?;
        let prop_matrix = Matrix::new(&prop_data, n, columns.features.len());
        let mut propensity_model = template.clone();
        propensity_model.fit(&prop_matrix, &treatment, None)?;

        let ones = vec![1.0; n];
        debug!(
            "Nuisance models fitted on {} subjects, risk AUC {:.4}, propensity AUC {:.4}.",
            n,
            roc_auc_score(&outcome, &risk_model.predict_proba(&risk_matrix), &ones),
            roc_auc_score(&treatment, &propensity_model.predict_proba(&prop_matrix), &ones),
        );

        Ok(RiskPropensityEstimator {
            risk_model,
            propensity_model,
            features: columns.features.clone(),
            treatment: columns.treatment.clone(),
        })
    }

    /// Predict risk under the observed treatment and propensity for `cohort`.
    pub fn predict(&self, cohort: &Cohort) -> Result<NuisancePredictions, OwlError> {
        let n = cohort.len();
        // Validates the coding of the treatment before it enters the risk model.
        cohort.binary_column(&self.treatment)?;
        let risk_cols = Self::risk_columns(&self.features, &self.treatment);
        let risk_data = cohort.feature_matrix(&risk_cols)?;
        let risk = self
            .risk_model
            .predict_proba(&Matrix::new(&risk_data, n, risk_cols.len()));
        let prop_data = cohort.feature_matrix(&self.features)?;
        let propensity = self
            .propensity_model
            .predict_proba(&Matrix::new(&prop_data, n, self.features.len()));
        Ok(NuisancePredictions { risk, propensity })
    }

    /// Fit on `cohort` and predict on the same subjects.
    pub fn fit_predict(
        cohort: &Cohort,
        columns: &OwlColumns,
        template: &LogisticRegression,
    ) -> Result<(Self, NuisancePredictions), OwlError> {
        let estimator = Self::fit(cohort, columns, template)?;
        let predictions = estimator.predict(cohort)?;
        Ok((estimator, predictions))
    }
}
