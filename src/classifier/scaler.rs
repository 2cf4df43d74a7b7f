//! Standard Scaler
//!
//! Removes the mean and scales each feature to unit variance.
use crate::data::Matrix;
use crate::errors::OwlError;
use crate::utils::{mean, variance};
use serde::{Deserialize, Serialize};

/// Per-feature standardization fitted on one dataset and reused on others.
///
/// Features with zero variance keep a scale of 1, so they are only centred.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit the scaler on the columns of `data`.
    pub fn fit(data: &Matrix<f64>) -> Result<Self, OwlError> {
        if data.rows == 0 {
            return Err(OwlError::InsufficientData("cannot fit a scaler on zero rows".to_string()));
        }
        let mut mean_ = Vec::with_capacity(data.cols);
        let mut scale = Vec::with_capacity(data.cols);
        for j in 0..data.cols {
            let col = data.get_col(j);
            mean_.push(mean(col));
            let sd = variance(col).sqrt();
            scale.push(if sd > 0.0 { sd } else { 1.0 });
        }
        Ok(StandardScaler { mean: mean_, scale })
    }

    /// Standardize `data`, returning column-major values.
    pub fn transform(&self, data: &Matrix<f64>) -> Result<Vec<f64>, OwlError> {
        if data.cols != self.mean.len() {
            return Err(OwlError::InvalidInput(format!(
                "scaler was fitted on {} features, got {}",
                self.mean.len(),
                data.cols
            )));
        }
        let mut out = Vec::with_capacity(data.rows * data.cols);
        for j in 0..data.cols {
            let (m, s) = (self.mean[j], self.scale[j]);
            out.extend(data.get_col(j).iter().map(|x| (x - m) / s));
        }
        Ok(out)
    }

    /// Fit on `data` and return it standardized.
    pub fn fit_transform(data: &Matrix<f64>) -> Result<(Self, Vec<f64>), OwlError> {
        let scaler = Self::fit(data)?;
        let out = scaler.transform(data)?;
        Ok((scaler, out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::precision_round;

    #[test]
    fn test_scaler_zero_mean_unit_variance() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 10.0, 10.0, 10.0, 10.0];
        let m = Matrix::new(&data, 4, 2);
        let (scaler, out) = StandardScaler::fit_transform(&m).unwrap();
        assert_eq!(scaler.mean, vec![2.5, 10.0]);
        assert_eq!(scaler.scale[1], 1.0);
        let z = Matrix::new(&out, 4, 2);
        assert_eq!(precision_round(mean(z.get_col(0)), 10), 0.0);
        assert_eq!(precision_round(variance(z.get_col(0)), 10), 1.0);
        assert_eq!(z.get_col(1), &[0.0; 4]);
    }

    #[test]
    fn test_scaler_reuses_training_parameters() {
        let train = vec![0.0, 2.0];
        let scaler = StandardScaler::fit(&Matrix::new(&train, 2, 1)).unwrap();
        let test = vec![4.0];
        let out = scaler.transform(&Matrix::new(&test, 1, 1)).unwrap();
        assert_eq!(out, vec![3.0]);
        let wrong = vec![1.0, 1.0];
        assert!(scaler.transform(&Matrix::new(&wrong, 1, 2)).is_err());
    }
}
