//! Standardization of dense statistical features.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpamSiftError};

/// Per-column mean and standard deviation learned at training time.
///
/// `transform` computes `(x - mean) / std`. A column that was constant in the
/// training data has `std == 0` and always scales to `0.0`, whatever the
/// inference-time value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScaler {
    mean: Vec<f64>,
    std: Vec<f64>,
}

impl FeatureScaler {
    /// Learn column statistics (population standard deviation) from `rows`.
    pub fn fit<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        let first = rows
            .first()
            .ok_or_else(|| SpamSiftError::training("cannot fit scaler on zero rows"))?
            .as_ref();
        let n_features = first.len();
        let n = rows.len() as f64;

        let mut mean = vec![0.0; n_features];
        let mut constant = vec![true; n_features];
        for row in rows {
            let row = row.as_ref();
            if row.len() != n_features {
                return Err(SpamSiftError::feature_dimension("scaler input", n_features, row.len()));
            }
            for (j, &value) in row.iter().enumerate() {
                mean[j] += value;
                constant[j] &= value == first[j];
            }
        }
        for m in &mut mean {
            *m /= n;
        }

        let mut std = vec![0.0; n_features];
        for row in rows {
            for (j, &value) in row.as_ref().iter().enumerate() {
                let d = value - mean[j];
                std[j] += d * d;
            }
        }
        for (j, s) in std.iter_mut().enumerate() {
            *s = if constant[j] { 0.0 } else { (*s / n).sqrt() };
        }

        Ok(Self { mean, std })
    }

    /// Standardize one row with the frozen statistics.
    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>> {
        if row.len() != self.n_features() {
            return Err(SpamSiftError::feature_dimension(
                "scaler input",
                self.n_features(),
                row.len(),
            ));
        }
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.std))
            .map(|(&x, (&mean, &std))| if std > 0.0 { (x - mean) / std } else { 0.0 })
            .collect())
    }

    /// Number of columns the scaler was fitted on.
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn std(&self) -> &[f64] {
        &self.std
    }

    pub(crate) fn check_consistency(&self) -> Result<()> {
        if self.mean.len() != self.std.len() {
            return Err(SpamSiftError::feature_dimension(
                "scaler std",
                self.mean.len(),
                self.std.len(),
            ));
        }
        if self.std.iter().any(|s| !s.is_finite() || *s < 0.0) {
            return Err(SpamSiftError::artifact_load("scaler has an invalid standard deviation"));
        }
        Ok(())
    }
}
