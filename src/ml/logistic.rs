//! Class-balanced L2-regularized logistic regression.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpamSiftError};
use crate::feature::SparseVector;
use crate::ml::adam::Adam;
use crate::ml::{BinaryClassifier, Label, balanced_class_weights, check_training_data, sigmoid};

/// Logistic regression hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogisticConfig {
    /// Inverse regularization strength.
    pub c: f64,
    /// Maximum number of full-batch optimizer steps.
    pub max_iter: usize,
    /// Stop once every gradient component is below this value.
    pub tol: f64,
    /// Adam step size.
    pub learning_rate: f64,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        Self {
            c: 5.0,
            max_iter: 5000,
            tol: 1e-4,
            learning_rate: 0.05,
        }
    }
}

impl LogisticConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.c > 0.0) || !(self.learning_rate > 0.0) || !(self.tol > 0.0) || self.max_iter == 0 {
            return Err(SpamSiftError::invalid_config(format!(
                "logistic regression needs positive c, learning_rate, tol and max_iter: {self:?}"
            )));
        }
        Ok(())
    }
}

/// A fitted logistic regression model.
///
/// Minimizes `1/(2C)·|w|² + Σ sᵢ·log(1 + exp(-yᵢ(w·xᵢ + b)))`, where `sᵢ` are
/// balanced class weights, using full-batch Adam. The intercept is not
/// regularized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    weights: Vec<f64>,
    bias: f64,
    /// Whether the gradient tolerance was reached before `max_iter`.
    converged: bool,
    iterations: usize,
}

impl LogisticRegression {
    pub fn fit(rows: &[SparseVector], labels: &[Label], config: &LogisticConfig) -> Result<Self> {
        config.validate()?;
        let n_features = check_training_data(rows, labels)?;
        let class_weight = balanced_class_weights(labels)?;

        let sample_weight: Vec<f64> = labels.iter().map(|l| class_weight[l.as_index()]).collect();
        let total_weight: f64 = sample_weight.iter().sum();
        // Objective divided by total_weight, so the penalty becomes 1/(2·C·S).
        let l2 = 1.0 / (config.c * total_weight);

        // The last coordinate is the intercept.
        let mut params = vec![0.0; n_features + 1];
        let mut grad = vec![0.0; n_features + 1];
        let mut adam = Adam::new(n_features + 1, config.learning_rate);
        let mut converged = false;
        let mut iterations = 0;

        while iterations < config.max_iter {
            iterations += 1;
            for (g, w) in grad[..n_features].iter_mut().zip(&params) {
                *g = l2 * w;
            }
            grad[n_features] = 0.0;

            for ((row, label), sw) in rows.iter().zip(labels).zip(&sample_weight) {
                let p = sigmoid(row.dot(&params) + params[n_features]);
                let residual = sw * (p - label.target()) / total_weight;
                for (idx, value) in row.iter() {
                    grad[idx] += residual * value;
                }
                grad[n_features] += residual;
            }

            let max_grad = grad.iter().fold(0.0f64, |acc, g| acc.max(g.abs()));
            if max_grad < config.tol {
                converged = true;
                break;
            }
            adam.apply(&mut params, &grad);
        }

        if !converged {
            log::warn!(
                "Logistic regression did not reach tol={} within {} iterations",
                config.tol,
                config.max_iter
            );
        }
        log::debug!("Logistic regression fitted in {iterations} iterations");

        let bias = params.pop().unwrap_or_default();
        Ok(Self {
            weights: params,
            bias,
            converged,
            iterations,
        })
    }

    /// Raw linear score `w·x + b`.
    pub fn decision_function(&self, row: &SparseVector) -> Result<f64> {
        if row.dim() != self.weights.len() {
            return Err(SpamSiftError::feature_dimension(
                "logistic regression input",
                self.weights.len(),
                row.dim(),
            ));
        }
        Ok(row.dot(&self.weights) + self.bias)
    }

    /// Reject a decoded model holding non-finite parameters.
    pub fn check_consistency(&self) -> Result<()> {
        if !self.bias.is_finite() || self.weights.iter().any(|w| !w.is_finite()) {
            return Err(SpamSiftError::artifact_load(
                "logistic regression has non-finite weights",
            ));
        }
        Ok(())
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

impl BinaryClassifier for LogisticRegression {
    fn predict_proba(&self, row: &SparseVector) -> Result<f64> {
        Ok(sigmoid(self.decision_function(row)?))
    }

    fn n_features(&self) -> usize {
        self.weights.len()
    }

    fn name(&self) -> &str {
        "logistic_regression"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable() -> (Vec<SparseVector>, Vec<Label>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..20 {
            let jitter = i as f64 * 0.01;
            rows.push(SparseVector::from_pairs(3, vec![(0, 1.0 + jitter), (2, 0.5)]));
            labels.push(Label::Spam);
            rows.push(SparseVector::from_pairs(3, vec![(1, 1.0 + jitter), (2, 0.5)]));
            labels.push(Label::NotSpam);
        }
        // Imbalance: a few extra hams.
        for _ in 0..10 {
            rows.push(SparseVector::from_pairs(3, vec![(1, 0.8)]));
            labels.push(Label::NotSpam);
        }
        (rows, labels)
    }

    #[test]
    fn test_fit_separates_classes() {
        let (rows, labels) = separable();
        let model = LogisticRegression::fit(&rows, &labels, &LogisticConfig::default()).unwrap();

        let spam = SparseVector::from_pairs(3, vec![(0, 1.0)]);
        let ham = SparseVector::from_pairs(3, vec![(1, 1.0)]);
        assert_eq!(model.predict(&spam).unwrap(), Label::Spam);
        assert_eq!(model.predict(&ham).unwrap(), Label::NotSpam);

        let p = model.predict_proba(&spam).unwrap();
        assert!(p > 0.5 && p <= 1.0);
    }

    #[test]
    fn test_regularization_bounds_weights() {
        let (rows, labels) = separable();
        let strong = LogisticConfig {
            c: 0.01,
            ..Default::default()
        };
        let weak = LogisticRegression::fit(&rows, &labels, &LogisticConfig::default()).unwrap();
        let strong = LogisticRegression::fit(&rows, &labels, &strong).unwrap();
        let norm = |m: &LogisticRegression| m.weights.iter().map(|w| w * w).sum::<f64>();
        assert!(norm(&strong) < norm(&weak));
    }

    #[test]
    fn test_rejects_bad_config_and_dimensions() {
        let (rows, labels) = separable();
        let bad = LogisticConfig {
            c: 0.0,
            ..Default::default()
        };
        assert!(LogisticRegression::fit(&rows, &labels, &bad).is_err());

        let model = LogisticRegression::fit(&rows, &labels, &LogisticConfig::default()).unwrap();
        assert!(model.predict(&SparseVector::new(7)).is_err());
    }
}
