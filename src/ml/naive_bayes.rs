//! Multinomial naive Bayes over weighted term counts.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpamSiftError};
use crate::feature::SparseVector;
use crate::ml::{BinaryClassifier, Label, check_training_data, class_counts};

/// Multinomial naive Bayes with additive (Lidstone) smoothing.
///
/// Feature values are treated as fractional event counts, so every input
/// must be non-negative. Priors are the empirical class frequencies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultinomialNaiveBayes {
    alpha: f64,
    class_log_prior: [f64; 2],
    /// `feature_log_prob[class][column]`.
    feature_log_prob: [Vec<f64>; 2],
}

impl MultinomialNaiveBayes {
    /// Fit on term rows. Both classes must be present.
    pub fn fit(rows: &[SparseVector], labels: &[Label], alpha: f64) -> Result<Self> {
        if alpha <= 0.0 {
            return Err(SpamSiftError::invalid_config(format!(
                "naive bayes alpha must be positive, got {alpha}"
            )));
        }
        let n_features = check_training_data(rows, labels)?;
        let counts = class_counts(labels);
        if counts.contains(&0) {
            return Err(SpamSiftError::training("naive bayes needs samples of both classes"));
        }

        let mut feature_count = [vec![0.0; n_features], vec![0.0; n_features]];
        for (row, label) in rows.iter().zip(labels) {
            let class = label.as_index();
            for (idx, value) in row.iter() {
                if value < 0.0 {
                    return Err(SpamSiftError::training(format!(
                        "naive bayes requires non-negative features, column {idx} is {value}"
                    )));
                }
                feature_count[class][idx] += value;
            }
        }

        let n = labels.len() as f64;
        let class_log_prior = [
            (counts[0] as f64 / n).ln(),
            (counts[1] as f64 / n).ln(),
        ];
        let feature_log_prob = feature_count.map(|fc| {
            let total: f64 = fc.iter().sum::<f64>() + alpha * n_features as f64;
            fc.iter().map(|&c| ((c + alpha) / total).ln()).collect::<Vec<f64>>()
        });

        Ok(Self {
            alpha,
            class_log_prior,
            feature_log_prob,
        })
    }

    /// Unnormalized log posterior of each class.
    pub fn joint_log_likelihood(&self, row: &SparseVector) -> Result<[f64; 2]> {
        if row.dim() != self.n_features() {
            return Err(SpamSiftError::feature_dimension(
                "naive bayes input",
                self.n_features(),
                row.dim(),
            ));
        }
        Ok([0usize, 1].map(|class| {
            self.class_log_prior[class] + row.dot(&self.feature_log_prob[class])
        }))
    }

    /// Both class tables must cover the same columns and hold finite log
    /// probabilities.
    pub fn check_consistency(&self) -> Result<()> {
        let [ham, spam] = &self.feature_log_prob;
        if spam.len() != ham.len() {
            return Err(SpamSiftError::feature_dimension(
                "naive bayes spam table",
                ham.len(),
                spam.len(),
            ));
        }
        let finite = self
            .class_log_prior
            .iter()
            .chain(ham)
            .chain(spam)
            .all(|v| v.is_finite());
        if !finite {
            return Err(SpamSiftError::artifact_load(
                "naive bayes has non-finite log probabilities",
            ));
        }
        Ok(())
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

impl BinaryClassifier for MultinomialNaiveBayes {
    fn predict_proba(&self, row: &SparseVector) -> Result<f64> {
        let [ham, spam] = self.joint_log_likelihood(row)?;
        // Softmax over two classes.
        Ok(super::sigmoid(spam - ham))
    }

    fn n_features(&self) -> usize {
        self.feature_log_prob[0].len()
    }

    fn name(&self) -> &str {
        "naive_bayes"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> (Vec<SparseVector>, Vec<Label>) {
        // Columns: 0 = "free", 1 = "prize", 2 = "lunch", 3 = "meeting"
        let rows = vec![
            SparseVector::from_pairs(4, vec![(0, 0.8), (1, 0.6)]),
            SparseVector::from_pairs(4, vec![(0, 1.0)]),
            SparseVector::from_pairs(4, vec![(1, 1.0)]),
            SparseVector::from_pairs(4, vec![(2, 0.7), (3, 0.7)]),
            SparseVector::from_pairs(4, vec![(3, 1.0)]),
        ];
        let labels = vec![Label::Spam, Label::Spam, Label::Spam, Label::NotSpam, Label::NotSpam];
        (rows, labels)
    }

    #[test]
    fn test_fit_predict() {
        let (rows, labels) = data();
        let model = MultinomialNaiveBayes::fit(&rows, &labels, 0.05).unwrap();

        let spammy = SparseVector::from_pairs(4, vec![(0, 1.0)]);
        let hammy = SparseVector::from_pairs(4, vec![(2, 1.0)]);
        assert_eq!(model.predict(&spammy).unwrap(), Label::Spam);
        assert_eq!(model.predict(&hammy).unwrap(), Label::NotSpam);

        let p = model.predict_proba(&spammy).unwrap();
        assert!(p > 0.9 && p <= 1.0);
    }

    #[test]
    fn test_empty_row_follows_prior() {
        let (rows, labels) = data();
        let model = MultinomialNaiveBayes::fit(&rows, &labels, 0.05).unwrap();
        let p = model.predict_proba(&SparseVector::new(4)).unwrap();
        assert!((p - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_negative_features() {
        let rows = vec![
            SparseVector::from_pairs(2, vec![(0, -1.0)]),
            SparseVector::from_pairs(2, vec![(1, 1.0)]),
        ];
        let labels = vec![Label::Spam, Label::NotSpam];
        assert!(MultinomialNaiveBayes::fit(&rows, &labels, 0.05).is_err());
    }

    #[test]
    fn test_dimension_mismatch() {
        let (rows, labels) = data();
        let model = MultinomialNaiveBayes::fit(&rows, &labels, 0.05).unwrap();
        assert!(model.predict(&SparseVector::new(5)).is_err());
    }

    #[test]
    fn test_consistency_checks_both_class_tables() {
        let (rows, labels) = data();
        let model = MultinomialNaiveBayes::fit(&rows, &labels, 0.05).unwrap();
        assert!(model.check_consistency().is_ok());

        let mut short = model.clone();
        short.feature_log_prob[1].clear();
        let err = short.check_consistency().unwrap_err();
        assert!(matches!(
            err,
            SpamSiftError::FeatureDimension { expected: 4, actual: 0, .. }
        ));

        let mut poisoned = model;
        poisoned.feature_log_prob[0][2] = f64::NAN;
        assert!(matches!(
            poisoned.check_consistency().unwrap_err(),
            SpamSiftError::ArtifactLoad(_)
        ));
    }
}
