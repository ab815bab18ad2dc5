//! Classifiers, evaluation metrics and data splitting.
//!
//! Three binary classifiers make up the ensemble:
//!
//! - [`naive_bayes::MultinomialNaiveBayes`] over term columns only (its
//!   count-based likelihood needs non-negative inputs),
//! - [`svm::CalibratedSvm`], a class-balanced linear SVM with k-fold sigmoid
//!   calibration, over the full feature row,
//! - [`logistic::LogisticRegression`], class-balanced, over the full row.
//!
//! [`ensemble::ModelEnsemble`] combines them by majority vote.

pub mod adam;
pub mod ensemble;
pub mod logistic;
pub mod metrics;
pub mod naive_bayes;
pub mod split;
pub mod svm;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpamSiftError};
use crate::feature::SparseVector;

/// Binary class of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    /// Legitimate message ("ham"), encoded as 0.
    NotSpam,
    /// Spam, encoded as 1.
    Spam,
}

impl Label {
    /// Both labels in encoding order.
    pub const ALL: [Label; 2] = [Label::NotSpam, Label::Spam];

    /// 0 for not-spam, 1 for spam.
    pub fn as_index(self) -> usize {
        match self {
            Label::NotSpam => 0,
            Label::Spam => 1,
        }
    }

    /// Inverse of [`as_index`](Self::as_index); any non-zero value is spam.
    pub fn from_index(index: usize) -> Self {
        if index == 0 { Label::NotSpam } else { Label::Spam }
    }

    /// -1.0 for not-spam, +1.0 for spam (margin-model encoding).
    pub fn sign(self) -> f64 {
        match self {
            Label::NotSpam => -1.0,
            Label::Spam => 1.0,
        }
    }

    /// Target value for probabilistic losses.
    pub fn target(self) -> f64 {
        self.as_index() as f64
    }

    /// Parse a corpus label (`ham` / `spam`, case-insensitive).
    pub fn parse_corpus_label(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "ham" => Some(Label::NotSpam),
            "spam" => Some(Label::Spam),
            _ => None,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::NotSpam => write!(f, "Not Spam"),
            Label::Spam => write!(f, "Spam"),
        }
    }
}

/// A trained binary classifier over sparse feature rows.
pub trait BinaryClassifier: Send + Sync {
    /// Probability that `row` is spam.
    fn predict_proba(&self, row: &SparseVector) -> Result<f64>;

    /// Hard prediction. Spam only when the spam probability exceeds 0.5.
    fn predict(&self, row: &SparseVector) -> Result<Label> {
        Ok(if self.predict_proba(row)? > 0.5 {
            Label::Spam
        } else {
            Label::NotSpam
        })
    }

    /// Number of input columns the model was trained on.
    fn n_features(&self) -> usize;

    /// Get the name of this classifier for debugging and logging.
    fn name(&self) -> &str;
}

/// Count of each label, indexed by [`Label::as_index`].
pub fn class_counts(labels: &[Label]) -> [usize; 2] {
    let mut counts = [0usize; 2];
    for label in labels {
        counts[label.as_index()] += 1;
    }
    counts
}

/// "Balanced" class weights: `n_samples / (2 * count(class))`.
///
/// Errors when either class is missing, since no binary model can be fitted.
pub fn balanced_class_weights(labels: &[Label]) -> Result<[f64; 2]> {
    let counts = class_counts(labels);
    if counts.contains(&0) {
        return Err(SpamSiftError::training(format!(
            "both classes are required, got {} not-spam and {} spam samples",
            counts[0], counts[1]
        )));
    }
    let n = labels.len() as f64;
    Ok([n / (2.0 * counts[0] as f64), n / (2.0 * counts[1] as f64)])
}

/// Validate that `rows` and `labels` line up and share one dimension.
pub(crate) fn check_training_data(rows: &[SparseVector], labels: &[Label]) -> Result<usize> {
    if rows.len() != labels.len() {
        return Err(SpamSiftError::training(format!(
            "{} rows but {} labels",
            rows.len(),
            labels.len()
        )));
    }
    let dim = rows
        .first()
        .map(SparseVector::dim)
        .ok_or_else(|| SpamSiftError::training("no training rows"))?;
    if let Some(row) = rows.iter().find(|row| row.dim() != dim) {
        return Err(SpamSiftError::feature_dimension("training row", dim, row.dim()));
    }
    Ok(dim)
}

/// Logistic function, written to avoid overflow for large |z|.
pub(crate) fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let exp_z = z.exp();
        exp_z / (1.0 + exp_z)
    }
}
