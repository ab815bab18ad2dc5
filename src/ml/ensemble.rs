//! Majority-vote ensemble of the three classifiers.

use serde::{Deserialize, Serialize};

use crate::analysis::STATISTICAL_FEATURE_COUNT;
use crate::error::{Result, SpamSiftError};
use crate::feature::SparseVector;
use crate::ml::logistic::LogisticRegression;
use crate::ml::naive_bayes::MultinomialNaiveBayes;
use crate::ml::svm::CalibratedSvm;
use crate::ml::{BinaryClassifier, Label};

/// Combine binary votes by `round(mean(votes))`.
///
/// With an odd number of voters the mean never sits exactly on one half,
/// so this is a strict majority.
pub fn majority_vote(votes: &[Label]) -> Label {
    if votes.is_empty() {
        return Label::NotSpam;
    }
    let mean = votes.iter().map(|v| v.target()).sum::<f64>() / votes.len() as f64;
    Label::from_index(mean.round() as usize)
}

/// The individual vote of each member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelVotes {
    pub naive_bayes: Label,
    pub svm: Label,
    pub logistic: Label,
}

impl ModelVotes {
    pub fn as_array(&self) -> [Label; 3] {
        [self.naive_bayes, self.svm, self.logistic]
    }

    /// How many members voted spam.
    pub fn spam_votes(&self) -> usize {
        self.as_array().iter().filter(|v| **v == Label::Spam).count()
    }
}

/// Outcome of one ensemble prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnsemblePrediction {
    pub label: Label,
    pub votes: ModelVotes,
    /// Logistic regression probability of spam.
    pub spam_probability: f64,
    /// `max(p, 1 - p) * 100` of the logistic model, whatever the vote was.
    pub confidence_percent: f64,
}

/// Check that fitted or decoded members agree with a layout of
/// `term_feature_count` term columns followed by the statistical columns.
///
/// Each member is first checked on its own, so a table that disagrees with
/// the width a model reports is caught here instead of at prediction time.
pub fn check_layout(
    naive_bayes: &MultinomialNaiveBayes,
    svm: &CalibratedSvm,
    logistic: &LogisticRegression,
    term_feature_count: usize,
) -> Result<()> {
    naive_bayes.check_consistency()?;
    svm.check_consistency()?;
    logistic.check_consistency()?;

    if naive_bayes.n_features() != term_feature_count {
        return Err(SpamSiftError::feature_dimension(
            "naive bayes model",
            term_feature_count,
            naive_bayes.n_features(),
        ));
    }
    let full = term_feature_count + STATISTICAL_FEATURE_COUNT;
    for model in [svm as &dyn BinaryClassifier, logistic] {
        if model.n_features() != full {
            return Err(SpamSiftError::feature_dimension(
                format!("{} model", model.name()),
                full,
                model.n_features(),
            ));
        }
    }
    Ok(())
}

/// Three classifiers over one feature layout.
///
/// Naive Bayes sees the first `term_feature_count` columns only; the SVM and
/// logistic regression see the full row of `term_feature_count + 6` columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEnsemble {
    pub naive_bayes: MultinomialNaiveBayes,
    pub svm: CalibratedSvm,
    pub logistic: LogisticRegression,
    term_feature_count: usize,
}

impl ModelEnsemble {
    /// Assemble fitted members, checking they agree on the feature layout.
    pub fn new(
        naive_bayes: MultinomialNaiveBayes,
        svm: CalibratedSvm,
        logistic: LogisticRegression,
        term_feature_count: usize,
    ) -> Result<Self> {
        check_layout(&naive_bayes, &svm, &logistic, term_feature_count)?;
        Ok(Self {
            naive_bayes,
            svm,
            logistic,
            term_feature_count,
        })
    }

    /// Width of the full feature row.
    pub fn full_feature_count(&self) -> usize {
        self.term_feature_count + STATISTICAL_FEATURE_COUNT
    }

    pub fn term_feature_count(&self) -> usize {
        self.term_feature_count
    }

    /// Every member's vote on a full feature row.
    pub fn votes(&self, row: &SparseVector) -> Result<ModelVotes> {
        self.check_row(row)?;
        Ok(ModelVotes {
            naive_bayes: self.naive_bayes.predict(&row.truncate(self.term_feature_count))?,
            svm: self.svm.predict(row)?,
            logistic: self.logistic.predict(row)?,
        })
    }

    /// Majority label, member votes and logistic confidence for one row.
    pub fn predict(&self, row: &SparseVector) -> Result<EnsemblePrediction> {
        let votes = self.votes(row)?;
        let spam_probability = self.logistic.predict_proba(row)?;
        Ok(EnsemblePrediction {
            label: majority_vote(&votes.as_array()),
            votes,
            spam_probability,
            confidence_percent: spam_probability.max(1.0 - spam_probability) * 100.0,
        })
    }

    /// Give back the three members.
    pub fn into_members(self) -> (MultinomialNaiveBayes, CalibratedSvm, LogisticRegression) {
        (self.naive_bayes, self.svm, self.logistic)
    }

    fn check_row(&self, row: &SparseVector) -> Result<()> {
        if row.dim() != self.full_feature_count() {
            return Err(SpamSiftError::feature_dimension(
                "ensemble input",
                self.full_feature_count(),
                row.dim(),
            ));
        }
        Ok(())
    }
}
