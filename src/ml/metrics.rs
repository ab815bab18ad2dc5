//! Evaluation metrics for binary predictions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpamSiftError};
use crate::ml::Label;

fn check_lengths(truth: &[Label], predicted: &[Label]) -> Result<()> {
    if truth.len() != predicted.len() {
        return Err(SpamSiftError::training(format!(
            "{} true labels but {} predictions",
            truth.len(),
            predicted.len()
        )));
    }
    if truth.is_empty() {
        return Err(SpamSiftError::training("cannot evaluate on zero samples"));
    }
    Ok(())
}

/// Fraction of predictions equal to the truth.
pub fn accuracy(truth: &[Label], predicted: &[Label]) -> Result<f64> {
    check_lengths(truth, predicted)?;
    let correct = truth.iter().zip(predicted).filter(|(t, p)| t == p).count();
    Ok(correct as f64 / truth.len() as f64)
}

/// Mean and population standard deviation.
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

/// 2x2 confusion matrix with spam as the positive class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_negative: usize,
    pub false_positive: usize,
    pub false_negative: usize,
    pub true_positive: usize,
}

impl ConfusionMatrix {
    pub fn from_predictions(truth: &[Label], predicted: &[Label]) -> Result<Self> {
        check_lengths(truth, predicted)?;
        let mut matrix = Self::default();
        for (t, p) in truth.iter().zip(predicted) {
            match (t, p) {
                (Label::NotSpam, Label::NotSpam) => matrix.true_negative += 1,
                (Label::NotSpam, Label::Spam) => matrix.false_positive += 1,
                (Label::Spam, Label::NotSpam) => matrix.false_negative += 1,
                (Label::Spam, Label::Spam) => matrix.true_positive += 1,
            }
        }
        Ok(matrix)
    }

    pub fn total(&self) -> usize {
        self.true_negative + self.false_positive + self.false_negative + self.true_positive
    }

    /// Rows are true labels, columns predictions, both in `[NotSpam, Spam]` order.
    pub fn as_rows(&self) -> [[usize; 2]; 2] {
        [
            [self.true_negative, self.false_positive],
            [self.false_negative, self.true_positive],
        ]
    }
}

/// Precision, recall and F1 for one class. Undefined ratios are 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

impl ClassMetrics {
    fn from_counts(true_pos: usize, false_pos: usize, false_neg: usize) -> Self {
        let precision = ratio(true_pos, true_pos + false_pos);
        let recall = ratio(true_pos, true_pos + false_neg);
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        Self {
            precision,
            recall,
            f1,
            support: true_pos + false_neg,
        }
    }
}

/// Per-class metrics with macro and support-weighted averages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub not_spam: ClassMetrics,
    pub spam: ClassMetrics,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
    pub accuracy: f64,
}

impl ClassificationReport {
    pub fn from_confusion(matrix: &ConfusionMatrix) -> Self {
        let not_spam = ClassMetrics::from_counts(
            matrix.true_negative,
            matrix.false_negative,
            matrix.false_positive,
        );
        let spam = ClassMetrics::from_counts(
            matrix.true_positive,
            matrix.false_positive,
            matrix.false_negative,
        );
        let total = matrix.total();

        let macro_avg = ClassMetrics {
            precision: (not_spam.precision + spam.precision) / 2.0,
            recall: (not_spam.recall + spam.recall) / 2.0,
            f1: (not_spam.f1 + spam.f1) / 2.0,
            support: total,
        };
        let weigh = |f: fn(&ClassMetrics) -> f64| {
            if total == 0 {
                0.0
            } else {
                (f(&not_spam) * not_spam.support as f64 + f(&spam) * spam.support as f64)
                    / total as f64
            }
        };
        let weighted_avg = ClassMetrics {
            precision: weigh(|m| m.precision),
            recall: weigh(|m| m.recall),
            f1: weigh(|m| m.f1),
            support: total,
        };

        Self {
            not_spam,
            spam,
            macro_avg,
            weighted_avg,
            accuracy: ratio(matrix.true_negative + matrix.true_positive, total),
        }
    }

    pub fn class(&self, label: Label) -> &ClassMetrics {
        match label {
            Label::NotSpam => &self.not_spam,
            Label::Spam => &self.spam,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>14} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        for (name, m) in [("Not Spam", &self.not_spam), ("Spam", &self.spam)] {
            writeln!(
                f,
                "{:>14} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, m.precision, m.recall, m.f1, m.support
            )?;
        }
        writeln!(
            f,
            "{:>14} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.weighted_avg.support
        )?;
        for (name, m) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>14} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, m.precision, m.recall, m.f1, m.support
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::Label::{NotSpam as H, Spam as S};

    #[test]
    fn test_accuracy() {
        assert_eq!(accuracy(&[H, S, S, H], &[H, S, H, H]).unwrap(), 0.75);
        assert!(accuracy(&[H], &[]).is_err());
        assert!(accuracy(&[], &[]).is_err());
    }

    #[test]
    fn test_confusion_and_report() {
        let truth = [H, H, H, H, S, S, S, S];
        let pred = [H, H, H, S, S, S, S, H];
        let matrix = ConfusionMatrix::from_predictions(&truth, &pred).unwrap();
        assert_eq!(matrix.as_rows(), [[3, 1], [1, 3]]);

        let report = ClassificationReport::from_confusion(&matrix);
        assert_eq!(report.accuracy, 0.75);
        assert_eq!(report.spam.precision, 0.75);
        assert_eq!(report.spam.recall, 0.75);
        assert_eq!(report.not_spam.support, 4);
        assert!((report.weighted_avg.f1 - 0.75).abs() < 1e-12);
        assert!(report.to_string().contains("weighted avg"));
    }

    #[test]
    fn test_zero_division_is_zero() {
        let matrix = ConfusionMatrix::from_predictions(&[H, H, S], &[H, H, H]).unwrap();
        let report = ClassificationReport::from_confusion(&matrix);
        assert_eq!(report.spam.precision, 0.0);
        assert_eq!(report.spam.f1, 0.0);
        assert_eq!(report.class(Label::NotSpam).recall, 1.0);
    }

    #[test]
    fn test_mean_std() {
        let (mean, std) = mean_std(&[0.9, 1.0, 1.1]);
        assert!((mean - 1.0).abs() < 1e-12);
        assert!((std - (0.02f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(mean_std(&[]), (0.0, 0.0));
    }
}
