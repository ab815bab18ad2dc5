//! Offline training, evaluation and artifact production.

use std::fmt;
use std::path::Path;

use chrono::Utc;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analysis::{STATISTICAL_FEATURE_COUNT, StatisticalFeatureExtractor, normalize};
use crate::config::{ArtifactPaths, TrainingConfig};
use crate::error::Result;
use crate::feature::{FeatureScaler, SparseVector, TermVectorizer, assemble_feature_row};
use crate::ml::ensemble::{ModelEnsemble, ModelVotes};
use crate::ml::logistic::LogisticRegression;
use crate::ml::metrics::{ClassificationReport, ConfusionMatrix, accuracy, mean_std};
use crate::ml::naive_bayes::MultinomialNaiveBayes;
use crate::ml::split::{stratified_k_fold, stratified_train_test_split, take};
use crate::ml::svm::CalibratedSvm;
use crate::ml::{BinaryClassifier, Label};
use crate::pipeline::artifacts::{ReportSummary, TrainedArtifactBundle, save_artifacts};
use crate::pipeline::corpus::{CorpusLoader, LabeledCorpus};

/// Held-out accuracy of each member and of the ensemble.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelAccuracies {
    pub naive_bayes: f64,
    pub svm: f64,
    pub logistic: f64,
    pub ensemble: f64,
}

impl ModelAccuracies {
    /// Labelled accuracies in report order.
    pub fn entries(&self) -> [(&'static str, f64); 4] {
        [
            ("nb", self.naive_bayes),
            ("svm", self.svm),
            ("lr", self.logistic),
            ("ensemble", self.ensemble),
        ]
    }

    /// Highest accuracy; the earlier entry wins a tie.
    pub fn best(&self) -> (&'static str, f64) {
        self.entries()
            .into_iter()
            .fold(("nb", f64::NEG_INFINITY), |best, entry| {
                if entry.1 > best.1 { entry } else { best }
            })
    }
}

/// Everything measured during a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub n_samples: usize,
    pub n_spam: usize,
    pub n_ham: usize,
    pub dropped_duplicates: usize,
    pub vocabulary_size: usize,
    pub n_train: usize,
    pub n_test: usize,
    pub fit_before_split: bool,
    pub accuracies: ModelAccuracies,
    /// Logistic regression accuracy per cross-validation fold.
    pub cv_scores: Vec<f64>,
    pub cv_mean: f64,
    pub cv_std: f64,
    /// Ensemble confusion matrix on the held-out split.
    pub confusion: ConfusionMatrix,
    pub classification: ClassificationReport,
    pub best_model: String,
    pub best_accuracy: f64,
}

impl TrainingReport {
    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            n_samples: self.n_samples,
            n_train: self.n_train,
            n_test: self.n_test,
            accuracies: self.accuracies,
            cv_mean: self.cv_mean,
            cv_std: self.cv_std,
        }
    }
}

impl fmt::Display for TrainingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Dataset: {} messages ({} spam, {} ham), {} duplicates dropped",
            self.n_samples, self.n_spam, self.n_ham, self.dropped_duplicates
        )?;
        writeln!(
            f,
            "Vocabulary: {} terms, train/test: {}/{}",
            self.vocabulary_size, self.n_train, self.n_test
        )?;
        writeln!(f)?;
        writeln!(f, "Naive Bayes accuracy:          {:.4}", self.accuracies.naive_bayes)?;
        writeln!(f, "SVM accuracy:                  {:.4}", self.accuracies.svm)?;
        writeln!(f, "Logistic Regression accuracy:  {:.4}", self.accuracies.logistic)?;
        writeln!(f, "Ensemble accuracy:             {:.4}", self.accuracies.ensemble)?;
        writeln!(f)?;
        let scores: Vec<String> = self.cv_scores.iter().map(|s| format!("{s:.4}")).collect();
        writeln!(f, "CV scores (Logistic Regression): [{}]", scores.join(", "))?;
        writeln!(f, "CV mean: {:.4} +/- {:.4}", self.cv_mean, self.cv_std)?;
        writeln!(f)?;
        writeln!(f, "Classification report (Ensemble):")?;
        write!(f, "{}", self.classification)?;
        writeln!(f)?;
        writeln!(f, "True Negatives:  {}", self.confusion.true_negative)?;
        writeln!(f, "False Positives: {}", self.confusion.false_positive)?;
        writeln!(f, "False Negatives: {}", self.confusion.false_negative)?;
        writeln!(f, "True Positives:  {}", self.confusion.true_positive)?;
        writeln!(f)?;
        write!(f, "Best model: {} ({:.4})", self.best_model, self.best_accuracy)
    }
}

/// A finished training run.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub vectorizer: TermVectorizer,
    pub bundle: TrainedArtifactBundle,
    pub report: TrainingReport,
}

impl TrainingOutcome {
    pub fn save(&self, paths: &ArtifactPaths) -> Result<()> {
        save_artifacts(paths, &self.vectorizer, &self.bundle)
    }
}

/// Runs corpus → features → models → evaluation → artifacts.
#[derive(Debug, Clone, Default)]
pub struct TrainingPipeline {
    config: TrainingConfig,
}

impl TrainingPipeline {
    pub fn new(config: TrainingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Load a corpus using the configured column names.
    pub fn load_corpus<P: AsRef<Path>>(&self, path: P) -> Result<LabeledCorpus> {
        CorpusLoader::new(self.config.label_column.as_str(), self.config.text_column.as_str())
            .load_path(path)
    }

    /// Train on `corpus` and evaluate on a stratified held-out split.
    pub fn run(&self, corpus: &LabeledCorpus) -> Result<TrainingOutcome> {
        let config = &self.config;
        let texts = corpus.texts();
        let labels = corpus.labels();
        let [n_ham, n_spam] = corpus.class_counts();
        log::info!(
            "Training on {} messages ({n_spam} spam, {n_ham} ham)",
            corpus.len()
        );

        log::info!("Processing text and extracting features");
        let normalized: Vec<String> = texts.par_iter().map(|t| normalize(t)).collect();
        let extractor = StatisticalFeatureExtractor::new();
        let stats: Vec<[f64; STATISTICAL_FEATURE_COUNT]> = texts
            .par_iter()
            .map(|t| extractor.extract(t).to_array())
            .collect();

        let split = stratified_train_test_split(labels, config.test_size, config.random_seed)?;
        let fit_indices: Vec<usize> = if config.fit_before_split {
            (0..corpus.len()).collect()
        } else {
            split.train.clone()
        };

        log::info!("Vectorizing");
        let mut vectorizer = TermVectorizer::new(config.vectorizer.clone());
        vectorizer.fit(&take(&normalized, &fit_indices))?;
        let scaler = FeatureScaler::fit(&take(&stats, &fit_indices))?;
        let term_count = vectorizer.vocabulary_size();
        log::debug!("Vocabulary size {term_count}");

        let rows = normalized
            .par_iter()
            .zip(&stats)
            .map(|(text, stat)| assemble_feature_row(&vectorizer, &scaler, text, stat))
            .collect::<Result<Vec<SparseVector>>>()?;

        let train_rows = take(&rows, &split.train);
        let train_labels = take(labels, &split.train);
        let train_terms: Vec<SparseVector> =
            train_rows.iter().map(|r| r.truncate(term_count)).collect();

        log::info!("Training models");
        let (naive_bayes, (svm, logistic)) = rayon::join(
            || MultinomialNaiveBayes::fit(&train_terms, &train_labels, config.nb_alpha),
            || {
                rayon::join(
                    || CalibratedSvm::fit(&train_rows, &train_labels, &config.svm),
                    || LogisticRegression::fit(&train_rows, &train_labels, &config.logistic),
                )
            },
        );
        let ensemble = ModelEnsemble::new(naive_bayes?, svm?, logistic?, term_count)?;

        let test_labels = take(labels, &split.test);
        let mut votes = Vec::with_capacity(split.test.len());
        let mut ensemble_pred = Vec::with_capacity(split.test.len());
        for &i in &split.test {
            let prediction = ensemble.predict(&rows[i])?;
            votes.push(prediction.votes);
            ensemble_pred.push(prediction.label);
        }
        let member = |pick: fn(&ModelVotes) -> Label| -> Vec<Label> {
            votes.iter().map(pick).collect()
        };
        let accuracies = ModelAccuracies {
            naive_bayes: accuracy(&test_labels, &member(|v| v.naive_bayes))?,
            svm: accuracy(&test_labels, &member(|v| v.svm))?,
            logistic: accuracy(&test_labels, &member(|v| v.logistic))?,
            ensemble: accuracy(&test_labels, &ensemble_pred)?,
        };
        for (name, acc) in accuracies.entries() {
            log::info!("{name} accuracy: {acc:.4}");
        }

        log::info!("Cross-validating logistic regression ({} folds)", config.cv_folds);
        let cv_scores = self.cross_validate(&rows, labels)?;
        let (cv_mean, cv_std) = mean_std(&cv_scores);
        log::info!("CV mean: {cv_mean:.4} +/- {cv_std:.4}");

        let confusion = ConfusionMatrix::from_predictions(&test_labels, &ensemble_pred)?;
        let classification = ClassificationReport::from_confusion(&confusion);
        let (best_model, best_accuracy) = accuracies.best();
        log::info!("Best model: {best_model} ({best_accuracy:.4})");

        let report = TrainingReport {
            n_samples: corpus.len(),
            n_spam,
            n_ham,
            dropped_duplicates: corpus.dropped_duplicates(),
            vocabulary_size: term_count,
            n_train: split.train.len(),
            n_test: split.test.len(),
            fit_before_split: config.fit_before_split,
            accuracies,
            cv_scores,
            cv_mean,
            cv_std,
            confusion,
            classification,
            best_model: best_model.to_string(),
            best_accuracy,
        };

        let (naive_bayes, svm, logistic) = ensemble.into_members();
        let bundle = TrainedArtifactBundle {
            naive_bayes,
            svm,
            logistic,
            scaler,
            best_model: report.best_model.clone(),
            tfidf_feature_count: term_count,
            trained_at: Utc::now(),
            summary: report.summary(),
        };

        Ok(TrainingOutcome {
            vectorizer,
            bundle,
            report,
        })
    }

    /// Train, then write both artifacts. Nothing is written if training fails.
    pub fn run_and_save(&self, corpus: &LabeledCorpus, paths: &ArtifactPaths) -> Result<TrainingOutcome> {
        let outcome = self.run(corpus)?;
        outcome.save(paths)?;
        Ok(outcome)
    }

    /// Stratified k-fold accuracy of the logistic model over all rows.
    fn cross_validate(&self, rows: &[SparseVector], labels: &[Label]) -> Result<Vec<f64>> {
        let folds = stratified_k_fold(labels, self.config.cv_folds, Some(self.config.random_seed))?;
        folds
            .par_iter()
            .map(|fold| {
                let model = LogisticRegression::fit(
                    &take(rows, &fold.train),
                    &take(labels, &fold.train),
                    &self.config.logistic,
                )?;
                let predicted = fold
                    .test
                    .iter()
                    .map(|&i| model.predict(&rows[i]))
                    .collect::<Result<Vec<Label>>>()?;
                accuracy(&take(labels, &fold.test), &predicted)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> LabeledCorpus {
        let spam = [
            "WIN a FREE prize now, call 09061701461",
            "Claim your cash prize today! Text WIN to 87121",
            "FREE entry to win cash, reply now www.win-cash.com",
            "URGENT! You have won a cash prize, call 09050000327",
            "Congratulations you won a free holiday, claim at http://prize.example",
            "Free ringtone offer, text CLAIM to 80082 now",
            "You are a winner! Claim cash prize call 08000930705",
            "Win free tickets, txt WIN to 86688 today",
            "Cash bonus waiting, claim your free prize now",
            "Free entry weekly comp win cash prize txt 87121",
        ];
        let ham = [
            "See you at 5 for dinner",
            "Are we still meeting for lunch tomorrow?",
            "I will be home late tonight, save me some food",
            "Can you pick up milk on the way home",
            "Thanks for the lovely dinner yesterday",
            "Meeting moved to tomorrow morning at the office",
            "Running late, see you at the station",
            "Did you finish the report for the meeting?",
            "Happy birthday! Have a great day with family",
            "Let me know when you get home safely",
            "Lunch tomorrow sounds good, see you there",
            "Call me when you are free this evening",
            "Dinner at home tonight, bring the kids",
            "The office is closed tomorrow morning",
            "Good morning, hope you slept well",
        ];
        let records = spam
            .iter()
            .map(|t| (Label::Spam, *t))
            .chain(ham.iter().map(|t| (Label::NotSpam, *t)));
        LabeledCorpus::from_records(records).unwrap()
    }

    fn config() -> TrainingConfig {
        TrainingConfig {
            cv_folds: 3,
            ..Default::default()
        }
    }

    #[test]
    fn test_run_produces_consistent_outcome() {
        let pipeline = TrainingPipeline::new(config()).unwrap();
        let outcome = pipeline.run(&corpus()).unwrap();
        let report = &outcome.report;

        assert_eq!(report.n_samples, 25);
        assert_eq!(report.n_spam, 10);
        assert_eq!(report.n_test, 5);
        assert_eq!(report.n_train, 20);
        assert_eq!(report.cv_scores.len(), 3);
        assert_eq!(report.confusion.total(), report.n_test);
        assert!(report.vocabulary_size > 0);
        assert_eq!(outcome.bundle.tfidf_feature_count, outcome.vectorizer.vocabulary_size());
        assert!(outcome.bundle.validate(&outcome.vectorizer).is_ok());

        let (name, acc) = report.accuracies.best();
        assert_eq!(report.best_model, name);
        assert_eq!(report.best_accuracy, acc);
        for (_, acc) in report.accuracies.entries() {
            assert!((0.0..=1.0).contains(&acc));
        }
    }

    #[test]
    fn test_fit_on_train_partition_only() {
        let config = TrainingConfig {
            fit_before_split: false,
            ..config()
        };
        let full = TrainingPipeline::new(self::config()).unwrap().run(&corpus()).unwrap();
        let train_only = TrainingPipeline::new(config).unwrap().run(&corpus()).unwrap();
        assert_eq!(train_only.vectorizer.n_documents(), 20);
        assert_eq!(full.vectorizer.n_documents(), 25);
        assert!(!train_only.report.fit_before_split);
    }

    #[test]
    fn test_best_model_tie_prefers_first() {
        let accuracies = ModelAccuracies {
            naive_bayes: 0.9,
            svm: 0.95,
            logistic: 0.95,
            ensemble: 0.95,
        };
        assert_eq!(accuracies.best(), ("svm", 0.95));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = TrainingConfig {
            nb_alpha: -1.0,
            ..Default::default()
        };
        assert!(TrainingPipeline::new(config).is_err());
    }
}
