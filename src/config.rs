//! Training and artifact configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpamSiftError};
use crate::feature::tfidf::VectorizerConfig;
use crate::ml::logistic::LogisticConfig;
use crate::ml::svm::SvmConfig;

/// File name of the serialized vectorizer.
pub const VECTORIZER_FILE: &str = "vectorizer.bin";
/// File name of the serialized model bundle.
pub const MODEL_FILE: &str = "model.bin";

/// Configuration of a training run.
///
/// Every field has a default, so a JSON config only needs the values it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Term vectorizer parameters.
    pub vectorizer: VectorizerConfig,
    /// Additive smoothing of the naive Bayes model.
    pub nb_alpha: f64,
    /// Linear SVM and calibration parameters.
    pub svm: SvmConfig,
    /// Logistic regression parameters.
    pub logistic: LogisticConfig,
    /// Fraction of the corpus held out for evaluation.
    pub test_size: f64,
    /// Number of cross-validation folds for the logistic model.
    pub cv_folds: usize,
    /// Seed of the train/test split and cross-validation shuffling.
    pub random_seed: u64,
    /// Fit the vectorizer and scaler on the whole corpus before splitting.
    ///
    /// This reproduces the reference evaluation numbers but lets held-out
    /// documents influence the vocabulary and scaling statistics. When
    /// false both are fitted on the training partition only.
    pub fit_before_split: bool,
    /// Corpus column holding `ham` / `spam`.
    pub label_column: String,
    /// Corpus column holding the message text.
    pub text_column: String,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            vectorizer: VectorizerConfig::default(),
            nb_alpha: 0.05,
            svm: SvmConfig::default(),
            logistic: LogisticConfig::default(),
            test_size: 0.2,
            cv_folds: 5,
            random_seed: 42,
            fit_before_split: true,
            label_column: "v1".to_string(),
            text_column: "v2".to_string(),
        }
    }
}

impl TrainingConfig {
    /// Load and validate a JSON config file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: TrainingConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.vectorizer.validate()?;
        self.svm.validate()?;
        self.logistic.validate()?;
        if !(self.nb_alpha > 0.0) {
            return Err(SpamSiftError::invalid_config(format!(
                "nb_alpha must be positive, got {}",
                self.nb_alpha
            )));
        }
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(SpamSiftError::invalid_config(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }
        if self.cv_folds < 2 {
            return Err(SpamSiftError::invalid_config(format!(
                "cv_folds must be at least 2, got {}",
                self.cv_folds
            )));
        }
        if self.label_column.is_empty() || self.text_column.is_empty() {
            return Err(SpamSiftError::invalid_config("corpus column names must not be empty"));
        }
        Ok(())
    }
}

/// Locations of the two persisted artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    pub vectorizer: PathBuf,
    pub model: PathBuf,
}

impl ArtifactPaths {
    /// The default file names inside `dir`.
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            vectorizer: dir.join(VECTORIZER_FILE),
            model: dir.join(MODEL_FILE),
        }
    }
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            vectorizer: PathBuf::from(VECTORIZER_FILE),
            model: PathBuf::from(MODEL_FILE),
        }
    }
}
