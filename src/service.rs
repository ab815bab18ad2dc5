//! Inference-time classification service.
//!
//! A [`PredictionService`] owns one immutable copy of the vectorizer, scaler
//! and ensemble. It is `Send + Sync`, so a single instance can be shared by
//! reference (or in an `Arc`) across threads without locking.
//!
//! # Examples
//!
//! ```no_run
//! use spamsift::config::ArtifactPaths;
//! use spamsift::service::PredictionService;
//!
//! let service = PredictionService::initialize(&ArtifactPaths::in_dir("models"))?;
//! let result = service.classify("WIN FREE CASH NOW!!!")?;
//! println!("{} ({})", result.label, result.confidence_string());
//! # Ok::<(), spamsift::error::SpamSiftError>(())
//! ```

use std::fmt;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::ArtifactPaths;
use crate::error::{Result, SpamSiftError};
use crate::feature::{FeatureScaler, TermVectorizer, build_feature_row};
use crate::ml::Label;
use crate::ml::ensemble::{ModelEnsemble, ModelVotes};
use crate::pipeline::artifacts::{BundleInfo, TrainedArtifactBundle, load_artifacts};

/// Result of classifying one message.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Majority vote of the ensemble.
    pub label: Label,
    /// Logistic regression confidence in `[50, 100]`.
    pub confidence_percent: f64,
    /// Logistic regression probability of spam.
    pub spam_probability: f64,
    pub votes: ModelVotes,
}

impl PredictionResult {
    /// Confidence with two decimals, e.g. `"97.42%"`.
    pub fn confidence_string(&self) -> String {
        format!("{:.2}%", self.confidence_percent)
    }
}

impl fmt::Display for PredictionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.confidence_string())
    }
}

/// Classifies raw messages with a loaded artifact set.
#[derive(Debug)]
pub struct PredictionService {
    vectorizer: TermVectorizer,
    scaler: FeatureScaler,
    ensemble: ModelEnsemble,
    info: BundleInfo,
}

impl PredictionService {
    /// Load both artifacts from disk.
    ///
    /// Any missing, unreadable or mismatched artifact is an error; there is
    /// no partially initialized service.
    pub fn initialize(paths: &ArtifactPaths) -> Result<Self> {
        let (vectorizer, bundle) = load_artifacts(paths)?;
        let service = Self::from_artifacts(vectorizer, bundle)?;
        log::info!(
            "Prediction service ready: {} term features, trained at {}",
            service.info.tfidf_feature_count,
            service.info.trained_at
        );
        Ok(service)
    }

    /// Build from in-memory artifacts, applying the same checks as loading.
    pub fn from_artifacts(vectorizer: TermVectorizer, bundle: TrainedArtifactBundle) -> Result<Self> {
        bundle.validate(&vectorizer)?;
        let (ensemble, scaler, info) = bundle.into_parts()?;
        Ok(Self {
            vectorizer,
            scaler,
            ensemble,
            info,
        })
    }

    /// Classify one raw message.
    ///
    /// Empty or whitespace-only text is rejected with
    /// [`SpamSiftError::EmptyInput`] before any model runs.
    pub fn classify(&self, text: &str) -> Result<PredictionResult> {
        if text.trim().is_empty() {
            return Err(SpamSiftError::EmptyInput);
        }
        let row = build_feature_row(&self.vectorizer, &self.scaler, text)?;
        let prediction = self.ensemble.predict(&row)?;
        log::debug!(
            "classified as {} with votes {:?}",
            prediction.label,
            prediction.votes
        );
        Ok(PredictionResult {
            label: prediction.label,
            confidence_percent: prediction.confidence_percent,
            spam_probability: prediction.spam_probability,
            votes: prediction.votes,
        })
    }

    /// Classify many messages in parallel. Results keep the input order.
    pub fn classify_batch<S: AsRef<str> + Sync>(&self, texts: &[S]) -> Vec<Result<PredictionResult>> {
        texts
            .par_iter()
            .map(|text| self.classify(text.as_ref()))
            .collect()
    }

    pub fn info(&self) -> &BundleInfo {
        &self.info
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vectorizer.vocabulary_size()
    }

    /// Width of the feature rows fed to the ensemble.
    pub fn feature_count(&self) -> usize {
        self.ensemble.full_feature_count()
    }
}
