//! # spamsift
//!
//! A spam/ham classifier for short text messages built from a three-model
//! voting ensemble.
//!
//! ## Features
//!
//! - Deterministic, idempotent text normalization with placeholder tokens
//! - Hand-crafted statistical features computed from the raw message
//! - TF-IDF term vectors over a frozen n-gram vocabulary
//! - Multinomial naive Bayes, calibrated linear SVM and logistic regression
//!   combined by majority vote
//! - Offline training with held-out evaluation and cross-validation
//! - Versioned, dimension-checked artifacts and a thread-safe prediction
//!   service
//!
//! ## Example
//!
//! ```no_run
//! use spamsift::prelude::*;
//!
//! let pipeline = TrainingPipeline::new(TrainingConfig::default())?;
//! let corpus = pipeline.load_corpus("spam.csv")?;
//! let paths = ArtifactPaths::in_dir("models");
//! pipeline.run_and_save(&corpus, &paths)?;
//!
//! let service = PredictionService::initialize(&paths)?;
//! let result = service.classify("WIN FREE CASH NOW!!! call 9876543210")?;
//! println!("{} {}", result.label, result.confidence_string());
//! # Ok::<(), SpamSiftError>(())
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod feature;
pub mod ml;
pub mod pipeline;
pub mod service;

pub mod prelude {
    pub use crate::analysis::{StatisticalFeatureExtractor, TextNormalizer, normalize};
    pub use crate::config::{ArtifactPaths, TrainingConfig};
    pub use crate::error::{Result, SpamSiftError};
    pub use crate::feature::{FeatureScaler, TermVectorizer};
    pub use crate::ml::Label;
    pub use crate::ml::ensemble::ModelEnsemble;
    pub use crate::pipeline::{LabeledCorpus, TrainingPipeline, TrainingReport};
    pub use crate::service::{PredictionResult, PredictionService};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
