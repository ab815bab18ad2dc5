//! The offline side: corpus loading, training and artifact persistence.
//!
//! [`training::TrainingPipeline`] turns a [`corpus::LabeledCorpus`] into a
//! fitted vectorizer plus a [`artifacts::TrainedArtifactBundle`], and
//! [`artifacts`] writes and reads both as versioned bincode files.

pub mod artifacts;
pub mod corpus;
pub mod training;

pub use artifacts::{BundleInfo, TrainedArtifactBundle, load_artifacts, save_artifacts};
pub use corpus::{CorpusLoader, LabeledCorpus};
pub use training::{ModelAccuracies, TrainingOutcome, TrainingPipeline, TrainingReport};
