//! Error types for the spamsift library.
//!
//! All fallible operations return [`Result`], whose error side is the
//! [`SpamSiftError`] enum. The variants mirror the failure classes of the
//! classifier: per-request input problems, fatal artifact problems at load
//! time, and corpus problems that abort training.
//!
//! # Examples
//!
//! ```
//! use spamsift::error::{SpamSiftError, Result};
//!
//! fn check(message: &str) -> Result<()> {
//!     if message.trim().is_empty() {
//!         return Err(SpamSiftError::EmptyInput);
//!     }
//!     Ok(())
//! }
//!
//! assert!(check("   ").unwrap_err().is_recoverable());
//! ```

use std::io;

use thiserror::Error;

/// The main error type for spamsift operations.
#[derive(Error, Debug)]
pub enum SpamSiftError {
    /// I/O errors (artifact files, corpus files).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The message to classify was empty or whitespace-only.
    #[error("Empty input: message must contain at least one non-whitespace character")]
    EmptyInput,

    /// An artifact was missing, unreadable or structurally malformed.
    #[error("Artifact load error: {0}")]
    ArtifactLoad(String),

    /// Loaded artifacts disagree about the shape of the feature space.
    #[error("Feature dimension mismatch in {component}: expected {expected}, found {actual}")]
    FeatureDimension {
        component: String,
        expected: usize,
        actual: usize,
    },

    /// The labeled corpus cannot be used for training.
    #[error("Corpus error: {0}")]
    Corpus(String),

    /// The vectorizer could not build a vocabulary.
    #[error("Vocabulary error: {0}")]
    Vocabulary(String),

    /// Model fitting failed.
    #[error("Training error: {0}")]
    Training(String),

    /// Binary (de)serialization errors.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV parsing errors.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid configuration values.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for operations that may fail with SpamSiftError.
pub type Result<T> = std::result::Result<T, SpamSiftError>;

impl SpamSiftError {
    /// Create a new artifact load error.
    pub fn artifact_load<S: Into<String>>(msg: S) -> Self {
        SpamSiftError::ArtifactLoad(msg.into())
    }

    /// Create a new feature dimension error.
    pub fn feature_dimension<S: Into<String>>(component: S, expected: usize, actual: usize) -> Self {
        SpamSiftError::FeatureDimension {
            component: component.into(),
            expected,
            actual,
        }
    }

    /// Create a new corpus error.
    pub fn corpus<S: Into<String>>(msg: S) -> Self {
        SpamSiftError::Corpus(msg.into())
    }

    /// Create a new vocabulary error.
    pub fn vocabulary<S: Into<String>>(msg: S) -> Self {
        SpamSiftError::Vocabulary(msg.into())
    }

    /// Create a new training error.
    pub fn training<S: Into<String>>(msg: S) -> Self {
        SpamSiftError::Training(msg.into())
    }

    /// Create a new serialization error.
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        SpamSiftError::Serialization(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        SpamSiftError::InvalidConfig(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        SpamSiftError::Other(msg.into())
    }

    /// Whether the caller can recover from this error without restarting.
    ///
    /// Only per-request input errors are recoverable; artifact, dimension
    /// and corpus errors must stop the process.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SpamSiftError::EmptyInput)
    }
}

impl From<bincode::Error> for SpamSiftError {
    fn from(err: bincode::Error) -> Self {
        SpamSiftError::Serialization(err.to_string())
    }
}
