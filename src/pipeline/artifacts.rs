//! Typed artifact bundle and its on-disk format.
//!
//! Each artifact file is a bincode stream of an [`ArtifactHeader`] followed by
//! the payload. The header is decoded first so that a file of the wrong kind
//! or an unsupported format version is rejected before its payload is read.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::analysis::STATISTICAL_FEATURE_COUNT;
use crate::config::ArtifactPaths;
use crate::error::{Result, SpamSiftError};
use crate::feature::{FeatureScaler, TermVectorizer};
use crate::ml::ensemble::{ModelEnsemble, check_layout};
use crate::ml::logistic::LogisticRegression;
use crate::ml::naive_bayes::MultinomialNaiveBayes;
use crate::ml::svm::CalibratedSvm;
use crate::pipeline::training::ModelAccuracies;

const MAGIC: [u8; 4] = *b"SPSF";
/// Bumped whenever a serialized struct changes shape.
pub const FORMAT_VERSION: u32 = 1;

/// What an artifact file contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactKind {
    Vectorizer,
    ModelBundle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactHeader {
    magic: [u8; 4],
    format_version: u32,
    kind: ArtifactKind,
}

impl ArtifactHeader {
    fn new(kind: ArtifactKind) -> Self {
        Self {
            magic: MAGIC,
            format_version: FORMAT_VERSION,
            kind,
        }
    }

    fn check(&self, expected: ArtifactKind) -> Result<()> {
        if self.magic != MAGIC {
            return Err(SpamSiftError::artifact_load("not a spamsift artifact"));
        }
        if self.format_version != FORMAT_VERSION {
            return Err(SpamSiftError::artifact_load(format!(
                "unsupported artifact format version {} (expected {FORMAT_VERSION})",
                self.format_version
            )));
        }
        if self.kind != expected {
            return Err(SpamSiftError::artifact_load(format!(
                "expected a {expected:?} artifact, found {:?}",
                self.kind
            )));
        }
        Ok(())
    }
}

/// Training diagnostics carried inside the bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub n_samples: usize,
    pub n_train: usize,
    pub n_test: usize,
    pub accuracies: ModelAccuracies,
    pub cv_mean: f64,
    pub cv_std: f64,
}

/// Everything the serving path needs besides the vectorizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedArtifactBundle {
    pub naive_bayes: MultinomialNaiveBayes,
    pub svm: CalibratedSvm,
    pub logistic: LogisticRegression,
    pub scaler: FeatureScaler,
    /// Highest held-out accuracy among the members and the ensemble.
    /// Informational only: predictions always use the ensemble vote.
    pub best_model: String,
    /// Number of term columns; statistical columns start at this index.
    pub tfidf_feature_count: usize,
    pub trained_at: DateTime<Utc>,
    pub summary: ReportSummary,
}

/// Bundle metadata that stays available after the models are moved out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleInfo {
    pub best_model: String,
    pub tfidf_feature_count: usize,
    pub trained_at: DateTime<Utc>,
    pub summary: ReportSummary,
}

impl TrainedArtifactBundle {
    /// Check every dimension in the bundle against `vectorizer`.
    pub fn validate(&self, vectorizer: &TermVectorizer) -> Result<()> {
        vectorizer.check_consistency()?;
        if self.tfidf_feature_count != vectorizer.vocabulary_size() {
            return Err(SpamSiftError::feature_dimension(
                "bundle term feature count",
                vectorizer.vocabulary_size(),
                self.tfidf_feature_count,
            ));
        }
        self.scaler.check_consistency()?;
        if self.scaler.n_features() != STATISTICAL_FEATURE_COUNT {
            return Err(SpamSiftError::feature_dimension(
                "scaler",
                STATISTICAL_FEATURE_COUNT,
                self.scaler.n_features(),
            ));
        }
        check_layout(
            &self.naive_bayes,
            &self.svm,
            &self.logistic,
            self.tfidf_feature_count,
        )
    }

    /// Split into a validated ensemble, the scaler and the metadata.
    pub fn into_parts(self) -> Result<(ModelEnsemble, FeatureScaler, BundleInfo)> {
        let ensemble = ModelEnsemble::new(
            self.naive_bayes,
            self.svm,
            self.logistic,
            self.tfidf_feature_count,
        )?;
        let info = BundleInfo {
            best_model: self.best_model,
            tfidf_feature_count: self.tfidf_feature_count,
            trained_at: self.trained_at,
            summary: self.summary,
        };
        Ok((ensemble, self.scaler, info))
    }

    pub fn info(&self) -> BundleInfo {
        BundleInfo {
            best_model: self.best_model.clone(),
            tfidf_feature_count: self.tfidf_feature_count,
            trained_at: self.trained_at,
            summary: self.summary.clone(),
        }
    }
}

/// Sibling path an artifact is written to before it is renamed into place.
fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write an artifact next to `path` and return the staged file.
fn stage_artifact<T: Serialize>(path: &Path, kind: ArtifactKind, payload: &T) -> Result<PathBuf> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let staged = staging_path(path);
    let written = File::create(&staged).map_err(SpamSiftError::from).and_then(|file| {
        let mut writer = BufWriter::new(file);
        bincode::serialize_into(&mut writer, &ArtifactHeader::new(kind))?;
        bincode::serialize_into(&mut writer, payload)?;
        writer.flush()?;
        Ok(())
    });
    if let Err(e) = written {
        let _ = fs::remove_file(&staged);
        return Err(e);
    }
    Ok(staged)
}

fn write_artifact<T: Serialize, P: AsRef<Path>>(path: P, kind: ArtifactKind, payload: &T) -> Result<()> {
    let path = path.as_ref();
    let staged = stage_artifact(path, kind, payload)?;
    fs::rename(&staged, path)?;
    log::debug!("Wrote {kind:?} artifact to {}", path.display());
    Ok(())
}

fn read_artifact<T: DeserializeOwned, R: Read>(mut reader: R, kind: ArtifactKind) -> Result<T> {
    let header: ArtifactHeader = bincode::deserialize_from(&mut reader)
        .map_err(|e| SpamSiftError::artifact_load(format!("unreadable {kind:?} header: {e}")))?;
    header.check(kind)?;
    bincode::deserialize_from(&mut reader)
        .map_err(|e| SpamSiftError::artifact_load(format!("malformed {kind:?} payload: {e}")))
}

fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path).map(BufReader::new).map_err(|e| {
        SpamSiftError::artifact_load(format!("cannot open {}: {e}", path.display()))
    })
}

pub fn save_vectorizer<P: AsRef<Path>>(vectorizer: &TermVectorizer, path: P) -> Result<()> {
    write_artifact(path, ArtifactKind::Vectorizer, vectorizer)
}

pub fn load_vectorizer<P: AsRef<Path>>(path: P) -> Result<TermVectorizer> {
    let vectorizer: TermVectorizer = read_artifact(open(path.as_ref())?, ArtifactKind::Vectorizer)?;
    vectorizer.check_consistency()?;
    if !vectorizer.is_fitted() {
        return Err(SpamSiftError::artifact_load("vectorizer has an empty vocabulary"));
    }
    Ok(vectorizer)
}

pub fn save_bundle<P: AsRef<Path>>(bundle: &TrainedArtifactBundle, path: P) -> Result<()> {
    write_artifact(path, ArtifactKind::ModelBundle, bundle)
}

/// Read a bundle. Dimensions are checked later, against the vectorizer.
pub fn load_bundle<P: AsRef<Path>>(path: P) -> Result<TrainedArtifactBundle> {
    read_artifact(open(path.as_ref())?, ArtifactKind::ModelBundle)
}

/// Write both artifacts.
///
/// Both files are fully written to staging paths before either replaces an
/// existing artifact, so a failed write leaves the previous pair untouched.
pub fn save_artifacts(
    paths: &ArtifactPaths,
    vectorizer: &TermVectorizer,
    bundle: &TrainedArtifactBundle,
) -> Result<()> {
    let staged_vectorizer = stage_artifact(&paths.vectorizer, ArtifactKind::Vectorizer, vectorizer)?;
    let staged_model = match stage_artifact(&paths.model, ArtifactKind::ModelBundle, bundle) {
        Ok(staged) => staged,
        Err(e) => {
            let _ = fs::remove_file(&staged_vectorizer);
            return Err(e);
        }
    };
    fs::rename(&staged_vectorizer, &paths.vectorizer)?;
    fs::rename(&staged_model, &paths.model)?;
    log::info!(
        "Saved artifacts to {} and {}",
        paths.vectorizer.display(),
        paths.model.display()
    );
    Ok(())
}

/// Read both artifacts and cross-check their dimensions.
pub fn load_artifacts(paths: &ArtifactPaths) -> Result<(TermVectorizer, TrainedArtifactBundle)> {
    let vectorizer = load_vectorizer(&paths.vectorizer)?;
    let bundle = load_bundle(&paths.model)?;
    bundle.validate(&vectorizer)?;
    Ok((vectorizer, bundle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_vectorizer_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("vectorizer.bin");
        let mut vectorizer = TermVectorizer::default();
        vectorizer
            .fit(&["free cash now", "free cash later", "see you soon", "see you later"])
            .unwrap();
        save_vectorizer(&vectorizer, &path).unwrap();

        let loaded = load_vectorizer(&path).unwrap();
        assert_eq!(loaded.vocabulary_size(), vectorizer.vocabulary_size());
        assert_eq!(
            loaded.transform("free cash").unwrap(),
            vectorizer.transform("free cash").unwrap()
        );
    }

    #[test]
    fn test_wrong_kind_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.bin");
        let mut vectorizer = TermVectorizer::default();
        vectorizer.fit(&["aa bb", "aa bb", "cc dd", "cc dd"]).unwrap();
        save_vectorizer(&vectorizer, &path).unwrap();

        let err = load_bundle(&path).unwrap_err();
        assert!(matches!(err, SpamSiftError::ArtifactLoad(_)));
    }

    #[test]
    fn test_garbage_and_missing_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("garbage.bin");
        fs::write(&path, b"definitely not bincode").unwrap();
        assert!(matches!(
            load_vectorizer(&path).unwrap_err(),
            SpamSiftError::ArtifactLoad(_)
        ));
        assert!(matches!(
            load_vectorizer(dir.path().join("missing.bin")).unwrap_err(),
            SpamSiftError::ArtifactLoad(_)
        ));
    }

    #[test]
    fn test_save_leaves_no_staging_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vectorizer.bin");
        let mut vectorizer = TermVectorizer::default();
        vectorizer.fit(&["aa bb", "aa bb", "cc dd", "cc dd"]).unwrap();
        save_vectorizer(&vectorizer, &path).unwrap();
        save_vectorizer(&vectorizer, &path).unwrap();

        assert!(path.exists());
        assert!(!staging_path(&path).exists());
        assert_eq!(staging_path(&path), dir.path().join("vectorizer.bin.tmp"));
    }
}
