//! Feature-space construction.
//!
//! A message becomes one sparse row made of two blocks:
//!
//! ```text
//! [ term columns (0..term_dim) | scaled statistical columns (term_dim..term_dim + 6) ]
//! ```
//!
//! The term block comes from [`tfidf::TermVectorizer`], the statistical block
//! from [`scaler::FeatureScaler`] applied to
//! [`crate::analysis::StatisticalFeatures`]. The boundary `term_dim` is the
//! vectorizer's vocabulary size and must be identical at training and
//! serving time.

pub mod scaler;
pub mod sparse;
pub mod tfidf;

pub use scaler::FeatureScaler;
pub use sparse::SparseVector;
pub use tfidf::TermVectorizer;

use crate::analysis::{STATISTICAL_FEATURE_COUNT, StatisticalFeatureExtractor, normalize};
use crate::error::{Result, SpamSiftError};

/// Build the full feature row of a raw message.
///
/// Training and serving both go through this function, so the column layout
/// cannot drift between them.
pub fn build_feature_row(
    vectorizer: &TermVectorizer,
    scaler: &FeatureScaler,
    raw: &str,
) -> Result<SparseVector> {
    let stats = StatisticalFeatureExtractor::new().extract(raw).to_array();
    assemble_feature_row(vectorizer, scaler, &normalize(raw), &stats)
}

/// Build a full row from a message already normalized and measured.
///
/// `normalized` must be `normalize(raw)` and `stats` the unscaled statistical
/// features of the same `raw`.
pub fn assemble_feature_row(
    vectorizer: &TermVectorizer,
    scaler: &FeatureScaler,
    normalized: &str,
    stats: &[f64; STATISTICAL_FEATURE_COUNT],
) -> Result<SparseVector> {
    let terms = vectorizer.transform(normalized)?;
    let scaled = scaler.transform(stats)?;
    concat_features(&terms, &scaled)
}

/// Concatenate a term vector with scaled statistical features.
///
/// The result has dimension `terms.dim() + STATISTICAL_FEATURE_COUNT`.
pub fn concat_features(terms: &SparseVector, scaled: &[f64]) -> Result<SparseVector> {
    if scaled.len() != STATISTICAL_FEATURE_COUNT {
        return Err(SpamSiftError::feature_dimension(
            "statistical features",
            STATISTICAL_FEATURE_COUNT,
            scaled.len(),
        ));
    }
    let term_dim = terms.dim();
    let mut row = SparseVector::with_capacity(term_dim + scaled.len(), terms.nnz() + scaled.len());
    for (idx, value) in terms.iter() {
        row.push(idx, value);
    }
    for (offset, &value) in scaled.iter().enumerate() {
        row.push(term_dim + offset, value);
    }
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concat_dimension() {
        let terms = SparseVector::from_pairs(10, vec![(2, 0.5), (7, 0.25)]);
        let row = concat_features(&terms, &[1.0, 0.0, -1.0, 0.0, 0.5, 2.0]).unwrap();
        assert_eq!(row.dim(), 10 + STATISTICAL_FEATURE_COUNT);
        assert_eq!(row.get(2), 0.5);
        assert_eq!(row.get(10), 1.0);
        assert_eq!(row.get(12), -1.0);
        assert_eq!(row.get(15), 2.0);
        assert_eq!(row.get(11), 0.0);
    }

    #[test]
    fn test_build_feature_row_layout() {
        let mut vectorizer = TermVectorizer::default();
        vectorizer
            .fit(&["free cash prize", "free cash today", "lunch today maybe", "lunch maybe later"])
            .unwrap();
        let scaler = FeatureScaler::fit(&[[1.0; 6], [3.0; 6]]).unwrap();

        for raw in ["FREE cash!!!", "", "completely unknown words"] {
            let row = build_feature_row(&vectorizer, &scaler, raw).unwrap();
            assert_eq!(row.dim(), vectorizer.vocabulary_size() + STATISTICAL_FEATURE_COUNT);
        }
    }

    #[test]
    fn test_assembled_row_matches_raw_row() {
        let mut vectorizer = TermVectorizer::default();
        vectorizer
            .fit(&["free cash prize", "free cash today", "lunch today maybe", "lunch maybe later"])
            .unwrap();
        let scaler = FeatureScaler::fit(&[[1.0, 0.0, 0.0, 1.0, 0.1, 0.0], [40.0, 1.0, 1.0, 0.0, 0.5, 3.0]])
            .unwrap();
        let extractor = StatisticalFeatureExtractor::new();

        for raw in ["FREE cash today!!! call 0800123456", "Lunch maybe?", ""] {
            let stats = extractor.extract(raw).to_array();
            assert_eq!(
                assemble_feature_row(&vectorizer, &scaler, &normalize(raw), &stats).unwrap(),
                build_feature_row(&vectorizer, &scaler, raw).unwrap(),
                "{raw:?}"
            );
        }
    }

    #[test]
    fn test_concat_rejects_wrong_width() {
        let terms = SparseVector::new(4);
        let err = concat_features(&terms, &[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, SpamSiftError::FeatureDimension { .. }));
    }
}
