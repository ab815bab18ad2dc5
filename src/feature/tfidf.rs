//! TF-IDF term vectorizer with a frozen n-gram vocabulary.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::analysis::stop_words::is_stop_word;
use crate::error::{Result, SpamSiftError};
use crate::feature::sparse::SparseVector;

/// Vocabulary construction parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizerConfig {
    /// Keep at most this many terms (the most frequent across the corpus).
    pub max_features: usize,
    /// Smallest and largest n-gram length.
    pub ngram_range: (usize, usize),
    /// Minimum number of documents a term must appear in.
    pub min_df: usize,
    /// Maximum fraction of documents a term may appear in.
    pub max_df: f64,
    /// Use `1 + ln(tf)` instead of the raw term count.
    pub sublinear_tf: bool,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            max_features: 8000,
            ngram_range: (1, 3),
            min_df: 2,
            max_df: 0.95,
            sublinear_tf: true,
        }
    }
}

impl VectorizerConfig {
    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(SpamSiftError::invalid_config(format!(
                "invalid ngram_range ({min_n}, {max_n})"
            )));
        }
        if self.max_features == 0 {
            return Err(SpamSiftError::invalid_config("max_features must be positive"));
        }
        if !(self.max_df > 0.0 && self.max_df <= 1.0) {
            return Err(SpamSiftError::invalid_config(format!(
                "max_df must be in (0, 1], got {}",
                self.max_df
            )));
        }
        Ok(())
    }
}

/// TF-IDF vectorizer for normalized text.
///
/// Terms are whitespace tokens of at least two characters with stop words
/// removed, joined into n-grams. After [`fit`](Self::fit) the vocabulary is
/// frozen: unknown terms contribute nothing, so every transformed vector has
/// exactly [`vocabulary_size`](Self::vocabulary_size) columns.
#[derive(Clone, Serialize, Deserialize)]
pub struct TermVectorizer {
    config: VectorizerConfig,
    /// Term -> column index. Columns are assigned in lexicographic term order.
    vocabulary: HashMap<String, usize>,
    /// Inverse document frequency for each column.
    idf: Vec<f64>,
    /// Total number of documents seen during training.
    n_documents: usize,
}

impl std::fmt::Debug for TermVectorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TermVectorizer")
            .field("vocabulary_size", &self.vocabulary.len())
            .field("n_documents", &self.n_documents)
            .field("config", &self.config)
            .finish()
    }
}

impl Default for TermVectorizer {
    fn default() -> Self {
        Self::new(VectorizerConfig::default())
    }
}

impl TermVectorizer {
    /// Create an unfitted vectorizer.
    pub fn new(config: VectorizerConfig) -> Self {
        Self {
            config,
            vocabulary: HashMap::new(),
            idf: Vec::new(),
            n_documents: 0,
        }
    }

    /// Learn the vocabulary and IDF weights from normalized documents.
    ///
    /// Fails when the thresholds leave no terms at all.
    pub fn fit<S: AsRef<str>>(&mut self, documents: &[S]) -> Result<()> {
        self.config.validate()?;
        if documents.is_empty() {
            return Err(SpamSiftError::vocabulary("cannot fit on an empty corpus"));
        }

        let n_documents = documents.len();
        let mut term_frequency: HashMap<String, usize> = HashMap::new();
        let mut document_frequency: HashMap<String, usize> = HashMap::new();

        for doc in documents {
            let terms = self.analyze(doc.as_ref());
            let mut unique = HashSet::new();
            for term in terms {
                *term_frequency.entry(term.clone()).or_insert(0) += 1;
                unique.insert(term);
            }
            for term in unique {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        let max_doc_count = self.config.max_df * n_documents as f64;
        if max_doc_count < self.config.min_df as f64 {
            return Err(SpamSiftError::vocabulary(format!(
                "max_df {} keeps fewer documents ({max_doc_count:.1}) than min_df {}",
                self.config.max_df, self.config.min_df
            )));
        }

        let mut candidates: Vec<(String, usize)> = term_frequency
            .into_iter()
            .filter(|(term, _)| {
                let df = document_frequency.get(term).copied().unwrap_or(0);
                df >= self.config.min_df && df as f64 <= max_doc_count
            })
            .collect();

        if candidates.is_empty() {
            return Err(SpamSiftError::vocabulary(format!(
                "no terms left after pruning {n_documents} documents (min_df={}, max_df={})",
                self.config.min_df, self.config.max_df
            )));
        }

        // Most frequent first; ties broken by term for determinism.
        candidates.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        candidates.truncate(self.config.max_features);

        let mut terms: Vec<String> = candidates.into_iter().map(|(term, _)| term).collect();
        terms.sort();

        let mut idf = Vec::with_capacity(terms.len());
        let mut vocabulary = HashMap::with_capacity(terms.len());
        for (idx, term) in terms.into_iter().enumerate() {
            let df = document_frequency.get(&term).copied().unwrap_or(0);
            // IDF = ln((N + 1) / (df + 1)) + 1
            idf.push(((n_documents as f64 + 1.0) / (df as f64 + 1.0)).ln() + 1.0);
            vocabulary.insert(term, idx);
        }

        log::debug!(
            "Vectorizer fitted on {} documents, vocabulary size {}",
            n_documents,
            vocabulary.len()
        );

        self.vocabulary = vocabulary;
        self.idf = idf;
        self.n_documents = n_documents;
        Ok(())
    }

    /// Transform a normalized document into an L2-normalized TF-IDF vector.
    pub fn transform(&self, document: &str) -> Result<SparseVector> {
        if !self.is_fitted() {
            return Err(SpamSiftError::vocabulary("vectorizer is not fitted"));
        }

        let mut counts: HashMap<usize, f64> = HashMap::new();
        for term in self.analyze(document) {
            if let Some(&idx) = self.vocabulary.get(&term) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let pairs = counts
            .into_iter()
            .map(|(idx, count)| {
                let tf = if self.config.sublinear_tf {
                    1.0 + count.ln()
                } else {
                    count
                };
                (idx, tf * self.idf[idx])
            })
            .collect();

        let mut vector = SparseVector::from_pairs(self.vocabulary.len(), pairs);
        vector.l2_normalize();
        Ok(vector)
    }

    /// Fit on `documents` and transform each of them.
    pub fn fit_transform<S: AsRef<str>>(&mut self, documents: &[S]) -> Result<Vec<SparseVector>> {
        self.fit(documents)?;
        documents
            .iter()
            .map(|doc| self.transform(doc.as_ref()))
            .collect()
    }

    /// Split a normalized document into its n-gram terms.
    pub fn analyze(&self, document: &str) -> Vec<String> {
        let tokens: Vec<&str> = document
            .split_whitespace()
            .filter(|token| token.chars().count() >= 2 && !is_stop_word(token))
            .collect();

        let (min_n, max_n) = self.config.ngram_range;
        let mut terms = Vec::new();
        for n in min_n..=max_n {
            for window in tokens.windows(n) {
                terms.push(window.join(" "));
            }
        }
        terms
    }

    /// Size of the vocabulary (the term-vector dimensionality).
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Whether [`fit`](Self::fit) has produced a vocabulary.
    pub fn is_fitted(&self) -> bool {
        !self.vocabulary.is_empty()
    }

    /// Column index of `term`, if it is in the vocabulary.
    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    /// IDF weight of `term`, if it is in the vocabulary.
    pub fn idf(&self, term: &str) -> Option<f64> {
        self.term_index(term).map(|idx| self.idf[idx])
    }

    /// Number of documents the vocabulary was learned from.
    pub fn n_documents(&self) -> usize {
        self.n_documents
    }

    /// Vectorizer parameters.
    pub fn config(&self) -> &VectorizerConfig {
        &self.config
    }

    /// Check internal consistency after deserialization.
    pub(crate) fn check_consistency(&self) -> Result<()> {
        if self.idf.len() != self.vocabulary.len() {
            return Err(SpamSiftError::feature_dimension(
                "vectorizer idf",
                self.vocabulary.len(),
                self.idf.len(),
            ));
        }
        if self.vocabulary.values().any(|&idx| idx >= self.idf.len()) {
            return Err(SpamSiftError::artifact_load(
                "vectorizer vocabulary references a column outside its idf table",
            ));
        }
        Ok(())
    }
}
