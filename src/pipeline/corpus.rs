//! Labeled corpus loading.
//!
//! The expected layout is a CSV file with a header row, one label column
//! (`ham` / `spam`) and one text column:
//! ```csv
//! v1,v2,,,
//! ham,"Go until jurong point, crazy..",,,
//! spam,Free entry in 2 a wkly comp to win FA Cup final tkts,,,
//! ```
//! Extra columns are ignored.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use csv::ReaderBuilder;

use crate::error::{Result, SpamSiftError};
use crate::ml::{Label, class_counts};

/// Column names tried when the configured ones are absent.
const FALLBACK_LABEL_COLUMN: &str = "label";
const FALLBACK_TEXT_COLUMN: &str = "text";

/// Messages and labels after deduplication.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabeledCorpus {
    texts: Vec<String>,
    labels: Vec<Label>,
    dropped_duplicates: usize,
}

impl LabeledCorpus {
    /// Build from `(label, text)` pairs, keeping the first copy of each text.
    ///
    /// Fails when nothing is left or only one class is present.
    pub fn from_records<I, S>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Label, S)>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut corpus = LabeledCorpus::default();
        for (label, text) in records {
            let text = text.into();
            if seen.insert(text.clone()) {
                corpus.texts.push(text);
                corpus.labels.push(label);
            } else {
                corpus.dropped_duplicates += 1;
            }
        }

        if corpus.dropped_duplicates > 0 {
            log::warn!("Dropped {} duplicate messages", corpus.dropped_duplicates);
        }
        if corpus.is_empty() {
            return Err(SpamSiftError::corpus("corpus is empty after deduplication"));
        }
        let [ham, spam] = corpus.class_counts();
        if ham == 0 || spam == 0 {
            return Err(SpamSiftError::corpus(format!(
                "corpus needs both ham and spam messages, found {ham} ham and {spam} spam"
            )));
        }
        Ok(corpus)
    }

    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Number of texts removed as exact duplicates.
    pub fn dropped_duplicates(&self) -> usize {
        self.dropped_duplicates
    }

    /// `[ham, spam]` counts.
    pub fn class_counts(&self) -> [usize; 2] {
        class_counts(&self.labels)
    }
}

/// Reads a [`LabeledCorpus`] from CSV.
#[derive(Debug, Clone)]
pub struct CorpusLoader {
    label_column: String,
    text_column: String,
    delimiter: u8,
}

impl Default for CorpusLoader {
    fn default() -> Self {
        Self::new("v1", "v2")
    }
}

impl CorpusLoader {
    pub fn new<S: Into<String>>(label_column: S, text_column: S) -> Self {
        CorpusLoader {
            label_column: label_column.into(),
            text_column: text_column.into(),
            delimiter: b',',
        }
    }

    /// Set a custom delimiter character.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Load a corpus file. Bytes that are not valid UTF-8 are read as Latin-1.
    pub fn load_path<P: AsRef<Path>>(&self, path: P) -> Result<LabeledCorpus> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| {
            SpamSiftError::corpus(format!("cannot read corpus {}: {e}", path.display()))
        })?;
        log::info!("Loading corpus from {}", path.display());
        self.load_str(&decode_lossy(bytes))
    }

    /// Parse CSV content.
    pub fn load_str(&self, content: &str) -> Result<LabeledCorpus> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers = reader.headers()?.clone();
        let find = |primary: &str, fallback: &str| {
            headers
                .iter()
                .position(|h| h.trim() == primary)
                .or_else(|| headers.iter().position(|h| h.trim() == fallback))
        };
        let label_idx = find(self.label_column.as_str(), FALLBACK_LABEL_COLUMN).ok_or_else(|| {
            SpamSiftError::corpus(format!("missing label column '{}'", self.label_column))
        })?;
        let text_idx = find(self.text_column.as_str(), FALLBACK_TEXT_COLUMN).ok_or_else(|| {
            SpamSiftError::corpus(format!("missing text column '{}'", self.text_column))
        })?;

        let mut records = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record?;
            let line = record.position().map_or(row + 2, |pos| pos.line() as usize);
            let raw_label = record.get(label_idx).ok_or_else(|| {
                SpamSiftError::corpus(format!("line {line}: missing label field"))
            })?;
            let label = Label::parse_corpus_label(raw_label).ok_or_else(|| {
                SpamSiftError::corpus(format!(
                    "line {line}: label must be 'ham' or 'spam', got '{raw_label}'"
                ))
            })?;
            let text = record.get(text_idx).ok_or_else(|| {
                SpamSiftError::corpus(format!("line {line}: missing text field"))
            })?;
            records.push((label, text.to_string()));
        }

        log::debug!("Read {} corpus rows", records.len());
        LabeledCorpus::from_records(records)
    }
}

/// UTF-8 when valid, otherwise every byte maps to the Latin-1 code point.
fn decode_lossy(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => err.into_bytes().iter().map(|&b| char::from(b)).collect(),
    }
}
