//! Text analysis for message classification.
//!
//! Two independent views of a raw message are produced here:
//!
//! - [`normalizer::TextNormalizer`] rewrites the message into a canonical,
//!   lowercase token stream with URLs, emails and numbers replaced by
//!   placeholder tokens. This stream feeds the term vectorizer.
//! - [`statistics::StatisticalFeatureExtractor`] reads the *raw* message and
//!   measures signals that normalization discards (case, punctuation, raw
//!   digit runs).
//!
//! [`stop_words`] holds the English stop-word list used when building terms.

pub mod normalizer;
pub mod statistics;
pub mod stop_words;

pub use normalizer::{TextNormalizer, normalize};
pub use statistics::{STATISTICAL_FEATURE_COUNT, StatisticalFeatureExtractor, StatisticalFeatures};
