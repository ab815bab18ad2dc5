//! Hand-crafted statistical features computed from the raw message.
//!
//! These features are position-sensitive: the scaler and the models only know
//! columns, not names, so [`StatisticalFeatures::to_array`] must always emit
//! the values in the order of [`FEATURE_NAMES`].

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Number of statistical features appended after the term columns.
pub const STATISTICAL_FEATURE_COUNT: usize = 6;

/// Column names, in column order.
pub const FEATURE_NAMES: [&str; STATISTICAL_FEATURE_COUNT] = [
    "length",
    "has_url",
    "has_phone",
    "has_spam_keyword",
    "upper_case_ratio",
    "exclamation_count",
];

/// Keywords that raise the spam keyword flag (substring match, case-insensitive).
pub const SPAM_KEYWORDS: &[&str] = &["free", "win", "prize", "cash", "claim"];

const URL_MARKERS: &[&str] = &["http", "www", ".com"];

static PHONE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{5,}").expect("phone run pattern must compile"));

/// Fixed-order statistical features of one raw message.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatisticalFeatures {
    /// Character count of the raw text.
    pub length: usize,
    pub has_url: bool,
    /// At least five consecutive digits.
    pub has_phone: bool,
    pub has_spam_keyword: bool,
    /// Uppercase letters over `max(length, 1)`.
    pub upper_case_ratio: f64,
    pub exclamation_count: usize,
}

impl StatisticalFeatures {
    /// Feature values in column order. Flags become 0.0 or 1.0.
    pub fn to_array(&self) -> [f64; STATISTICAL_FEATURE_COUNT] {
        [
            self.length as f64,
            flag(self.has_url),
            flag(self.has_phone),
            flag(self.has_spam_keyword),
            self.upper_case_ratio,
            self.exclamation_count as f64,
        ]
    }
}

fn flag(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}

/// Computes [`StatisticalFeatures`] from raw, un-normalized text.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatisticalFeatureExtractor;

impl StatisticalFeatureExtractor {
    /// Create a new extractor.
    pub fn new() -> Self {
        Self
    }

    /// Extract the six statistical features of `raw`.
    pub fn extract(&self, raw: &str) -> StatisticalFeatures {
        let lowered = raw.to_lowercase();
        let length = raw.chars().count();
        let upper = raw.chars().filter(|c| c.is_uppercase()).count();

        StatisticalFeatures {
            length,
            has_url: URL_MARKERS.iter().any(|marker| lowered.contains(marker)),
            has_phone: PHONE_RUN.is_match(raw),
            has_spam_keyword: SPAM_KEYWORDS.iter().any(|keyword| lowered.contains(keyword)),
            upper_case_ratio: upper as f64 / length.max(1) as f64,
            exclamation_count: raw.chars().filter(|&c| c == '!').count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spam_example() {
        let features = StatisticalFeatureExtractor::new()
            .extract("WIN FREE CASH NOW!!! call 9876543210 www.win.com");
        assert!(features.has_spam_keyword);
        assert!(features.has_url);
        assert!(features.has_phone);
        assert_eq!(features.exclamation_count, 3);
        assert_eq!(features.length, 48);
    }

    #[test]
    fn test_empty_input() {
        let features = StatisticalFeatureExtractor::new().extract("");
        assert_eq!(features.length, 0);
        assert_eq!(features.upper_case_ratio, 0.0);
        assert_eq!(features.to_array(), [0.0; STATISTICAL_FEATURE_COUNT]);
    }

    #[test]
    fn test_ranges() {
        let extractor = StatisticalFeatureExtractor::new();
        for text in ["ABC", "abc", "A!b!C!", "ÄÖÜ straße", "12345", "!!!!"] {
            let features = extractor.extract(text);
            assert!((0.0..=1.0).contains(&features.upper_case_ratio));
            assert_eq!(
                features.exclamation_count,
                text.matches('!').count(),
                "exclamations in {text:?}"
            );
            for value in &features.to_array()[1..4] {
                assert!(*value == 0.0 || *value == 1.0);
            }
        }
        assert_eq!(extractor.extract("ABC").upper_case_ratio, 1.0);
    }

    #[test]
    fn test_phone_needs_five_digits() {
        let extractor = StatisticalFeatureExtractor::new();
        assert!(!extractor.extract("call 1234 now").has_phone);
        assert!(extractor.extract("call 12345 now").has_phone);
        assert!(!extractor.extract("12-34-56").has_phone);
    }

    #[test]
    fn test_length_counts_characters() {
        let features = StatisticalFeatureExtractor::new().extract("£100 héllo");
        assert_eq!(features.length, 10);
    }

    #[test]
    fn test_deterministic() {
        let extractor = StatisticalFeatureExtractor::new();
        let text = "Claim your PRIZE at http://x.co";
        assert_eq!(extractor.extract(text), extractor.extract(text));
    }
}
