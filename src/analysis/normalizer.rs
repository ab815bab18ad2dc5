//! Deterministic text normalization.
//!
//! The normalizer applies an ordered list of rewrite stages to a raw message.
//! Each stage sees the output of the previous one, so the order matters:
//! URLs and emails are replaced before any digit handling (their digits must
//! not become number tokens), long phone numbers are matched before generic
//! numbers, and punctuation is stripped only after every placeholder is in
//! place.
//!
//! The output only contains `[a-z0-9]` words separated by single spaces,
//! which makes normalization idempotent.
//!
//! # Examples
//!
//! ```
//! use spamsift::analysis::normalizer::normalize;
//!
//! let text = normalize("WIN FREE CASH NOW!!! call 9876543210 www.win.com");
//! assert_eq!(text, "win free cash now call phonenumber urllink");
//! ```

use std::sync::LazyLock;

use regex::Regex;

/// Placeholder for URL-like substrings.
pub const URL_TOKEN: &str = "urllink";
/// Placeholder for email-like substrings.
pub const EMAIL_TOKEN: &str = "emailaddr";
/// Placeholder for long or formatted phone numbers.
pub const PHONE_TOKEN: &str = "phonenumber";
/// Placeholder for any other standalone digit run.
pub const NUMBER_TOKEN: &str = "number";

/// A single regex rewrite applied by the normalizer.
struct RewriteStage {
    name: &'static str,
    pattern: Regex,
    replacement: String,
    /// Only replace matches not glued to a neighbouring `[a-z0-9]` character.
    standalone: bool,
}

impl RewriteStage {
    fn new(name: &'static str, pattern: &str, replacement: &str, standalone: bool) -> Self {
        Self {
            name,
            // Patterns are compile-time constants covered by the unit tests.
            pattern: Regex::new(pattern).expect("normalizer pattern must compile"),
            replacement: replacement.to_string(),
            standalone,
        }
    }

    fn apply(&self, input: &str) -> String {
        if self.standalone {
            replace_standalone(&self.pattern, input, &self.replacement)
        } else {
            self.pattern
                .replace_all(input, self.replacement.as_str())
                .into_owned()
        }
    }
}

static STAGES: LazyLock<Vec<RewriteStage>> = LazyLock::new(|| {
    vec![
        RewriteStage::new("url", r"(?:http|www)\S+", &format!(" {URL_TOKEN} "), false),
        RewriteStage::new("email", r"\S+@\S+", &format!(" {EMAIL_TOKEN} "), false),
        // Digit classes are ASCII; digits of other scripts fall through to `strip`.
        RewriteStage::new("long_digits", r"[0-9]{10,}", &format!(" {PHONE_TOKEN} "), true),
        RewriteStage::new(
            "formatted_phone",
            r"[0-9]{4,5}[-\s]?[0-9]{5,6}",
            &format!(" {PHONE_TOKEN} "),
            true,
        ),
        RewriteStage::new("number", r"[0-9]+", &format!(" {NUMBER_TOKEN} "), true),
        RewriteStage::new("strip", r"[^a-z0-9\s]+", " ", false),
    ]
});

/// Rewrites raw messages into the canonical token stream used for term
/// vectorization.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextNormalizer;

impl TextNormalizer {
    /// Create a new normalizer.
    pub fn new() -> Self {
        Self
    }

    /// Normalize a raw message. Never fails; empty input yields empty output.
    pub fn normalize(&self, raw: &str) -> String {
        let mut text = raw.to_lowercase();
        for stage in STAGES.iter() {
            text = stage.apply(&text);
        }
        collapse_whitespace(&text)
    }

    /// Names of the regex stages in the order they run.
    pub fn stage_names(&self) -> Vec<&'static str> {
        STAGES.iter().map(|stage| stage.name).collect()
    }
}

/// Normalize a raw message with the default normalizer.
pub fn normalize(raw: &str) -> String {
    TextNormalizer::new().normalize(raw)
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit()
}

fn is_standalone(input: &str, start: usize, end: usize) -> bool {
    let before = input[..start].chars().next_back();
    let after = input[end..].chars().next();
    before.is_none_or(|c| !is_word_char(c)) && after.is_none_or(|c| !is_word_char(c))
}

/// Replace matches whose neighbours are not word characters.
///
/// A word character is anything that survives the final strip stage, so a
/// digit run is "standalone" exactly when it would be a token of its own in
/// the normalized output.
fn replace_standalone(pattern: &Regex, input: &str, replacement: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut last = 0;
    let mut pos = 0;

    while let Some(m) = pattern.find_at(input, pos) {
        if is_standalone(input, m.start(), m.end()) {
            output.push_str(&input[last..m.start()]);
            output.push_str(replacement);
            last = m.end();
            pos = m.end();
        } else {
            // Every later start inside this word is preceded by a word char.
            pos = input[m.start()..]
                .char_indices()
                .find(|(_, c)| !is_word_char(*c))
                .map_or(input.len(), |(offset, _)| m.start() + offset);
        }
        if pos >= input.len() {
            break;
        }
    }

    output.push_str(&input[last..]);
    output
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}
