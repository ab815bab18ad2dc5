//! Output formatting for CLI commands.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cli::args::{OutputFormat, SpamSiftArgs};
use crate::error::Result;
use crate::ml::Label;
use crate::ml::ensemble::ModelVotes;
use crate::pipeline::BundleInfo;
use crate::pipeline::TrainingReport;

/// Result structure for a training run.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainResult {
    pub vectorizer_path: String,
    pub model_path: String,
    pub duration_ms: u64,
    pub report: TrainingReport,
}

impl fmt::Display for TrainResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.report)?;
        writeln!(f)?;
        writeln!(f, "Vectorizer: {}", self.vectorizer_path)?;
        writeln!(f, "Model:      {}", self.model_path)?;
        write!(f, "Trained in {} ms", self.duration_ms)
    }
}

/// Classification of one message.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageClassification {
    pub message: String,
    /// Absent when the message was rejected. Serialized as `Spam` or
    /// `NotSpam`, shown to humans as "Spam" or "Not Spam".
    pub label: Option<Label>,
    /// Percentage string such as "97.42%".
    pub confidence: Option<String>,
    pub votes: Option<ModelVotes>,
    pub error: Option<String>,
}

/// Result structure for the classify command.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClassifyResults {
    pub results: Vec<MessageClassification>,
    pub duration_ms: u64,
}

impl fmt::Display for ClassifyResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.results.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            match (&item.label, &item.confidence, &item.error) {
                (Some(label), Some(confidence), _) => {
                    write!(f, "{:<8} {confidence:>8}  {}", label.to_string(), item.message)?
                }
                (_, _, Some(error)) => write!(f, "{:<8} {:>8}  {} ({error})", "-", "-", item.message)?,
                _ => write!(f, "{:<8} {:>8}  {}", "-", "-", item.message)?,
            }
        }
        Ok(())
    }
}

/// Result structure for the inspect command.
#[derive(Debug, Serialize, Deserialize)]
pub struct InspectResult {
    pub vectorizer_path: String,
    pub model_path: String,
    pub format_version: u32,
    pub vocabulary_size: usize,
    pub feature_count: usize,
    pub info: BundleInfo,
}

impl fmt::Display for InspectResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = &self.info.summary;
        writeln!(f, "Vectorizer:        {}", self.vectorizer_path)?;
        writeln!(f, "Model:             {}", self.model_path)?;
        writeln!(f, "Format version:    {}", self.format_version)?;
        writeln!(f, "Trained at:        {}", self.info.trained_at.to_rfc3339())?;
        writeln!(f, "Vocabulary size:   {}", self.vocabulary_size)?;
        writeln!(f, "Term features:     {}", self.info.tfidf_feature_count)?;
        writeln!(f, "Total features:    {}", self.feature_count)?;
        writeln!(
            f,
            "Samples:           {} ({} train / {} test)",
            summary.n_samples, summary.n_train, summary.n_test
        )?;
        for (name, acc) in summary.accuracies.entries() {
            writeln!(f, "Accuracy {name:<9} {acc:.4}")?;
        }
        writeln!(f, "CV mean:           {:.4} +/- {:.4}", summary.cv_mean, summary.cv_std)?;
        write!(f, "Best model:        {}", self.info.best_model)
    }
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize + fmt::Display>(
    message: &str,
    result: &T,
    args: &SpamSiftArgs,
) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in human-readable format.
fn output_human<T: fmt::Display>(message: &str, result: &T, args: &SpamSiftArgs) -> Result<()> {
    if args.verbosity() > 1 {
        println!("{message}");
        println!();
    }
    println!("{result}");
    Ok(())
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &SpamSiftArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_results_display() {
        let results = ClassifyResults {
            results: vec![
                MessageClassification {
                    message: "See you at 5".to_string(),
                    label: Some(Label::NotSpam),
                    confidence: Some("91.20%".to_string()),
                    votes: None,
                    error: None,
                },
                MessageClassification {
                    message: "   ".to_string(),
                    label: None,
                    confidence: None,
                    votes: None,
                    error: Some("empty".to_string()),
                },
            ],
            duration_ms: 1,
        };
        let text = results.to_string();
        assert!(text.contains("Not Spam"));
        assert!(text.contains("91.20%"));
        assert!(text.contains("(empty)"));
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn test_json_label_uses_variant_name() {
        let item = MessageClassification {
            message: "See you at 5".to_string(),
            label: Some(Label::NotSpam),
            confidence: Some("91.20%".to_string()),
            votes: None,
            error: None,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["label"], "NotSpam");

        let rejected = MessageClassification {
            label: None,
            error: Some("empty".to_string()),
            ..item
        };
        assert!(serde_json::to_value(&rejected).unwrap()["label"].is_null());
    }
}
