//! Command implementations for the spamsift CLI.

use std::time::Instant;

use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::{ArtifactPaths, TrainingConfig};
use crate::error::Result;
use crate::pipeline::TrainingPipeline;
use crate::pipeline::artifacts::{FORMAT_VERSION, load_artifacts};
use crate::service::PredictionService;

/// Execute a CLI command.
pub fn execute_command(args: SpamSiftArgs) -> Result<()> {
    match &args.command {
        Command::Train(train_args) => train(train_args, &args),
        Command::Classify(classify_args) => classify(classify_args, &args),
        Command::Inspect(inspect_args) => inspect(inspect_args, &args),
    }
}

/// Train the ensemble and write both artifacts.
fn train(args: &TrainArgs, cli_args: &SpamSiftArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading training config from {}", path.display());
            TrainingConfig::from_file(path)?
        }
        None => TrainingConfig::default(),
    };
    if args.train_partition_only {
        config.fit_before_split = false;
    }

    let start = Instant::now();
    let pipeline = TrainingPipeline::new(config)?;
    let corpus = pipeline.load_corpus(&args.corpus)?;
    let paths = ArtifactPaths::in_dir(&args.out_dir);
    let outcome = pipeline.run_and_save(&corpus, &paths)?;

    output_result(
        "Training complete",
        &TrainResult {
            vectorizer_path: paths.vectorizer.to_string_lossy().to_string(),
            model_path: paths.model.to_string_lossy().to_string(),
            duration_ms: start.elapsed().as_millis() as u64,
            report: outcome.report,
        },
        cli_args,
    )
}

/// Classify each message. Rejected inputs are reported, not fatal.
fn classify(args: &ClassifyArgs, cli_args: &SpamSiftArgs) -> Result<()> {
    let service = PredictionService::initialize(&ArtifactPaths::in_dir(&args.artifacts))?;

    let start = Instant::now();
    let mut results = Vec::with_capacity(args.messages.len());
    for (message, outcome) in args.messages.iter().zip(service.classify_batch(&args.messages)) {
        let item = match outcome {
            Ok(prediction) => MessageClassification {
                message: message.clone(),
                label: Some(prediction.label),
                confidence: Some(prediction.confidence_string()),
                votes: Some(prediction.votes),
                error: None,
            },
            Err(e) if e.is_recoverable() => MessageClassification {
                message: message.clone(),
                label: None,
                confidence: None,
                votes: None,
                error: Some(e.to_string()),
            },
            Err(e) => return Err(e),
        };
        results.push(item);
    }

    output_result(
        &format!("Classified {} messages", results.len()),
        &ClassifyResults {
            results,
            duration_ms: start.elapsed().as_millis() as u64,
        },
        cli_args,
    )
}

/// Show what a pair of artifacts contains.
fn inspect(args: &InspectArgs, cli_args: &SpamSiftArgs) -> Result<()> {
    let paths = ArtifactPaths::in_dir(&args.artifacts);
    let (vectorizer, bundle) = load_artifacts(&paths)?;
    let service = PredictionService::from_artifacts(vectorizer, bundle)?;

    output_result(
        "Artifact metadata",
        &InspectResult {
            vectorizer_path: paths.vectorizer.to_string_lossy().to_string(),
            model_path: paths.model.to_string_lossy().to_string(),
            format_version: FORMAT_VERSION,
            vocabulary_size: service.vocabulary_size(),
            feature_count: service.feature_count(),
            info: service.info().clone(),
        },
        cli_args,
    )
}
