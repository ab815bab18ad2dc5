//! Command line argument parsing for the spamsift CLI using clap.

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// spamsift - spam/ham message classifier
#[derive(Parser, Debug, Clone)]
#[command(name = "spamsift")]
#[command(about = "Train and run a three-model spam classification ensemble")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct SpamSiftArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl SpamSiftArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Train the ensemble on a labeled CSV corpus and write the artifacts
    Train(TrainArgs),

    /// Classify one or more messages
    Classify(ClassifyArgs),

    /// Show metadata of trained artifacts
    Inspect(InspectArgs),
}

/// Arguments for training
#[derive(Parser, Debug, Clone)]
pub struct TrainArgs {
    /// CSV corpus with a ham/spam label column and a text column
    #[arg(short, long, value_name = "CORPUS_FILE")]
    pub corpus: PathBuf,

    /// Training configuration file (JSON)
    #[arg(long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Directory the artifacts are written to
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub out_dir: PathBuf,

    /// Fit the vectorizer and scaler on the training partition only
    #[arg(long)]
    pub train_partition_only: bool,
}

/// Arguments for classification
#[derive(Parser, Debug, Clone)]
pub struct ClassifyArgs {
    /// Directory holding vectorizer.bin and model.bin
    #[arg(short, long, value_name = "DIR", default_value = ".", env = "SPAMSIFT_ARTIFACTS")]
    pub artifacts: PathBuf,

    /// Messages to classify
    #[arg(value_name = "MESSAGE", required = true)]
    pub messages: Vec<String>,
}

/// Arguments for artifact inspection
#[derive(Parser, Debug, Clone)]
pub struct InspectArgs {
    /// Directory holding vectorizer.bin and model.bin
    #[arg(short, long, value_name = "DIR", default_value = ".", env = "SPAMSIFT_ARTIFACTS")]
    pub artifacts: PathBuf,
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
