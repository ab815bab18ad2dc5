use std::path::Path;

use spamsift::config::{ArtifactPaths, TrainingConfig};
use spamsift::error::{Result, SpamSiftError};
use spamsift::feature::{FeatureScaler, TermVectorizer};
use spamsift::ml::Label;
use spamsift::ml::naive_bayes::MultinomialNaiveBayes;
use spamsift::pipeline::{TrainingOutcome, TrainingPipeline, save_artifacts};
use spamsift::service::PredictionService;
use tempfile::TempDir;

const SPAM_OPENERS: [&str; 8] = [
    "WIN a FREE prize NOW!!!",
    "URGENT! Claim your CASH reward",
    "Congratulations, you have WON a free holiday!",
    "FREE entry into our weekly cash draw!",
    "You are a WINNER! Claim your prize",
    "Exclusive offer: win free tickets!!",
    "Your mobile has been selected for a CASH prize!",
    "Claim FREE ringtones today!!!",
];

const SPAM_CLOSERS: [&str; 5] = [
    "call 09061701461",
    "text WIN to 87121",
    "visit www.win-prize.com",
    "reply CLAIM to 80082",
    "go to http://claim.example.com",
];

const HAM_MESSAGES: [&str; 12] = [
    "See you at 5 for dinner",
    "Are we still meeting for lunch tomorrow",
    "I will be home late tonight, save me some food",
    "Can you pick up milk on the way home",
    "Thanks for the lovely dinner yesterday",
    "Meeting moved to tomorrow morning at 9",
    "Running late, be there by 7",
    "Did you finish the report for the meeting",
    "Happy birthday, have a great day with the family",
    "Let me know when you get home safely",
    "Lunch at 1 sounds good, see you there",
    "The office opens at 8 tomorrow morning",
];

const HAM_SUFFIXES: [&str; 5] = ["", " ok", " thanks", " love you", " cheers"];

fn write_corpus(path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["v1", "v2"])?;
    for (i, opener) in SPAM_OPENERS.iter().enumerate() {
        for (j, closer) in SPAM_CLOSERS.iter().enumerate() {
            if (i + j) % 2 == 0 {
                writer.write_record(["spam", format!("{opener} {closer}").as_str()])?;
            }
        }
    }
    for message in HAM_MESSAGES {
        for suffix in HAM_SUFFIXES {
            writer.write_record(["ham", format!("{message}{suffix}").as_str()])?;
        }
    }
    // Exact duplicates are dropped at load time.
    writer.write_record(["ham", HAM_MESSAGES[0]])?;
    writer.write_record(["spam", format!("{} {}", SPAM_OPENERS[0], SPAM_CLOSERS[0]).as_str()])?;
    writer.flush()?;
    Ok(())
}

fn train(dir: &Path) -> Result<(TrainingOutcome, ArtifactPaths)> {
    let corpus_path = dir.join("corpus.csv");
    write_corpus(&corpus_path)?;

    let pipeline = TrainingPipeline::new(TrainingConfig::default())?;
    let corpus = pipeline.load_corpus(&corpus_path)?;
    let paths = ArtifactPaths::in_dir(dir.join("artifacts"));
    let outcome = pipeline.run_and_save(&corpus, &paths)?;
    Ok((outcome, paths))
}

#[test]
fn test_training_report_and_artifacts() -> Result<()> {
    let dir = TempDir::new()?;
    let (outcome, paths) = train(dir.path())?;
    let report = &outcome.report;

    // 20 spam + 60 ham, two duplicates dropped.
    assert_eq!(report.n_samples, 80);
    assert_eq!(report.n_spam, 20);
    assert_eq!(report.n_ham, 60);
    assert_eq!(report.dropped_duplicates, 2);
    assert_eq!(report.n_test, 16);
    assert_eq!(report.cv_scores.len(), 5);
    assert_eq!(report.confusion.total(), 16);
    assert!(report.accuracies.ensemble > 0.8, "ensemble accuracy {}", report.accuracies.ensemble);
    assert!(["nb", "svm", "lr", "ensemble"].contains(&report.best_model.as_str()));

    assert!(paths.vectorizer.exists());
    assert!(paths.model.exists());
    Ok(())
}

#[test]
fn test_round_trip_matches_in_memory_predictions() -> Result<()> {
    let dir = TempDir::new()?;
    let (outcome, paths) = train(dir.path())?;

    let in_memory = PredictionService::from_artifacts(outcome.vectorizer, outcome.bundle)?;
    let loaded = PredictionService::initialize(&paths)?;

    for message in [
        "WIN FREE CASH NOW!!! call 9876543210 www.win.com",
        "See you at 5",
        "completely unrelated words here",
        "Claim your prize, text 87121",
    ] {
        let a = in_memory.classify(message)?;
        let b = loaded.classify(message)?;
        assert_eq!(a.label, b.label, "{message}");
        assert_eq!(a.confidence_percent, b.confidence_percent, "{message}");
        assert_eq!(a.votes, b.votes, "{message}");
        assert!((0.0..=100.0).contains(&b.confidence_percent));
    }
    Ok(())
}

#[test]
fn test_typical_messages() -> Result<()> {
    let dir = TempDir::new()?;
    let (_, paths) = train(dir.path())?;
    let service = PredictionService::initialize(&paths)?;

    let ham = service.classify("See you at 5")?;
    assert_eq!(ham.label, Label::NotSpam);
    assert!(ham.votes.spam_votes() <= 1);

    let spam = service.classify("WIN FREE CASH NOW!!! call 9876543210 www.win.com")?;
    assert_eq!(spam.label, Label::Spam);
    assert!(spam.confidence_string().ends_with('%'));
    Ok(())
}

#[test]
fn test_empty_input_is_recoverable() -> Result<()> {
    let dir = TempDir::new()?;
    let (_, paths) = train(dir.path())?;
    let service = PredictionService::initialize(&paths)?;

    for blank in ["", "   ", "\n\t "] {
        let err = service.classify(blank).unwrap_err();
        assert!(matches!(err, SpamSiftError::EmptyInput));
        assert!(err.is_recoverable());
    }
    // The service keeps working afterwards.
    assert!(service.classify("See you at 5").is_ok());
    Ok(())
}

#[test]
fn test_mismatched_bundle_refuses_to_load() -> Result<()> {
    let dir = TempDir::new()?;
    let (outcome, paths) = train(dir.path())?;

    let mut bundle = outcome.bundle.clone();
    bundle.tfidf_feature_count += 1;
    save_artifacts(&paths, &outcome.vectorizer, &bundle)?;

    let err = PredictionService::initialize(&paths).unwrap_err();
    assert!(matches!(err, SpamSiftError::FeatureDimension { .. }), "{err}");
    assert!(!err.is_recoverable());
    Ok(())
}

#[test]
fn test_scaler_width_mismatch_refuses_to_load() -> Result<()> {
    let dir = TempDir::new()?;
    let (outcome, paths) = train(dir.path())?;

    let mut bundle = outcome.bundle.clone();
    bundle.scaler = FeatureScaler::fit(&[[0.0; 5], [1.0; 5]])?;
    save_artifacts(&paths, &outcome.vectorizer, &bundle)?;

    let err = PredictionService::initialize(&paths).unwrap_err();
    assert!(
        matches!(err, SpamSiftError::FeatureDimension { expected: 6, actual: 5, .. }),
        "{err}"
    );
    Ok(())
}

#[test]
fn test_truncated_naive_bayes_table_refuses_to_load() -> Result<()> {
    let dir = TempDir::new()?;
    let (outcome, paths) = train(dir.path())?;

    let mut value = serde_json::to_value(&outcome.bundle.naive_bayes)?;
    value["feature_log_prob"][1] = serde_json::json!([]);
    let mut bundle = outcome.bundle.clone();
    bundle.naive_bayes = serde_json::from_value::<MultinomialNaiveBayes>(value)?;
    save_artifacts(&paths, &outcome.vectorizer, &bundle)?;

    let err = PredictionService::initialize(&paths).unwrap_err();
    assert!(matches!(err, SpamSiftError::FeatureDimension { .. }), "{err}");
    assert!(!err.is_recoverable());
    Ok(())
}

#[test]
fn test_failed_save_keeps_previous_artifacts() -> Result<()> {
    let dir = TempDir::new()?;
    let (outcome, paths) = train(dir.path())?;
    let vectorizer_before = std::fs::read(&paths.vectorizer)?;
    let model_before = std::fs::read(&paths.model)?;

    let mut other = TermVectorizer::default();
    other.fit(&["brand new words", "brand new terms", "other words here", "other terms here"])?;
    // A directory in the way makes the bundle write fail.
    std::fs::create_dir(dir.path().join("artifacts").join("model.bin.tmp"))?;
    assert!(save_artifacts(&paths, &other, &outcome.bundle).is_err());

    assert_eq!(std::fs::read(&paths.vectorizer)?, vectorizer_before);
    assert_eq!(std::fs::read(&paths.model)?, model_before);
    assert!(!dir.path().join("artifacts").join("vectorizer.bin.tmp").exists());
    assert!(PredictionService::initialize(&paths).is_ok());
    Ok(())
}

#[test]
fn test_swapped_artifacts_refuse_to_load() -> Result<()> {
    let dir = TempDir::new()?;
    let (_, paths) = train(dir.path())?;

    let swapped = ArtifactPaths {
        vectorizer: paths.model.clone(),
        model: paths.vectorizer.clone(),
    };
    let err = PredictionService::initialize(&swapped).unwrap_err();
    assert!(matches!(err, SpamSiftError::ArtifactLoad(_)), "{err}");
    Ok(())
}

#[test]
fn test_concurrent_classification() -> Result<()> {
    let dir = TempDir::new()?;
    let (_, paths) = train(dir.path())?;
    let service = PredictionService::initialize(&paths)?;
    let expected = service.classify("Claim your FREE prize now!!!")?;

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..25 {
                    let result = service.classify("Claim your FREE prize now!!!").unwrap();
                    assert_eq!(result, expected);
                }
            });
        }
    });

    let batch = service.classify_batch(&["See you at 5", "", "Claim your FREE prize now!!!"]);
    assert!(batch[0].is_ok());
    assert!(matches!(batch[1], Err(SpamSiftError::EmptyInput)));
    assert_eq!(batch[2].as_ref().unwrap(), &expected);
    Ok(())
}

#[test]
fn test_corpus_error_writes_nothing() -> Result<()> {
    let dir = TempDir::new()?;
    let corpus_path = dir.path().join("bad.csv");
    std::fs::write(&corpus_path, "v1,v2\nham,hello\nmaybe,what\n")?;

    let pipeline = TrainingPipeline::default();
    let err = pipeline.load_corpus(&corpus_path).unwrap_err();
    assert!(matches!(err, SpamSiftError::Corpus(_)));

    let paths = ArtifactPaths::in_dir(dir.path());
    assert!(!paths.vectorizer.exists());
    assert!(!paths.model.exists());
    Ok(())
}
