//! Criterion benchmarks for the spamsift classifier.
//!
//! Covers the per-request path:
//! - Text normalization and statistical feature extraction
//! - Feature row construction
//! - End-to-end classification with a trained ensemble

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use spamsift::analysis::{StatisticalFeatureExtractor, TextNormalizer};
use spamsift::config::TrainingConfig;
use spamsift::feature::build_feature_row;
use spamsift::ml::Label;
use spamsift::pipeline::{LabeledCorpus, TrainingPipeline};
use spamsift::service::PredictionService;
use std::hint::black_box;

const SPAM_WORDS: [&str; 12] = [
    "WIN", "free", "cash", "prize", "claim", "now", "urgent", "txt", "reply", "offer", "winner",
    "bonus",
];

const HAM_WORDS: [&str; 12] = [
    "see", "dinner", "tomorrow", "lunch", "home", "meeting", "office", "later", "thanks",
    "morning", "family", "tonight",
];

/// Generate a labeled corpus of pseudo-random messages.
fn generate_corpus(count: usize) -> LabeledCorpus {
    let mut records = Vec::with_capacity(count);
    for i in 0..count {
        let spam = i % 4 == 0;
        let words = if spam { &SPAM_WORDS } else { &HAM_WORDS };
        let length = 6 + (i % 9);
        let mut message: Vec<String> = (0..length)
            .map(|j| words[(i * 7 + j * 13) % words.len()].to_string())
            .collect();
        if spam {
            message.push(format!("call 0906{:07}!!", i));
        } else {
            message.push(format!("at {}", i % 12));
        }
        let label = if spam { Label::Spam } else { Label::NotSpam };
        records.push((label, message.join(" ")));
    }
    // Generated messages are unique because each carries its index.
    LabeledCorpus::from_records(records).expect("generated corpus is valid")
}

fn bench_text_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("text_analysis");
    let normalizer = TextNormalizer::new();
    let extractor = StatisticalFeatureExtractor::new();
    let message = "WIN FREE CASH NOW!!! call 9876543210 or email win@prize.com www.win.com";

    group.bench_function("normalize", |b| {
        b.iter(|| black_box(normalizer.normalize(black_box(message))))
    });
    group.bench_function("extract_statistics", |b| {
        b.iter(|| black_box(extractor.extract(black_box(message))))
    });
    group.finish();
}

fn bench_classification(c: &mut Criterion) {
    let mut group = c.benchmark_group("classification");
    group.sample_size(30);

    let corpus = generate_corpus(400);
    let config = TrainingConfig {
        cv_folds: 2,
        ..Default::default()
    };
    let outcome = TrainingPipeline::new(config)
        .and_then(|pipeline| pipeline.run(&corpus))
        .expect("training succeeds on generated corpus");

    group.bench_function("build_feature_row", |b| {
        b.iter(|| {
            black_box(
                build_feature_row(
                    &outcome.vectorizer,
                    &outcome.bundle.scaler,
                    black_box("Claim your FREE prize now, txt 87121"),
                )
                .unwrap(),
            )
        })
    });

    let service = PredictionService::from_artifacts(outcome.vectorizer, outcome.bundle)
        .expect("trained artifacts are consistent");

    group.bench_function("classify_single", |b| {
        b.iter(|| black_box(service.classify(black_box("See you at 5 for dinner")).unwrap()))
    });

    let batch: Vec<&str> = corpus.texts().iter().take(100).map(String::as_str).collect();
    group.throughput(Throughput::Elements(batch.len() as u64));
    group.bench_function("classify_batch", |b| {
        b.iter(|| black_box(service.classify_batch(black_box(&batch))))
    });

    group.finish();
}

criterion_group!(benches, bench_text_analysis, bench_classification);
criterion_main!(benches);
