use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use aurora_sentiment::classifier::ClassProbabilities;
use aurora_sentiment::{
    DecayParameters, EngineConfig, MarketRegime, RawPost, ScoreSource, SentimentBias,
    SentimentClassifier, SentimentModel, SignalEngine, SignalError, SignalResult,
};
use chrono::{DateTime, Duration, TimeZone, Utc};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 14, 30, 0).unwrap()
}

/// Scores "good"/"bad" posts and fails on everything else, counting calls.
struct KeywordModel {
    calls: Arc<AtomicUsize>,
}

impl SentimentModel for KeywordModel {
    fn name(&self) -> &str {
        "keyword-model"
    }

    fn predict(&self, text: &str) -> SignalResult<ClassProbabilities> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if text.contains("good") {
            Ok(ClassProbabilities::new(0.8, 0.1, 0.1))
        } else if text.contains("bad") {
            Ok(ClassProbabilities::new(0.05, 0.9, 0.05))
        } else {
            Err(SignalError::ClassificationError {
                reason: format!("cannot score `{text}`"),
            })
        }
    }
}

#[test]
fn end_to_end_half_life_scenario() {
    let calls = Arc::new(AtomicUsize::new(0));
    let classifier = SentimentClassifier::from_model(Box::new(KeywordModel {
        calls: calls.clone(),
    }));
    let engine = SignalEngine::new(classifier, DecayParameters::new(6.0, "reddit")).unwrap();

    let posts = vec![
        RawPost::new("good earnings", now()),
        RawPost::new("good guidance", now() - Duration::hours(6)),
    ];
    let agg = engine.compute(&posts, 1.0, now()).unwrap();

    assert_eq!(agg.count, 2);
    assert!((agg.mean - 0.6).abs() < 1e-9);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn failing_posts_degrade_individually() {
    let calls = Arc::new(AtomicUsize::new(0));
    let classifier = SentimentClassifier::from_model(Box::new(KeywordModel {
        calls: calls.clone(),
    }));
    let engine = SignalEngine::new(classifier, DecayParameters::for_source("twitter"))
        .unwrap()
        .with_parallel(false);

    let posts = vec![
        RawPost::new("bad quarter", now()),
        // Model fails here; keyword fallback sees two bullish words.
        RawPost::new("buy the breakout", now()),
        RawPost::new("", now()),
    ];
    let agg = engine.compute(&posts, 1.0, now()).unwrap();

    assert_eq!(agg.count, 3);
    // Empty text never reaches the model.
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    let expected_mean = (-0.9 + 0.2 + 0.0) / 3.0;
    assert!((agg.mean - expected_mean).abs() < 1e-9);
    assert!((agg.positive_ratio - 1.0 / 3.0).abs() < 1e-12);
    assert!((agg.negative_ratio - 1.0 / 3.0).abs() < 1e-12);
    assert_eq!(agg.bias, SentimentBias::Bearish);

    let single = engine.classifier().classify("buy the breakout");
    assert_eq!(single.source, ScoreSource::Heuristic);
}

#[test]
fn unavailable_model_gives_heuristic_engine() {
    let mut config = EngineConfig::default();
    config.model_name = "missing/finbert".to_string();
    config.model_root = std::env::temp_dir().display().to_string();
    config.source = "Twitter".to_string();

    let engine = SignalEngine::from_config(&config).unwrap();
    assert!(!engine.classifier().is_model_backed());
    assert!((engine.decay_model().half_life_hours() - 3.0).abs() < f64::EPSILON);

    let posts = vec![RawPost::new("bullish buy moon", now())];
    let agg = engine.compute(&posts, 1.0, now()).unwrap();
    assert!((agg.mean - 0.3).abs() < 1e-9);
}

#[test]
fn bad_half_life_fails_construction() {
    let mut config = EngineConfig::default();
    config.half_life_hours = Some(-1.0);
    let err = SignalEngine::from_config(&config).unwrap_err();
    assert!(matches!(err, SignalError::InvalidParameter { .. }));
}

#[test]
fn volatile_regime_ages_faster_than_dead() {
    let engine = SignalEngine::new(
        SentimentClassifier::heuristic(),
        DecayParameters::for_source("reddit"),
    )
    .unwrap();
    let posts = vec![RawPost::new("moon rally breakout", now() - Duration::hours(4))];

    let volatile = engine
        .compute_for_regime(&posts, MarketRegime::Volatile, now())
        .unwrap();
    let dead = engine
        .compute_for_regime(&posts, MarketRegime::Dead, now())
        .unwrap();
    assert!(volatile.mean < dead.mean);
    assert!(volatile.mean > 0.0);
}

#[test]
fn engine_is_shareable_across_threads() {
    let engine = Arc::new(
        SignalEngine::new(
            SentimentClassifier::heuristic(),
            DecayParameters::for_source("reddit"),
        )
        .unwrap(),
    );

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let engine = engine.clone();
            std::thread::spawn(move || {
                let posts = vec![RawPost::new("sell the news", now() - Duration::hours(i))];
                engine.compute(&posts, 1.0, now()).unwrap()
            })
        })
        .collect();

    for h in handles {
        let agg = h.join().unwrap();
        assert_eq!(agg.count, 1);
        assert!(agg.mean < 0.0);
    }
}
