// =============================================================================
// Signal Engine — Classify, age, aggregate
// =============================================================================
//
// Pipeline per call (one instrument / window):
//   1. Classify each post (parallel when enabled; order is irrelevant to the
//      aggregate but preserved anyway)
//   2. age_hours = reference_time - post.timestamp, clamped to >= 0
//   3. decayed = value * exp(-lambda * age_hours * regime_multiplier)
//   4. Aggregate decayed values, weighted by post weight
//
// Only configuration errors surface (bad regime multiplier, bad half-life).
// Classifier failures degrade per post; a malformed weight or pre-scored
// value is neutralised and logged so the rest of the batch still counts.
// =============================================================================

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::classifier::SentimentClassifier;
use crate::error::{SignalError, SignalResult};
use crate::regime::MarketRegime;
use crate::runtime_config::EngineConfig;
use crate::signals::{Aggregator, DecayModel, DecayParameters};
use crate::types::{AggregateSentiment, RawPost, ScoreSource, ScoredPost};

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Sentiment signal engine. Immutable after construction and safe to share
/// across threads.
#[derive(Debug)]
pub struct SignalEngine {
    classifier: SentimentClassifier,
    decay: DecayModel,
    aggregator: Aggregator,
    parallel: bool,
}

impl SignalEngine {
    /// Build an engine around an existing classifier.
    ///
    /// Fails with `InvalidParameter` if the half-life is not positive.
    pub fn new(classifier: SentimentClassifier, decay_params: DecayParameters) -> SignalResult<Self> {
        Ok(Self {
            classifier,
            decay: DecayModel::from_params(decay_params)?,
            aggregator: Aggregator::default(),
            parallel: true,
        })
    }

    /// Build an engine from configuration, loading the model eagerly.
    ///
    /// A model that fails to load leaves a heuristic-only engine; only a bad
    /// half-life is an error.
    pub fn from_config(config: &EngineConfig) -> SignalResult<Self> {
        let decay = DecayModel::from_params(config.decay_parameters())?;
        let classifier = SentimentClassifier::from_config(config);
        Ok(Self {
            classifier,
            decay,
            aggregator: Aggregator::new(config.bias_threshold),
            parallel: config.parallel_classification,
        })
    }

    pub fn with_aggregator(mut self, aggregator: Aggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn classifier(&self) -> &SentimentClassifier {
        &self.classifier
    }

    pub fn decay_model(&self) -> &DecayModel {
        &self.decay
    }

    /// [`compute_signal`](Self::compute_signal) with the engine's own decay
    /// parameters.
    pub fn compute(
        &self,
        posts: &[RawPost],
        regime_multiplier: f64,
        reference_time: DateTime<Utc>,
    ) -> SignalResult<AggregateSentiment> {
        let params = self.decay.params().clone();
        self.compute_signal(posts, regime_multiplier, &params, reference_time)
    }

    /// [`compute`](Self::compute) with the multiplier for a market regime.
    pub fn compute_for_regime(
        &self,
        posts: &[RawPost],
        regime: MarketRegime,
        reference_time: DateTime<Utc>,
    ) -> SignalResult<AggregateSentiment> {
        self.compute(posts, regime.decay_multiplier(), reference_time)
    }

    /// Classify, age and aggregate one batch of posts.
    pub fn compute_signal(
        &self,
        posts: &[RawPost],
        regime_multiplier: f64,
        decay_params: &DecayParameters,
        reference_time: DateTime<Utc>,
    ) -> SignalResult<AggregateSentiment> {
        validate_regime_multiplier(regime_multiplier)?;
        let decay = self.resolve_decay(decay_params)?;

        let scores = if self.parallel {
            let texts: Vec<&str> = posts.iter().map(|p| p.text.as_str()).collect();
            self.classifier.classify_batch(&texts)
        } else {
            posts.iter().map(|p| self.classifier.classify(&p.text)).collect()
        };

        let fallbacks = scores
            .iter()
            .filter(|s| s.source == ScoreSource::Heuristic)
            .count();

        let mut values = Vec::with_capacity(posts.len());
        let mut weights = Vec::with_capacity(posts.len());
        for (post, score) in posts.iter().zip(&scores) {
            let age = age_hours(reference_time, post.timestamp);
            values.push(decay.apply_decay(score.value, age, regime_multiplier));
            weights.push(sanitize_weight(post.weight));
        }

        let result = self.aggregator.aggregate(&values, Some(weights.as_slice()))?;

        debug!(
            posts = posts.len(),
            backend = self.classifier.backend_name(),
            heuristic_scores = fallbacks,
            source = %decay.source(),
            half_life_hours = decay.half_life_hours(),
            regime_multiplier,
            mean = format!("{:.4}", result.mean),
            std = format!("{:.4}", result.std),
            bias = %result.bias,
            "sentiment signal computed"
        );

        Ok(result)
    }

    /// Age and aggregate posts that were scored upstream.
    ///
    /// Non-finite values count as neutral; values outside [-1, 1] are clamped.
    pub fn compute_signal_from_scores(
        &self,
        items: &[ScoredPost],
        regime_multiplier: f64,
        decay_params: &DecayParameters,
        reference_time: DateTime<Utc>,
    ) -> SignalResult<AggregateSentiment> {
        validate_regime_multiplier(regime_multiplier)?;
        let decay = self.resolve_decay(decay_params)?;

        let mut values = Vec::with_capacity(items.len());
        let mut weights = Vec::with_capacity(items.len());
        for item in items {
            let value = if item.value.is_finite() {
                item.value.clamp(-1.0, 1.0)
            } else {
                warn!(value = item.value, "non-finite pre-scored value treated as neutral");
                0.0
            };
            let age = age_hours(reference_time, item.timestamp);
            values.push(decay.apply_decay(value, age, regime_multiplier));
            weights.push(sanitize_weight(item.weight));
        }

        let result = self.aggregator.aggregate(&values, Some(weights.as_slice()))?;
        debug!(
            items = items.len(),
            regime_multiplier,
            mean = format!("{:.4}", result.mean),
            "pre-scored sentiment signal computed"
        );
        Ok(result)
    }

    fn resolve_decay(&self, params: &DecayParameters) -> SignalResult<Cow<'_, DecayModel>> {
        if params == self.decay.params() {
            Ok(Cow::Borrowed(&self.decay))
        } else {
            Ok(Cow::Owned(DecayModel::from_params(params.clone())?))
        }
    }
}

fn validate_regime_multiplier(regime_multiplier: f64) -> SignalResult<()> {
    if !regime_multiplier.is_finite() || regime_multiplier < 0.0 {
        return Err(SignalError::invalid(
            "regime_multiplier",
            format!("must be a finite number >= 0, got {regime_multiplier}"),
        ));
    }
    Ok(())
}

/// Hours between `timestamp` and `reference_time`; future posts count as 0.
fn age_hours(reference_time: DateTime<Utc>, timestamp: DateTime<Utc>) -> f64 {
    let millis = (reference_time - timestamp).num_milliseconds() as f64;
    (millis / MILLIS_PER_HOUR).max(0.0)
}

fn sanitize_weight(weight: f64) -> f64 {
    if weight.is_finite() && weight >= 0.0 {
        weight
    } else {
        warn!(weight, "invalid post weight treated as 0");
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ClassProbabilities, SentimentModel};
    use crate::types::SentimentBias;
    use chrono::{Duration, TimeZone};

    struct Constant(f64);

    impl SentimentModel for Constant {
        fn name(&self) -> &str {
            "constant"
        }
        fn predict(&self, _text: &str) -> SignalResult<ClassProbabilities> {
            Ok(ClassProbabilities::new(self.0, (1.0 - self.0) / 2.0, (1.0 - self.0) / 2.0))
        }
    }

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn engine(value: f64) -> SignalEngine {
        SignalEngine::new(
            SentimentClassifier::from_model(Box::new(Constant(value))),
            DecayParameters::new(6.0, "reddit"),
        )
        .unwrap()
    }

    #[test]
    fn two_posts_half_life_apart() {
        let now = reference();
        let posts = vec![
            RawPost::new("fresh", now),
            RawPost::new("six hours old", now - Duration::hours(6)),
        ];
        let agg = engine(0.8).compute(&posts, 1.0, now).unwrap();
        assert_eq!(agg.count, 2);
        assert!((agg.mean - 0.6).abs() < 1e-9);
        assert!((agg.median - 0.6).abs() < 1e-9);
        assert!((agg.positive_ratio - 1.0).abs() < 1e-12);
        assert_eq!(agg.bias, SentimentBias::Bullish);
    }

    #[test]
    fn empty_batch() {
        let agg = engine(0.8).compute(&[], 1.0, reference()).unwrap();
        assert_eq!(agg, AggregateSentiment::default());
    }

    #[test]
    fn future_posts_are_not_amplified() {
        let now = reference();
        let posts = vec![RawPost::new("from the future", now + Duration::hours(3))];
        let agg = engine(0.8).compute(&posts, 1.0, now).unwrap();
        assert!((agg.mean - 0.8).abs() < 1e-9);
    }

    #[test]
    fn zero_regime_freezes_signal() {
        let now = reference();
        let posts = vec![RawPost::new("old news", now - Duration::hours(48))];
        let agg = engine(0.8).compute(&posts, 0.0, now).unwrap();
        assert!((agg.mean - 0.8).abs() < 1e-9);
    }

    #[test]
    fn invalid_regime_is_rejected() {
        let e = engine(0.8);
        assert!(e.compute(&[], -1.0, reference()).is_err());
        assert!(e.compute(&[], f64::NAN, reference()).is_err());
        assert!(e.compute(&[], f64::INFINITY, reference()).is_err());
    }

    #[test]
    fn invalid_half_life_is_rejected_per_call() {
        let e = engine(0.8);
        let bad = DecayParameters::new(0.0, "reddit");
        let err = e.compute_signal(&[], 1.0, &bad, reference()).unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn per_call_decay_params_override_engine() {
        let now = reference();
        let posts = vec![RawPost::new("three hours", now - Duration::hours(3))];
        let twitter = DecayParameters::for_source("twitter");
        let agg = engine(0.8).compute_signal(&posts, 1.0, &twitter, now).unwrap();
        assert!((agg.mean - 0.4).abs() < 1e-9);
    }

    #[test]
    fn weights_shift_the_mean() {
        let now = reference();
        let e = SignalEngine::new(SentimentClassifier::heuristic(), DecayParameters::new(6.0, "reddit"))
            .unwrap();
        let posts = vec![
            RawPost::new("bullish buy moon", now).with_weight(3.0),
            RawPost::new("nothing to see", now).with_weight(1.0),
        ];
        let agg = e.compute(&posts, 1.0, now).unwrap();
        assert!((agg.mean - 0.225).abs() < 1e-9);
        assert!((agg.median - 0.15).abs() < 1e-9);
    }

    #[test]
    fn malformed_weight_does_not_fail_batch() {
        let now = reference();
        let posts = vec![
            RawPost::new("a", now).with_weight(f64::NAN),
            RawPost::new("b", now).with_weight(-4.0),
            RawPost::new("c", now).with_weight(2.0),
        ];
        let agg = engine(0.8).compute(&posts, 1.0, now).unwrap();
        assert_eq!(agg.count, 3);
        assert!((agg.mean - 0.8).abs() < 1e-9);
    }

    #[test]
    fn sequential_matches_parallel() {
        let now = reference();
        let posts: Vec<RawPost> = (0..20)
            .map(|i| {
                let text = if i % 3 == 0 { "sell crash dump" } else { "buy calls" };
                RawPost::new(text, now - Duration::minutes(i * 30))
            })
            .collect();
        let params = DecayParameters::for_source("reddit");
        let par = SignalEngine::new(SentimentClassifier::heuristic(), params.clone()).unwrap();
        let seq = SignalEngine::new(SentimentClassifier::heuristic(), params)
            .unwrap()
            .with_parallel(false);
        let a = par.compute(&posts, 1.5, now).unwrap();
        let b = seq.compute(&posts, 1.5, now).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn regime_label_uses_multiplier() {
        let now = reference();
        let posts = vec![RawPost::new("x", now - Duration::hours(3))];
        let e = engine(0.8);
        // VOLATILE doubles time: 3h ages like 6h.
        let agg = e.compute_for_regime(&posts, MarketRegime::Volatile, now).unwrap();
        assert!((agg.mean - 0.4).abs() < 1e-9);
    }

    #[test]
    fn pre_scored_posts_skip_classification() {
        let now = reference();
        let items = vec![
            ScoredPost {
                value: 0.8,
                timestamp: now,
                weight: 1.0,
            },
            ScoredPost {
                value: 0.8,
                timestamp: now - Duration::hours(6),
                weight: 1.0,
            },
            ScoredPost {
                value: f64::NAN,
                timestamp: now,
                weight: 0.0,
            },
        ];
        let params = DecayParameters::new(6.0, "reddit");
        let agg = engine(0.1)
            .compute_signal_from_scores(&items, 1.0, &params, now)
            .unwrap();
        assert_eq!(agg.count, 3);
        assert!((agg.mean - 0.6).abs() < 1e-9);
    }

    #[test]
    fn age_hours_clamps_negative() {
        let now = reference();
        assert_eq!(age_hours(now, now + Duration::hours(1)), 0.0);
        assert!((age_hours(now, now - Duration::minutes(90)) - 1.5).abs() < 1e-12);
    }
}
