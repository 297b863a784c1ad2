// =============================================================================
// Sentiment Aggregator — Weighted fusion of aged per-post scores
// =============================================================================
//
// Statistics over one batch:
//   mean            weighted when weights are supplied (weights normalised to 1)
//   median, std     always unweighted, over the raw scores
//   positive_ratio  fraction of scores > 0
//   negative_ratio  fraction of scores < 0   (exact zeros count in neither)
//
// An empty batch yields the zero aggregate, never an error.

use tracing::debug;

use crate::error::{SignalError, SignalResult};
use crate::types::{AggregateSentiment, SentimentBias};

/// Default dead-band around zero inside which the mean reads as neutral.
pub const DEFAULT_BIAS_THRESHOLD: f64 = 0.05;

/// Stateless aggregator; the only setting is the bias dead-band.
#[derive(Debug, Clone)]
pub struct Aggregator {
    /// Minimum absolute mean to call the batch bullish or bearish.
    pub bias_threshold: f64,
}

impl Aggregator {
    pub fn new(bias_threshold: f64) -> Self {
        Self { bias_threshold }
    }

    /// Aggregate `scores`, optionally weighting the mean by `weights`.
    ///
    /// Fails with `DimensionMismatch` when the lengths differ and with
    /// `InvalidParameter` when a weight is negative or not finite.
    pub fn aggregate(
        &self,
        scores: &[f64],
        weights: Option<&[f64]>,
    ) -> SignalResult<AggregateSentiment> {
        if let Some(w) = weights {
            if w.len() != scores.len() {
                return Err(SignalError::DimensionMismatch {
                    scores: scores.len(),
                    weights: w.len(),
                });
            }
            if let Some(bad) = w.iter().find(|x| !x.is_finite() || **x < 0.0) {
                return Err(SignalError::invalid(
                    "weights",
                    format!("weights must be finite and >= 0, got {bad}"),
                ));
            }
        }

        if scores.is_empty() {
            return Ok(AggregateSentiment::default());
        }

        let n = scores.len() as f64;
        let plain_mean = scores.iter().sum::<f64>() / n;

        let mean = match weights {
            Some(w) => {
                // Scale by the largest weight first so the total stays finite.
                let max_weight = w.iter().copied().fold(0.0, f64::max);
                if max_weight > 0.0 {
                    let total: f64 = w.iter().map(|wi| wi / max_weight).sum();
                    scores
                        .iter()
                        .zip(w)
                        .map(|(s, wi)| s * (wi / max_weight / total))
                        .sum::<f64>()
                } else {
                    debug!(count = scores.len(), "all weights zero, using unweighted mean");
                    plain_mean
                }
            }
            None => plain_mean,
        };

        let variance = scores.iter().map(|x| (x - plain_mean).powi(2)).sum::<f64>() / n;
        let std = variance.sqrt();

        let positive = scores.iter().filter(|&&x| x > 0.0).count() as f64;
        let negative = scores.iter().filter(|&&x| x < 0.0).count() as f64;

        let bias = if mean > self.bias_threshold {
            SentimentBias::Bullish
        } else if mean < -self.bias_threshold {
            SentimentBias::Bearish
        } else {
            SentimentBias::Neutral
        };

        Ok(AggregateSentiment {
            mean,
            median: median(scores),
            std,
            count: scores.len(),
            positive_ratio: positive / n,
            negative_ratio: negative / n,
            bias,
        })
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(DEFAULT_BIAS_THRESHOLD)
    }
}

/// Median of a non-empty slice; mean of the two middle values for even counts.
fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_batch_is_zero() {
        let agg = Aggregator::default().aggregate(&[], None).unwrap();
        assert_eq!(agg, AggregateSentiment::default());

        // Empty weights alongside empty scores are fine too.
        let agg = Aggregator::default()
            .aggregate(&[], Some(&[][..]))
            .unwrap();
        assert_eq!(agg.count, 0);
    }

    #[test]
    fn symmetric_scores() {
        let agg = Aggregator::default().aggregate(&[1.0, -1.0], None).unwrap();
        assert!(agg.mean.abs() < 1e-12);
        assert!((agg.positive_ratio - 0.5).abs() < 1e-12);
        assert!((agg.negative_ratio - 0.5).abs() < 1e-12);
        assert!((agg.std - 1.0).abs() < 1e-12);
        assert_eq!(agg.count, 2);
        assert_eq!(agg.bias, SentimentBias::Neutral);
    }

    #[test]
    fn weighted_mean() {
        let agg = Aggregator::default()
            .aggregate(&[1.0, 0.0], Some(&[3.0, 1.0][..]))
            .unwrap();
        assert!((agg.mean - 0.75).abs() < 1e-12);
        // Median and std ignore the weights.
        assert!((agg.median - 0.5).abs() < 1e-12);
        assert!((agg.std - 0.5).abs() < 1e-12);
        assert_eq!(agg.bias, SentimentBias::Bullish);
    }

    #[test]
    fn length_mismatch_fails() {
        let err = Aggregator::default()
            .aggregate(&[0.1, 0.2], Some(&[1.0][..]))
            .unwrap_err();
        assert!(matches!(
            err,
            SignalError::DimensionMismatch {
                scores: 2,
                weights: 1
            }
        ));
    }

    #[test]
    fn negative_weight_fails() {
        let err = Aggregator::default()
            .aggregate(&[0.1, 0.2], Some(&[1.0, -1.0][..]))
            .unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn zero_weights_fall_back_to_plain_mean() {
        let agg = Aggregator::default()
            .aggregate(&[0.2, 0.4], Some(&[0.0, 0.0][..]))
            .unwrap();
        assert!((agg.mean - 0.3).abs() < 1e-12);
    }

    #[test]
    fn huge_finite_weights_do_not_overflow() {
        let agg = Aggregator::default()
            .aggregate(&[0.5, 0.5], Some(&[f64::MAX, f64::MAX][..]))
            .unwrap();
        assert!((agg.mean - 0.5).abs() < 1e-12);

        let agg = Aggregator::default()
            .aggregate(&[1.0, 0.0], Some(&[f64::MAX, f64::MAX / 3.0][..]))
            .unwrap();
        assert!((agg.mean - 0.75).abs() < 1e-12);
    }

    #[test]
    fn zeros_count_in_neither_ratio() {
        let agg = Aggregator::default()
            .aggregate(&[0.0, 0.0, 0.5, -0.25], None)
            .unwrap();
        assert!((agg.positive_ratio - 0.25).abs() < 1e-12);
        assert!((agg.negative_ratio - 0.25).abs() < 1e-12);
        assert!(agg.positive_ratio + agg.negative_ratio <= 1.0);
    }

    #[test]
    fn median_odd_and_even() {
        assert!((median(&[3.0, -1.0, 2.0]) - 2.0).abs() < 1e-12);
        assert!((median(&[4.0, 1.0, 3.0, 2.0]) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn bearish_bias_below_threshold() {
        let agg = Aggregator::new(0.1).aggregate(&[-0.3, -0.1], None).unwrap();
        assert_eq!(agg.bias, SentimentBias::Bearish);
        let agg = Aggregator::new(0.5).aggregate(&[-0.3, -0.1], None).unwrap();
        assert_eq!(agg.bias, SentimentBias::Neutral);
    }
}
