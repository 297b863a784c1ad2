// =============================================================================
// Model Classifier — Inference-backed sentiment with per-call fallback
// =============================================================================
//
// Wraps any `SentimentModel` backend. A backend returns a 3-way probability
// distribution; the arg-max class becomes the label and its probability the
// confidence. When a call fails (tokenisation, inference, or a malformed
// distribution) that single text is scored by the keyword classifier instead.

use tracing::warn;

use crate::classifier::keyword::KeywordClassifier;
use crate::error::{SignalError, SignalResult};
use crate::types::{ScoreSource, SentimentLabel, SentimentScore};

/// Inference backend for the model classifier.
///
/// Implementations must be safe to call from several threads at once.
pub trait SentimentModel: Send + Sync {
    /// Identifier used in logs.
    fn name(&self) -> &str;

    /// Class probabilities for one non-empty text.
    fn predict(&self, text: &str) -> SignalResult<ClassProbabilities>;
}

// =============================================================================
// ClassProbabilities
// =============================================================================

/// Probability mass per sentiment class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassProbabilities {
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
}

impl ClassProbabilities {
    pub fn new(positive: f64, negative: f64, neutral: f64) -> Self {
        Self {
            positive,
            negative,
            neutral,
        }
    }

    /// Softmax over raw logits whose classes are given by `labels`.
    pub fn from_logits(logits: &[f32], labels: &[SentimentLabel]) -> SignalResult<Self> {
        if logits.len() != labels.len() || logits.is_empty() {
            return Err(SignalError::ClassificationError {
                reason: format!(
                    "model produced {} logits for {} labels",
                    logits.len(),
                    labels.len()
                ),
            });
        }

        let max = logits
            .iter()
            .map(|&l| l as f64)
            .fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = logits.iter().map(|&l| (l as f64 - max).exp()).collect();
        let total: f64 = exps.iter().sum();

        let mut probs = Self::new(0.0, 0.0, 0.0);
        for (label, e) in labels.iter().zip(&exps) {
            let p = e / total;
            match label {
                SentimentLabel::Positive => probs.positive += p,
                SentimentLabel::Negative => probs.negative += p,
                SentimentLabel::Neutral => probs.neutral += p,
            }
        }
        Ok(probs)
    }

    /// Convert to a score: arg-max label, its probability as confidence.
    ///
    /// Exact ties resolve to neutral first, then positive. Fails when any
    /// probability is negative or not finite.
    pub fn to_score(self) -> SignalResult<SentimentScore> {
        let entries = [
            (SentimentLabel::Neutral, self.neutral),
            (SentimentLabel::Positive, self.positive),
            (SentimentLabel::Negative, self.negative),
        ];
        if let Some((label, p)) = entries.iter().find(|(_, p)| !p.is_finite() || *p < 0.0) {
            return Err(SignalError::ClassificationError {
                reason: format!("invalid probability {p} for class {label}"),
            });
        }

        let (label, confidence) = entries
            .iter()
            .copied()
            .fold(entries[0], |best, e| if e.1 > best.1 { e } else { best });
        let confidence = confidence.min(1.0);

        let value = match label {
            SentimentLabel::Positive => confidence,
            SentimentLabel::Negative => -confidence,
            SentimentLabel::Neutral => 0.0,
        };

        Ok(SentimentScore {
            value,
            label,
            confidence,
            source: ScoreSource::Model,
        })
    }
}

// =============================================================================
// ModelClassifier
// =============================================================================

/// Classifier backed by a loaded model, degrading per call to keywords.
pub struct ModelClassifier {
    model: Box<dyn SentimentModel>,
    fallback: KeywordClassifier,
}

impl ModelClassifier {
    pub fn new(model: Box<dyn SentimentModel>) -> Self {
        Self {
            model,
            fallback: KeywordClassifier::new(),
        }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn classify(&self, text: &str) -> SentimentScore {
        if text.trim().is_empty() {
            return SentimentScore::empty();
        }

        match self.try_classify(text) {
            Ok(score) => score,
            Err(e) => {
                warn!(
                    model = self.model.name(),
                    error = %e,
                    "model classification failed, using keyword fallback"
                );
                self.fallback.classify(text)
            }
        }
    }

    fn try_classify(&self, text: &str) -> SignalResult<SentimentScore> {
        self.model.predict(text)?.to_score()
    }
}

impl std::fmt::Debug for ModelClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelClassifier")
            .field("model", &self.model.name())
            .finish()
    }
}
