// =============================================================================
// Shared types used across the sentiment signal engine
// =============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn default_weight() -> f64 {
    1.0
}

/// A single post as handed over by the ingestion layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPost {
    /// Extracted post text. May be empty.
    #[serde(default)]
    pub text: String,
    /// Publication instant (UTC).
    pub timestamp: DateTime<Utc>,
    /// Relative importance of the post (e.g. upvotes). Expected >= 0.
    #[serde(default = "default_weight")]
    pub weight: f64,
}

impl RawPost {
    pub fn new(text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            text: text.into(),
            timestamp,
            weight: default_weight(),
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }
}

/// A post that was scored upstream; classification is skipped for these.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredPost {
    /// Sentiment value in [-1, 1].
    pub value: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

/// Three-way sentiment class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    /// Parse a model label name such as `"positive"` or `"LABEL_NEG"`.
    pub fn parse(name: &str) -> Option<Self> {
        let lower = name.trim().to_lowercase();
        if lower.starts_with("pos") || lower.ends_with("_pos") || lower == "bullish" {
            Some(Self::Positive)
        } else if lower.starts_with("neg") || lower.ends_with("_neg") || lower == "bearish" {
            Some(Self::Negative)
        } else if lower.starts_with("neu") || lower.ends_with("_neu") {
            Some(Self::Neutral)
        } else {
            None
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Positive => write!(f, "positive"),
            Self::Negative => write!(f, "negative"),
            Self::Neutral => write!(f, "neutral"),
        }
    }
}

/// Which classifier backend produced a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreSource {
    Model,
    Heuristic,
    /// Empty text short-circuit; no backend ran.
    Empty,
}

/// Per-post classification result. Never mutated after construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    /// Signed strength in [-1, 1].
    pub value: f64,
    pub label: SentimentLabel,
    /// Probability / certainty in [0, 1].
    pub confidence: f64,
    pub source: ScoreSource,
}

impl SentimentScore {
    /// The defined result for empty or whitespace-only text.
    pub fn empty() -> Self {
        Self {
            value: 0.0,
            label: SentimentLabel::Neutral,
            confidence: 0.0,
            source: ScoreSource::Empty,
        }
    }
}

/// Directional reading of an aggregate, for the strategy layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SentimentBias {
    Bullish,
    Bearish,
    #[default]
    Neutral,
}

impl std::fmt::Display for SentimentBias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bullish => write!(f, "BULLISH"),
            Self::Bearish => write!(f, "BEARISH"),
            Self::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

/// Summary statistics over one batch of aged scores.
///
/// Always recomputed from scratch; the zero value is the result for an empty
/// batch.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AggregateSentiment {
    /// Weighted mean when weights were supplied, plain mean otherwise.
    pub mean: f64,
    /// Unweighted median.
    pub median: f64,
    /// Unweighted population standard deviation.
    pub std: f64,
    pub count: usize,
    /// Fraction of scores strictly above zero.
    pub positive_ratio: f64,
    /// Fraction of scores strictly below zero.
    pub negative_ratio: f64,
    pub bias: SentimentBias,
}
