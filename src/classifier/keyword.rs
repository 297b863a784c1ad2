// =============================================================================
// Keyword Classifier — Heuristic fallback sentiment
// =============================================================================
//
// Counts case-insensitive whole-word hits against a bullish and a bearish
// vocabulary. The side with more hits wins; a tie (including no hits at all)
// is neutral.
//
//   value      = +/- min(0.5, winning_hits / 10)
//   confidence = |value|

use crate::types::{ScoreSource, SentimentLabel, SentimentScore};

/// Largest magnitude a keyword-only score may reach.
const MAX_HEURISTIC_MAGNITUDE: f64 = 0.5;

/// Score contributed per keyword hit.
const SCORE_PER_HIT: f64 = 0.1;

const BULLISH_KEYWORDS: &[&str] = &[
    "bull",
    "bullish",
    "buy",
    "buying",
    "long",
    "calls",
    "moon",
    "mooning",
    "rocket",
    "pump",
    "rally",
    "surge",
    "soar",
    "breakout",
    "gain",
    "gains",
    "green",
    "beat",
    "beats",
    "upgrade",
    "strong",
    "growth",
    "profit",
    "hodl",
    "undervalued",
    "outperform",
];

const BEARISH_KEYWORDS: &[&str] = &[
    "bear",
    "bearish",
    "sell",
    "selling",
    "short",
    "puts",
    "crash",
    "dump",
    "dumping",
    "plunge",
    "drop",
    "red",
    "miss",
    "downgrade",
    "weak",
    "loss",
    "losses",
    "tank",
    "overvalued",
    "bankrupt",
    "fraud",
    "scam",
    "bagholder",
    "collapse",
    "fear",
    "panic",
];

/// Stateless keyword-count classifier. Always available.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Number of (bullish, bearish) keyword hits in `text`.
    pub fn count_hits(text: &str) -> (usize, usize) {
        let lower = text.to_lowercase();
        let mut bullish = 0;
        let mut bearish = 0;

        for token in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            if BULLISH_KEYWORDS.contains(&token) {
                bullish += 1;
            } else if BEARISH_KEYWORDS.contains(&token) {
                bearish += 1;
            }
        }

        (bullish, bearish)
    }

    pub fn classify(&self, text: &str) -> SentimentScore {
        if text.trim().is_empty() {
            return SentimentScore::empty();
        }

        let (bullish, bearish) = Self::count_hits(text);

        let (label, value) = if bullish > bearish {
            (SentimentLabel::Positive, magnitude(bullish))
        } else if bearish > bullish {
            (SentimentLabel::Negative, -magnitude(bearish))
        } else {
            (SentimentLabel::Neutral, 0.0)
        };

        SentimentScore {
            value,
            label,
            confidence: value.abs(),
            source: ScoreSource::Heuristic,
        }
    }
}

fn magnitude(hits: usize) -> f64 {
    (hits as f64 * SCORE_PER_HIT).min(MAX_HEURISTIC_MAGNITUDE)
}
