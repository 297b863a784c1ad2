// =============================================================================
// Aurora Sentiment — Social-media sentiment signal engine
// =============================================================================
//
// Turns a batch of posts about one instrument into a single aged,
// confidence-weighted sentiment reading for the strategy layer:
//
//   posts -> classifier -> decay (half-life x regime) -> aggregator
//
// Fetching posts, regime detection and persistence live elsewhere.
// =============================================================================

pub mod classifier;
pub mod engine;
pub mod error;
pub mod regime;
pub mod runtime_config;
pub mod signals;
pub mod types;

pub use classifier::{KeywordClassifier, SentimentClassifier, SentimentModel};
pub use engine::SignalEngine;
pub use error::{SignalError, SignalResult};
pub use regime::MarketRegime;
pub use runtime_config::EngineConfig;
pub use signals::{Aggregator, DecayModel, DecayParameters};
pub use types::{
    AggregateSentiment, RawPost, ScoreSource, ScoredPost, SentimentBias, SentimentLabel,
    SentimentScore,
};
