// =============================================================================
// Classifier Module
// =============================================================================
//
// Text -> SentimentScore. The backend is chosen once at construction:
//
//   Model      inference backend, keyword fallback per failed call
//   Heuristic  keyword counts only
//
// If the model cannot be loaded the classifier is built as Heuristic for its
// whole lifetime and the reason is logged once.

pub mod keyword;
pub mod model;
#[cfg(feature = "onnx")]
pub mod onnx;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::error::SignalResult;
use crate::runtime_config::EngineConfig;
use crate::types::SentimentScore;

pub use keyword::KeywordClassifier;
pub use model::{ClassProbabilities, ModelClassifier, SentimentModel};

/// Model names that select the keyword classifier directly.
const HEURISTIC_MODEL_NAMES: &[&str] = &["", "heuristic", "keyword", "keywords"];

/// Sentiment classifier with a backend fixed at construction.
#[derive(Debug)]
pub enum SentimentClassifier {
    Model(ModelClassifier),
    Heuristic(KeywordClassifier),
}

impl SentimentClassifier {
    pub fn heuristic() -> Self {
        Self::Heuristic(KeywordClassifier::new())
    }

    pub fn from_model(model: Box<dyn SentimentModel>) -> Self {
        Self::Model(ModelClassifier::new(model))
    }

    /// Resolve the backend named by `config.model_name`, loading it eagerly.
    pub fn from_config(config: &EngineConfig) -> Self {
        let requested = config.model_name.trim().to_lowercase();
        if HEURISTIC_MODEL_NAMES.contains(&requested.as_str()) {
            info!("sentiment classifier: keyword heuristic");
            return Self::heuristic();
        }

        match load_model(config) {
            Ok(model) => {
                info!(model = model.name(), "sentiment classifier: model-backed");
                Self::from_model(model)
            }
            Err(e) => {
                warn!(
                    model = %config.model_name,
                    error = %e,
                    "sentiment model unavailable, running keyword heuristic only"
                );
                Self::heuristic()
            }
        }
    }

    pub fn classify(&self, text: &str) -> SentimentScore {
        if text.trim().is_empty() {
            return SentimentScore::empty();
        }
        match self {
            Self::Model(m) => m.classify(text),
            Self::Heuristic(k) => k.classify(text),
        }
    }

    /// Classify many texts in parallel. Output order matches input order.
    pub fn classify_batch<S: AsRef<str> + Sync>(&self, texts: &[S]) -> Vec<SentimentScore> {
        texts.par_iter().map(|t| self.classify(t.as_ref())).collect()
    }

    pub fn is_model_backed(&self) -> bool {
        matches!(self, Self::Model(_))
    }

    pub fn backend_name(&self) -> &str {
        match self {
            Self::Model(m) => m.model_name(),
            Self::Heuristic(_) => "keyword-heuristic",
        }
    }
}

impl Default for SentimentClassifier {
    fn default() -> Self {
        Self::heuristic()
    }
}

#[cfg(feature = "onnx")]
fn load_model(config: &EngineConfig) -> SignalResult<Box<dyn SentimentModel>> {
    let options = onnx::OnnxOptions {
        max_tokens: config.max_tokens,
        intra_threads: config.intra_threads,
        accelerated: config.use_accelerated_inference,
    };
    let model = onnx::OnnxSentimentModel::load(&config.model_dir(), &options)?;
    Ok(Box::new(model))
}

#[cfg(not(feature = "onnx"))]
fn load_model(config: &EngineConfig) -> SignalResult<Box<dyn SentimentModel>> {
    Err(crate::error::SignalError::ModelUnavailable {
        model: config.model_name.clone(),
        reason: "built without the `onnx` feature".to_string(),
    })
}
