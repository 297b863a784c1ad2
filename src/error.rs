// =============================================================================
// Signal Errors
// =============================================================================
//
// Configuration errors (`InvalidParameter`, `DimensionMismatch`) are returned
// to the caller. Runtime degradations (`ModelUnavailable`,
// `ClassificationError`) are absorbed inside the classifier and only ever
// surface through logs.

use thiserror::Error;

/// Errors produced by the sentiment signal engine.
#[derive(Debug, Error)]
pub enum SignalError {
    /// A configuration value is out of its valid domain.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// Weights were supplied with a different length than the scores.
    #[error("dimension mismatch: {scores} scores but {weights} weights")]
    DimensionMismatch { scores: usize, weights: usize },

    /// The model-backed classifier could not be constructed or loaded.
    #[error("sentiment model `{model}` unavailable: {reason}")]
    ModelUnavailable { model: String, reason: String },

    /// A single inference call failed.
    #[error("classification failed: {reason}")]
    ClassificationError { reason: String },
}

impl SignalError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    /// True for errors the caller must fix in its configuration or input.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidParameter { .. } | Self::DimensionMismatch { .. }
        )
    }
}

pub type SignalResult<T> = Result<T, SignalError>;
