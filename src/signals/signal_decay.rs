// =============================================================================
// Signal Decay — Half-life ageing of sentiment strength
// =============================================================================
//
// Continuous-time exponential decay:
//
//   lambda          = ln(2) / half_life_hours
//   decay_factor    = max(exp(-lambda * age_hours * regime_multiplier), MIN_POSITIVE)
//   decayed_signal  = signal_strength * decay_factor
//
// The regime multiplier stretches time: 1.0 is baseline, > 1.0 ages signals
// faster (volatile markets), 0.0 freezes them.
//
// Age is a caller invariant: sentiment callers pass age_hours >= 0. The model
// itself accepts negative ages (future-dated signals grow instead of decay).

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SignalError, SignalResult};

/// Default half-life for Reddit posts (hours).
pub const REDDIT_HALF_LIFE_HOURS: f64 = 6.0;

/// Default half-life for Twitter posts (hours).
pub const TWITTER_HALF_LIFE_HOURS: f64 = 3.0;

/// Half-life used for any source without a dedicated default (hours).
pub const DEFAULT_HALF_LIFE_HOURS: f64 = 4.0;

/// Default half-life for a source name, matched case-insensitively.
pub fn half_life_for_source(source: &str) -> f64 {
    match source.trim().to_lowercase().as_str() {
        "reddit" => REDDIT_HALF_LIFE_HOURS,
        "twitter" => TWITTER_HALF_LIFE_HOURS,
        _ => DEFAULT_HALF_LIFE_HOURS,
    }
}

// =============================================================================
// DecayParameters
// =============================================================================

/// Half-life and source identifier for one decay model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecayParameters {
    pub half_life_hours: f64,
    pub source: String,
}

impl DecayParameters {
    pub fn new(half_life_hours: f64, source: impl Into<String>) -> Self {
        Self {
            half_life_hours,
            source: source.into(),
        }
    }

    /// Parameters with the default half-life for `source`.
    pub fn for_source(source: impl Into<String>) -> Self {
        let source = source.into();
        Self {
            half_life_hours: half_life_for_source(&source),
            source,
        }
    }

    /// Replace the source default with an explicit half-life, when given.
    pub fn with_half_life_override(mut self, half_life_hours: Option<f64>) -> Self {
        if let Some(h) = half_life_hours {
            self.half_life_hours = h;
        }
        self
    }
}

// =============================================================================
// DecayModel
// =============================================================================

/// Immutable exponential decay model for one signal source.
#[derive(Debug, Clone, PartialEq)]
pub struct DecayModel {
    params: DecayParameters,
    decay_rate: f64,
}

impl DecayModel {
    /// Build a model from a half-life in hours.
    ///
    /// Fails with `InvalidParameter` unless `half_life_hours` is finite and
    /// strictly positive.
    pub fn new(half_life_hours: f64, source: impl Into<String>) -> SignalResult<Self> {
        Self::from_params(DecayParameters::new(half_life_hours, source))
    }

    pub fn from_params(params: DecayParameters) -> SignalResult<Self> {
        let h = params.half_life_hours;
        if !h.is_finite() || h <= 0.0 {
            return Err(SignalError::invalid(
                "half_life_hours",
                format!("must be a positive finite number, got {h}"),
            ));
        }

        let decay_rate = std::f64::consts::LN_2 / h;
        debug!(
            source = %params.source,
            half_life_hours = h,
            decay_rate = format!("{:.6}", decay_rate),
            "decay model ready"
        );

        Ok(Self { params, decay_rate })
    }

    /// Model with the default half-life for `source`.
    pub fn from_source(source: &str) -> Self {
        let params = DecayParameters::for_source(source);
        let decay_rate = std::f64::consts::LN_2 / params.half_life_hours;
        Self { params, decay_rate }
    }

    /// lambda = ln(2) / half-life, always > 0.
    pub fn decay_rate(&self) -> f64 {
        self.decay_rate
    }

    pub fn half_life_hours(&self) -> f64 {
        self.params.half_life_hours
    }

    pub fn source(&self) -> &str {
        &self.params.source
    }

    pub fn params(&self) -> &DecayParameters {
        &self.params
    }

    /// Multiplicative decay factor for a signal of the given age.
    ///
    /// In (0, 1] whenever `age_hours >= 0` and `regime_multiplier >= 0`.
    ///
    /// Never returns 0: very old signals bottom out at `f64::MIN_POSITIVE`
    /// so they keep their sign.
    pub fn get_decay_factor(&self, age_hours: f64, regime_multiplier: f64) -> f64 {
        (-self.decay_rate * age_hours * regime_multiplier)
            .exp()
            .max(f64::MIN_POSITIVE)
    }

    /// Decayed signal strength.
    pub fn apply_decay(&self, signal_strength: f64, age_hours: f64, regime_multiplier: f64) -> f64 {
        signal_strength * self.get_decay_factor(age_hours, regime_multiplier)
    }

    /// Age (hours, baseline regime) at which the decay factor reaches
    /// `target_decay_factor`.
    ///
    /// Non-positive and NaN targets are never reached and return
    /// `f64::INFINITY`. Targets above 1.0 give a negative age.
    pub fn get_age_for_decay(&self, target_decay_factor: f64) -> f64 {
        if target_decay_factor.is_nan() || target_decay_factor <= 0.0 {
            return f64::INFINITY;
        }
        -target_decay_factor.ln() / self.decay_rate
    }
}
