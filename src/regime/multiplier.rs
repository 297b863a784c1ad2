// =============================================================================
// Regime Multiplier — Market regime to decay-speed mapping
// =============================================================================
//
// Regime detection itself lives upstream. This module turns whatever the
// detector reports into the scalar that stretches decay time:
//
//   DEAD      0.50   little new information, sentiment stays relevant longer
//   SQUEEZE   0.75   compressed range, slow repricing
//   RANGING   1.00   baseline
//   TRENDING  1.25   price discovery under way, chatter goes stale faster
//   VOLATILE  2.00   fast repricing, old posts are quickly priced in
//
// A realised-volatility ratio can be used instead of a label.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{SignalError, SignalResult};

/// Lower clamp for volatility-derived multipliers.
const MIN_VOL_MULTIPLIER: f64 = 0.25;

/// Upper clamp for volatility-derived multipliers.
const MAX_VOL_MULTIPLIER: f64 = 4.0;

/// High-level market regime classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MarketRegime {
    /// Strong directional move with persistence.
    Trending,
    /// Sideways chop.
    Ranging,
    /// Extreme volatility expansion.
    Volatile,
    /// Low-volatility compression.
    Squeeze,
    /// Near-maximum entropy, market behaves as noise.
    Dead,
}

impl MarketRegime {
    /// Decay-time multiplier for this regime.
    pub fn decay_multiplier(self) -> f64 {
        match self {
            Self::Dead => 0.50,
            Self::Squeeze => 0.75,
            Self::Ranging => 1.00,
            Self::Trending => 1.25,
            Self::Volatile => 2.00,
        }
    }
}

impl std::fmt::Display for MarketRegime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trending => write!(f, "TRENDING"),
            Self::Ranging => write!(f, "RANGING"),
            Self::Volatile => write!(f, "VOLATILE"),
            Self::Squeeze => write!(f, "SQUEEZE"),
            Self::Dead => write!(f, "DEAD"),
        }
    }
}

impl std::str::FromStr for MarketRegime {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TRENDING" => Ok(Self::Trending),
            "RANGING" => Ok(Self::Ranging),
            "VOLATILE" => Ok(Self::Volatile),
            "SQUEEZE" => Ok(Self::Squeeze),
            "DEAD" => Ok(Self::Dead),
            other => Err(SignalError::invalid(
                "regime",
                format!("unknown market regime `{other}`"),
            )),
        }
    }
}

/// Multiplier from the ratio of current to baseline volatility, clamped to
/// [0.25, 4.0].
///
/// Both inputs must be finite; `baseline_volatility` must be > 0 and
/// `current_volatility` >= 0.
pub fn volatility_multiplier(current_volatility: f64, baseline_volatility: f64) -> SignalResult<f64> {
    if !baseline_volatility.is_finite() || baseline_volatility <= 0.0 {
        return Err(SignalError::invalid(
            "baseline_volatility",
            format!("must be a positive finite number, got {baseline_volatility}"),
        ));
    }
    if !current_volatility.is_finite() || current_volatility < 0.0 {
        return Err(SignalError::invalid(
            "current_volatility",
            format!("must be a finite number >= 0, got {current_volatility}"),
        ));
    }

    let ratio = current_volatility / baseline_volatility;
    let multiplier = ratio.clamp(MIN_VOL_MULTIPLIER, MAX_VOL_MULTIPLIER);
    trace!(
        ratio = format!("{:.4}", ratio),
        multiplier = format!("{:.4}", multiplier),
        "volatility regime multiplier"
    );
    Ok(multiplier)
}
