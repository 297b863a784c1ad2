// =============================================================================
// Regime Module
// =============================================================================
//
// Converts upstream regime/volatility context into the decay-time multiplier
// used by the signal engine.

pub mod multiplier;

pub use multiplier::{volatility_multiplier, MarketRegime};
