// =============================================================================
// Signals Module
// =============================================================================
//
// Numeric half of the sentiment pipeline:
// - Signal decay (half-life ageing, regime-scaled)
// - Weighted aggregation into summary statistics

pub mod aggregator;
pub mod signal_decay;

pub use aggregator::{Aggregator, DEFAULT_BIAS_THRESHOLD};
pub use signal_decay::{half_life_for_source, DecayModel, DecayParameters};
