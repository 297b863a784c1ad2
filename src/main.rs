// =============================================================================
// Aurora Sentiment — Batch entry point
// =============================================================================
//
// Usage: aurora-sentiment <batch.json> [engine_config.json]
//
// Reads one batch of posts, runs the engine once and prints the aggregate as
// JSON on stdout. Logs go to stderr (RUST_LOG, default `info`).
//
// Batch file:
//   {
//     "reference_time": "2024-03-01T12:00:00Z",   optional, defaults to now
//     "regime": "VOLATILE",                        optional
//     "regime_multiplier": 1.5,                    optional, wins over regime
//     "source": "twitter",                         optional, else config
//     "posts": [ { "text": "...", "timestamp": "...", "weight": 12 } ]
//   }
// =============================================================================

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use aurora_sentiment::{DecayParameters, EngineConfig, MarketRegime, RawPost, SignalEngine};

#[derive(Debug, Deserialize)]
struct PostBatch {
    #[serde(default)]
    reference_time: Option<DateTime<Utc>>,
    #[serde(default)]
    regime: Option<MarketRegime>,
    #[serde(default)]
    regime_multiplier: Option<f64>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    posts: Vec<RawPost>,
}

fn main() -> Result<()> {
    // ── 1. Environment & logging ─────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let batch_path = args
        .next()
        .context("usage: aurora-sentiment <batch.json> [engine_config.json]")?;
    let config_path = args
        .next()
        .or_else(|| std::env::var("SENTIMENT_CONFIG").ok())
        .unwrap_or_else(|| "engine_config.json".to_string());

    // ── 2. Config ────────────────────────────────────────────────────────
    let mut config = EngineConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        EngineConfig::default()
    });
    config.apply_env_overrides();

    // ── 3. Engine (eager model load) ─────────────────────────────────────
    let engine = SignalEngine::from_config(&config)?;
    info!(
        backend = engine.classifier().backend_name(),
        source = %engine.decay_model().source(),
        half_life_hours = engine.decay_model().half_life_hours(),
        "engine ready"
    );

    // ── 4. Batch ─────────────────────────────────────────────────────────
    let content = std::fs::read_to_string(&batch_path)
        .with_context(|| format!("failed to read post batch from {batch_path}"))?;
    let batch: PostBatch = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse post batch from {batch_path}"))?;

    let reference_time = batch.reference_time.unwrap_or_else(Utc::now);
    let regime_multiplier = match (batch.regime_multiplier, batch.regime) {
        (Some(m), _) => m,
        (None, Some(regime)) => regime.decay_multiplier(),
        (None, None) => 1.0,
    };
    let params = match batch.source {
        Some(source) => {
            DecayParameters::for_source(source).with_half_life_override(config.half_life_hours)
        }
        None => config.decay_parameters(),
    };

    info!(
        posts = batch.posts.len(),
        regime = ?batch.regime,
        regime_multiplier,
        reference_time = %reference_time,
        "computing sentiment signal"
    );

    // ── 5. Compute & emit ────────────────────────────────────────────────
    let result = engine.compute_signal(&batch.posts, regime_multiplier, &params, reference_time)?;
    println!(
        "{}",
        serde_json::to_string_pretty(&result).context("failed to serialise aggregate")?
    );

    Ok(())
}
