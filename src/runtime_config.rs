// =============================================================================
// Engine Configuration — JSON file + environment overrides
// =============================================================================
//
// Everything fixed at engine construction: classifier backend, inference
// settings, decay source/half-life and the bias dead-band.
//
// All fields carry `#[serde(default)]` so that adding new fields never breaks
// loading an older config file. Environment variables are applied after the
// file:
//
//   SENTIMENT_MODEL             model_name
//   SENTIMENT_SOURCE            source
//   SENTIMENT_HALF_LIFE_HOURS   half_life_hours
//   SENTIMENT_ACCELERATED       use_accelerated_inference (true/false/1/0)
//
// =============================================================================

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::signals::{DecayParameters, DEFAULT_BIAS_THRESHOLD};

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_model_name() -> String {
    "heuristic".to_string()
}

fn default_model_root() -> String {
    "models".to_string()
}

fn default_source() -> String {
    "reddit".to_string()
}

fn default_max_tokens() -> usize {
    512
}

fn default_intra_threads() -> usize {
    2
}

fn default_true() -> bool {
    true
}

fn default_bias_threshold() -> f64 {
    DEFAULT_BIAS_THRESHOLD
}

// =============================================================================
// EngineConfig
// =============================================================================

/// Construction-time configuration for the signal engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    // --- Classifier ---------------------------------------------------------

    /// Classifier backend. `"heuristic"` selects keywords; anything else is a
    /// model directory, absolute or relative to `model_root`.
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Base directory for relative model names.
    #[serde(default = "default_model_root")]
    pub model_root: String,

    /// Ask the inference backend for GPU execution.
    #[serde(default)]
    pub use_accelerated_inference: bool,

    /// Token budget per post.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// Threads per inference session.
    #[serde(default = "default_intra_threads")]
    pub intra_threads: usize,

    /// Classify posts of one batch in parallel.
    #[serde(default = "default_true")]
    pub parallel_classification: bool,

    // --- Decay --------------------------------------------------------------

    /// Post source; selects the default half-life.
    #[serde(default = "default_source")]
    pub source: String,

    /// Explicit half-life in hours, overriding the source default.
    #[serde(default)]
    pub half_life_hours: Option<f64>,

    // --- Aggregation --------------------------------------------------------

    /// Minimum |mean| for a bullish/bearish bias.
    #[serde(default = "default_bias_threshold")]
    pub bias_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_name: default_model_name(),
            model_root: default_model_root(),
            use_accelerated_inference: false,
            max_tokens: default_max_tokens(),
            intra_threads: default_intra_threads(),
            parallel_classification: true,
            source: default_source(),
            half_life_hours: None,
            bias_threshold: default_bias_threshold(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// Returns an error if the file is missing so the caller can fall back to
    /// defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read engine config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse engine config from {}", path.display()))?;

        info!(
            path = %path.display(),
            model = %config.model_name,
            source = %config.source,
            "engine config loaded"
        );

        Ok(config)
    }

    /// Apply `SENTIMENT_*` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup (environment, test map, ...).
    ///
    /// Unparseable values are ignored with a warning.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(model) = lookup("SENTIMENT_MODEL") {
            self.model_name = model.trim().to_string();
        }
        if let Some(source) = lookup("SENTIMENT_SOURCE") {
            self.source = source.trim().to_string();
        }
        if let Some(raw) = lookup("SENTIMENT_HALF_LIFE_HOURS") {
            match raw.trim().parse::<f64>() {
                Ok(h) => self.half_life_hours = Some(h),
                Err(e) => warn!(value = %raw, error = %e, "ignoring SENTIMENT_HALF_LIFE_HOURS"),
            }
        }
        if let Some(raw) = lookup("SENTIMENT_ACCELERATED") {
            match raw.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.use_accelerated_inference = true,
                "0" | "false" | "no" | "off" => self.use_accelerated_inference = false,
                _ => warn!(value = %raw, "ignoring SENTIMENT_ACCELERATED"),
            }
        }
    }

    /// Decay parameters for the configured source, honouring the override.
    pub fn decay_parameters(&self) -> DecayParameters {
        DecayParameters::for_source(self.source.clone())
            .with_half_life_override(self.half_life_hours)
    }

    /// Directory holding the configured model.
    pub fn model_dir(&self) -> PathBuf {
        let name = Path::new(&self.model_name);
        if name.is_absolute() {
            name.to_path_buf()
        } else {
            Path::new(&self.model_root).join(name)
        }
    }
}
