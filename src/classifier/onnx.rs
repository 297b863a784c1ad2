//! ONNX Runtime sentiment backend.
//!
//! Loads a sequence-classification export (e.g. FinBERT) from a model
//! directory:
//!
//! ```text
//! <dir>/model.onnx       3-way classification head, logits output
//! <dir>/tokenizer.json   HuggingFace tokenizer
//! <dir>/labels.json      optional, class names in output order
//! ```
//!
//! Without `labels.json` the FinBERT order `positive, negative, neutral` is
//! assumed.
//!
//! Inputs are bound by name. `input_ids` and `attention_mask` are always
//! fed; `token_type_ids` only when the graph declares it (BERT exports do,
//! DistilBERT/RoBERTa exports usually don't).

use std::path::Path;

use ort::execution_providers::CUDAExecutionProvider;
use ort::session::Session;
use ort::value::{DynValue, Tensor};
use parking_lot::Mutex;
use tokenizers::{Encoding, Tokenizer, TruncationParams};
use tracing::{debug, info};

use crate::classifier::model::{ClassProbabilities, SentimentModel};
use crate::error::{SignalError, SignalResult};
use crate::types::SentimentLabel;

const FINBERT_LABELS: [SentimentLabel; 3] = [
    SentimentLabel::Positive,
    SentimentLabel::Negative,
    SentimentLabel::Neutral,
];

/// Which encoding field feeds a graph input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputKind {
    InputIds,
    AttentionMask,
    TokenTypeIds,
}

impl InputKind {
    fn from_input_name(name: &str) -> Option<Self> {
        match name {
            "input_ids" => Some(Self::InputIds),
            "attention_mask" => Some(Self::AttentionMask),
            "token_type_ids" => Some(Self::TokenTypeIds),
            _ => None,
        }
    }

    fn values(self, encoding: &Encoding) -> Vec<i64> {
        let raw = match self {
            Self::InputIds => encoding.get_ids(),
            Self::AttentionMask => encoding.get_attention_mask(),
            Self::TokenTypeIds => encoding.get_type_ids(),
        };
        raw.iter().map(|&v| v as i64).collect()
    }
}

/// Session settings for [`OnnxSentimentModel::load`].
#[derive(Debug, Clone)]
pub struct OnnxOptions {
    /// Token budget per text; longer inputs are truncated.
    pub max_tokens: usize,
    pub intra_threads: usize,
    /// Request the CUDA execution provider (CPU is used if it cannot register).
    pub accelerated: bool,
}

/// ONNX sequence classifier.
///
/// The session needs `&mut` to run, so it sits behind a mutex to keep the
/// model `Sync`.
pub struct OnnxSentimentModel {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    /// Graph inputs in declaration order.
    inputs: Vec<(String, InputKind)>,
    labels: Vec<SentimentLabel>,
    name: String,
}

impl OnnxSentimentModel {
    /// Load the model directory eagerly.
    ///
    /// # Errors
    /// `SignalError::ModelUnavailable` if any file is missing or unreadable.
    pub fn load(dir: &Path, options: &OnnxOptions) -> SignalResult<Self> {
        let name = dir.display().to_string();
        let unavailable = |reason: String| SignalError::ModelUnavailable {
            model: name.clone(),
            reason,
        };

        let model_path = dir.join("model.onnx");
        if !model_path.exists() {
            return Err(unavailable(format!("{} not found", model_path.display())));
        }

        let tokenizer_path = dir.join("tokenizer.json");
        let mut tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            unavailable(format!(
                "tokenizer load failed at {}: {e}",
                tokenizer_path.display()
            ))
        })?;
        let max_tokens = options.max_tokens.max(2);
        // Tokenizer-side truncation keeps [CLS] ... [SEP] intact.
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: max_tokens,
                ..Default::default()
            }))
            .map_err(|e| unavailable(format!("tokenizer truncation setup failed: {e}")))?;

        let labels = load_labels(dir).map_err(unavailable)?;

        let mut builder = Session::builder()
            .map_err(|e| unavailable(e.to_string()))?
            .with_intra_threads(options.intra_threads.max(1))
            .map_err(|e| unavailable(e.to_string()))?;

        if options.accelerated {
            builder = builder
                .with_execution_providers([CUDAExecutionProvider::default().build()])
                .map_err(|e| unavailable(e.to_string()))?;
        }

        let session = builder
            .commit_from_file(&model_path)
            .map_err(|e| unavailable(e.to_string()))?;

        let input_names: Vec<String> = session
            .inputs()
            .iter()
            .map(|input| input.name().to_string())
            .collect();
        let inputs = bind_inputs(&input_names).map_err(unavailable)?;

        info!(
            model = %name,
            labels = ?labels,
            inputs = ?input_names,
            max_tokens,
            accelerated = options.accelerated,
            "ONNX sentiment model loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            inputs,
            labels,
            name,
        })
    }

    fn infer(&self, text: &str) -> SignalResult<Vec<f32>> {
        let failed = |reason: String| SignalError::ClassificationError { reason };

        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| failed(format!("tokenization failed: {e}")))?;

        if !encoding.get_overflowing().is_empty() {
            debug!(kept = encoding.get_ids().len(), "input truncated");
        }

        let seq_len = encoding.get_ids().len() as i64;
        let mut feeds: Vec<(String, DynValue)> = Vec::with_capacity(self.inputs.len());
        for (input_name, kind) in &self.inputs {
            let tensor = Tensor::from_array((vec![1i64, seq_len], kind.values(&encoding)))
                .map_err(|e| failed(format!("tensor creation error for {input_name}: {e}")))?;
            feeds.push((input_name.clone(), tensor.into_dyn()));
        }

        let mut session = self.session.lock();
        let outputs = session
            .run(feeds)
            .map_err(|e| failed(e.to_string()))?;

        let (_name, output) = outputs
            .iter()
            .next()
            .ok_or_else(|| failed("no output tensor".to_string()))?;

        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| failed(format!("tensor extraction failed: {e}")))?;

        // [batch=1, classes]
        let classes = shape.last().copied().unwrap_or(0) as usize;
        if classes != self.labels.len() || data.len() < classes {
            return Err(failed(format!("unexpected output shape: {shape:?}")));
        }
        Ok(data[..classes].to_vec())
    }
}

impl SentimentModel for OnnxSentimentModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, text: &str) -> SignalResult<ClassProbabilities> {
        let logits = self.infer(text)?;
        ClassProbabilities::from_logits(&logits, &self.labels)
    }
}

/// Map declared graph inputs to encoding fields.
///
/// `input_ids` is mandatory; any input the tokenizer cannot fill is an error.
fn bind_inputs(names: &[String]) -> Result<Vec<(String, InputKind)>, String> {
    let inputs = names
        .iter()
        .map(|n| {
            InputKind::from_input_name(n)
                .map(|kind| (n.clone(), kind))
                .ok_or_else(|| format!("unsupported model input `{n}`"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if !inputs.iter().any(|(_, kind)| *kind == InputKind::InputIds) {
        return Err("model declares no `input_ids` input".to_string());
    }
    Ok(inputs)
}

/// Read `labels.json` when present, otherwise the FinBERT ordering.
fn load_labels(dir: &Path) -> Result<Vec<SentimentLabel>, String> {
    let path = dir.join("labels.json");
    if !path.exists() {
        return Ok(FINBERT_LABELS.to_vec());
    }

    let content = std::fs::read_to_string(&path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    let names: Vec<String> = serde_json::from_str(&content)
        .map_err(|e| format!("failed to parse {}: {e}", path.display()))?;

    names
        .iter()
        .map(|n| SentimentLabel::parse(n).ok_or_else(|| format!("unknown label `{n}`")))
        .collect()
}
