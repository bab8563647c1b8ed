//! BERT sequence-classification backend
//!
//! Loads a HuggingFace `BertForSequenceClassification` checkpoint (for
//! example a fine-tuned MARBERT) with the candle framework and runs it on a
//! single text at a time.
//!
//! # Model directory layout
//!
//! - `config.json` - BERT hyperparameters, optionally `id2label`
//! - `tokenizer.json` - fast tokenizer definition
//! - `model.safetensors` (preferred) or `pytorch_model.bin` - weights
//! - `label_encoder.json` - optional, see [`crate::labels`]
//!
//! # Forward pass
//!
//! encoder → `[CLS]` hidden state → pooler (dense + tanh) → classifier
//! (dense) → softmax.
//!
//! # Example
//!
//! ```rust,ignore
//! use medspec::bert::BertClassifier;
//! use medspec::classifier::predict_specialty;
//! use medspec::config::ModelConfig;
//!
//! let classifier = BertClassifier::load(&ModelConfig::new("fine_tuned_marbert_medical_specialty"))?;
//! let prediction = predict_specialty(&classifier, "أعاني من ألم في الصدر")?;
//! println!("{} ({:.2}%)", prediction.specialty, prediction.confidence);
//! ```

use std::collections::HashMap;
#[cfg(feature = "bert")]
use std::fmt::Debug;
use std::path::{Path, PathBuf};
#[cfg(feature = "bert")]
use std::sync::Arc;

use serde::Deserialize;

#[cfg(feature = "bert")]
use crate::classifier::softmax;
use crate::classifier::{Classifier, ComputeDevice};
use crate::config::ModelConfig;
#[cfg(feature = "bert")]
use crate::config::DevicePreference;
use crate::error::{MedspecError, Result};
use crate::labels::LabelEncoder;

#[cfg(feature = "bert")]
use candle_core::{DType, Device, Tensor};
#[cfg(feature = "bert")]
use candle_nn::{linear, Linear, Module, VarBuilder};
#[cfg(feature = "bert")]
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
#[cfg(feature = "bert")]
use tokenizers::{Tokenizer, TruncationParams};

/// Model hyperparameters file
pub const CONFIG_FILE: &str = "config.json";
/// Fast tokenizer file
pub const TOKENIZER_FILE: &str = "tokenizer.json";
/// Preferred weights file
pub const SAFETENSORS_FILE: &str = "model.safetensors";
/// Legacy PyTorch weights file
pub const PYTORCH_FILE: &str = "pytorch_model.bin";

/// The parts of `config.json` the classification head needs
#[derive(Debug, Clone, Deserialize)]
pub struct HeadConfig {
    /// Encoder output width
    pub hidden_size: usize,
    /// Position embedding table size; caps the token budget
    #[serde(default = "default_max_position_embeddings")]
    pub max_position_embeddings: usize,
    /// Class index → name table written by `transformers`
    #[serde(default)]
    pub id2label: Option<HashMap<String, String>>,
    /// Checkpoint name recorded at save time
    #[serde(default, rename = "_name_or_path")]
    pub name_or_path: Option<String>,
}

fn default_max_position_embeddings() -> usize {
    512
}

impl HeadConfig {
    /// Parse `config.json` contents
    ///
    /// # Errors
    ///
    /// Returns error if the JSON is malformed or lacks `hidden_size`.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| MedspecError::InvalidConfiguration(format!("Invalid config.json: {e}")))
    }
}

/// Locate the weights file, preferring safetensors
///
/// # Errors
///
/// Returns error if neither weights file exists.
pub fn weights_path(model_dir: &Path) -> Result<PathBuf> {
    [SAFETENSORS_FILE, PYTORCH_FILE]
        .iter()
        .map(|name| model_dir.join(name))
        .find(|path| path.is_file())
        .ok_or_else(|| MedspecError::IoError {
            message: format!(
                "No {SAFETENSORS_FILE} or {PYTORCH_FILE} in {}",
                model_dir.display()
            ),
        })
}

#[cfg_attr(not(feature = "bert"), allow(dead_code))]
fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| MedspecError::IoError {
        message: format!("Failed to read {}: {e}", path.display()),
    })
}

/// Display name for a checkpoint: recorded name, else the directory name
#[cfg_attr(not(feature = "bert"), allow(dead_code))]
fn model_name(head: &HeadConfig, model_dir: &Path) -> String {
    head.name_or_path
        .as_deref()
        .filter(|name| !name.is_empty())
        .map(ToString::to_string)
        .or_else(|| {
            model_dir
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "bert".to_string())
}

#[cfg(feature = "bert")]
fn infer_err(context: &'static str) -> impl Fn(candle_core::Error) -> MedspecError {
    move |e| MedspecError::InferenceError(format!("{context}: {e}"))
}

#[cfg(feature = "bert")]
fn select_device(preference: DevicePreference) -> Result<Device> {
    match preference {
        DevicePreference::Cpu => Ok(Device::Cpu),
        DevicePreference::Auto => Device::cuda_if_available(0).map_err(|e| {
            MedspecError::InvalidConfiguration(format!("Device probe failed: {e}"))
        }),
        DevicePreference::Cuda => Device::new_cuda(0).map_err(|e| {
            MedspecError::InvalidConfiguration(format!("CUDA device unavailable: {e}"))
        }),
    }
}

#[cfg(feature = "bert")]
fn compute_device(device: &Device) -> ComputeDevice {
    if device.is_cuda() {
        ComputeDevice::Cuda
    } else if device.is_metal() {
        ComputeDevice::Metal
    } else {
        ComputeDevice::Cpu
    }
}

/// Loaded model, tokenizer, label encoder and device
#[cfg(feature = "bert")]
struct BertClassifierInner {
    model: BertModel,
    pooler: Linear,
    classifier: Linear,
    tokenizer: Tokenizer,
    labels: LabelEncoder,
    device: Device,
    name: String,
}

#[cfg(feature = "bert")]
impl Debug for BertClassifierInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BertClassifierInner")
            .field("name", &self.name)
            .field("device", &self.device)
            .field("labels", &self.labels.len())
            .finish()
    }
}

/// Fine-tuned BERT specialty classifier
#[derive(Debug, Clone)]
pub struct BertClassifier {
    #[cfg(feature = "bert")]
    inner: Arc<BertClassifierInner>,
    #[cfg(not(feature = "bert"))]
    never: std::convert::Infallible,
}

impl BertClassifier {
    /// Load a checkpoint directory
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - the directory or any required file is missing
    /// - `config.json` or `tokenizer.json` is invalid
    /// - weights don't match the BERT architecture
    /// - no usable label encoder is found
    /// - the requested device is unavailable
    #[cfg(feature = "bert")]
    pub fn load(config: &ModelConfig) -> Result<Self> {
        let model_dir = &config.model_dir;
        if !model_dir.is_dir() {
            return Err(MedspecError::ModelNotFound(model_dir.clone()));
        }

        let device = select_device(config.device)?;

        let config_json = read_file(&model_dir.join(CONFIG_FILE))?;
        let head = HeadConfig::from_json(&config_json)?;
        let bert_config: BertConfig = serde_json::from_str(&config_json).map_err(|e| {
            MedspecError::InvalidConfiguration(format!("Invalid BERT config: {e}"))
        })?;

        let labels = LabelEncoder::load(model_dir, head.id2label.as_ref())?;

        let tokenizer_path = model_dir.join(TOKENIZER_FILE);
        let mut tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            MedspecError::IoError {
                message: format!(
                    "Failed to load tokenizer from {}: {e}",
                    tokenizer_path.display()
                ),
            }
        })?;
        let max_length = config.max_length.min(head.max_position_embeddings);
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length,
                ..Default::default()
            }))
            .map_err(|e| {
                MedspecError::InvalidConfiguration(format!("Invalid truncation settings: {e}"))
            })?;
        tokenizer.with_padding(None);

        let weights = weights_path(model_dir)?;
        let vb = if weights.extension().is_some_and(|ext| ext == "safetensors") {
            // SAFETY: the weights file must not be modified while mapped
            unsafe {
                VarBuilder::from_mmaped_safetensors(&[&weights], DType::F32, &device)
                    .map_err(|e| MedspecError::IoError {
                        message: format!("Failed to load model weights: {e}"),
                    })?
            }
        } else {
            VarBuilder::from_pth(&weights, DType::F32, &device).map_err(|e| {
                MedspecError::IoError {
                    message: format!("Failed to load model weights: {e}"),
                }
            })?
        };

        let model = BertModel::load(vb.clone(), &bert_config).map_err(|e| {
            MedspecError::InvalidConfiguration(format!("Failed to load BERT encoder: {e}"))
        })?;

        let pooler_prefix = if vb.contains_tensor("bert.pooler.dense.weight") {
            "bert.pooler.dense"
        } else {
            "pooler.dense"
        };
        let pooler = linear(head.hidden_size, head.hidden_size, vb.pp(pooler_prefix)).map_err(
            |e| MedspecError::InvalidConfiguration(format!("Failed to load pooler: {e}")),
        )?;
        let classifier = linear(head.hidden_size, labels.len(), vb.pp("classifier")).map_err(
            |e| {
                MedspecError::InvalidConfiguration(format!(
                    "Failed to load classifier head for {} labels: {e}",
                    labels.len()
                ))
            },
        )?;

        Ok(Self {
            inner: Arc::new(BertClassifierInner {
                model,
                pooler,
                classifier,
                tokenizer,
                labels,
                device,
                name: model_name(&head, model_dir),
            }),
        })
    }

    /// Load a checkpoint (stub when the bert feature is disabled).
    #[cfg(not(feature = "bert"))]
    pub fn load(_config: &ModelConfig) -> Result<Self> {
        Err(MedspecError::InvalidConfiguration(
            "BERT backend not enabled. Rebuild with --features bert".to_string(),
        ))
    }

    #[cfg(feature = "bert")]
    fn logits(&self, text: &str) -> Result<Vec<f32>> {
        let inner = &self.inner;

        let encoding = inner
            .tokenizer
            .encode(text, true)
            .map_err(|e| MedspecError::InferenceError(format!("Tokenization failed: {e}")))?;
        let seq_len = encoding.get_ids().len();
        let mask: Vec<f32> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| m as f32)
            .collect();

        let input_ids = Tensor::from_vec(encoding.get_ids().to_vec(), (1, seq_len), &inner.device)
            .map_err(infer_err("Tensor creation failed"))?;
        let token_type_ids =
            Tensor::from_vec(encoding.get_type_ids().to_vec(), (1, seq_len), &inner.device)
                .map_err(infer_err("Tensor creation failed"))?;
        let attention_mask = Tensor::from_vec(mask, (1, seq_len), &inner.device)
            .map_err(infer_err("Tensor creation failed"))?;

        let hidden = inner
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))
            .map_err(infer_err("Model forward failed"))?;

        let cls = hidden
            .narrow(1, 0, 1)
            .map_err(infer_err("CLS selection failed"))?
            .squeeze(1)
            .map_err(infer_err("Squeeze failed"))?;
        let pooled = inner
            .pooler
            .forward(&cls)
            .map_err(infer_err("Pooler failed"))?
            .tanh()
            .map_err(infer_err("Tanh failed"))?;

        inner
            .classifier
            .forward(&pooled)
            .map_err(infer_err("Classifier head failed"))?
            .squeeze(0)
            .map_err(infer_err("Squeeze failed"))?
            .to_vec1::<f32>()
            .map_err(infer_err("Tensor conversion failed"))
    }
}

#[cfg(feature = "bert")]
impl Classifier for BertClassifier {
    fn predict_proba(&self, text: &str) -> Result<Vec<f32>> {
        let logits = self.logits(text)?;
        Ok(softmax(&logits))
    }

    fn labels(&self) -> &LabelEncoder {
        &self.inner.labels
    }

    fn device(&self) -> ComputeDevice {
        compute_device(&self.inner.device)
    }

    fn name(&self) -> &str {
        &self.inner.name
    }
}

#[cfg(not(feature = "bert"))]
impl Classifier for BertClassifier {
    fn predict_proba(&self, _text: &str) -> Result<Vec<f32>> {
        match self.never {}
    }

    fn labels(&self) -> &LabelEncoder {
        match self.never {}
    }

    fn device(&self) -> ComputeDevice {
        match self.never {}
    }

    fn name(&self) -> &str {
        match self.never {}
    }
}
