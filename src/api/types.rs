//! API request/response types

use serde::{Deserialize, Serialize};

/// JSON prediction request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    /// Clinical text to classify
    #[serde(default)]
    pub text: String,
}

/// Form body posted by the home page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictForm {
    /// Clinical text to classify
    #[serde(default)]
    pub text: String,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

impl ErrorResponse {
    /// Wrap a message
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "healthy" when a model is loaded, "unhealthy" otherwise
    pub status: String,
    /// Whether a model is loaded
    pub model_loaded: bool,
    /// Service version
    pub version: String,
}

/// Diagnostics dump for `/debug-info`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugInfoResponse {
    /// Model weights loaded
    pub model_loaded: bool,
    /// Tokenizer loaded
    pub tokenizer_loaded: bool,
    /// Label encoder loaded
    pub label_encoder_loaded: bool,
    /// Inference device, if a model is loaded
    pub device: Option<String>,
    /// Model name, if a model is loaded
    pub model_name: Option<String>,
    /// Specialty labels in output order
    pub labels: Vec<String>,
    /// Process working directory
    pub current_dir: Option<String>,
    /// Configured model directory
    pub model_path: String,
    /// Whether the model directory exists
    pub model_path_exists: bool,
    /// Configured template override directory
    pub templates_dir: Option<String>,
    /// Whether the template override directory exists
    pub templates_exists: bool,
    /// Service version
    pub version: String,
    /// Files in the model directory
    pub model_files: Vec<String>,
    /// Files in the working directory
    pub all_files: Vec<String>,
}
