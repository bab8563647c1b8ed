//! Server and model configuration
//!
//! Values come from CLI flags, with environment fallbacks wired up in
//! `main.rs`. [`ServerConfig::validate`] runs once at startup so the handlers
//! can assume a sane configuration.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::{MedspecError, Result};

/// Default bind host
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default bind port
pub const DEFAULT_PORT: u16 = 5001;

/// Default model directory, relative to the working directory
pub const DEFAULT_MODEL_DIR: &str = "fine_tuned_marbert_medical_specialty";

/// Default token budget per input (BERT position limit)
pub const DEFAULT_MAX_LENGTH: usize = 512;

/// Which device to run inference on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DevicePreference {
    /// CUDA when available, CPU otherwise
    #[default]
    Auto,
    /// Always CPU
    Cpu,
    /// CUDA device 0; loading fails if unavailable
    #[value(alias = "gpu")]
    Cuda,
}

impl fmt::Display for DevicePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Auto => "auto",
            Self::Cpu => "cpu",
            Self::Cuda => "cuda",
        };
        f.write_str(name)
    }
}

/// Where and how to load the classifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelConfig {
    /// Directory holding config.json, tokenizer.json, weights and labels
    pub model_dir: PathBuf,
    /// Inference device
    pub device: DevicePreference,
    /// Maximum number of tokens fed to the model per input
    pub max_length: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            device: DevicePreference::default(),
            max_length: DEFAULT_MAX_LENGTH,
        }
    }
}

impl ModelConfig {
    /// Create a config for a model directory with default settings
    #[must_use]
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
            ..Self::default()
        }
    }

    /// Set the inference device.
    #[must_use]
    pub fn with_device(mut self, device: DevicePreference) -> Self {
        self.device = device;
        self
    }

    /// Set the token budget.
    #[must_use]
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Model settings
    pub model: ModelConfig,
    /// Directory whose `index.html` / `result.html` override the built-in pages
    pub templates_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            model: ModelConfig::default(),
            templates_dir: None,
        }
    }
}

impl ServerConfig {
    /// Check the configuration before the server starts
    ///
    /// # Errors
    ///
    /// Returns error on an empty host, port 0, or a token budget of 0.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(MedspecError::InvalidConfiguration(
                "host must not be empty".to_string(),
            ));
        }
        if self.port == 0 {
            return Err(MedspecError::InvalidConfiguration(
                "port must be non-zero".to_string(),
            ));
        }
        if self.model.max_length == 0 {
            return Err(MedspecError::InvalidConfiguration(
                "max_length must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve `host:port` to the first matching socket address
    ///
    /// Accepts IP literals and host names such as `localhost`.
    ///
    /// # Errors
    ///
    /// Returns error if the host does not resolve.
    pub async fn resolve_addr(&self) -> Result<SocketAddr> {
        let host = self.host.as_str();
        tokio::net::lookup_host((host, self.port))
            .await
            .map_err(|e| {
                MedspecError::InvalidConfiguration(format!(
                    "invalid address {host}:{}: {e}",
                    self.port
                ))
            })?
            .next()
            .ok_or_else(|| {
                MedspecError::InvalidConfiguration(format!(
                    "{host}:{} resolved to no addresses",
                    self.port
                ))
            })
    }
}
