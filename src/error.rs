//! Error types for medspec
//!
//! A single error enum covers model loading, inference, label decoding and
//! page rendering. HTTP handlers translate it into status codes at the
//! handler boundary (see [`crate::api`]).

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for medspec operations
pub type Result<T> = std::result::Result<T, MedspecError>;

/// Error type for all medspec operations
#[derive(Debug, Error)]
pub enum MedspecError {
    /// Model directory does not exist
    #[error("Model directory not found: {}", .0.display())]
    ModelNotFound(PathBuf),

    /// Filesystem error while reading model artifacts or templates
    #[error("I/O error: {message}")]
    IoError {
        /// Description including the offending path
        message: String,
    },

    /// Invalid or unsupported configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Label encoder is missing or malformed
    #[error("Label encoder error: {0}")]
    LabelEncoder(String),

    /// No classifier is loaded
    #[error("Model not available")]
    ModelUnavailable,

    /// Request body exceeds the server's size limit
    #[error("Request body too large")]
    PayloadTooLarge,

    /// Input text was empty after trimming
    #[error("Input text is empty")]
    EmptyInput,

    /// Tokenization or forward pass failed
    #[error("Inference failed: {0}")]
    InferenceError(String),

    /// Template syntax or rendering failure
    #[error("Template error: {reason}")]
    TemplateError {
        /// Underlying template engine message
        reason: String,
    },
}

impl From<minijinja::Error> for MedspecError {
    fn from(err: minijinja::Error) -> Self {
        Self::TemplateError {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_not_found_shows_path() {
        let err = MedspecError::ModelNotFound(PathBuf::from("/models/missing"));
        assert!(err.to_string().contains("/models/missing"));
    }

    #[test]
    fn test_io_error_message() {
        let err = MedspecError::IoError {
            message: "permission denied".to_string(),
        };
        assert_eq!(err.to_string(), "I/O error: permission denied");
    }

    #[test]
    fn test_label_encoder_error() {
        let err = MedspecError::LabelEncoder("no classes".to_string());
        assert!(err.to_string().contains("Label encoder"));
        assert!(err.to_string().contains("no classes"));
    }

    #[test]
    fn test_template_error_from_minijinja() {
        let mut env = minijinja::Environment::new();
        let err = env
            .add_template("broken", "{% if %}")
            .expect_err("invalid syntax");
        let err: MedspecError = err.into();
        assert!(matches!(err, MedspecError::TemplateError { .. }));
    }
}
