//! Startup model loading with diagnostics
//!
//! Deployments fail most often because the checkpoint directory is not where
//! the process expects it, so loading logs the working directory, the
//! resolved model path and both directory listings before touching any
//! weights. A failed load is logged and leaves the server without a model;
//! requests then degrade to "model not available" instead of the process
//! exiting.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::bert::BertClassifier;
use crate::classifier::Classifier;
use crate::config::ModelConfig;
use crate::error::{MedspecError, Result};

/// Sorted entry names of a directory
///
/// Unreadable or missing directories yield an empty list.
#[must_use]
pub fn list_dir(path: &Path) -> Vec<String> {
    match std::fs::read_dir(path) {
        Ok(entries) => {
            let mut names: Vec<String> = entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .collect();
            names.sort();
            names
        },
        Err(e) => {
            debug!(path = %path.display(), error = %e, "directory not listable");
            Vec::new()
        },
    }
}

/// Log where the process is running from and what the model directory holds
pub fn log_environment(config: &ModelConfig) {
    match std::env::current_dir() {
        Ok(cwd) => {
            info!(cwd = %cwd.display(), "working directory");
            info!(files = ?list_dir(&cwd), "working directory contents");
        },
        Err(e) => warn!(error = %e, "working directory unavailable"),
    }

    let model_dir = &config.model_dir;
    let resolved = std::path::absolute(model_dir).unwrap_or_else(|_| model_dir.clone());
    let exists = model_dir.is_dir();
    info!(path = %resolved.display(), exists, "model directory");
    if exists {
        info!(files = ?list_dir(model_dir), "model directory contents");
    }
}

/// Load the BERT classifier described by `config`
///
/// # Errors
///
/// Returns [`MedspecError::ModelNotFound`] if the directory is missing, or the
/// backend's error if loading fails.
pub fn load_model(config: &ModelConfig) -> Result<Arc<dyn Classifier>> {
    log_environment(config);

    if !config.model_dir.is_dir() {
        return Err(MedspecError::ModelNotFound(config.model_dir.clone()));
    }

    info!(
        path = %config.model_dir.display(),
        device = %config.device,
        max_length = config.max_length,
        "loading model"
    );
    let classifier = BertClassifier::load(config)?;
    load_report(&classifier);
    Ok(Arc::new(classifier))
}

/// Load the classifier, logging failure instead of returning it
#[must_use]
pub fn load_or_degrade(config: &ModelConfig) -> Option<Arc<dyn Classifier>> {
    match load_model(config) {
        Ok(classifier) => Some(classifier),
        Err(e) => {
            error!(error = %e, "model loading failed; serving without a model");
            None
        },
    }
}

/// Log a summary of a freshly loaded classifier
pub fn load_report(classifier: &dyn Classifier) {
    info!(
        model = classifier.name(),
        device = %classifier.device(),
        labels = classifier.labels().len(),
        "model loaded"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_dir_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.json"), "{}").unwrap();
        std::fs::write(dir.path().join("a.json"), "{}").unwrap();
        std::fs::create_dir(dir.path().join("c")).unwrap();
        assert_eq!(list_dir(dir.path()), vec!["a.json", "b.json", "c"]);
    }

    #[test]
    fn test_list_dir_missing_is_empty() {
        assert!(list_dir(Path::new("/nonexistent/medspec")).is_empty());
    }

    #[test]
    fn test_load_model_missing_dir() {
        let config = ModelConfig::new("/nonexistent/medspec/model");
        let err = load_model(&config).unwrap_err();
        assert!(matches!(err, MedspecError::ModelNotFound(_)));
    }

    #[test]
    fn test_load_or_degrade_returns_none() {
        let config = ModelConfig::new("/nonexistent/medspec/model");
        assert!(load_or_degrade(&config).is_none());
    }

    #[test]
    fn test_load_or_degrade_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_or_degrade(&ModelConfig::new(dir.path())).is_none());
    }
}
