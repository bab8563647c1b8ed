//! Label encoder: class index to specialty name
//!
//! Fine-tuned checkpoints ship their class names either in a dedicated
//! `label_encoder.json` or in the `id2label` table of `config.json`. Both are
//! accepted here; `label_encoder.json` wins when present.
//!
//! ```rust
//! use medspec::labels::LabelEncoder;
//!
//! let encoder = LabelEncoder::new(vec!["Cardiology".into(), "Neurology".into()]).unwrap();
//! assert_eq!(encoder.decode(1), Some("Neurology"));
//! assert_eq!(encoder.len(), 2);
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;

use crate::error::{MedspecError, Result};

/// File name of the standalone label encoder
pub const LABEL_ENCODER_FILE: &str = "label_encoder.json";

/// Accepted shapes of `label_encoder.json`
#[derive(Deserialize)]
#[serde(untagged)]
enum LabelFile {
    /// `["Cardiology", "Dermatology", ...]`
    List(Vec<String>),
    /// `{"classes": ["Cardiology", ...]}`
    Object { classes: Vec<String> },
}

/// Ordered mapping from model output index to specialty name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Create an encoder from class names in output-index order
    ///
    /// # Errors
    ///
    /// Returns error if the list is empty, contains a blank name, or contains
    /// duplicates.
    pub fn new(classes: Vec<String>) -> Result<Self> {
        if classes.is_empty() {
            return Err(MedspecError::LabelEncoder(
                "label set is empty".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(classes.len());
        for name in &classes {
            if name.trim().is_empty() {
                return Err(MedspecError::LabelEncoder(
                    "label names must not be blank".to_string(),
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(MedspecError::LabelEncoder(format!(
                    "duplicate label '{name}'"
                )));
            }
        }

        Ok(Self { classes })
    }

    /// Wrap a compiled-in label table without validation
    pub(crate) fn from_builtin(classes: Vec<String>) -> Self {
        Self { classes }
    }

    /// Parse the contents of `label_encoder.json`
    ///
    /// # Errors
    ///
    /// Returns error if the JSON has neither accepted shape or the label set
    /// is invalid.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: LabelFile = serde_json::from_str(json).map_err(|e| {
            MedspecError::LabelEncoder(format!(
                "expected a list of names or {{\"classes\": [...]}}: {e}"
            ))
        })?;
        let classes = match file {
            LabelFile::List(classes) | LabelFile::Object { classes } => classes,
        };
        Self::new(classes)
    }

    /// Build from a HuggingFace `id2label` table
    ///
    /// Keys must be the indices `0..n` with no gaps. Tables consisting only
    /// of the generic `LABEL_<i>` placeholders are rejected, since they carry
    /// no specialty names.
    ///
    /// # Errors
    ///
    /// Returns error on non-numeric keys, gaps, or placeholder-only tables.
    pub fn from_id2label(id2label: &HashMap<String, String>) -> Result<Self> {
        let mut indexed = Vec::with_capacity(id2label.len());
        for (key, name) in id2label {
            let index: usize = key.parse().map_err(|_| {
                MedspecError::LabelEncoder(format!("id2label key '{key}' is not an index"))
            })?;
            indexed.push((index, name.clone()));
        }
        indexed.sort_by_key(|(index, _)| *index);

        if let Some(pos) = indexed.iter().enumerate().position(|(i, (index, _))| i != *index) {
            return Err(MedspecError::LabelEncoder(format!(
                "id2label is missing index {pos}"
            )));
        }

        if !indexed.is_empty()
            && indexed
                .iter()
                .all(|(index, name)| *name == format!("LABEL_{index}"))
        {
            return Err(MedspecError::LabelEncoder(
                "id2label only contains placeholder names".to_string(),
            ));
        }

        Self::new(indexed.into_iter().map(|(_, name)| name).collect())
    }

    /// Load the encoder for a model directory
    ///
    /// Reads `label_encoder.json` when present, otherwise falls back to the
    /// `id2label` table passed in from `config.json`.
    ///
    /// # Errors
    ///
    /// Returns error if neither source yields a valid label set.
    pub fn load(model_dir: &Path, id2label: Option<&HashMap<String, String>>) -> Result<Self> {
        let path = model_dir.join(LABEL_ENCODER_FILE);
        if path.is_file() {
            let json = std::fs::read_to_string(&path).map_err(|e| MedspecError::IoError {
                message: format!("Failed to read {}: {e}", path.display()),
            })?;
            return Self::from_json(&json);
        }

        match id2label {
            Some(table) => Self::from_id2label(table),
            None => Err(MedspecError::LabelEncoder(format!(
                "no {LABEL_ENCODER_FILE} and no id2label in config.json under {}",
                model_dir.display()
            ))),
        }
    }

    /// Specialty name for an output index
    #[must_use]
    pub fn decode(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(String::as_str)
    }

    /// Number of classes
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Always false; an encoder cannot be constructed without classes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Class names in output-index order
    #[must_use]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}
