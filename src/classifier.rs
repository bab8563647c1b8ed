//! Classifier seam and prediction decoding
//!
//! Every backend (the BERT checkpoint, the keyword demo model, test doubles)
//! implements [`Classifier`], which returns a probability distribution in
//! label-encoder order. [`predict_specialty`] turns that distribution into a
//! [`Prediction`] the HTTP layer can render.
//!
//! # Example
//!
//! ```rust
//! use medspec::classifier::predict_specialty;
//! use medspec::demo::KeywordClassifier;
//!
//! let classifier = KeywordClassifier::new();
//! let prediction = predict_specialty(&classifier, "ألم في الصدر وخفقان في القلب").unwrap();
//! assert_eq!(prediction.specialty, "Cardiology");
//! ```

use std::collections::BTreeMap;
use std::fmt::{self, Debug};

use serde::{Deserialize, Serialize};

use crate::error::{MedspecError, Result};
use crate::labels::LabelEncoder;

/// Compute device an inference backend runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComputeDevice {
    /// Host CPU
    Cpu,
    /// NVIDIA GPU
    Cuda,
    /// Apple GPU
    Metal,
}

impl fmt::Display for ComputeDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cpu => "cpu",
            Self::Cuda => "cuda",
            Self::Metal => "metal",
        };
        f.write_str(name)
    }
}

/// A loaded text classifier
///
/// Implementations bundle the model, its tokenizer, the label encoder and the
/// device together, so a partially loaded classifier cannot exist.
pub trait Classifier: Send + Sync + Debug {
    /// Class probabilities for `text`, indexed like [`Classifier::labels`]
    ///
    /// # Errors
    ///
    /// Returns error if tokenization or the forward pass fails.
    fn predict_proba(&self, text: &str) -> Result<Vec<f32>>;

    /// Label encoder mapping output indices to specialty names
    fn labels(&self) -> &LabelEncoder;

    /// Device inference runs on
    fn device(&self) -> ComputeDevice;

    /// Human-readable model name for diagnostics
    fn name(&self) -> &str;
}

/// Classification result for one text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Most probable specialty
    pub specialty: String,
    /// Probability of `specialty`, in percent
    pub confidence: f32,
    /// Probability of every specialty, in percent
    pub probabilities: BTreeMap<String, f32>,
}

impl Prediction {
    /// Decode a probability distribution against a label encoder
    ///
    /// # Errors
    ///
    /// Returns error if the distribution length differs from the number of
    /// labels or contains non-finite values.
    pub fn from_probabilities(probs: &[f32], labels: &LabelEncoder) -> Result<Self> {
        if probs.len() != labels.len() {
            return Err(MedspecError::InferenceError(format!(
                "model produced {} scores for {} labels",
                probs.len(),
                labels.len()
            )));
        }
        if probs.iter().any(|p| !p.is_finite()) {
            return Err(MedspecError::InferenceError(
                "model produced non-finite probabilities".to_string(),
            ));
        }

        let (top, top_prob) = probs
            .iter()
            .copied()
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |best, (i, p)| {
                if p > best.1 {
                    (i, p)
                } else {
                    best
                }
            });

        let specialty = labels
            .decode(top)
            .ok_or_else(|| MedspecError::InferenceError(format!("no label for index {top}")))?
            .to_string();

        let probabilities = labels
            .classes()
            .iter()
            .zip(probs)
            .map(|(name, p)| (name.clone(), p * 100.0))
            .collect();

        Ok(Self {
            specialty,
            confidence: top_prob * 100.0,
            probabilities,
        })
    }

    /// Probabilities sorted from most to least likely
    #[must_use]
    pub fn ranked(&self) -> Vec<(String, f32)> {
        let mut ranked: Vec<(String, f32)> = self
            .probabilities
            .iter()
            .map(|(name, p)| (name.clone(), *p))
            .collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        ranked
    }
}

/// Numerically stable softmax
///
/// Returns an empty vector for empty input.
#[must_use]
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    if logits.is_empty() {
        return Vec::new();
    }
    let max_val = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|x| (x - max_val).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Classify `text` and decode the result
///
/// The text is trimmed first; blank input is rejected before the model runs.
///
/// # Errors
///
/// Returns [`MedspecError::EmptyInput`] for blank text, or the backend's
/// error if inference fails.
pub fn predict_specialty(classifier: &dyn Classifier, text: &str) -> Result<Prediction> {
    let text = text.trim();
    if text.is_empty() {
        return Err(MedspecError::EmptyInput);
    }
    let probs = classifier.predict_proba(text)?;
    Prediction::from_probabilities(&probs, classifier.labels())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Returns a fixed distribution regardless of input
    #[derive(Debug)]
    struct FixedClassifier {
        labels: LabelEncoder,
        probs: Vec<f32>,
    }

    impl Classifier for FixedClassifier {
        fn predict_proba(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(self.probs.clone())
        }

        fn labels(&self) -> &LabelEncoder {
            &self.labels
        }

        fn device(&self) -> ComputeDevice {
            ComputeDevice::Cpu
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn labels(names: &[&str]) -> LabelEncoder {
        LabelEncoder::new(names.iter().map(|s| (*s).to_string()).collect()).unwrap()
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[1.0, 2.0, 3.0]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(probs[2] > probs[1] && probs[1] > probs[0]);
    }

    #[test]
    fn test_softmax_large_logits_stable() {
        let probs = softmax(&[1000.0, 1000.0]);
        assert!((probs[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_softmax_empty() {
        assert!(softmax(&[]).is_empty());
    }

    #[test]
    fn test_prediction_picks_max() {
        let enc = labels(&["Cardiology", "Dermatology", "Neurology"]);
        let pred = Prediction::from_probabilities(&[0.2, 0.7, 0.1], &enc).unwrap();
        assert_eq!(pred.specialty, "Dermatology");
        assert!((pred.confidence - 70.0).abs() < 1e-4);
        assert!((pred.probabilities["Neurology"] - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_prediction_length_mismatch() {
        let enc = labels(&["A", "B"]);
        let err = Prediction::from_probabilities(&[1.0], &enc).unwrap_err();
        assert!(matches!(err, MedspecError::InferenceError(_)));
    }

    #[test]
    fn test_prediction_rejects_nan() {
        let enc = labels(&["A", "B"]);
        assert!(Prediction::from_probabilities(&[f32::NAN, 0.5], &enc).is_err());
    }

    #[test]
    fn test_ranked_descending_with_name_tiebreak() {
        let enc = labels(&["B", "A", "C"]);
        let pred = Prediction::from_probabilities(&[0.4, 0.4, 0.2], &enc).unwrap();
        let ranked = pred.ranked();
        let names: Vec<&str> = ranked.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_predict_specialty_rejects_blank() {
        let classifier = FixedClassifier {
            labels: labels(&["A"]),
            probs: vec![1.0],
        };
        let err = predict_specialty(&classifier, "   \n").unwrap_err();
        assert!(matches!(err, MedspecError::EmptyInput));
    }

    #[test]
    fn test_predict_specialty_decodes() {
        let classifier = FixedClassifier {
            labels: labels(&["A", "B"]),
            probs: vec![0.1, 0.9],
        };
        let pred = predict_specialty(&classifier, "text").unwrap();
        assert_eq!(pred.specialty, "B");
    }

    #[test]
    fn test_compute_device_display() {
        assert_eq!(ComputeDevice::Cpu.to_string(), "cpu");
        assert_eq!(ComputeDevice::Cuda.to_string(), "cuda");
        assert_eq!(
            serde_json::to_string(&ComputeDevice::Metal).unwrap(),
            "\"metal\""
        );
    }
}
