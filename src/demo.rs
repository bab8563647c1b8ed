//! Keyword-based demo classifier
//!
//! Lets the server run without a fine-tuned checkpoint (`medspec serve
//! --demo`). Each specialty has a small list of Arabic and English keywords;
//! the logit for a specialty is proportional to the number of keyword hits,
//! and the distribution is the softmax of those logits. Deterministic, so it
//! doubles as the classifier for router tests.

use crate::classifier::{softmax, Classifier, ComputeDevice};
use crate::error::Result;
use crate::labels::LabelEncoder;

/// Logit added per keyword hit
const HIT_WEIGHT: f32 = 2.0;

/// Specialties and their trigger words
const SPECIALTY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Cardiology",
        &["قلب", "صدر", "خفقان", "ضغط الدم", "heart", "chest", "palpitation"],
    ),
    (
        "Dermatology",
        &["جلد", "حكة", "طفح", "حبوب", "skin", "rash", "itch"],
    ),
    (
        "Gastroenterology",
        &["معدة", "بطن", "إسهال", "امساك", "حموضة", "stomach", "diarrhea"],
    ),
    (
        "Neurology",
        &["صداع", "دوخة", "تنميل", "صرع", "headache", "dizziness", "numbness"],
    ),
    (
        "Ophthalmology",
        &["عين", "نظر", "رؤية", "eye", "vision"],
    ),
    (
        "Orthopedics",
        &["عظم", "مفصل", "كسر", "ركبة", "ظهر", "bone", "joint", "fracture"],
    ),
    (
        "Otolaryngology",
        &["أذن", "حلق", "أنف", "لوز", "ear", "throat", "nose"],
    ),
    (
        "Pediatrics",
        &["طفل", "رضيع", "ابني", "ابنتي", "child", "infant"],
    ),
];

/// Deterministic keyword classifier
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    labels: LabelEncoder,
}

impl KeywordClassifier {
    /// Create the classifier with the built-in specialty set
    #[must_use]
    pub fn new() -> Self {
        let classes = SPECIALTY_KEYWORDS
            .iter()
            .map(|(name, _)| (*name).to_string())
            .collect();
        Self {
            labels: LabelEncoder::from_builtin(classes),
        }
    }

    fn hits(text: &str, keywords: &[&str]) -> usize {
        keywords
            .iter()
            .map(|kw| text.matches(kw).count())
            .sum()
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for KeywordClassifier {
    fn predict_proba(&self, text: &str) -> Result<Vec<f32>> {
        let text = text.to_lowercase();
        let logits: Vec<f32> = SPECIALTY_KEYWORDS
            .iter()
            .map(|(_, keywords)| Self::hits(&text, keywords) as f32 * HIT_WEIGHT)
            .collect();
        Ok(softmax(&logits))
    }

    fn labels(&self) -> &LabelEncoder {
        &self.labels
    }

    fn device(&self) -> ComputeDevice {
        ComputeDevice::Cpu
    }

    fn name(&self) -> &str {
        "keyword-demo"
    }
}
