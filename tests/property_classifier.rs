//! Property-based tests for probability handling and label decoding
//!
//! Covers softmax normalization, prediction invariants (confidence equals the
//! top probability, percentages sum to 100) and label file parsing.

use std::collections::HashMap;

use medspec::classifier::{predict_specialty, softmax, Prediction};
use medspec::demo::KeywordClassifier;
use medspec::labels::LabelEncoder;
use proptest::prelude::*;

fn encoder(n: usize) -> LabelEncoder {
    LabelEncoder::new((0..n).map(|i| format!("Specialty{i}")).collect()).expect("test")
}

// ============================================================================
// Softmax
// ============================================================================

#[test]
fn test_softmax_empty() {
    assert!(softmax(&[]).is_empty());
}

#[test]
fn test_softmax_large_logits_stay_finite() {
    let probs = softmax(&[1000.0, 1000.0]);
    assert!(probs.iter().all(|p| p.is_finite()));
    assert!((probs[0] - 0.5).abs() < 1e-6);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_softmax_is_distribution(logits in prop::collection::vec(-50.0f32..50.0, 1..32)) {
        let probs = softmax(&logits);
        prop_assert_eq!(probs.len(), logits.len());
        prop_assert!(probs.iter().all(|p| *p >= 0.0 && *p <= 1.0));
        let total: f32 = probs.iter().sum();
        prop_assert!((total - 1.0).abs() < 1e-4);
    }

    #[test]
    fn prop_softmax_preserves_argmax(logits in prop::collection::vec(-50.0f32..50.0, 1..32)) {
        let probs = softmax(&logits);
        let top_logit = logits
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .expect("non-empty");
        let top_prob = probs[top_logit];
        prop_assert!(probs.iter().all(|p| *p <= top_prob));
    }
}

// ============================================================================
// Prediction
// ============================================================================

#[test]
fn test_prediction_rejects_length_mismatch() {
    assert!(Prediction::from_probabilities(&[0.5, 0.5], &encoder(3)).is_err());
}

#[test]
fn test_prediction_rejects_nan() {
    assert!(Prediction::from_probabilities(&[f32::NAN, 0.5], &encoder(2)).is_err());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_prediction_invariants(logits in prop::collection::vec(-20.0f32..20.0, 2..16)) {
        let labels = encoder(logits.len());
        let prediction = Prediction::from_probabilities(&softmax(&logits), &labels).expect("valid");

        prop_assert_eq!(prediction.probabilities.len(), labels.len());
        let max = prediction.probabilities.values().copied().fold(f32::NEG_INFINITY, f32::max);
        prop_assert!((prediction.confidence - max).abs() < 1e-4);
        prop_assert!(prediction.confidence >= 0.0 && prediction.confidence <= 100.0);
        let total: f32 = prediction.probabilities.values().sum();
        prop_assert!((total - 100.0).abs() < 0.01);
        prop_assert!(labels.classes().contains(&prediction.specialty));
    }

    #[test]
    fn prop_ranked_is_descending(logits in prop::collection::vec(-20.0f32..20.0, 2..16)) {
        let labels = encoder(logits.len());
        let prediction = Prediction::from_probabilities(&softmax(&logits), &labels).expect("valid");
        let ranked = prediction.ranked();
        prop_assert_eq!(ranked.len(), logits.len());
        prop_assert!(ranked.windows(2).all(|w| w[0].1 >= w[1].1));
        prop_assert!((ranked[0].1 - prediction.confidence).abs() < 1e-4);
    }

    #[test]
    fn prop_demo_classifier_total(text in "\\PC{1,200}") {
        prop_assume!(!text.trim().is_empty());
        let prediction = predict_specialty(&KeywordClassifier::new(), &text).expect("non-empty");
        let total: f32 = prediction.probabilities.values().sum();
        prop_assert!((total - 100.0).abs() < 0.01);
    }
}

// ============================================================================
// LabelEncoder
// ============================================================================

#[test]
fn test_label_file_object_form() {
    let labels = LabelEncoder::from_json(r#"{"classes": ["Cardiology", "Neurology"]}"#)
        .expect("test");
    assert_eq!(labels.decode(1), Some("Neurology"));
    assert_eq!(labels.decode(2), None);
}

#[test]
fn test_label_file_rejects_empty() {
    assert!(LabelEncoder::from_json("[]").is_err());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_label_list_decodes_in_order(
        names in prop::collection::hash_set("[A-Z][a-z]{3,12}", 1..12)
    ) {
        let names: Vec<String> = names.into_iter().collect();
        let json = serde_json::to_string(&names).expect("serialize");
        let labels = LabelEncoder::from_json(&json).expect("valid");
        for (i, name) in names.iter().enumerate() {
            prop_assert_eq!(labels.decode(i), Some(name.as_str()));
        }
    }

    #[test]
    fn prop_id2label_orders_by_index(
        names in prop::collection::hash_set("[A-Z][a-z]{3,12}", 1..12)
    ) {
        let names: Vec<String> = names.into_iter().collect();
        let id2label: HashMap<String, String> = names
            .iter()
            .enumerate()
            .rev()
            .map(|(i, name)| (i.to_string(), name.clone()))
            .collect();
        let labels = LabelEncoder::from_id2label(&id2label).expect("valid");
        prop_assert_eq!(labels.classes(), names.as_slice());
    }
}
