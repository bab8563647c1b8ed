//! # medspec
//!
//! Medical specialty classification for Arabic clinical text, served over
//! HTTP.
//!
//! A fine-tuned BERT checkpoint (MARBERT in production) reads a free-text
//! description of symptoms and predicts which medical specialty should handle
//! it. This crate loads the checkpoint once at startup and exposes it through
//! a small web front end and a JSON API.
//!
//! ## Example
//!
//! ```rust
//! use medspec::classifier::predict_specialty;
//! use medspec::demo::KeywordClassifier;
//!
//! let classifier = KeywordClassifier::new();
//! let prediction = predict_specialty(&classifier, "ألم في المعدة وإسهال").unwrap();
//! assert_eq!(prediction.specialty, "Gastroenterology");
//! assert!(prediction.confidence > 50.0);
//! ```
//!
//! ## Architecture
//!
//! - [`classifier`]: the [`classifier::Classifier`] seam every backend implements
//! - [`bert`]: candle-based BERT sequence classifier (feature `bert`)
//! - [`demo`]: keyword classifier for running without a checkpoint
//! - [`model_loader`]: startup loading that degrades instead of crashing
//! - [`api`]: axum router, handlers and shared state

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)] // usize -> f32 for keyword scores
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_panics_doc)]

pub mod api;
pub mod bert;
pub mod classifier;
pub mod config;
pub mod demo;
pub mod error;
pub mod labels;
pub mod model_loader;
pub mod pages;

// Re-exports for convenience
pub use error::{MedspecError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(VERSION.starts_with("0."));
        assert!(VERSION.contains('.'));
    }
}
