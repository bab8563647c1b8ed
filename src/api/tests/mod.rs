//! API Tests
//!
//! - predict: form and JSON prediction routes
//! - system: home page, health probe, debug info
