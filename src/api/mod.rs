//! HTTP API and web front end
//!
//! Serves the classifier to browsers (HTML form and result page) and to
//! programs (JSON) using axum.
//!
//! ## Endpoints
//!
//! - `GET /` - Home page with the input form
//! - `POST /predict` - Form field `text` (urlencoded or multipart) → rendered result page
//! - `GET /static/js/script.js` - Page script (input bounds, loading overlay, bars)
//! - `POST /api/predict` - `{"text": ...}` → `{specialty, confidence, probabilities}`
//! - `GET /health` - Liveness/readiness probe (503 while no model is loaded)
//! - `GET /debug-info` - Model and filesystem diagnostics
//!
//! ## Example
//!
//! ```rust,ignore
//! use medspec::api::{create_router, AppState};
//!
//! let state = AppState::demo()?;
//! let app = create_router(state);
//! axum::serve(listener, app).await?;
//! ```

use std::sync::Arc;

use axum::{
    http::StatusCode,
    routing::{get, post},
    Router,
};
use tracing::warn;

use crate::{
    classifier::Classifier,
    config::ServerConfig,
    demo::KeywordClassifier,
    error::{MedspecError, Result},
    pages::{PageRenderer, SCRIPT_PATH},
};

mod predict_handlers;
mod system_handlers;
pub mod types;

#[cfg(test)]
mod test_helpers;
#[cfg(test)]
mod tests;

pub use types::{DebugInfoResponse, ErrorResponse, HealthResponse, PredictForm, PredictRequest};

use predict_handlers::{api_predict_handler, predict_form_handler};
use system_handlers::{debug_info_handler, health_handler, home_handler, script_handler};

/// Application state shared across handlers
///
/// The classifier is either fully loaded or absent; it is never swapped
/// after startup.
#[derive(Clone)]
pub struct AppState {
    /// Loaded classifier, if startup loading succeeded
    model: Option<Arc<dyn Classifier>>,
    /// HTML page renderer
    pages: Arc<PageRenderer>,
    /// Configuration the server was started with
    config: Arc<ServerConfig>,
}

impl AppState {
    /// Create application state
    ///
    /// # Arguments
    ///
    /// * `model` - Loaded classifier, or `None` to serve degraded
    /// * `config` - Server configuration; `templates_dir` overrides built-in pages
    ///
    /// # Errors
    ///
    /// Returns error if a page template fails to load.
    pub fn new(model: Option<Arc<dyn Classifier>>, config: ServerConfig) -> Result<Self> {
        let pages = match &config.templates_dir {
            Some(dir) if dir.is_dir() => PageRenderer::with_overrides(dir)?,
            Some(dir) => {
                warn!(path = %dir.display(), "templates directory not found, using built-in pages");
                PageRenderer::new()?
            },
            None => PageRenderer::new()?,
        };

        Ok(Self {
            model,
            pages: Arc::new(pages),
            config: Arc::new(config),
        })
    }

    /// Create state backed by the keyword demo classifier
    ///
    /// # Errors
    ///
    /// Returns error if a page template fails to load.
    pub fn demo() -> Result<Self> {
        Self::new(
            Some(Arc::new(KeywordClassifier::new())),
            ServerConfig::default(),
        )
    }

    /// Loaded classifier, if any
    #[must_use]
    pub fn model(&self) -> Option<&Arc<dyn Classifier>> {
        self.model.as_ref()
    }

    /// Whether a classifier is loaded
    #[must_use]
    pub fn is_model_loaded(&self) -> bool {
        self.model.is_some()
    }

    /// Server configuration
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub(crate) fn pages(&self) -> &PageRenderer {
        &self.pages
    }
}

/// HTTP status for an error surfaced at a handler boundary
pub(crate) fn status_for(err: &MedspecError) -> StatusCode {
    match err {
        MedspecError::EmptyInput => StatusCode::BAD_REQUEST,
        MedspecError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        MedspecError::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Create the API router
///
/// # Arguments
///
/// * `state` - Application state with the (optional) classifier
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Browser front end
        .route("/", get(home_handler))
        .route("/predict", post(predict_form_handler))
        .route(SCRIPT_PATH, get(script_handler))
        // JSON API
        .route("/api/predict", post(api_predict_handler))
        // Probes and diagnostics
        .route("/health", get(health_handler))
        .route("/debug-info", get(debug_info_handler))
        .with_state(state)
}
