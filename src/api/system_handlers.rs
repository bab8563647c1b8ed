//! Home page, health probe and diagnostics handlers

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use tracing::{debug, error};

use super::{AppState, DebugInfoResponse, HealthResponse};
use crate::model_loader::list_dir;
use crate::pages::SCRIPT_SOURCE;

/// Home page handler (/)
pub(crate) async fn home_handler(State(state): State<AppState>) -> Response {
    debug!("home page requested");
    match state.pages().index() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!(error = %e, "failed to render home page");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render home page").into_response()
        },
    }
}

/// Page script handler (/static/js/script.js)
pub(crate) async fn script_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        SCRIPT_SOURCE,
    )
}

/// Health check handler (/health)
///
/// 200 with a loaded model, 503 otherwise, so load balancers keep traffic
/// away from a degraded instance.
pub(crate) async fn health_handler(
    State(state): State<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let model_loaded = state.is_model_loaded();
    debug!(model_loaded, "health check");

    let (status, label) = if model_loaded {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };

    (
        status,
        Json(HealthResponse {
            status: label.to_string(),
            model_loaded,
            version: crate::VERSION.to_string(),
        }),
    )
}

/// Diagnostics handler (/debug-info)
pub(crate) async fn debug_info_handler(State(state): State<AppState>) -> Json<DebugInfoResponse> {
    let config = state.config();
    let model = state.model();
    let loaded = model.is_some();

    let current_dir = std::env::current_dir().ok();
    let model_path = &config.model.model_dir;
    let templates_dir = config.templates_dir.as_ref();

    let info = DebugInfoResponse {
        model_loaded: loaded,
        tokenizer_loaded: loaded,
        label_encoder_loaded: loaded,
        device: model.map(|m| m.device().to_string()),
        model_name: model.map(|m| m.name().to_string()),
        labels: model
            .map(|m| m.labels().classes().to_vec())
            .unwrap_or_default(),
        current_dir: current_dir.as_ref().map(|dir| dir.display().to_string()),
        model_path: model_path.display().to_string(),
        model_path_exists: model_path.is_dir(),
        templates_dir: templates_dir.map(|dir| dir.display().to_string()),
        templates_exists: templates_dir.is_some_and(|dir| dir.is_dir()),
        version: crate::VERSION.to_string(),
        model_files: list_dir(model_path),
        all_files: current_dir.as_deref().map(list_dir).unwrap_or_default(),
    };

    debug!(?info, "debug info");
    Json(info)
}
