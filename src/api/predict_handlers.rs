//! Prediction handlers for the form and JSON routes

use std::fmt::Display;

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Multipart, Request, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Form, Json,
};
use tracing::{error, info, warn};

use super::{status_for, AppState, ErrorResponse, PredictForm, PredictRequest};
use crate::{
    classifier::{predict_specialty, Prediction},
    error::{MedspecError, Result},
    pages::ResultView,
};

/// Characters of input text shown in request logs
const LOG_PREVIEW_CHARS: usize = 100;

/// Name of the form field carrying the clinical text
const TEXT_FIELD: &str = "text";

/// First [`LOG_PREVIEW_CHARS`] characters of `text`, with an ellipsis if cut
pub(crate) fn preview(text: &str) -> String {
    match text.char_indices().nth(LOG_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Map an unreadable request body to the error reported to the client
///
/// Bodies over the size limit are reported as such; anything else counts
/// as missing text.
fn body_error(status: StatusCode, cause: &dyn Display) -> MedspecError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        warn!(error = %cause, "request body too large");
        MedspecError::PayloadTooLarge
    } else {
        warn!(error = %cause, "unreadable request body");
        MedspecError::EmptyInput
    }
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| {
            value
                .to_ascii_lowercase()
                .starts_with("multipart/form-data")
        })
}

/// Read the `text` field of a urlencoded or multipart form body
///
/// A multipart body without a `text` part yields empty text.
async fn read_form_text(request: Request) -> Result<String> {
    if !is_multipart(request.headers()) {
        return match Form::<PredictForm>::from_request(request, &()).await {
            Ok(Form(form)) => Ok(form.text),
            Err(rejection) => Err(body_error(rejection.status(), &rejection)),
        };
    }

    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|rejection| body_error(rejection.status(), &rejection))?;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| body_error(e.status(), &e))?
    {
        if field.name() == Some(TEXT_FIELD) {
            return field.text().await.map_err(|e| body_error(e.status(), &e));
        }
    }
    Ok(String::new())
}

/// Validate, then run the classifier off the async executor
async fn classify(state: &AppState, text: String) -> Result<Prediction> {
    if text.trim().is_empty() {
        return Err(MedspecError::EmptyInput);
    }
    let model = state.model().cloned().ok_or(MedspecError::ModelUnavailable)?;

    let prediction = tokio::task::spawn_blocking(move || predict_specialty(&*model, &text))
        .await
        .map_err(|e| MedspecError::InferenceError(format!("inference task failed: {e}")))??;

    info!(
        specialty = %prediction.specialty,
        confidence = %format_args!("{:.2}%", prediction.confidence),
        "prediction"
    );
    Ok(prediction)
}

/// Log a failed prediction at a level matching its cause
fn log_failure(route: &str, err: &MedspecError) {
    match err {
        MedspecError::EmptyInput => warn!(route, "no text provided"),
        MedspecError::PayloadTooLarge => warn!(route, "request body too large"),
        MedspecError::ModelUnavailable => warn!(route, "model not available"),
        other => error!(route, error = %other, "prediction failed"),
    }
}

/// Render `result.html`, falling back to plain text if the template breaks
fn render_result(state: &AppState, status: StatusCode, view: &ResultView) -> Response {
    match state.pages().result(view) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            error!(error = %e, "failed to render result page");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to render result page",
            )
                .into_response()
        },
    }
}

/// Result page for a failed form prediction
fn form_failure(state: &AppState, err: &MedspecError) -> Response {
    log_failure("/predict", err);
    let message = match err {
        MedspecError::EmptyInput => "Please provide some text to analyze",
        MedspecError::PayloadTooLarge => "The text is too long",
        MedspecError::ModelUnavailable => "Model not available",
        _ => "Prediction failed",
    };
    render_result(state, status_for(err), &ResultView::error(message))
}

/// Form prediction handler (/predict)
///
/// Accepts `application/x-www-form-urlencoded` and `multipart/form-data`.
pub(crate) async fn predict_form_handler(
    State(state): State<AppState>,
    request: Request,
) -> Response {
    let text = match read_form_text(request).await {
        Ok(text) => text.trim().to_string(),
        Err(err) => return form_failure(&state, &err),
    };
    info!(text = %preview(&text), "form prediction requested");

    match classify(&state, text.clone()).await {
        Ok(prediction) => render_result(
            &state,
            StatusCode::OK,
            &ResultView::success(&text, &prediction),
        ),
        Err(err) => form_failure(&state, &err),
    }
}

/// JSON prediction handler (/api/predict)
pub(crate) async fn api_predict_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<PredictRequest>, JsonRejection>,
) -> std::result::Result<Json<Prediction>, (StatusCode, Json<ErrorResponse>)> {
    let result = match payload {
        Ok(Json(request)) => {
            let text = request.text.trim().to_string();
            info!(text = %preview(&text), "API prediction requested");
            classify(&state, text).await
        },
        Err(rejection) => Err(body_error(rejection.status(), &rejection)),
    };

    result.map(Json).map_err(|err| {
        log_failure("/api/predict", &err);
        let message = match err {
            MedspecError::EmptyInput => "No text provided",
            MedspecError::PayloadTooLarge => "Request body too large",
            MedspecError::ModelUnavailable => "Model not available",
            _ => "Prediction failed",
        };
        (status_for(&err), Json(ErrorResponse::new(message)))
    })
}
