//! Test helper functions for api tests

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use tower::util::ServiceExt;

use super::*;
use crate::classifier::ComputeDevice;
use crate::labels::LabelEncoder;

/// Classifier whose forward pass always fails
#[derive(Debug)]
pub struct FailingClassifier {
    labels: LabelEncoder,
}

impl FailingClassifier {
    pub fn new() -> Self {
        Self {
            labels: LabelEncoder::new(vec!["Cardiology".into(), "Neurology".into()])
                .expect("test"),
        }
    }
}

impl Classifier for FailingClassifier {
    fn predict_proba(&self, _text: &str) -> Result<Vec<f32>> {
        Err(MedspecError::InferenceError("CUDA out of memory".to_string()))
    }

    fn labels(&self) -> &LabelEncoder {
        &self.labels
    }

    fn device(&self) -> ComputeDevice {
        ComputeDevice::Cuda
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Classifier whose forward pass panics
#[derive(Debug)]
pub struct PanicClassifier {
    labels: LabelEncoder,
}

impl PanicClassifier {
    pub fn new() -> Self {
        Self {
            labels: LabelEncoder::new(vec!["Cardiology".into(), "Neurology".into()])
                .expect("test"),
        }
    }
}

impl Classifier for PanicClassifier {
    fn predict_proba(&self, _text: &str) -> Result<Vec<f32>> {
        panic!("forward pass aborted");
    }

    fn labels(&self) -> &LabelEncoder {
        &self.labels
    }

    fn device(&self) -> ComputeDevice {
        ComputeDevice::Cpu
    }

    fn name(&self) -> &str {
        "panicking"
    }
}

/// Create a test application with the demo classifier
pub fn create_test_app() -> Router {
    create_router(AppState::demo().expect("test"))
}

/// Create a test application with no model loaded
pub fn create_unloaded_app() -> Router {
    create_router(AppState::new(None, ServerConfig::default()).expect("test"))
}

/// Create a test application whose classifier always errors
pub fn create_failing_app() -> Router {
    let model: Arc<dyn Classifier> = Arc::new(FailingClassifier::new());
    create_router(AppState::new(Some(model), ServerConfig::default()).expect("test"))
}

/// Create a test application whose classifier panics mid-request
pub fn create_panicking_app() -> Router {
    let model: Arc<dyn Classifier> = Arc::new(PanicClassifier::new());
    create_router(AppState::new(Some(model), ServerConfig::default()).expect("test"))
}

/// Create a demo application whose pages come from `dir`
pub fn create_app_with_templates(dir: &std::path::Path) -> Router {
    let model: Arc<dyn Classifier> = Arc::new(crate::demo::KeywordClassifier::new());
    let config = ServerConfig {
        templates_dir: Some(dir.to_path_buf()),
        ..ServerConfig::default()
    };
    create_router(AppState::new(Some(model), config).expect("test"))
}

/// Send a request and return status and body text
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.oneshot(request).await.expect("test");
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("test");
    (status, String::from_utf8(body.to_vec()).expect("test"))
}

/// POST a JSON body to /api/predict
pub fn json_predict(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/predict")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("test")
}

/// POST a urlencoded form to /predict
pub fn form_predict(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .expect("test")
}

/// GET a path
pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("test")
}

/// POST a multipart form with one field to /predict
pub fn multipart_predict(field: &str, value: &str) -> Request<Body> {
    let body = format!(
        "--XBOUND\r\n\
         Content-Disposition: form-data; name=\"{field}\"\r\n\r\n\
         {value}\r\n\
         --XBOUND--\r\n"
    );
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header("content-type", "multipart/form-data; boundary=XBOUND")
        .body(Body::from(body))
        .expect("test")
}
