//! Statistical classifier seam. The model is opaque: a dense numeric matrix in, one class id per
//! row out. Loaded once at startup and shared read-only.

mod onnx;

pub use onnx::OnnxClassifier;

use crate::features::FeatureMatrix;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("onnx runtime: {0}")]
    Runtime(String),
    #[error("invalid input shape: {0}")]
    Shape(String),
    #[error("model produced no usable output: {0}")]
    Output(String),
}

impl From<ort::OrtError> for ClassifierError {
    fn from(e: ort::OrtError) -> Self {
        ClassifierError::Runtime(e.to_string())
    }
}

pub trait Classifier: Send + Sync {
    /// One class id per matrix row, in row order.
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<i64>, ClassifierError>;

    fn name(&self) -> &str;
}

/// Shared handle; `None` disables the classifier path.
pub type SharedClassifier = Arc<dyn Classifier>;

/// Load the ONNX model at `path`. Any failure is logged and yields `None`; it never aborts.
pub fn load_classifier(path: &Path) -> Option<SharedClassifier> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "classifier model not found; classifier scoring disabled");
        return None;
    }
    // ort panics rather than erroring when the dynamic runtime library cannot be loaded.
    match std::panic::catch_unwind(|| OnnxClassifier::load(path)) {
        Ok(Ok(model)) => {
            tracing::info!(classifier = model.name(), "classifier model loaded");
            Some(Arc::new(model))
        }
        Ok(Err(e)) => {
            tracing::error!(path = %path.display(), error = %e, "failed to load classifier model");
            None
        }
        Err(_) => {
            tracing::error!(path = %path.display(), "onnx runtime unavailable");
            None
        }
    }
}
