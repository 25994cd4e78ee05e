//! Batch-scoped failures. Per-record problems never land here; they resolve to NAP.

use thiserror::Error;

use crate::model::ClassifierError;

#[derive(Debug, Error)]
pub enum LabelError {
    #[error("input batch is empty")]
    EmptyBatch,

    #[error("malformed batch at line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("missing expected column: {0}")]
    MissingColumn(String),

    #[error("classifier failed: {0}")]
    Classifier(#[from] ClassifierError),

    #[error("classifier returned {got} predictions for {expected} rows")]
    PredictionCount { expected: usize, got: usize },

    #[error("classifier returned unknown class id {0}")]
    UnknownClass(i64),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl LabelError {
    /// True when the caller sent something unusable, as opposed to a failure on our side.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            LabelError::EmptyBatch
                | LabelError::Malformed { .. }
                | LabelError::MissingColumn(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, LabelError>;
