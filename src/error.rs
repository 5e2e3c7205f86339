//! Pipeline error kinds. Every fallible stage returns [`Result`].

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Dataset file does not exist.
    #[error("data file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// Dataset parsed but holds no rows.
    #[error("data file is empty: {}", .0.display())]
    EmptyDataset(PathBuf),
    /// Required columns absent and auto-heal disabled.
    #[error("missing required columns: {missing:?}")]
    Schema { missing: Vec<String> },
    /// Split or fit could not run on the given matrix.
    #[error("training failed: {0}")]
    Training(String),
    /// No regressor artifact stored under the tag.
    #[error("no model for tag '{tag}'")]
    ModelNotFound { tag: String },
    #[error("invalid model tag '{0}'")]
    InvalidTag(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn training(msg: impl Into<String>) -> Self {
        PipelineError::Training(msg.into())
    }

    /// True when callers should fall back to fresh training.
    pub fn is_model_not_found(&self) -> bool {
        matches!(self, PipelineError::ModelNotFound { .. })
    }
}
