use serde::Serialize;
use thiserror::Error;

use crate::photos::model::Photo;

/// Outcome of one file inside an upload batch.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Committed { file: String, photo: Photo },
    Failed { file: String, error: String },
}

/// Every error an exposed gallery operation can return.
#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("caller does not own this resource")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("{} of {} files failed", failed_count(.outcomes), .outcomes.len())]
    PartialBatchFailure { outcomes: Vec<FileOutcome> },
}

fn failed_count(outcomes: &[FileOutcome]) -> usize {
    outcomes
        .iter()
        .filter(|o| matches!(o, FileOutcome::Failed { .. }))
        .count()
}

impl GalleryError {
    /// Wraps an SDK or transport error, prefixed with the failing operation.
    pub fn store(operation: &str, err: impl std::fmt::Display) -> Self {
        GalleryError::Store(format!("{} error: {}", operation, err))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        GalleryError::Validation(msg.into())
    }

    /// Stable machine-readable kind, used in HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            GalleryError::Unauthenticated => "Unauthenticated",
            GalleryError::Forbidden => "Forbidden",
            GalleryError::NotFound(_) => "NotFound",
            GalleryError::Validation(_) => "ValidationError",
            GalleryError::Store(_) => "StoreError",
            GalleryError::PartialBatchFailure { .. } => "PartialBatchFailure",
        }
    }
}

pub type GalleryResult<T> = Result<T, GalleryError>;
