use serde::{Deserialize, Serialize};

use crate::error::{FileOutcome, GalleryError};
use crate::photos::model::Photo;

/// A local file queued for upload
#[derive(Debug, Clone)]
pub struct LocalFile {
    pub name: String,
    /// Declared MIME type, e.g. from the file picker or the extension
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl LocalFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn byte_size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Metadata shared by every file in one batch
#[derive(Debug, Clone, Default)]
pub struct BatchMetadata {
    pub title: String,
    pub description: Option<String>,
    pub category_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTicketPayload {
    pub filename: String,
}

/// Metadata commit for bytes already sitting at `storage_path`
#[derive(Debug, Clone, Deserialize)]
pub struct CommitPhotoPayload {
    pub title: String,
    pub description: Option<String>,
    pub storage_path: String,
    #[serde(default)]
    pub category_ids: Vec<i64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub byte_size: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStage {
    Requesting,
    Transferring,
    Measuring,
    Committing,
    Committed,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub file: String,
    pub error: String,
}

/// Per-file results of one batch, in batch order
#[derive(Debug, Clone, Default, Serialize)]
pub struct UploadReport {
    pub committed: Vec<Photo>,
    pub failures: Vec<FileFailure>,
    #[serde(skip)]
    pub outcomes: Vec<FileOutcome>,
}

impl UploadReport {
    pub(crate) fn record_committed(&mut self, file: &str, photo: Photo) {
        self.outcomes.push(FileOutcome::Committed {
            file: file.to_string(),
            photo: photo.clone(),
        });
        self.committed.push(photo);
    }

    pub(crate) fn record_failed(&mut self, file: &str, error: &GalleryError) {
        self.outcomes.push(FileOutcome::Failed {
            file: file.to_string(),
            error: error.to_string(),
        });
        self.failures.push(FileFailure {
            file: file.to_string(),
            error: error.to_string(),
        });
    }

    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// All committed photos, or `PartialBatchFailure` carrying every outcome.
    pub fn into_result(self) -> Result<Vec<Photo>, GalleryError> {
        if self.failures.is_empty() {
            Ok(self.committed)
        } else {
            Err(GalleryError::PartialBatchFailure {
                outcomes: self.outcomes,
            })
        }
    }
}
