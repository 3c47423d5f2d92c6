pub mod s3;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::GalleryResult;

pub use s3::S3ObjectStore;

/// Short-lived, path-scoped write credential. Consumed by at most one transfer.
#[derive(Debug, Clone, Serialize)]
pub struct UploadTicket {
    pub upload_url: String,
    pub storage_path: String,
    /// Bearer token for stores that do not embed the credential in the URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    /// Headers the signature covers; the transfer must send them verbatim
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<(String, String)>,
    pub expires_at: DateTime<Utc>,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_signed(&self, path: &str) -> GalleryResult<UploadTicket>;

    fn public_url(&self, path: &str) -> String;

    async fn delete(&self, path: &str) -> GalleryResult<()>;
}
