use async_trait::async_trait;

use super::model::LocalFile;
use crate::error::{GalleryError, GalleryResult};
use crate::storage::UploadTicket;

/// Moves file bytes to a ticket's endpoint, bypassing the application tier.
#[async_trait]
pub trait ByteTransfer: Send + Sync {
    async fn send(&self, ticket: &UploadTicket, file: &LocalFile) -> GalleryResult<()>;
}

/// Plain HTTP `PUT` against the signed URL.
#[derive(Debug, Clone, Default)]
pub struct HttpTransfer {
    client: reqwest::Client,
}

impl HttpTransfer {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ByteTransfer for HttpTransfer {
    async fn send(&self, ticket: &UploadTicket, file: &LocalFile) -> GalleryResult<()> {
        let mut request = self.client.put(&ticket.upload_url).body(file.bytes.clone());

        let mut has_content_type = false;
        for (name, value) in &ticket.headers {
            if name.eq_ignore_ascii_case("host") {
                continue;
            }
            has_content_type |= name.eq_ignore_ascii_case("content-type");
            request = request.header(name.as_str(), value.as_str());
        }
        if !has_content_type {
            request = request.header("Content-Type", &file.content_type);
        }
        if let Some(token) = &ticket.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GalleryError::store("upload transfer", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GalleryError::Store(format!(
                "upload transfer rejected with {}: {}",
                status, body
            )));
        }
        Ok(())
    }
}
