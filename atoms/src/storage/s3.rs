use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client as S3Client;
use chrono::Utc;

use super::{ObjectStore, UploadTicket};
use crate::error::{GalleryError, GalleryResult};

/// S3-backed object store. Credentials are presigned `PutObject` requests.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: S3Client,
    bucket: String,
    public_base_url: String,
    ticket_ttl: Duration,
}

impl S3ObjectStore {
    pub fn new(
        client: S3Client,
        bucket: impl Into<String>,
        public_base_url: impl Into<String>,
        ticket_ttl: Duration,
    ) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            public_base_url: public_base_url.into(),
            ticket_ttl,
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_signed(&self, path: &str) -> GalleryResult<UploadTicket> {
        let presigning = PresigningConfig::expires_in(self.ticket_ttl)
            .map_err(|e| GalleryError::store("S3 presigning config", e))?;

        let presigned = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .presigned(presigning)
            .await
            .map_err(|e| GalleryError::store("S3 presign put_object", e))?;

        let headers = presigned
            .headers()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let expires_at = Utc::now()
            + chrono::Duration::from_std(self.ticket_ttl)
                .unwrap_or_else(|_| chrono::Duration::hours(2));

        Ok(UploadTicket {
            upload_url: presigned.uri().to_string(),
            storage_path: path.to_string(),
            auth_token: None,
            headers,
            expires_at,
        })
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.public_base_url.trim_end_matches('/'), path)
    }

    async fn delete(&self, path: &str) -> GalleryResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| GalleryError::store("S3 delete_object", e))?;
        Ok(())
    }
}
