//! AWS wiring for the gallery: configuration, SDK clients and the store
//! adapters built from them.

pub mod config;
pub mod logging;

use std::sync::Arc;

use aws_sdk_cognitoidentityprovider::Client as CognitoClient;
use aws_sdk_dynamodb::Client as DynamoClient;
use aws_sdk_s3::Client as S3Client;
use gallery_atoms::categories::CategoryIndex;
use gallery_atoms::uploads::HttpTransfer;
use gallery_atoms::{DynamoStore, S3ObjectStore};

pub use config::{ConfigError, GalleryConfig};

/// Everything a request needs, built once per cold start.
pub struct AppState {
    pub config: GalleryConfig,
    pub cognito_client: CognitoClient,
    pub store: Arc<DynamoStore>,
    pub objects: S3ObjectStore,
    pub categories: CategoryIndex,
    pub transfer: HttpTransfer,
}

impl AppState {
    pub async fn from_env() -> Result<Self, ConfigError> {
        let config = GalleryConfig::from_env()?;
        let aws_config = aws_config::load_from_env().await;

        let dynamo_client = DynamoClient::new(&aws_config);
        let s3_client = S3Client::new(&aws_config);
        let cognito_client = CognitoClient::new(&aws_config);

        let store = Arc::new(DynamoStore::new(dynamo_client, config.table_name.clone()));
        let objects = S3ObjectStore::new(
            s3_client,
            config.bucket_name.clone(),
            config.public_base_url.clone(),
            config.upload_url_ttl,
        );
        let categories = CategoryIndex::new(store.clone());

        tracing::info!(
            "Gallery state ready (table {}, bucket {})",
            config.table_name,
            config.bucket_name
        );

        Ok(AppState {
            config,
            cognito_client,
            store,
            objects,
            categories,
            transfer: HttpTransfer::new(reqwest::Client::new()),
        })
    }
}
