//! Single-table DynamoDB implementation of the relational store.
//!
//! | Item | PK | SK |
//! |---|---|---|
//! | photo | `PHOTO#{id}` | `PHOTO#{id}` |
//! | photo -> category link | `PHOTO#{id}` | `CATEGORY#{cid}` |
//! | category -> photo link | `CATEGORY#{cid}` | `PHOTO#{id}` |
//! | category | `CATEGORY` | `CATEGORY#{cid}` |
//! | category name claim | `CATEGORY_NAME#{name}` | `CATEGORY_NAME#{name}` |
//! | id counter | `COUNTER` | `CATEGORY` |
//!
//! GSIs: `feed-index` (`feed_pk`, `feed_sk`), sparse, public photos only;
//! `owner-index` (`owner_pk`, `feed_sk`).

mod categories;
pub(crate) mod item;
mod photos;

use std::collections::HashMap;
use std::time::Duration;

use aws_sdk_dynamodb::types::{AttributeValue, DeleteRequest, WriteRequest};
use aws_sdk_dynamodb::Client as DynamoClient;
use tokio::time::sleep;

use crate::error::{GalleryError, GalleryResult};

pub(crate) mod keys {
    pub const FEED_INDEX: &str = "feed-index";
    pub const OWNER_INDEX: &str = "owner-index";
    pub const FEED_PUBLIC: &str = "FEED#PUBLIC";
    pub const PHOTO_PREFIX: &str = "PHOTO#";
    pub const CATEGORY_PREFIX: &str = "CATEGORY#";
    pub const CATEGORY_PARTITION: &str = "CATEGORY";
    pub const COUNTER_PARTITION: &str = "COUNTER";

    pub fn photo(id: &str) -> String {
        format!("{}{}", PHOTO_PREFIX, id)
    }

    pub fn category(id: i64) -> String {
        format!("{}{}", CATEGORY_PREFIX, id)
    }

    pub fn category_name(name: &str) -> String {
        format!("CATEGORY_NAME#{}", name)
    }

    pub fn owner(owner_id: &str) -> String {
        format!("OWNER#{}", owner_id)
    }
}

const BATCH_WRITE_LIMIT: usize = 25;
const MAX_BATCH_ATTEMPTS: u64 = 5;

#[derive(Debug, Clone)]
pub struct DynamoStore {
    client: DynamoClient,
    table_name: String,
}

impl DynamoStore {
    pub fn new(client: DynamoClient, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    /// Every SK under one partition, following pagination.
    async fn sort_keys_with_prefix(&self, pk: &str, prefix: &str) -> GalleryResult<Vec<String>> {
        let mut sort_keys = Vec::new();
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;
        loop {
            let result = self
                .client
                .query()
                .table_name(&self.table_name)
                .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
                .expression_attribute_values(":pk", AttributeValue::S(pk.to_string()))
                .expression_attribute_values(":sk_prefix", AttributeValue::S(prefix.to_string()))
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| GalleryError::store("DynamoDB query", e))?;

            for row in result.items() {
                if let Some(sk) = item::get_s(row, "SK") {
                    sort_keys.push(sk);
                }
            }

            match result.last_evaluated_key() {
                Some(key) => start_key = Some(key.clone()),
                None => break,
            }
        }
        Ok(sort_keys)
    }

    /// Batch delete (25 items per request, unprocessed keys retried with backoff)
    async fn batch_delete_items(&self, delete_keys: &[HashMap<String, AttributeValue>]) -> GalleryResult<()> {
        for chunk in delete_keys.chunks(BATCH_WRITE_LIMIT) {
            let mut write_reqs = Vec::with_capacity(chunk.len());
            for key in chunk {
                let delete = DeleteRequest::builder()
                    .set_key(Some(key.clone()))
                    .build()
                    .map_err(|e| GalleryError::store("DynamoDB delete request", e))?;
                write_reqs.push(WriteRequest::builder().delete_request(delete).build());
            }

            let mut unprocessed = Some(write_reqs);
            let mut attempts = 0;
            while let Some(reqs) = unprocessed {
                attempts += 1;
                let result = self
                    .client
                    .batch_write_item()
                    .request_items(&self.table_name, reqs)
                    .send()
                    .await
                    .map_err(|e| GalleryError::store("DynamoDB batch_write_item", e))?;

                unprocessed = result
                    .unprocessed_items()
                    .and_then(|m| m.get(&self.table_name))
                    .filter(|v| !v.is_empty())
                    .cloned();

                if unprocessed.is_none() {
                    break;
                }
                if attempts >= MAX_BATCH_ATTEMPTS {
                    return Err(GalleryError::Store(format!(
                        "DynamoDB batch_write_item left unprocessed deletes after {} attempts",
                        attempts
                    )));
                }
                sleep(Duration::from_millis(100 * attempts)).await;
            }
        }
        Ok(())
    }
}
