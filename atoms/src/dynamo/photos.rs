use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{
    AttributeValue, KeysAndAttributes, Put, ReturnValue, TransactWriteItem,
};
use chrono::{SubsecRound, Utc};
use tokio::time::sleep;

use super::item::{self, Item};
use super::{keys, DynamoStore, MAX_BATCH_ATTEMPTS};
use crate::error::{GalleryError, GalleryResult};
use crate::photos::model::{NewPhoto, Photo, UpdatePhotoPayload};
use crate::store::{PhotoQuery, PhotoStore};

const BATCH_GET_LIMIT: usize = 100;

fn newest_first(a: &Photo, b: &Photo) -> std::cmp::Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.id.cmp(&a.id))
}

impl DynamoStore {
    /// Photos by id via BatchGetItem, filtered and ordered in memory.
    ///
    /// Every id is read on each call, so one page of a category costs a read of
    /// the whole category.
    async fn photos_by_ids(&self, ids: &[String], query: &PhotoQuery) -> GalleryResult<Vec<Photo>> {
        let mut photos = Vec::new();

        for chunk in ids.chunks(BATCH_GET_LIMIT) {
            let request_keys: Vec<Item> = chunk
                .iter()
                .map(|id| {
                    let pk = keys::photo(id);
                    item::key(&pk, &pk)
                })
                .collect();

            let mut pending = Some(
                KeysAndAttributes::builder()
                    .set_keys(Some(request_keys))
                    .build()
                    .map_err(|e| GalleryError::store("DynamoDB batch_get request", e))?,
            );
            let mut attempts = 0;
            while let Some(request) = pending.take() {
                attempts += 1;
                let result = self
                    .client
                    .batch_get_item()
                    .request_items(&self.table_name, request)
                    .send()
                    .await
                    .map_err(|e| GalleryError::store("DynamoDB batch_get_item", e))?;

                if let Some(items) = result.responses().and_then(|r| r.get(&self.table_name)) {
                    photos.extend(
                        items
                            .iter()
                            .filter_map(item::photo_from_item)
                            .filter(|p| query.admits(p)),
                    );
                }

                pending = result
                    .unprocessed_keys()
                    .and_then(|m| m.get(&self.table_name))
                    .filter(|k| !k.keys().is_empty())
                    .cloned();

                if pending.is_some() {
                    if attempts >= MAX_BATCH_ATTEMPTS {
                        return Err(GalleryError::Store(format!(
                            "DynamoDB batch_get_item left unprocessed keys after {} attempts",
                            attempts
                        )));
                    }
                    sleep(Duration::from_millis(100 * attempts)).await;
                }
            }
        }

        photos.sort_by(newest_first);
        if let Some(limit) = query.limit {
            photos.truncate(limit);
        }
        Ok(photos)
    }

    /// Walks one GSI partition newest first until `limit` rows pass the filter.
    async fn photos_from_index(
        &self,
        index: &str,
        partition_attr: &str,
        partition: String,
        query: &PhotoQuery,
    ) -> GalleryResult<Vec<Photo>> {
        let mut condition = "#pk = :pk".to_string();
        let before = query.before.as_ref().map(item::cursor_sort_key);
        if before.is_some() {
            condition.push_str(" AND feed_sk < :before");
        }

        let mut photos = Vec::new();
        let mut start_key: Option<Item> = None;
        loop {
            let mut builder = self
                .client
                .query()
                .table_name(&self.table_name)
                .index_name(index)
                .key_condition_expression(condition.as_str())
                .expression_attribute_names("#pk", partition_attr)
                .expression_attribute_values(":pk", AttributeValue::S(partition.clone()))
                .scan_index_forward(false)
                .set_exclusive_start_key(start_key.take());
            if let Some(before) = &before {
                builder = builder.expression_attribute_values(":before", AttributeValue::S(before.clone()));
            }
            if let Some(limit) = query.limit {
                let remaining = limit.saturating_sub(photos.len()).max(1);
                builder = builder.limit(i32::try_from(remaining).unwrap_or(i32::MAX));
            }

            let result = builder
                .send()
                .await
                .map_err(|e| GalleryError::store("DynamoDB query", e))?;

            for row in result.items() {
                if let Some(photo) = item::photo_from_item(row) {
                    if query.admits(&photo) {
                        photos.push(photo);
                    }
                }
                if query.limit.is_some_and(|limit| photos.len() >= limit) {
                    return Ok(photos);
                }
            }

            match result.last_evaluated_key() {
                Some(key) => start_key = Some(key.clone()),
                None => break,
            }
        }
        Ok(photos)
    }

    /// Unindexed fallback for queries that are neither public nor per-owner.
    async fn scan_photos(&self, query: &PhotoQuery) -> GalleryResult<Vec<Photo>> {
        let mut photos = Vec::new();
        let mut start_key: Option<Item> = None;
        loop {
            let result = self
                .client
                .scan()
                .table_name(&self.table_name)
                .filter_expression("attribute_exists(feed_sk)")
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| GalleryError::store("DynamoDB scan", e))?;

            photos.extend(
                result
                    .items()
                    .iter()
                    .filter_map(item::photo_from_item)
                    .filter(|p| query.admits(p)),
            );

            match result.last_evaluated_key() {
                Some(key) => start_key = Some(key.clone()),
                None => break,
            }
        }

        photos.sort_by(newest_first);
        if let Some(limit) = query.limit {
            photos.truncate(limit);
        }
        Ok(photos)
    }
}

#[async_trait]
impl PhotoStore for DynamoStore {
    async fn query_photos(&self, query: &PhotoQuery) -> GalleryResult<Vec<Photo>> {
        if query.limit == Some(0) {
            return Ok(vec![]);
        }
        if let Some(ids) = &query.ids {
            if ids.is_empty() {
                return Ok(vec![]);
            }
            return self.photos_by_ids(ids, query).await;
        }

        match (&query.owner_id, query.public_only) {
            (Some(owner_id), _) => {
                self.photos_from_index(keys::OWNER_INDEX, "owner_pk", keys::owner(owner_id), query)
                    .await
            }
            (None, true) => {
                self.photos_from_index(
                    keys::FEED_INDEX,
                    "feed_pk",
                    keys::FEED_PUBLIC.to_string(),
                    query,
                )
                .await
            }
            (None, false) => self.scan_photos(query).await,
        }
    }

    async fn get_photo(&self, id: &str) -> GalleryResult<Option<Photo>> {
        let pk = keys::photo(id);
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(item::key(&pk, &pk)))
            .send()
            .await
            .map_err(|e| GalleryError::store("DynamoDB get_item", e))?;

        Ok(result.item().and_then(item::photo_from_item))
    }

    async fn insert_photo(&self, photo: NewPhoto) -> GalleryResult<Photo> {
        let photo = Photo {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: photo.owner_id,
            title: photo.title,
            description: photo.description,
            storage_path: photo.storage_path,
            public_url: photo.public_url,
            width: photo.width,
            height: photo.height,
            byte_size: photo.byte_size,
            is_public: photo.is_public,
            // Stored with microsecond precision; keep the returned value identical
            created_at: Utc::now().trunc_subsecs(6),
        };

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item::photo_to_item(&photo)))
            .condition_expression("attribute_not_exists(PK)")
            .send()
            .await
            .map_err(|e| GalleryError::store("DynamoDB put_item", e))?;

        Ok(photo)
    }

    async fn update_photo(
        &self,
        id: &str,
        update: &UpdatePhotoPayload,
    ) -> GalleryResult<Option<Photo>> {
        if update.is_empty() {
            return self.get_photo(id).await;
        }

        let mut set_expr = vec![];
        let mut remove_expr = vec![];
        let mut expr_names = HashMap::new();
        let mut expr_values = HashMap::new();

        if let Some(title) = &update.title {
            set_expr.push("#title = :title");
            expr_names.insert("#title".to_string(), "title".to_string());
            expr_values.insert(":title".to_string(), AttributeValue::S(title.clone()));
        }

        if let Some(description) = &update.description {
            expr_names.insert("#description".to_string(), "description".to_string());
            if description.trim().is_empty() {
                remove_expr.push("#description");
            } else {
                set_expr.push("#description = :description");
                expr_values.insert(
                    ":description".to_string(),
                    AttributeValue::S(description.clone()),
                );
            }
        }

        if let Some(is_public) = update.is_public {
            set_expr.push("is_public = :is_public");
            expr_values.insert(":is_public".to_string(), AttributeValue::Bool(is_public));
            // Toggle membership in the sparse feed index
            if is_public {
                set_expr.push("feed_pk = :feed_pk");
                expr_values.insert(
                    ":feed_pk".to_string(),
                    AttributeValue::S(keys::FEED_PUBLIC.to_string()),
                );
            } else {
                remove_expr.push("feed_pk");
            }
        }

        let mut update_expression = String::new();
        if !set_expr.is_empty() {
            update_expression.push_str(&format!("SET {}", set_expr.join(", ")));
        }
        if !remove_expr.is_empty() {
            if !update_expression.is_empty() {
                update_expression.push(' ');
            }
            update_expression.push_str(&format!("REMOVE {}", remove_expr.join(", ")));
        }

        let pk = keys::photo(id);
        let mut builder = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .set_key(Some(item::key(&pk, &pk)))
            .update_expression(update_expression)
            .condition_expression("attribute_exists(PK)")
            .return_values(ReturnValue::AllNew);

        for (k, v) in expr_names {
            builder = builder.expression_attribute_names(k, v);
        }
        for (k, v) in expr_values {
            builder = builder.expression_attribute_values(k, v);
        }

        match builder.send().await {
            Ok(result) => Ok(result.attributes().and_then(item::photo_from_item)),
            Err(e) => {
                let missing = e
                    .as_service_error()
                    .is_some_and(|se| se.is_conditional_check_failed_exception());
                if missing {
                    Ok(None)
                } else {
                    Err(GalleryError::store("DynamoDB update_item", e))
                }
            }
        }
    }

    async fn delete_photo(&self, id: &str) -> GalleryResult<()> {
        let photo_pk = keys::photo(id);
        let mut delete_keys = vec![item::key(&photo_pk, &photo_pk)];

        // Both directions of every category link
        for sk in self
            .sort_keys_with_prefix(&photo_pk, keys::CATEGORY_PREFIX)
            .await?
        {
            delete_keys.push(item::key(&sk, &photo_pk));
            delete_keys.push(item::key(&photo_pk, &sk));
        }

        tracing::info!("Deleting photo {} ({} items)", id, delete_keys.len());
        self.batch_delete_items(&delete_keys).await
    }

    async fn link_category(&self, photo_id: &str, category_id: i64) -> GalleryResult<()> {
        let photo_pk = keys::photo(photo_id);
        let category_pk = keys::category(category_id);

        let link = |pk: &str, sk: &str| -> GalleryResult<TransactWriteItem> {
            let mut row = item::key(pk, sk);
            row.insert("photo_id".to_string(), AttributeValue::S(photo_id.to_string()));
            row.insert(
                "category_id".to_string(),
                AttributeValue::N(category_id.to_string()),
            );
            let put = Put::builder()
                .table_name(&self.table_name)
                .set_item(Some(row))
                .build()
                .map_err(|e| GalleryError::store("DynamoDB put request", e))?;
            Ok(TransactWriteItem::builder().put(put).build())
        };

        self.client
            .transact_write_items()
            .transact_items(link(&category_pk, &photo_pk)?)
            .transact_items(link(&photo_pk, &category_pk)?)
            .send()
            .await
            .map_err(|e| GalleryError::store("DynamoDB transact_write_items", e))?;

        Ok(())
    }

    async fn photo_ids_in_category(&self, category_id: i64) -> GalleryResult<Vec<String>> {
        let sort_keys = self
            .sort_keys_with_prefix(&keys::category(category_id), keys::PHOTO_PREFIX)
            .await?;
        Ok(sort_keys
            .iter()
            .filter_map(|sk| sk.strip_prefix(keys::PHOTO_PREFIX))
            .map(|id| id.to_string())
            .collect())
    }

    async fn category_ids_for_photo(&self, photo_id: &str) -> GalleryResult<Vec<i64>> {
        let sort_keys = self
            .sort_keys_with_prefix(&keys::photo(photo_id), keys::CATEGORY_PREFIX)
            .await?;
        Ok(sort_keys
            .iter()
            .filter_map(|sk| sk.strip_prefix(keys::CATEGORY_PREFIX))
            .filter_map(|id| id.parse().ok())
            .collect())
    }
}
