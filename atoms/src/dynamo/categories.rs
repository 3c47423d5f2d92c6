use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, Put, ReturnValue, TransactWriteItem};

use super::item::{self, Item};
use super::{keys, DynamoStore};
use crate::categories::model::{Category, CategoryInsert, NewCategory};
use crate::error::{GalleryError, GalleryResult};
use crate::store::CategoryStore;

impl DynamoStore {
    /// Next category id from the counter item (`ADD` creates it on first use).
    async fn next_category_id(&self) -> GalleryResult<i64> {
        let result = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .set_key(Some(item::key(
                keys::COUNTER_PARTITION,
                keys::CATEGORY_PARTITION,
            )))
            .update_expression("ADD next_id :one")
            .expression_attribute_values(":one", AttributeValue::N("1".to_string()))
            .return_values(ReturnValue::UpdatedNew)
            .send()
            .await
            .map_err(|e| GalleryError::store("DynamoDB update_item", e))?;

        result
            .attributes()
            .and_then(|attrs| item::get_n(attrs, "next_id"))
            .ok_or_else(|| GalleryError::Store("category counter returned no value".to_string()))
    }

    async fn category_by_name(&self, name: &str) -> GalleryResult<Option<Category>> {
        let claim = keys::category_name(name);
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(item::key(&claim, &claim)))
            .send()
            .await
            .map_err(|e| GalleryError::store("DynamoDB get_item", e))?;

        let Some(category_id) = result
            .item()
            .and_then(|row| item::get_n::<i64>(row, "category_id"))
        else {
            return Ok(None);
        };

        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(item::key(
                keys::CATEGORY_PARTITION,
                &keys::category(category_id),
            )))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| GalleryError::store("DynamoDB get_item", e))?;

        Ok(result.item().and_then(item::category_from_item))
    }

    fn conditional_put(&self, row: Item) -> GalleryResult<TransactWriteItem> {
        let put = Put::builder()
            .table_name(&self.table_name)
            .set_item(Some(row))
            .condition_expression("attribute_not_exists(PK)")
            .build()
            .map_err(|e| GalleryError::store("DynamoDB put request", e))?;
        Ok(TransactWriteItem::builder().put(put).build())
    }
}

#[async_trait]
impl CategoryStore for DynamoStore {
    async fn list_categories(&self) -> GalleryResult<Vec<Category>> {
        let mut categories = Vec::new();
        let mut start_key: Option<Item> = None;
        loop {
            let result = self
                .client
                .query()
                .table_name(&self.table_name)
                .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
                .expression_attribute_values(
                    ":pk",
                    AttributeValue::S(keys::CATEGORY_PARTITION.to_string()),
                )
                .expression_attribute_values(
                    ":sk_prefix",
                    AttributeValue::S(keys::CATEGORY_PREFIX.to_string()),
                )
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| GalleryError::store("DynamoDB query", e))?;

            categories.extend(result.items().iter().filter_map(item::category_from_item));

            match result.last_evaluated_key() {
                Some(key) => start_key = Some(key.clone()),
                None => break,
            }
        }

        categories.sort_by_key(|c| c.sort_order);
        Ok(categories)
    }

    /// Writes the category together with a name claim item in one transaction.
    /// A cancelled transaction means the name is taken; the holder is returned.
    async fn insert_category(&self, category: NewCategory) -> GalleryResult<CategoryInsert> {
        let id = self.next_category_id().await?;
        let category = Category {
            id,
            name: category.name,
            description: category.description,
            sort_order: category.sort_order,
        };

        let claim = keys::category_name(&category.name);
        let mut claim_row = item::key(&claim, &claim);
        claim_row.insert("category_id".to_string(), AttributeValue::N(id.to_string()));

        let result = self
            .client
            .transact_write_items()
            .transact_items(self.conditional_put(claim_row)?)
            .transact_items(self.conditional_put(item::category_to_item(&category))?)
            .send()
            .await;

        match result {
            Ok(_) => Ok(CategoryInsert::Created(category)),
            Err(e) => {
                let taken = e
                    .as_service_error()
                    .is_some_and(|se| se.is_transaction_canceled_exception());
                if !taken {
                    return Err(GalleryError::store("DynamoDB transact_write_items", e));
                }
                tracing::info!("Category name '{}' already claimed", category.name);
                self.category_by_name(&category.name)
                    .await?
                    .map(CategoryInsert::Existing)
                    .ok_or_else(|| {
                        GalleryError::Store(format!(
                            "category '{}' is claimed but its row is missing",
                            category.name
                        ))
                    })
            }
        }
    }
}
