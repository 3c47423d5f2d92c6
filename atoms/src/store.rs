//! Relational store capabilities consumed by the services.
//!
//! Implementations: [`crate::dynamo::DynamoStore`] in production, in-memory
//! fakes in the integration tests.

use async_trait::async_trait;

use crate::categories::model::{Category, CategoryInsert, NewCategory};
use crate::error::GalleryResult;
use crate::photos::model::{FeedCursor, NewPhoto, Photo, UpdatePhotoPayload};

/// Filtered, ordered, limited photo query. Rows always come back newest
/// first (`created_at` desc, then `id` desc).
#[derive(Debug, Clone, Default)]
pub struct PhotoQuery {
    pub public_only: bool,
    pub owner_id: Option<String>,
    pub before: Option<FeedCursor>,
    /// Restrict to these ids. `Some(vec![])` matches nothing.
    pub ids: Option<Vec<String>>,
    /// `None` means unbounded.
    pub limit: Option<usize>,
}

impl PhotoQuery {
    pub fn admits(&self, photo: &Photo) -> bool {
        if self.public_only && !photo.is_public {
            return false;
        }
        if let Some(owner) = &self.owner_id {
            if &photo.owner_id != owner {
                return false;
            }
        }
        if let Some(cursor) = &self.before {
            if !cursor.admits(photo) {
                return false;
            }
        }
        if let Some(ids) = &self.ids {
            if !ids.iter().any(|id| id == &photo.id) {
                return false;
            }
        }
        true
    }
}

#[async_trait]
pub trait PhotoStore: Send + Sync {
    async fn query_photos(&self, query: &PhotoQuery) -> GalleryResult<Vec<Photo>>;

    async fn get_photo(&self, id: &str) -> GalleryResult<Option<Photo>>;

    /// Inserts the row, assigning `id` and `created_at`.
    async fn insert_photo(&self, photo: NewPhoto) -> GalleryResult<Photo>;

    /// Partial update; `None` when the row does not exist.
    async fn update_photo(
        &self,
        id: &str,
        update: &UpdatePhotoPayload,
    ) -> GalleryResult<Option<Photo>>;

    /// Deletes the row together with its category links.
    async fn delete_photo(&self, id: &str) -> GalleryResult<()>;

    async fn link_category(&self, photo_id: &str, category_id: i64) -> GalleryResult<()>;

    async fn photo_ids_in_category(&self, category_id: i64) -> GalleryResult<Vec<String>>;

    async fn category_ids_for_photo(&self, photo_id: &str) -> GalleryResult<Vec<i64>>;
}

#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// All categories, ascending by `sort_order`.
    async fn list_categories(&self) -> GalleryResult<Vec<Category>>;

    /// Inserts unless the name is taken, atomically; the id is assigned here.
    async fn insert_category(&self, category: NewCategory) -> GalleryResult<CategoryInsert>;
}
