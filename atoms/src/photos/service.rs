use std::collections::HashMap;

use super::model::{
    ListPhotosParams, Photo, PhotoPage, PhotoWithCategories, UpdatePhotoPayload,
};
use crate::auth::{ensure_owner, require_identity, IdentityProvider};
use crate::categories::model::Category;
use crate::error::{GalleryError, GalleryResult};
use crate::storage::ObjectStore;
use crate::store::{CategoryStore, PhotoQuery, PhotoStore};

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;

/// One page of the public feed, newest first.
///
/// Asks the store for `limit + 1` rows so `has_more` needs no second round
/// trip. A category with no linked photos short-circuits to an empty page.
pub async fn list_photos(
    photos: &dyn PhotoStore,
    params: ListPhotosParams,
) -> GalleryResult<PhotoPage> {
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE);
    if limit == 0 {
        return Err(GalleryError::validation("limit must be at least 1"));
    }

    let ids = match params.category_id {
        Some(category_id) => {
            let ids = photos.photo_ids_in_category(category_id).await?;
            if ids.is_empty() {
                return Ok(PhotoPage::empty());
            }
            Some(ids)
        }
        None => None,
    };

    let query = PhotoQuery {
        public_only: true,
        owner_id: params.owner_id,
        before: params.cursor,
        ids,
        limit: Some(limit + 1),
    };

    let mut rows = photos.query_photos(&query).await?;
    let has_more = rows.len() > limit;
    rows.truncate(limit);

    let next_cursor = if has_more {
        rows.last().map(super::model::FeedCursor::after)
    } else {
        None
    };

    Ok(PhotoPage {
        photos: rows,
        has_more,
        next_cursor,
    })
}

/// Single photo with its categories; `None` when it does not exist.
pub async fn get_photo(
    photos: &dyn PhotoStore,
    categories: &dyn CategoryStore,
    id: &str,
) -> GalleryResult<Option<PhotoWithCategories>> {
    let Some(photo) = photos.get_photo(id).await? else {
        return Ok(None);
    };

    let linked = photos.category_ids_for_photo(id).await?;
    let categories = if linked.is_empty() {
        vec![]
    } else {
        let by_id: HashMap<i64, Category> = categories
            .list_categories()
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();
        let mut found: Vec<Category> = linked
            .iter()
            .filter_map(|cid| by_id.get(cid).cloned())
            .collect();
        found.sort_by_key(|c| c.sort_order);
        found
    };

    Ok(Some(PhotoWithCategories { photo, categories }))
}

/// Every photo of one owner, public or not, newest first.
pub async fn list_owned_photos(
    photos: &dyn PhotoStore,
    owner_id: &str,
) -> GalleryResult<Vec<Photo>> {
    let query = PhotoQuery {
        public_only: false,
        owner_id: Some(owner_id.to_string()),
        ..Default::default()
    };
    photos.query_photos(&query).await
}

async fn load_owned(
    photos: &dyn PhotoStore,
    auth: &dyn IdentityProvider,
    id: &str,
) -> GalleryResult<Photo> {
    let identity = require_identity(auth).await?;
    let photo = photos
        .get_photo(id)
        .await?
        .ok_or_else(|| GalleryError::NotFound(format!("photo {}", id)))?;
    ensure_owner(&identity, &photo.owner_id)?;
    Ok(photo)
}

/// Ownership-checked partial update. Storage is left untouched.
pub async fn update_photo(
    photos: &dyn PhotoStore,
    auth: &dyn IdentityProvider,
    id: &str,
    mut payload: UpdatePhotoPayload,
) -> GalleryResult<Photo> {
    let current = load_owned(photos, auth, id).await?;

    if let Some(title) = payload.title.as_mut() {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(GalleryError::validation("title must not be empty"));
        }
        *title = trimmed.to_string();
    }
    if payload.is_empty() {
        return Ok(current);
    }

    photos
        .update_photo(id, &payload)
        .await?
        .ok_or_else(|| GalleryError::NotFound(format!("photo {}", id)))
}

/// Deletes the stored object, then the row (links go with it).
///
/// A failed object delete is logged and the row is removed anyway; the
/// object is left orphaned.
pub async fn delete_photo(
    photos: &dyn PhotoStore,
    objects: &dyn ObjectStore,
    auth: &dyn IdentityProvider,
    id: &str,
) -> GalleryResult<()> {
    let photo = load_owned(photos, auth, id).await?;

    if let Err(e) = objects.delete(&photo.storage_path).await {
        tracing::warn!(
            "Object delete failed for photo {} at {}, continuing: {}",
            photo.id,
            photo.storage_path,
            e
        );
    }

    photos.delete_photo(id).await?;
    tracing::info!("Deleted photo {} owned by {}", photo.id, photo.owner_id);
    Ok(())
}
