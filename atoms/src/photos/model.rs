use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::categories::model::Category;

/// Photo domain model - one uploaded image and its metadata row
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Photo {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: Option<String>,
    /// Location inside the object store, never changes after insert
    pub storage_path: String,
    pub public_url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub byte_size: Option<u64>,
    pub is_public: bool,
    /// Assigned by the store on insert; doubles as the feed cursor
    pub created_at: DateTime<Utc>,
}

/// Row values supplied by the caller; `id` and `created_at` come from the store.
#[derive(Debug, Clone)]
pub struct NewPhoto {
    pub owner_id: String,
    pub title: String,
    pub description: Option<String>,
    pub storage_path: String,
    pub public_url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub byte_size: Option<u64>,
    pub is_public: bool,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct UpdatePhotoPayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_public: Option<bool>,
}

impl UpdatePhotoPayload {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.is_public.is_none()
    }
}

/// Photo joined with the categories it is linked to
#[derive(Debug, Serialize, Clone)]
pub struct PhotoWithCategories {
    #[serde(flatten)]
    pub photo: Photo,
    pub categories: Vec<Category>,
}

/// Position in the feed. Without `id` the cursor is a plain `created_at <`
/// bound; with `id` equal timestamps are ordered by id descending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedCursor {
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl FeedCursor {
    pub fn after(photo: &Photo) -> Self {
        FeedCursor {
            created_at: photo.created_at,
            id: Some(photo.id.clone()),
        }
    }

    /// True when `photo` sorts strictly after this cursor in the
    /// newest-first feed order.
    pub fn admits(&self, photo: &Photo) -> bool {
        match &self.id {
            None => photo.created_at < self.created_at,
            Some(id) => {
                photo.created_at < self.created_at
                    || (photo.created_at == self.created_at && photo.id.as_str() < id.as_str())
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListPhotosParams {
    pub cursor: Option<FeedCursor>,
    pub category_id: Option<i64>,
    pub owner_id: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Clone)]
pub struct PhotoPage {
    pub photos: Vec<Photo>,
    pub has_more: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<FeedCursor>,
}

impl PhotoPage {
    pub fn empty() -> Self {
        PhotoPage {
            photos: vec![],
            has_more: false,
            next_cursor: None,
        }
    }
}
