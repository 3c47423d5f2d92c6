use chrono::{DateTime, Utc};
use lambda_http::{http::StatusCode, Body, Error, Response};

use super::model::{FeedCursor, ListPhotosParams, UpdatePhotoPayload};
use super::service::{delete_photo, get_photo, list_owned_photos, list_photos, update_photo};
use crate::auth::{require_identity, IdentityProvider};
use crate::error::{GalleryError, GalleryResult};
use crate::http::{error_response, no_content, parse_body, respond};
use crate::storage::ObjectStore;
use crate::store::{CategoryStore, PhotoStore};

/// Feed query string: `cursor` (RFC 3339), `cursor_id`, `category_id`,
/// `owner_id`, `limit`.
pub fn parse_list_params<'a>(
    get: impl Fn(&str) -> Option<&'a str>,
) -> GalleryResult<ListPhotosParams> {
    let cursor = match get("cursor").filter(|s| !s.is_empty()) {
        Some(raw) => {
            let created_at = DateTime::parse_from_rfc3339(raw)
                .map_err(|e| GalleryError::validation(format!("invalid cursor: {}", e)))?
                .with_timezone(&Utc);
            Some(FeedCursor {
                created_at,
                id: get("cursor_id")
                    .filter(|s| !s.is_empty())
                    .map(|s| s.to_string()),
            })
        }
        None => None,
    };

    let category_id = get("category_id")
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| GalleryError::validation("category_id must be an integer"))
        })
        .transpose()?;

    let limit = get("limit")
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>()
                .map_err(|_| GalleryError::validation("limit must be a positive integer"))
        })
        .transpose()?;

    Ok(ListPhotosParams {
        cursor,
        category_id,
        owner_id: get("owner_id")
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string()),
        limit,
    })
}

/// HTTP Handler: GET /photos
pub async fn list_photos_handler(
    photos: &dyn PhotoStore,
    params: GalleryResult<ListPhotosParams>,
) -> Result<Response<Body>, Error> {
    let params = match params {
        Ok(p) => p,
        Err(e) => return error_response(&e),
    };
    respond(list_photos(photos, params).await, StatusCode::OK, "list_photos")
}

/// HTTP Handler: GET /photos/mine
pub async fn list_my_photos_handler(
    photos: &dyn PhotoStore,
    auth: &dyn IdentityProvider,
) -> Result<Response<Body>, Error> {
    let result = async {
        let identity = require_identity(auth).await?;
        list_owned_photos(photos, &identity.id).await
    }
    .await;
    respond(result, StatusCode::OK, "list_owned_photos")
}

/// HTTP Handler: GET /photos/{id}
pub async fn get_photo_handler(
    photos: &dyn PhotoStore,
    categories: &dyn CategoryStore,
    photo_id: &str,
) -> Result<Response<Body>, Error> {
    let result = get_photo(photos, categories, photo_id)
        .await
        .and_then(|found| found.ok_or_else(|| GalleryError::NotFound(format!("photo {}", photo_id))));
    respond(result, StatusCode::OK, "get_photo")
}

/// HTTP Handler: PATCH /photos/{id}
pub async fn update_photo_handler(
    photos: &dyn PhotoStore,
    auth: &dyn IdentityProvider,
    photo_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let result = async {
        let payload: UpdatePhotoPayload = parse_body(body)?;
        update_photo(photos, auth, photo_id, payload).await
    }
    .await;
    respond(result, StatusCode::OK, "update_photo")
}

/// HTTP Handler: DELETE /photos/{id}
pub async fn delete_photo_handler(
    photos: &dyn PhotoStore,
    objects: &dyn ObjectStore,
    auth: &dyn IdentityProvider,
    photo_id: &str,
) -> Result<Response<Body>, Error> {
    match delete_photo(photos, objects, auth, photo_id).await {
        Ok(()) => no_content(),
        Err(e) => respond::<()>(Err(e), StatusCode::NO_CONTENT, "delete_photo"),
    }
}
