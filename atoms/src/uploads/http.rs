use chrono::Utc;
use lambda_http::{http::StatusCode, Body, Error, Response};

use super::model::{CommitPhotoPayload, CreateTicketPayload};
use super::service::{commit_photo, issue_ticket};
use crate::auth::IdentityProvider;
use crate::http::{parse_body, respond};
use crate::storage::ObjectStore;
use crate::store::PhotoStore;

/// HTTP Handler: POST /uploads/tickets
///
/// Browser clients transfer the bytes themselves with the returned ticket,
/// then call `POST /photos`.
pub async fn create_ticket_handler(
    objects: &dyn ObjectStore,
    auth: &dyn IdentityProvider,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let result = async {
        let payload: CreateTicketPayload = parse_body(body)?;
        issue_ticket(objects, auth, &payload.filename, Utc::now()).await
    }
    .await;
    respond(result, StatusCode::CREATED, "issue_upload_ticket")
}

/// HTTP Handler: POST /photos
pub async fn commit_photo_handler(
    photos: &dyn PhotoStore,
    objects: &dyn ObjectStore,
    auth: &dyn IdentityProvider,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let result = async {
        let payload: CommitPhotoPayload = parse_body(body)?;
        commit_photo(photos, objects, auth, payload).await
    }
    .await;
    respond(result, StatusCode::CREATED, "commit_photo")
}
