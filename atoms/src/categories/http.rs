use lambda_http::{http::StatusCode, Body, Error, Response};

use super::model::CreateCategoryPayload;
use super::service::{create_category, list_categories};
use crate::auth::IdentityProvider;
use crate::http::{parse_body, respond};
use crate::store::CategoryStore;

/// HTTP Handler: GET /categories
///
/// Reads the store on every request; warm containers never serve a stale list.
pub async fn list_categories_handler(store: &dyn CategoryStore) -> Result<Response<Body>, Error> {
    respond(list_categories(store).await, StatusCode::OK, "list_categories")
}

/// HTTP Handler: POST /categories
///
/// Answers 200 with the existing row when the name is already taken.
pub async fn create_category_handler(
    store: &dyn CategoryStore,
    auth: &dyn IdentityProvider,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let result = async {
        let payload: CreateCategoryPayload = parse_body(body)?;
        create_category(store, auth, &payload.name, payload.description).await
    }
    .await;
    respond(result, StatusCode::OK, "create_category")
}
