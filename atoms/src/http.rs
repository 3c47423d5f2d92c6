use lambda_http::{http::StatusCode, Body, Error, Response};
use serde::Serialize;

use crate::error::{GalleryError, GalleryResult};

pub fn status_for(err: &GalleryError) -> StatusCode {
    match err {
        GalleryError::Unauthenticated => StatusCode::UNAUTHORIZED,
        GalleryError::Forbidden => StatusCode::FORBIDDEN,
        GalleryError::NotFound(_) => StatusCode::NOT_FOUND,
        GalleryError::Validation(_) => StatusCode::BAD_REQUEST,
        GalleryError::Store(_) => StatusCode::BAD_GATEWAY,
        GalleryError::PartialBatchFailure { .. } => StatusCode::MULTI_STATUS,
    }
}

pub fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(serde_json::to_string(value)?.into())
        .map_err(Box::new)?)
}

pub fn error_response(err: &GalleryError) -> Result<Response<Body>, Error> {
    let mut body = serde_json::json!({
        "error": err.kind(),
        "message": err.to_string(),
    });
    if let GalleryError::PartialBatchFailure { outcomes } = err {
        body["outcomes"] = serde_json::to_value(outcomes)?;
    }
    json_response(status_for(err), &body)
}

pub fn no_content() -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(StatusCode::NO_CONTENT)
        .body(Body::Empty)
        .map_err(Box::new)?)
}

/// Success body with `ok`, or the mapped error. Store failures are logged here
/// so every handler reports them the same way.
pub fn respond<T: Serialize>(
    result: GalleryResult<T>,
    ok: StatusCode,
    operation: &str,
) -> Result<Response<Body>, Error> {
    match result {
        Ok(value) => json_response(ok, &value),
        Err(e) => {
            if matches!(e, GalleryError::Store(_)) {
                tracing::error!("❌ {} failed: {}", operation, e);
            } else {
                tracing::info!("{} rejected: {}", operation, e);
            }
            error_response(&e)
        }
    }
}

/// JSON body into a payload type; malformed input is a validation error.
pub fn parse_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> GalleryResult<T> {
    serde_json::from_slice(body)
        .map_err(|e| GalleryError::validation(format!("invalid request body: {}", e)))
}
