use std::sync::Arc;

use gallery_atoms::auth::CognitoIdentity;
use gallery_atoms::categories::{create_category_handler, list_categories_handler};
use gallery_atoms::http::error_response;
use gallery_atoms::photos::{
    delete_photo_handler, get_photo_handler, list_my_photos_handler, list_photos_handler,
    parse_list_params, update_photo_handler,
};
use gallery_atoms::uploads::{commit_photo_handler, create_ticket_handler};
use gallery_atoms::GalleryError;
use gallery_shared::AppState;
use lambda_http::http::header::{HeaderValue, VARY};
use lambda_http::{
    http::{Method, StatusCode},
    Body, Error, Request, RequestExt, Response,
};

fn with_cors_headers(mut resp: Response<Body>, request_origin: Option<&str>) -> Response<Body> {
    let headers = resp.headers_mut();
    match request_origin.and_then(|o| HeaderValue::from_str(o).ok()) {
        Some(origin) => {
            headers.insert("Access-Control-Allow-Origin", origin);
            headers.insert("Access-Control-Allow-Credentials", HeaderValue::from_static("true"));
        }
        None => {
            headers.insert("Access-Control-Allow-Origin", HeaderValue::from_static("*"));
        }
    }
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET,POST,PATCH,DELETE,OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type,Authorization,Cookie"),
    );
    headers.append(VARY, HeaderValue::from_static("Origin"));

    resp
}

fn finalize_response(
    resp: Result<Response<Body>, Error>,
    request_origin: Option<&str>,
) -> Result<Response<Body>, Error> {
    resp.map(|r| with_cors_headers(r, request_origin))
}

fn not_found(method: &Method, path: &str) -> Result<Response<Body>, Error> {
    error_response(&GalleryError::NotFound(format!("route {} {}", method, path)))
}

/// Main Lambda handler - routes gallery requests to the atoms handlers
pub(crate) async fn function_handler(
    event: Request,
    state: Arc<AppState>,
) -> Result<Response<Body>, Error> {
    let method = event.method();
    let path = event.uri().path();
    let body: &[u8] = event.body().as_ref();
    let request_origin = event.headers().get("Origin").and_then(|v| v.to_str().ok());
    tracing::info!("🚀 Gallery API invoked - Method: {} Path: {}", method, path);

    // Handle CORS preflight
    if *method == Method::OPTIONS {
        let resp = Response::builder()
            .status(StatusCode::OK)
            .body(Body::Empty)
            .map_err(Box::new)?;
        return Ok(with_cors_headers(resp, request_origin));
    }

    // Identity is only resolved (Cognito GetUser) by handlers that need it
    let auth = CognitoIdentity::from_headers(state.cognito_client.clone(), event.headers());
    let store = state.store.as_ref();
    let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let resp = match (method, parts.as_slice()) {
        (&Method::GET, ["photos"]) => {
            let query = event.query_string_parameters();
            let params = parse_list_params(|name| query.first(name)).map(|mut p| {
                p.limit = p.limit.or(Some(state.config.page_size));
                p
            });
            list_photos_handler(store, params).await
        }
        (&Method::GET, ["photos", "mine"]) => list_my_photos_handler(store, &auth).await,
        (&Method::GET, ["photos", photo_id]) => get_photo_handler(store, store, photo_id).await,
        (&Method::POST, ["photos"]) => {
            commit_photo_handler(store, &state.objects, &auth, body).await
        }
        (&Method::PATCH, ["photos", photo_id]) => {
            update_photo_handler(store, &auth, photo_id, body).await
        }
        (&Method::DELETE, ["photos", photo_id]) => {
            delete_photo_handler(store, &state.objects, &auth, photo_id).await
        }
        (&Method::GET, ["categories"]) => list_categories_handler(state.store.as_ref()).await,
        (&Method::POST, ["categories"]) => {
            create_category_handler(state.store.as_ref(), &auth, body).await
        }
        (&Method::POST, ["uploads", "tickets"]) => {
            create_ticket_handler(&state.objects, &auth, body).await
        }
        _ => not_found(method, path),
    };

    finalize_response(resp, request_origin)
}
