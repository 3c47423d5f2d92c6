use async_trait::async_trait;
use aws_sdk_cognitoidentityprovider::Client as CognitoClient;
use lambda_http::http::HeaderMap;

use super::guard::{Identity, IdentityProvider};
use crate::error::{GalleryError, GalleryResult};

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Resolves the caller from a Cognito access token via `GetUser`.
#[derive(Debug, Clone)]
pub struct CognitoIdentity {
    client: CognitoClient,
    access_token: Option<String>,
}

impl CognitoIdentity {
    pub fn new(client: CognitoClient, access_token: Option<String>) -> Self {
        Self {
            client,
            access_token,
        }
    }

    pub fn from_headers(client: CognitoClient, headers: &HeaderMap) -> Self {
        Self::new(client, access_token_from_headers(headers))
    }
}

#[async_trait]
impl IdentityProvider for CognitoIdentity {
    async fn current_identity(&self) -> GalleryResult<Option<Identity>> {
        let Some(token) = self.access_token.as_deref() else {
            return Ok(None);
        };

        let result = self.client.get_user().access_token(token).send().await;
        let output = match result {
            Ok(output) => output,
            Err(e) => {
                let service_err = e.into_service_error();
                if service_err.is_not_authorized_exception() {
                    tracing::warn!("Rejected access token: {}", service_err);
                    return Ok(None);
                }
                return Err(GalleryError::store("Cognito get_user", service_err));
            }
        };

        let attribute = |name: &str| {
            output
                .user_attributes()
                .iter()
                .find(|a| a.name() == name)
                .and_then(|a| a.value())
                .map(|v| v.to_string())
        };

        let id = attribute("sub").unwrap_or_else(|| output.username().to_string());
        Ok(Some(Identity {
            id,
            email: attribute("email"),
        }))
    }
}

/// Bearer header first, then the `access_token` cookie.
pub fn access_token_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get("Cookie")
        .and_then(|v| v.to_str().ok())
        .and_then(|cookies| {
            cookies.split(';').find_map(|pair| {
                let (name, value) = pair.trim().split_once('=')?;
                (name == ACCESS_TOKEN_COOKIE && !value.is_empty()).then(|| value.to_string())
            })
        })
}
