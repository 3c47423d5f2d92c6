use async_trait::async_trait;
use serde::Serialize;

use crate::error::{GalleryError, GalleryResult};

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub id: String,
    pub email: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `Ok(None)` means the caller is anonymous.
    async fn current_identity(&self) -> GalleryResult<Option<Identity>>;
}

/// Identity already resolved by the caller (trusted authorizer, tests).
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity(pub Option<Identity>);

impl StaticIdentity {
    pub fn user(id: impl Into<String>) -> Self {
        StaticIdentity(Some(Identity {
            id: id.into(),
            email: None,
        }))
    }

    pub fn anonymous() -> Self {
        StaticIdentity(None)
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_identity(&self) -> GalleryResult<Option<Identity>> {
        Ok(self.0.clone())
    }
}

/// Every mutating operation starts here.
pub async fn require_identity(auth: &dyn IdentityProvider) -> GalleryResult<Identity> {
    auth.current_identity()
        .await?
        .ok_or(GalleryError::Unauthenticated)
}

pub fn ensure_owner(identity: &Identity, owner_id: &str) -> GalleryResult<()> {
    if identity.id == owner_id {
        Ok(())
    } else {
        Err(GalleryError::Forbidden)
    }
}
