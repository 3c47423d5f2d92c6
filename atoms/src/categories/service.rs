use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use super::model::{next_sort_order, Category, CategoryInsert, NewCategory};
use crate::auth::{require_identity, IdentityProvider};
use crate::error::{GalleryError, GalleryResult};
use crate::store::CategoryStore;

/// All categories, ascending by `sort_order`
pub async fn list_categories(store: &dyn CategoryStore) -> GalleryResult<Vec<Category>> {
    let mut categories = store.list_categories().await?;
    categories.sort_by_key(|c| c.sort_order);
    Ok(categories)
}

/// Idempotent by name: an existing row is returned unchanged, otherwise a new
/// one is appended one sort step after the current maximum.
///
/// The name check is repeated atomically by the store, so two concurrent
/// creators of the same name both get the winner's row.
pub async fn create_category(
    store: &dyn CategoryStore,
    auth: &dyn IdentityProvider,
    name: &str,
    description: Option<String>,
) -> GalleryResult<Category> {
    let identity = require_identity(auth).await?;

    let name = name.trim();
    if name.is_empty() {
        return Err(GalleryError::validation("category name must not be empty"));
    }

    let existing = store.list_categories().await?;
    if let Some(found) = existing.iter().find(|c| c.name == name) {
        return Ok(found.clone());
    }

    let new_category = NewCategory {
        name: name.to_string(),
        description: description.filter(|d| !d.trim().is_empty()),
        sort_order: next_sort_order(&existing),
    };

    match store.insert_category(new_category).await? {
        CategoryInsert::Created(category) => {
            tracing::info!(
                "Category {} '{}' created by {} (sort_order {})",
                category.id,
                category.name,
                identity.id,
                category.sort_order
            );
            Ok(category)
        }
        CategoryInsert::Existing(category) => Ok(category),
    }
}

/// How long a loaded category list is served before the store is read again.
pub const DEFAULT_CATEGORY_TTL: Duration = Duration::from_secs(60);

/// Read-through cache over the category list. Cheap to clone; clones share
/// the cache.
///
/// A create through this index clears the cache at once. Creates made
/// elsewhere become visible once the loaded list is older than the TTL.
#[derive(Clone)]
pub struct CategoryIndex {
    store: Arc<dyn CategoryStore>,
    ttl: Duration,
    cache: Arc<RwLock<Option<(Instant, Vec<Category>)>>>,
}

impl CategoryIndex {
    pub fn new(store: Arc<dyn CategoryStore>) -> Self {
        Self::with_ttl(store, DEFAULT_CATEGORY_TTL)
    }

    pub fn with_ttl(store: Arc<dyn CategoryStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            cache: Arc::new(RwLock::new(None)),
        }
    }

    fn fresh(&self, cached: &Option<(Instant, Vec<Category>)>) -> Option<Vec<Category>> {
        cached
            .as_ref()
            .filter(|(loaded, _)| loaded.elapsed() < self.ttl)
            .map(|(_, categories)| categories.clone())
    }

    pub async fn list(&self) -> GalleryResult<Vec<Category>> {
        if let Some(cached) = self.fresh(&*self.cache.read().await) {
            return Ok(cached);
        }

        let mut guard = self.cache.write().await;
        if let Some(cached) = self.fresh(&guard) {
            return Ok(cached);
        }
        let loaded = list_categories(self.store.as_ref()).await?;
        *guard = Some((Instant::now(), loaded.clone()));
        Ok(loaded)
    }

    pub async fn create(
        &self,
        auth: &dyn IdentityProvider,
        name: &str,
        description: Option<String>,
    ) -> GalleryResult<Category> {
        let category = create_category(self.store.as_ref(), auth, name, description).await?;
        self.invalidate().await;
        Ok(category)
    }

    /// Exact name match against the cached list.
    pub async fn resolve(&self, name: &str) -> GalleryResult<Option<i64>> {
        let name = name.trim();
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|c| c.name == name)
            .map(|c| c.id))
    }

    /// Resolves every name or fails naming the first unknown one.
    pub async fn resolve_all(&self, names: &[String]) -> GalleryResult<Vec<i64>> {
        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            let id = self
                .resolve(name)
                .await?
                .ok_or_else(|| GalleryError::NotFound(format!("category '{}'", name)))?;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    pub async fn invalidate(&self) {
        *self.cache.write().await = None;
    }
}
