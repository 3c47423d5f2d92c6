#![allow(dead_code)]

//! In-memory stores shared by the integration tests.

use std::collections::HashSet;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use image::{DynamicImage, ImageOutputFormat, RgbImage};

use gallery_atoms::auth::{Identity, IdentityProvider, StaticIdentity};
use gallery_atoms::categories::{Category, CategoryInsert, NewCategory};
use gallery_atoms::photos::{NewPhoto, Photo, UpdatePhotoPayload};
use gallery_atoms::uploads::{ByteTransfer, LocalFile};
use gallery_atoms::{
    CategoryStore, GalleryError, GalleryResult, ObjectStore, PhotoQuery, PhotoStore, UploadTicket,
};

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
}

pub fn at(secs: i64) -> DateTime<Utc> {
    epoch() + Duration::seconds(secs)
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(RgbImage::new(width, height))
        .write_to(&mut buf, ImageOutputFormat::Png)
        .unwrap();
    buf.into_inner()
}

pub fn png_file(name: &str) -> LocalFile {
    LocalFile::new(name, "image/png", png(4, 3))
}

pub fn photo(id: &str, owner: &str, secs: i64, is_public: bool) -> Photo {
    Photo {
        id: id.to_string(),
        owner_id: owner.to_string(),
        title: format!("photo {}", id),
        description: None,
        storage_path: format!("{}/2026/01/{}.png", owner, id),
        public_url: format!("https://cdn.test/{}/2026/01/{}.png", owner, id),
        width: None,
        height: None,
        byte_size: None,
        is_public,
        created_at: at(secs),
    }
}

fn newest_first(a: &Photo, b: &Photo) -> std::cmp::Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.id.cmp(&a.id))
}

#[derive(Default)]
struct PhotoState {
    photos: Vec<Photo>,
    links: Vec<(String, i64)>,
    inserted: usize,
}

/// Photo rows and category links. Inserted rows get strictly increasing
/// `created_at` values after every seeded row.
#[derive(Default)]
pub struct MemoryPhotoStore {
    state: Mutex<PhotoState>,
    pub fail_links: AtomicBool,
    pub fail_deletes: AtomicBool,
    failing_titles: Mutex<HashSet<String>>,
}

impl MemoryPhotoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts with one of these titles are rejected.
    pub fn fail_inserts_for(&self, titles: &[&str]) {
        self.failing_titles
            .lock()
            .unwrap()
            .extend(titles.iter().map(|t| t.to_string()));
    }

    pub fn seed(&self, photo: Photo) {
        self.state.lock().unwrap().photos.push(photo);
    }

    pub fn seed_link(&self, photo_id: &str, category_id: i64) {
        self.state
            .lock()
            .unwrap()
            .links
            .push((photo_id.to_string(), category_id));
    }

    pub fn all(&self) -> Vec<Photo> {
        let mut photos = self.state.lock().unwrap().photos.clone();
        photos.sort_by(newest_first);
        photos
    }

    pub fn find(&self, id: &str) -> Option<Photo> {
        self.state
            .lock()
            .unwrap()
            .photos
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    pub fn links(&self) -> Vec<(String, i64)> {
        self.state.lock().unwrap().links.clone()
    }
}

#[async_trait]
impl PhotoStore for MemoryPhotoStore {
    async fn query_photos(&self, query: &PhotoQuery) -> GalleryResult<Vec<Photo>> {
        let mut rows: Vec<Photo> = self
            .state
            .lock()
            .unwrap()
            .photos
            .iter()
            .filter(|p| query.admits(p))
            .cloned()
            .collect();
        rows.sort_by(newest_first);
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn get_photo(&self, id: &str) -> GalleryResult<Option<Photo>> {
        Ok(self.find(id))
    }

    async fn insert_photo(&self, photo: NewPhoto) -> GalleryResult<Photo> {
        if self.failing_titles.lock().unwrap().contains(&photo.title) {
            return Err(GalleryError::Store(format!("insert of '{}' rejected", photo.title)));
        }
        let mut state = self.state.lock().unwrap();
        state.inserted += 1;
        let latest = state
            .photos
            .iter()
            .map(|p| p.created_at)
            .max()
            .unwrap_or_else(epoch);
        let row = Photo {
            id: format!("photo-{}", state.inserted),
            owner_id: photo.owner_id,
            title: photo.title,
            description: photo.description,
            storage_path: photo.storage_path,
            public_url: photo.public_url,
            width: photo.width,
            height: photo.height,
            byte_size: photo.byte_size,
            is_public: photo.is_public,
            created_at: latest + Duration::seconds(1),
        };
        state.photos.push(row.clone());
        Ok(row)
    }

    async fn update_photo(
        &self,
        id: &str,
        update: &UpdatePhotoPayload,
    ) -> GalleryResult<Option<Photo>> {
        let mut state = self.state.lock().unwrap();
        let Some(row) = state.photos.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(title) = &update.title {
            row.title = title.clone();
        }
        if let Some(description) = &update.description {
            row.description = Some(description.clone()).filter(|d| !d.trim().is_empty());
        }
        if let Some(is_public) = update.is_public {
            row.is_public = is_public;
        }
        Ok(Some(row.clone()))
    }

    async fn delete_photo(&self, id: &str) -> GalleryResult<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(GalleryError::Store("delete rejected".into()));
        }
        let mut state = self.state.lock().unwrap();
        state.photos.retain(|p| p.id != id);
        state.links.retain(|(pid, _)| pid != id);
        Ok(())
    }

    async fn link_category(&self, photo_id: &str, category_id: i64) -> GalleryResult<()> {
        if self.fail_links.load(Ordering::SeqCst) {
            return Err(GalleryError::Store("link rejected".into()));
        }
        self.seed_link(photo_id, category_id);
        Ok(())
    }

    async fn photo_ids_in_category(&self, category_id: i64) -> GalleryResult<Vec<String>> {
        Ok(self
            .links()
            .into_iter()
            .filter(|(_, cid)| *cid == category_id)
            .map(|(pid, _)| pid)
            .collect())
    }

    async fn category_ids_for_photo(&self, photo_id: &str) -> GalleryResult<Vec<i64>> {
        Ok(self
            .links()
            .into_iter()
            .filter(|(pid, _)| pid == photo_id)
            .map(|(_, cid)| cid)
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryCategoryStore {
    categories: Mutex<Vec<Category>>,
    pub list_calls: AtomicUsize,
}

impl MemoryCategoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CategoryStore for MemoryCategoryStore {
    async fn list_categories(&self) -> GalleryResult<Vec<Category>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let mut categories = self.categories.lock().unwrap().clone();
        categories.sort_by_key(|c| c.sort_order);
        Ok(categories)
    }

    async fn insert_category(&self, category: NewCategory) -> GalleryResult<CategoryInsert> {
        let mut categories = self.categories.lock().unwrap();
        if let Some(existing) = categories.iter().find(|c| c.name == category.name) {
            return Ok(CategoryInsert::Existing(existing.clone()));
        }
        let row = Category {
            id: categories.len() as i64 + 1,
            name: category.name,
            description: category.description,
            sort_order: category.sort_order,
        };
        categories.push(row.clone());
        Ok(CategoryInsert::Created(row))
    }
}

/// Issues tickets for `memory://` URLs and records deletes.
#[derive(Default)]
pub struct MemoryObjectStore {
    pub tickets: Mutex<Vec<String>>,
    pub deleted: Mutex<Vec<String>>,
    pub fail_deletes: AtomicBool,
    ticket_requests: AtomicUsize,
    failing_requests: Mutex<HashSet<usize>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects the ticket requests with these 1-based call numbers.
    pub fn fail_tickets_for(&self, requests: &[usize]) {
        self.failing_requests
            .lock()
            .unwrap()
            .extend(requests.iter().copied());
    }

    pub fn ticket_count(&self) -> usize {
        self.tickets.lock().unwrap().len()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put_signed(&self, path: &str) -> GalleryResult<UploadTicket> {
        let request = self.ticket_requests.fetch_add(1, Ordering::SeqCst) + 1;
        if self.failing_requests.lock().unwrap().contains(&request) {
            return Err(GalleryError::Store(format!("presign of {} rejected", path)));
        }
        self.tickets.lock().unwrap().push(path.to_string());
        Ok(UploadTicket {
            upload_url: format!("memory://{}", path),
            storage_path: path.to_string(),
            auth_token: None,
            headers: vec![],
            expires_at: Utc::now() + Duration::hours(2),
        })
    }

    fn public_url(&self, path: &str) -> String {
        format!("https://cdn.test/{}", path)
    }

    async fn delete(&self, path: &str) -> GalleryResult<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(GalleryError::Store("object delete rejected".into()));
        }
        self.deleted.lock().unwrap().push(path.to_string());
        Ok(())
    }
}

/// Records transfers; fails for the file names in `failing`.
#[derive(Default)]
pub struct MemoryTransfer {
    pub sent: Mutex<Vec<(String, String)>>,
    failing: HashSet<String>,
}

impl MemoryTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(names: &[&str]) -> Self {
        Self {
            sent: Mutex::new(vec![]),
            failing: names.iter().map(|n| n.to_string()).collect(),
        }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl ByteTransfer for MemoryTransfer {
    async fn send(&self, ticket: &UploadTicket, file: &LocalFile) -> GalleryResult<()> {
        if self.failing.contains(&file.name) {
            return Err(GalleryError::Store(format!(
                "transfer of {} refused with status 500",
                file.name
            )));
        }
        self.sent
            .lock()
            .unwrap()
            .push((file.name.clone(), ticket.storage_path.clone()));
        Ok(())
    }
}

/// Wraps a `StaticIdentity` and counts lookups.
#[derive(Default)]
pub struct CountingIdentity {
    inner: StaticIdentity,
    pub lookups: AtomicUsize,
}

impl CountingIdentity {
    pub fn user(id: &str) -> Self {
        Self {
            inner: StaticIdentity::user(id),
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for CountingIdentity {
    async fn current_identity(&self) -> GalleryResult<Option<Identity>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.current_identity().await
    }
}
