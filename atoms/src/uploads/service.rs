use chrono::{DateTime, Utc};

use super::model::{BatchMetadata, CommitPhotoPayload, LocalFile, UploadReport, UploadStage};
use super::path::{batch_title, belongs_to, storage_path};
use super::progress::{ProgressSink, ProgressTracker, UploadProgress};
use super::transfer::ByteTransfer;
use super::validate::{measure, validate_batch, validate_title, UploadLimits};
use crate::auth::{require_identity, Identity, IdentityProvider};
use crate::error::{GalleryError, GalleryResult};
use crate::photos::model::{NewPhoto, Photo};
use crate::storage::{ObjectStore, UploadTicket};
use crate::store::PhotoStore;

/// Collaborators the orchestrator drives
pub struct UploadContext<'a> {
    pub photos: &'a dyn PhotoStore,
    pub objects: &'a dyn ObjectStore,
    pub transfer: &'a dyn ByteTransfer,
    pub auth: &'a dyn IdentityProvider,
    pub limits: UploadLimits,
}

/// Write credential for a fresh randomized path under the caller's prefix.
pub async fn issue_ticket(
    objects: &dyn ObjectStore,
    auth: &dyn IdentityProvider,
    filename: &str,
    now: DateTime<Utc>,
) -> GalleryResult<UploadTicket> {
    let identity = require_identity(auth).await?;
    request_ticket(objects, &identity, filename, now).await
}

async fn request_ticket(
    objects: &dyn ObjectStore,
    identity: &Identity,
    filename: &str,
    now: DateTime<Utc>,
) -> GalleryResult<UploadTicket> {
    let path = storage_path(&identity.id, filename, now);
    objects.put_signed(&path).await
}

/// Inserts the photo row, then its category links.
///
/// Link failures are logged and skipped: the photo stays, uncategorized for
/// that link.
pub async fn commit_photo(
    photos: &dyn PhotoStore,
    objects: &dyn ObjectStore,
    auth: &dyn IdentityProvider,
    payload: CommitPhotoPayload,
) -> GalleryResult<Photo> {
    let identity = require_identity(auth).await?;
    let title = validate_title(&payload.title)?;
    if !belongs_to(&identity.id, &payload.storage_path) {
        return Err(GalleryError::Forbidden);
    }
    insert_with_links(photos, objects, &identity, title, payload).await
}

async fn insert_with_links(
    photos: &dyn PhotoStore,
    objects: &dyn ObjectStore,
    identity: &Identity,
    title: String,
    payload: CommitPhotoPayload,
) -> GalleryResult<Photo> {
    let new_photo = NewPhoto {
        owner_id: identity.id.clone(),
        title,
        description: payload.description.filter(|d| !d.trim().is_empty()),
        public_url: objects.public_url(&payload.storage_path),
        storage_path: payload.storage_path,
        width: payload.width,
        height: payload.height,
        byte_size: payload.byte_size,
        is_public: true,
    };

    let photo = photos.insert_photo(new_photo).await?;

    for category_id in &payload.category_ids {
        if let Err(e) = photos.link_category(&photo.id, *category_id).await {
            tracing::warn!(
                "Photo {} committed but linking category {} failed: {}",
                photo.id,
                category_id,
                e
            );
        }
    }

    tracing::info!(
        "Committed photo {} at {} for {}",
        photo.id,
        photo.storage_path,
        photo.owner_id
    );
    Ok(photo)
}

/// Uploads `files` one after another.
///
/// Validation fails the whole call before any network traffic, including the
/// identity lookup. Authentication then fails it before any ticket is
/// requested. After that, a failure only ends its own file; the queue carries on
/// and the report lists one outcome per file in batch order.
pub async fn upload_batch(
    ctx: &UploadContext<'_>,
    files: &[LocalFile],
    metadata: &BatchMetadata,
    progress: &dyn ProgressSink,
) -> GalleryResult<UploadReport> {
    let base_title = validate_batch(files, &metadata.title, &ctx.limits)?;
    let identity = require_identity(ctx.auth).await?;

    let total = files.len();
    let mut tracker = ProgressTracker::new(total);
    let mut report = UploadReport::default();

    tracing::info!("Uploading batch of {} files for {}", total, identity.id);

    for (index, file) in files.iter().enumerate() {
        let title = batch_title(&base_title, index, total);
        let mut emit = |stage: UploadStage, percent: f64| {
            progress.report(&UploadProgress {
                file_index: index,
                file_name: file.name.clone(),
                stage,
                percent,
            })
        };

        match upload_one(ctx, &identity, file, title, metadata, &mut tracker, &mut emit).await {
            Ok(photo) => {
                report.record_committed(&file.name, photo);
                let percent = tracker.file_done();
                emit(UploadStage::Committed, percent);
            }
            Err(e) => {
                tracing::error!("Upload of {} failed: {}", file.name, e);
                report.record_failed(&file.name, &e);
                let percent = tracker.file_done();
                emit(UploadStage::Failed, percent);
            }
        }
    }

    tracing::info!(
        "Batch finished: {} committed, {} failed",
        report.committed.len(),
        report.failures.len()
    );
    Ok(report)
}

async fn upload_one(
    ctx: &UploadContext<'_>,
    identity: &Identity,
    file: &LocalFile,
    title: String,
    metadata: &BatchMetadata,
    tracker: &mut ProgressTracker,
    emit: &mut (dyn FnMut(UploadStage, f64) + Send),
) -> GalleryResult<Photo> {
    let ticket = request_ticket(ctx.objects, identity, &file.name, Utc::now()).await?;
    emit(UploadStage::Requesting, tracker.step_done(UploadStage::Requesting));

    ctx.transfer.send(&ticket, file).await?;
    emit(
        UploadStage::Transferring,
        tracker.step_done(UploadStage::Transferring),
    );

    // Bytes are in the store from here on; a later failure leaves them orphaned.
    let (width, height) = measure(&file.bytes)?;
    emit(UploadStage::Measuring, tracker.step_done(UploadStage::Measuring));

    let payload = CommitPhotoPayload {
        title: title.clone(),
        description: metadata.description.clone(),
        storage_path: ticket.storage_path,
        category_ids: metadata.category_ids.clone(),
        width: Some(width),
        height: Some(height),
        byte_size: Some(file.byte_size()),
    };
    emit(UploadStage::Committing, tracker.percent());
    insert_with_links(ctx.photos, ctx.objects, identity, title, payload).await
}
