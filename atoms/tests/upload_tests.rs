mod common;

use std::sync::atomic::Ordering;
use std::sync::Mutex;

use common::{png, png_file, CountingIdentity, MemoryObjectStore, MemoryPhotoStore, MemoryTransfer};
use gallery_atoms::auth::StaticIdentity;
use gallery_atoms::uploads::{
    upload_batch, BatchMetadata, LocalFile, NoProgress, UploadContext, UploadLimits,
    UploadProgress, UploadStage,
};
use gallery_atoms::{FileOutcome, GalleryError};

fn metadata(title: &str) -> BatchMetadata {
    BatchMetadata {
        title: title.to_string(),
        description: Some("trip".into()),
        category_ids: vec![3],
    }
}

#[tokio::test]
async fn failed_transfer_only_skips_that_file() {
    let photos = MemoryPhotoStore::new();
    let objects = MemoryObjectStore::new();
    let transfer = MemoryTransfer::failing_on(&["two.png"]);
    let auth = StaticIdentity::user("u1");
    let ctx = UploadContext {
        photos: &photos,
        objects: &objects,
        transfer: &transfer,
        auth: &auth,
        limits: UploadLimits::default(),
    };
    let files = vec![png_file("one.png"), png_file("two.png"), png_file("three.png")];

    let report = upload_batch(&ctx, &files, &metadata("Dunes"), &NoProgress)
        .await
        .unwrap();

    let titles: Vec<&str> = report.committed.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["Dunes (1)", "Dunes (3)"]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].file, "two.png");
    assert_eq!(photos.all().len(), 2);

    let committed = &report.committed[0];
    assert!(committed.is_public);
    assert_eq!(committed.owner_id, "u1");
    assert_eq!((committed.width, committed.height), (Some(4), Some(3)));
    assert!(committed.storage_path.starts_with("u1/"));
    assert_eq!(
        committed.public_url,
        format!("https://cdn.test/{}", committed.storage_path)
    );
    assert_eq!(photos.links().len(), 2);

    match report.into_result() {
        Err(GalleryError::PartialBatchFailure { outcomes }) => {
            assert_eq!(outcomes.len(), 3);
            assert!(matches!(outcomes[1], FileOutcome::Failed { .. }));
        }
        other => panic!("expected partial failure, got {:?}", other),
    }
}

#[tokio::test]
async fn single_file_keeps_the_plain_title() {
    let photos = MemoryPhotoStore::new();
    let objects = MemoryObjectStore::new();
    let transfer = MemoryTransfer::new();
    let auth = StaticIdentity::user("u1");
    let ctx = UploadContext {
        photos: &photos,
        objects: &objects,
        transfer: &transfer,
        auth: &auth,
        limits: UploadLimits::default(),
    };

    let report = upload_batch(&ctx, &[png_file("solo.png")], &metadata("  Solo "), &NoProgress)
        .await
        .unwrap();

    assert_eq!(report.committed[0].title, "Solo");
    assert!(report.into_result().is_ok());
}

#[tokio::test]
async fn invalid_file_rejects_batch_before_any_network_call() {
    let photos = MemoryPhotoStore::new();
    let objects = MemoryObjectStore::new();
    let transfer = MemoryTransfer::new();
    let auth = StaticIdentity::user("u1");
    let ctx = UploadContext {
        photos: &photos,
        objects: &objects,
        transfer: &transfer,
        auth: &auth,
        limits: UploadLimits::default(),
    };
    let files = vec![
        png_file("good.png"),
        LocalFile::new("anim.gif", "image/gif", b"GIF89a".to_vec()),
    ];

    let err = upload_batch(&ctx, &files, &metadata("Mixed"), &NoProgress)
        .await
        .unwrap_err();

    assert!(matches!(err, GalleryError::Validation(_)));
    assert_eq!(objects.ticket_count(), 0);
    assert_eq!(transfer.sent_count(), 0);
    assert!(photos.all().is_empty());
}

#[tokio::test]
async fn oversized_file_rejects_batch() {
    let photos = MemoryPhotoStore::new();
    let objects = MemoryObjectStore::new();
    let transfer = MemoryTransfer::new();
    let auth = StaticIdentity::user("u1");
    let ctx = UploadContext {
        photos: &photos,
        objects: &objects,
        transfer: &transfer,
        auth: &auth,
        limits: UploadLimits { max_file_size: 16 },
    };

    let err = upload_batch(&ctx, &[png_file("big.png")], &metadata("Big"), &NoProgress)
        .await
        .unwrap_err();
    assert!(matches!(err, GalleryError::Validation(_)));
    assert_eq!(objects.ticket_count(), 0);
}

#[tokio::test]
async fn blank_title_rejects_batch() {
    let photos = MemoryPhotoStore::new();
    let objects = MemoryObjectStore::new();
    let transfer = MemoryTransfer::new();
    let auth = StaticIdentity::user("u1");
    let ctx = UploadContext {
        photos: &photos,
        objects: &objects,
        transfer: &transfer,
        auth: &auth,
        limits: UploadLimits::default(),
    };

    let err = upload_batch(&ctx, &[png_file("a.png")], &metadata("   "), &NoProgress)
        .await
        .unwrap_err();
    assert!(matches!(err, GalleryError::Validation(_)));
}

#[tokio::test]
async fn anonymous_upload_is_rejected() {
    let photos = MemoryPhotoStore::new();
    let objects = MemoryObjectStore::new();
    let transfer = MemoryTransfer::new();
    let auth = StaticIdentity::anonymous();
    let ctx = UploadContext {
        photos: &photos,
        objects: &objects,
        transfer: &transfer,
        auth: &auth,
        limits: UploadLimits::default(),
    };

    let err = upload_batch(&ctx, &[png_file("a.png")], &metadata("Dunes"), &NoProgress)
        .await
        .unwrap_err();
    assert!(matches!(err, GalleryError::Unauthenticated));
    assert_eq!(objects.ticket_count(), 0);
}

#[tokio::test]
async fn link_failures_keep_the_photo() {
    let photos = MemoryPhotoStore::new();
    photos.fail_links.store(true, Ordering::SeqCst);
    let objects = MemoryObjectStore::new();
    let transfer = MemoryTransfer::new();
    let auth = StaticIdentity::user("u1");
    let ctx = UploadContext {
        photos: &photos,
        objects: &objects,
        transfer: &transfer,
        auth: &auth,
        limits: UploadLimits::default(),
    };

    let report = upload_batch(&ctx, &[png_file("a.png")], &metadata("Dunes"), &NoProgress)
        .await
        .unwrap();

    assert_eq!(report.committed.len(), 1);
    assert!(report.failures.is_empty());
    assert!(photos.links().is_empty());
}

#[tokio::test]
async fn undecodable_image_fails_after_transfer() {
    let photos = MemoryPhotoStore::new();
    let objects = MemoryObjectStore::new();
    let transfer = MemoryTransfer::new();
    let auth = StaticIdentity::user("u1");
    let ctx = UploadContext {
        photos: &photos,
        objects: &objects,
        transfer: &transfer,
        auth: &auth,
        limits: UploadLimits::default(),
    };
    // Valid PNG signature, truncated header
    let mut bytes = png(4, 3);
    bytes.truncate(12);
    let files = vec![LocalFile::new("cut.png", "image/png", bytes), png_file("ok.png")];

    let report = upload_batch(&ctx, &files, &metadata("Cut"), &NoProgress)
        .await
        .unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].file, "cut.png");
    assert_eq!(report.committed.len(), 1);
    assert_eq!(transfer.sent_count(), 2);
}

#[tokio::test]
async fn progress_is_monotonic_and_ends_at_100() {
    let photos = MemoryPhotoStore::new();
    let objects = MemoryObjectStore::new();
    let transfer = MemoryTransfer::failing_on(&["b.png"]);
    let auth = StaticIdentity::user("u1");
    let ctx = UploadContext {
        photos: &photos,
        objects: &objects,
        transfer: &transfer,
        auth: &auth,
        limits: UploadLimits::default(),
    };
    let events: Mutex<Vec<UploadProgress>> = Mutex::new(vec![]);
    let sink = |p: &UploadProgress| events.lock().unwrap().push(p.clone());

    upload_batch(
        &ctx,
        &[png_file("a.png"), png_file("b.png"), png_file("c.png")],
        &metadata("Run"),
        &sink,
    )
    .await
    .unwrap();

    let events = events.into_inner().unwrap();
    let committing: Vec<usize> = events
        .iter()
        .filter(|e| e.stage == UploadStage::Committing)
        .map(|e| e.file_index)
        .collect();
    assert_eq!(committing, vec![0, 2]);

    let percents: Vec<f64> = events.iter().map(|e| e.percent).collect();
    assert!(percents.windows(2).all(|w| w[1] >= w[0]));
    assert_eq!(percents.last().copied(), Some(100.0));
    assert!(percents[..percents.len() - 1].iter().all(|p| *p < 100.0));

    let failed: Vec<usize> = events
        .iter()
        .filter(|e| e.stage == UploadStage::Failed)
        .map(|e| e.file_index)
        .collect();
    assert_eq!(failed, vec![1]);
}

#[tokio::test]
async fn failed_ticket_request_only_skips_that_file() {
    let photos = MemoryPhotoStore::new();
    let objects = MemoryObjectStore::new();
    objects.fail_tickets_for(&[2]);
    let transfer = MemoryTransfer::new();
    let auth = StaticIdentity::user("u1");
    let ctx = UploadContext {
        photos: &photos,
        objects: &objects,
        transfer: &transfer,
        auth: &auth,
        limits: UploadLimits::default(),
    };
    let files = vec![png_file("one.png"), png_file("two.png"), png_file("three.png")];

    let report = upload_batch(&ctx, &files, &metadata("Dunes"), &NoProgress)
        .await
        .unwrap();

    let titles: Vec<&str> = report.committed.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["Dunes (1)", "Dunes (3)"]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].file, "two.png");

    let sent: Vec<String> = transfer.sent.lock().unwrap().iter().map(|(f, _)| f.clone()).collect();
    assert_eq!(sent, vec!["one.png", "three.png"]);
    assert_eq!(photos.all().len(), 2);
}

#[tokio::test]
async fn failed_insert_is_reported_after_the_bytes_were_sent() {
    let photos = MemoryPhotoStore::new();
    photos.fail_inserts_for(&["Dunes (2)"]);
    let objects = MemoryObjectStore::new();
    let transfer = MemoryTransfer::new();
    let auth = StaticIdentity::user("u1");
    let ctx = UploadContext {
        photos: &photos,
        objects: &objects,
        transfer: &transfer,
        auth: &auth,
        limits: UploadLimits::default(),
    };
    let files = vec![png_file("one.png"), png_file("two.png"), png_file("three.png")];

    let report = upload_batch(&ctx, &files, &metadata("Dunes"), &NoProgress)
        .await
        .unwrap();

    let titles: Vec<&str> = report.committed.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["Dunes (1)", "Dunes (3)"]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].file, "two.png");

    assert_eq!(transfer.sent_count(), 3);
    assert!(transfer
        .sent
        .lock()
        .unwrap()
        .iter()
        .any(|(file, _)| file == "two.png"));
    assert_eq!(photos.all().len(), 2);
    assert_eq!(photos.links().len(), 2);
}

#[tokio::test]
async fn invalid_batch_is_rejected_before_the_identity_lookup() {
    let photos = MemoryPhotoStore::new();
    let objects = MemoryObjectStore::new();
    let transfer = MemoryTransfer::new();
    let auth = CountingIdentity::anonymous();
    let ctx = UploadContext {
        photos: &photos,
        objects: &objects,
        transfer: &transfer,
        auth: &auth,
        limits: UploadLimits::default(),
    };
    let files = vec![LocalFile::new("anim.gif", "image/gif", b"GIF89a".to_vec())];

    let err = upload_batch(&ctx, &files, &metadata("Mixed"), &NoProgress)
        .await
        .unwrap_err();

    assert!(matches!(err, GalleryError::Validation(_)));
    assert_eq!(auth.lookup_count(), 0);
    assert_eq!(objects.ticket_count(), 0);
}

#[tokio::test]
async fn valid_batch_looks_up_the_identity_once() {
    let photos = MemoryPhotoStore::new();
    let objects = MemoryObjectStore::new();
    let transfer = MemoryTransfer::new();
    let auth = CountingIdentity::user("u1");
    let ctx = UploadContext {
        photos: &photos,
        objects: &objects,
        transfer: &transfer,
        auth: &auth,
        limits: UploadLimits::default(),
    };

    let report = upload_batch(
        &ctx,
        &[png_file("a.png"), png_file("b.png")],
        &metadata("Pair"),
        &NoProgress,
    )
    .await
    .unwrap();

    assert_eq!(report.committed.len(), 2);
    assert_eq!(auth.lookup_count(), 1);
}
