use std::io::Cursor;

use image::ImageFormat;

use super::model::LocalFile;
use crate::error::{GalleryError, GalleryResult};

pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
pub const ALLOWED_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

/// Upload limits; `Default` gives the stock 10 MiB JPEG/PNG/WebP policy.
#[derive(Debug, Clone)]
pub struct UploadLimits {
    pub max_file_size: u64,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_file_size: MAX_FILE_SIZE,
        }
    }
}

fn mime_for(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Jpeg => Some("image/jpeg"),
        ImageFormat::Png => Some("image/png"),
        ImageFormat::WebP => Some("image/webp"),
        _ => None,
    }
}

/// MIME type inferred from the file extension, for callers without one.
pub fn content_type_for_name(name: &str) -> Option<&'static str> {
    ImageFormat::from_path(name).ok().and_then(mime_for)
}

pub fn validate_title(title: &str) -> GalleryResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(GalleryError::validation("title must not be empty"));
    }
    Ok(title.to_string())
}

/// Declared type, decoded magic bytes and size must all pass.
pub fn validate_file(file: &LocalFile, limits: &UploadLimits) -> GalleryResult<()> {
    if !ALLOWED_TYPES.contains(&file.content_type.as_str()) {
        return Err(GalleryError::validation(format!(
            "{}: unsupported type {} (JPEG/PNG/WebP only)",
            file.name, file.content_type
        )));
    }
    if file.byte_size() == 0 {
        return Err(GalleryError::validation(format!("{}: file is empty", file.name)));
    }
    if file.byte_size() > limits.max_file_size {
        return Err(GalleryError::validation(format!(
            "{}: {} bytes exceeds the {} byte limit",
            file.name,
            file.byte_size(),
            limits.max_file_size
        )));
    }

    let sniffed = image::guess_format(&file.bytes)
        .ok()
        .and_then(mime_for);
    if sniffed != Some(file.content_type.as_str()) {
        return Err(GalleryError::validation(format!(
            "{}: content does not match declared type {}",
            file.name, file.content_type
        )));
    }
    Ok(())
}

/// Every file is checked before the first network call.
pub fn validate_batch(
    files: &[LocalFile],
    title: &str,
    limits: &UploadLimits,
) -> GalleryResult<String> {
    if files.is_empty() {
        return Err(GalleryError::validation("no files selected"));
    }
    let title = validate_title(title)?;
    for file in files {
        validate_file(file, limits)?;
    }
    Ok(title)
}

/// Pixel dimensions read from the image header.
pub fn measure(bytes: &[u8]) -> GalleryResult<(u32, u32)> {
    image::io::Reader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| GalleryError::validation(format!("unreadable image: {}", e)))?
        .into_dimensions()
        .map_err(|e| GalleryError::validation(format!("cannot decode image size: {}", e)))
}
