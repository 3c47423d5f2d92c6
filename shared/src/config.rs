use std::env;
use std::time::Duration;

use gallery_atoms::photos::DEFAULT_PAGE_SIZE;
use gallery_atoms::uploads::UploadLimits;
use thiserror::Error;

pub const DEFAULT_TABLE_NAME: &str = "gallery";
pub const DEFAULT_BUCKET_NAME: &str = "gallery";
pub const DEFAULT_UPLOAD_URL_TTL_SECS: u64 = 7200;
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Deployment settings read from the environment
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryConfig {
    pub table_name: String,
    pub bucket_name: String,
    pub public_base_url: String,
    pub upload_url_ttl: Duration,
    pub max_upload_bytes: u64,
    pub page_size: usize,
}

impl GalleryConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as `from_env` over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let table_name = var("TABLE_NAME").unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string());
        let bucket_name = var("S3_BUCKET_NAME").unwrap_or_else(|| DEFAULT_BUCKET_NAME.to_string());
        let public_base_url = var("PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("https://{}.s3.amazonaws.com", bucket_name));

        let ttl_secs = parse_number(
            "UPLOAD_URL_TTL_SECS",
            var("UPLOAD_URL_TTL_SECS"),
            DEFAULT_UPLOAD_URL_TTL_SECS,
        )?;
        let max_upload_bytes = parse_number(
            "MAX_UPLOAD_BYTES",
            var("MAX_UPLOAD_BYTES"),
            DEFAULT_MAX_UPLOAD_BYTES,
        )?;
        let page_size = parse_number("PAGE_SIZE", var("PAGE_SIZE"), DEFAULT_PAGE_SIZE)?;

        Ok(GalleryConfig {
            table_name,
            bucket_name,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            upload_url_ttl: Duration::from_secs(ttl_secs),
            max_upload_bytes,
            page_size,
        })
    }

    pub fn upload_limits(&self) -> UploadLimits {
        UploadLimits {
            max_file_size: self.max_upload_bytes,
        }
    }
}

fn parse_number<T: std::str::FromStr + PartialOrd + Default>(
    name: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => Ok(value),
        _ => Err(ConfigError::Invalid {
            name,
            expected: "a positive integer",
            value: raw,
        }),
    }
}
