use chrono::{DateTime, Datelike, Utc};
use rand::distr::Alphanumeric;
use rand::Rng;

const FALLBACK_EXTENSION: &str = "png";
const SUFFIX_LEN: usize = 6;

/// `{owner}/{yyyy}/{mm}/{millis}-{random}.{ext}`
///
/// The original file name never reaches the store; only its extension does.
pub fn storage_path(owner_id: &str, filename: &str, now: DateTime<Utc>) -> String {
    let suffix: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    storage_path_with_suffix(owner_id, filename, now, &suffix)
}

pub(crate) fn storage_path_with_suffix(
    owner_id: &str,
    filename: &str,
    now: DateTime<Utc>,
    suffix: &str,
) -> String {
    format!(
        "{}/{}/{:02}/{}-{}.{}",
        owner_id,
        now.year(),
        now.month(),
        now.timestamp_millis(),
        suffix,
        extension(filename)
    )
}

fn extension(filename: &str) -> String {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string())
}

/// True when `path` sits under the owner's prefix.
pub fn belongs_to(owner_id: &str, path: &str) -> bool {
    path.strip_prefix(owner_id)
        .and_then(|rest| rest.strip_prefix('/'))
        .is_some_and(|rest| !rest.is_empty() && !rest.split('/').any(|seg| seg == ".."))
}

/// Title shown for file `index` (0-based) of a batch of `total`.
pub fn batch_title(base: &str, index: usize, total: usize) -> String {
    if total > 1 {
        format!("{} ({})", base, index + 1)
    } else {
        base.to_string()
    }
}
