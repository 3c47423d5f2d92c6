use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gallery_atoms::uploads::{content_type_for_name, LocalFile};

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Reads every file up front; the declared type comes from the extension.
pub async fn load_files(paths: &[PathBuf]) -> Result<Vec<LocalFile>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let name = file_name(path);
        let content_type = content_type_for_name(&name).unwrap_or("application/octet-stream");
        files.push(LocalFile::new(name, content_type, bytes));
    }
    Ok(files)
}

/// First file name without its extension.
pub fn default_title(paths: &[PathBuf]) -> Option<String> {
    paths
        .first()
        .and_then(|p| p.file_stem())
        .map(|s| s.to_string_lossy().trim().to_string())
        .filter(|s| !s.is_empty())
}
