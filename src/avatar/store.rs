/// Disk-based avatar storage
use crate::{
    error::{DirectoryError, DirectoryResult},
    user_store::UserId,
};
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Extension used when the uploaded file name carries none
pub const DEFAULT_EXTENSION: &str = ".jpg";

/// Avatar storage
///
/// Stores images under `{root}/{user_id}/{epoch_millis}{ext}` and hands out
/// URLs of the form `{url_prefix}/{user_id}/{file}`.
#[derive(Debug, Clone)]
pub struct AvatarStore {
    root: PathBuf,
    url_prefix: String,
}

impl AvatarStore {
    /// Create a new avatar store
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    /// Root directory holding every user's avatar directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Avatar directory of one user
    pub fn user_dir(&self, user_id: UserId) -> PathBuf {
        self.root.join(user_id.to_string())
    }

    /// Write an avatar for `user_id` and return its relative URL
    pub async fn store(
        &self,
        user_id: UserId,
        data: &[u8],
        original_filename: Option<&str>,
    ) -> DirectoryResult<String> {
        let dir = self.user_dir(user_id);
        fs::create_dir_all(&dir).await.map_err(|e| {
            DirectoryError::Filesystem(format!(
                "Failed to create avatar directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        let filename = generate_filename(original_filename, Utc::now().timestamp_millis());
        let path = dir.join(&filename);
        fs::write(&path, data).await.map_err(|e| {
            DirectoryError::Filesystem(format!("Failed to write avatar {}: {}", path.display(), e))
        })?;

        tracing::info!(user_id, file = %filename, size = data.len(), "stored avatar");

        Ok(format!("{}/{}/{}", self.url_prefix, user_id, filename))
    }

    /// Delete every entry in `directory` except `keep`
    ///
    /// A missing directory is an error. Returns the number of entries removed.
    pub async fn prune_others(&self, directory: &Path, keep: &str) -> DirectoryResult<usize> {
        let mut entries = fs::read_dir(directory).await.map_err(|e| {
            DirectoryError::Filesystem(format!(
                "Failed to list avatar directory {}: {}",
                directory.display(),
                e
            ))
        })?;

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_name() == keep {
                continue;
            }

            let path = entry.path();
            let result = if entry.file_type().await?.is_dir() {
                fs::remove_dir_all(&path).await
            } else {
                fs::remove_file(&path).await
            };
            result.map_err(|e| {
                DirectoryError::Filesystem(format!(
                    "Failed to remove stale avatar {}: {}",
                    path.display(),
                    e
                ))
            })?;
            removed += 1;
        }

        tracing::debug!(directory = %directory.display(), keep, removed, "pruned avatar directory");
        Ok(removed)
    }
}

/// Build a stored file name from a timestamp and the original file's extension
pub fn generate_filename(original_filename: Option<&str>, epoch_millis: i64) -> String {
    let extension = original_filename
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());

    format!("{}{}", epoch_millis, extension)
}

/// File name portion of an avatar URL (its last `/`-separated segment)
pub fn filename_from_url(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}
