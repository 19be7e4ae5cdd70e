/// JSON file user record backend
use crate::{
    error::{DirectoryError, DirectoryResult},
    user_store::{apply_delete, apply_upsert, User, UserBackend, UserId, UserInput},
};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::{fs, sync::Mutex};

/// JSON file backend
///
/// Keeps the full record set as a pretty-printed JSON array. Every mutation
/// reads the file, applies the change and overwrites the whole file.
pub struct JsonFileBackend {
    file_path: PathBuf,
    /// Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl JsonFileBackend {
    /// Create a new backend over `file_path`
    ///
    /// The file does not need to exist yet; a missing file reads as empty.
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Read and parse the backing file
    ///
    /// A file that cannot be read yields no records; one that cannot be
    /// parsed is an error.
    async fn read_data(&self) -> DirectoryResult<Vec<User>> {
        let bytes = match fs::read(&self.file_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.file_path.display(), "backing store missing, treating as empty");
                return Ok(Vec::new());
            }
            Err(e) => {
                tracing::error!(path = %self.file_path.display(), error = %e, "failed to read backing store");
                return Ok(Vec::new());
            }
        };

        serde_json::from_slice(&bytes).map_err(|e| {
            tracing::error!(path = %self.file_path.display(), error = %e, "backing store failed to parse");
            DirectoryError::StorageCorrupt(format!("{}: {}", self.file_path.display(), e))
        })
    }

    /// Overwrite the backing file with `users`
    async fn write_data(&self, users: &[User]) -> DirectoryResult<()> {
        let data = serde_json::to_vec_pretty(users)
            .map_err(|e| DirectoryError::Serialization(e.to_string()))?;

        fs::write(&self.file_path, data).await.map_err(|e| {
            DirectoryError::Filesystem(format!(
                "Failed to write {}: {}",
                self.file_path.display(),
                e
            ))
        })?;

        Ok(())
    }
}

#[async_trait]
impl UserBackend for JsonFileBackend {
    async fn list_all(&self) -> DirectoryResult<Vec<User>> {
        self.read_data().await
    }

    async fn upsert(&self, input: UserInput) -> DirectoryResult<User> {
        let _guard = self.write_lock.lock().await;

        let mut users = self.read_data().await?;
        let user = apply_upsert(&mut users, input)?;
        self.write_data(&users).await?;

        tracing::debug!(user_id = user.id, count = users.len(), "upserted user");
        Ok(user)
    }

    async fn delete(&self, id: UserId) -> DirectoryResult<bool> {
        let _guard = self.write_lock.lock().await;

        let mut users = self.read_data().await?;
        if !apply_delete(&mut users, id) {
            return Ok(false);
        }
        self.write_data(&users).await?;

        tracing::debug!(user_id = id, count = users.len(), "deleted user");
        Ok(true)
    }
}
