/// Application context and dependency injection
use crate::{
    avatar::{AvatarStore, UploadGate},
    config::ServerConfig,
    error::{DirectoryError, DirectoryResult},
    service::UserService,
    user_store::{JsonFileBackend, UserBackend},
};
use std::{path::Path, sync::Arc, time::Instant};

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub backend: Arc<dyn UserBackend>,
    pub users: Arc<UserService>,
    /// One in-flight avatar upload per user
    pub upload_gate: UploadGate,
    pub started_at: Instant,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> DirectoryResult<Self> {
        // Validate configuration
        config.validate()?;

        // Create data directories if they don't exist
        Self::ensure_directories(&config).await?;

        let backend: Arc<dyn UserBackend> =
            Arc::new(JsonFileBackend::new(config.storage.data_file.clone()));
        let avatars = AvatarStore::new(config.avatar_root(), config.avatar_url_prefix());
        let users = Arc::new(UserService::new(Arc::clone(&backend), avatars));

        tracing::info!(
            data_file = %config.storage.data_file.display(),
            public_root = %config.storage.public_root.display(),
            "storage initialised"
        );

        Ok(Self {
            config: Arc::new(config),
            backend,
            users,
            upload_gate: UploadGate::new(),
            started_at: Instant::now(),
        })
    }

    /// Ensure required directories exist
    async fn ensure_directories(config: &ServerConfig) -> DirectoryResult<()> {
        let avatar_root = config.avatar_root();
        let mut dirs: Vec<&Path> = vec![config.storage.public_root.as_path(), avatar_root.as_path()];
        if let Some(parent) = config.storage.data_file.parent() {
            if !parent.as_os_str().is_empty() {
                dirs.push(parent);
            }
        }

        for dir in dirs {
            if !dir.exists() {
                tokio::fs::create_dir_all(dir).await.map_err(|e| {
                    DirectoryError::Filesystem(format!(
                        "Failed to create directory {:?}: {}",
                        dir, e
                    ))
                })?;
            }
        }

        Ok(())
    }

    /// Get service URL
    pub fn service_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.config.service.hostname, self.config.service.port
        )
    }

    /// Seconds since the context was created
    pub fn uptime_seconds(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }
}
