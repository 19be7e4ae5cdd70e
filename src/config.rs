/// Configuration management for the user directory
use crate::error::{DirectoryError, DirectoryResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub uploads: UploadConfig,
    pub pagination: PaginationConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    pub version: String,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// JSON file holding every user record
    pub data_file: PathBuf,
    /// Root of the publicly served files; avatars live in `<public_root>/avatar`
    pub public_root: PathBuf,
    /// URL segment the public root is mounted under
    pub static_prefix: String,
}

/// Avatar upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub max_avatar_bytes: usize,
    /// Larger side, in pixels, above which uploads are downscaled
    pub avatar_max_dimension: Option<u32>,
}

/// Pagination configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub default_page_size: i64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    /// Emit one JSON object per event instead of human-readable lines
    pub json: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> DirectoryResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("DIRECTORY_HOSTNAME").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("DIRECTORY_PORT")
            .unwrap_or_else(|_| "4000".to_string())
            .parse()
            .map_err(|_| DirectoryError::Validation("Invalid port number".to_string()))?;
        let version = env::var("DIRECTORY_VERSION")
            .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string());

        let data_file = env::var("DIRECTORY_DATA_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./static-files-storage/data.json"));
        let public_root = env::var("DIRECTORY_PUBLIC_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./public"));
        let static_prefix = env::var("DIRECTORY_STATIC_PREFIX")
            .unwrap_or_else(|_| "static".to_string())
            .trim_matches('/')
            .to_string();

        let max_avatar_bytes = env::var("DIRECTORY_AVATAR_MAX_BYTES")
            .unwrap_or_else(|_| "2000000".to_string())
            .parse()
            .map_err(|_| DirectoryError::Validation("Invalid avatar size limit".to_string()))?;
        let avatar_max_dimension = match env::var("DIRECTORY_AVATAR_MAX_DIMENSION") {
            Ok(value) => Some(value.parse().map_err(|_| {
                DirectoryError::Validation("Invalid avatar max dimension".to_string())
            })?),
            Err(_) => None,
        };

        let default_page_size = env::var("DIRECTORY_DEFAULT_PAGE_SIZE")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|_| DirectoryError::Validation("Invalid default page size".to_string()))?;

        let log_level = env::var("RUST_LOG")
            .unwrap_or_else(|_| "user_directory=debug,tower_http=debug".to_string());
        let log_json = env::var("DIRECTORY_LOG_JSON")
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            service: ServiceConfig {
                hostname,
                port,
                version,
            },
            storage: StorageConfig {
                data_file,
                public_root,
                static_prefix,
            },
            uploads: UploadConfig {
                max_avatar_bytes,
                avatar_max_dimension,
            },
            pagination: PaginationConfig { default_page_size },
            logging: LoggingConfig {
                level: log_level,
                json: log_json,
            },
        })
    }

    /// Build a configuration rooted in a single directory
    ///
    /// The data file and public root are placed inside `base`, everything
    /// else keeps its default. Used by tests and local tooling.
    pub fn rooted_at(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        Self {
            service: ServiceConfig {
                hostname: "127.0.0.1".to_string(),
                port: 4000,
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            storage: StorageConfig {
                data_file: base.join("data.json"),
                public_root: base.join("public"),
                static_prefix: "static".to_string(),
            },
            uploads: UploadConfig {
                max_avatar_bytes: 2_000_000,
                avatar_max_dimension: None,
            },
            pagination: PaginationConfig {
                default_page_size: 10,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                json: false,
            },
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> DirectoryResult<()> {
        if self.service.port == 0 {
            return Err(DirectoryError::Validation("Port must be non-zero".to_string()));
        }

        if self.uploads.max_avatar_bytes == 0 {
            return Err(DirectoryError::Validation(
                "Avatar size limit must be greater than zero".to_string(),
            ));
        }

        if self.uploads.avatar_max_dimension == Some(0) {
            return Err(DirectoryError::Validation(
                "Avatar max dimension must be greater than zero".to_string(),
            ));
        }

        if self.pagination.default_page_size <= 0 {
            return Err(DirectoryError::Validation(
                "Default page size must be greater than zero".to_string(),
            ));
        }

        if self.storage.static_prefix.is_empty() {
            return Err(DirectoryError::Validation(
                "Static prefix cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Directory holding one subdirectory of avatars per user
    pub fn avatar_root(&self) -> PathBuf {
        self.storage.public_root.join("avatar")
    }

    /// URL prefix for stored avatars, relative to the server root
    pub fn avatar_url_prefix(&self) -> String {
        format!("{}/avatar", self.storage.static_prefix)
    }
}
