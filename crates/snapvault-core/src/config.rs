use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, SnapvaultError};

/// Retention cap shared by every backend unless overridden.
pub const DEFAULT_RETENTION_CAP: usize = 50;

/// Top-level configuration for the Snapvault service.
///
/// Loaded from `~/.snapvault/config.toml` by default. Every section falls
/// back to its defaults when omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapvaultConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

impl SnapvaultConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SnapvaultConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage.retention_cap == 0 {
            return Err(SnapvaultError::Config(
                "storage.retention_cap must be at least 1".to_string(),
            ));
        }
        if self.storage.backend == StorageBackend::Redis && self.storage.redis_key.is_empty() {
            return Err(SnapvaultError::Config(
                "storage.redis_key must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3030,
        }
    }
}

/// Which storage backend serves captures. Fixed for the process lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local bounded list.
    #[default]
    Memory,
    /// Remote bounded list (Redis LPUSH/LTRIM).
    Redis,
    /// SQLite table with read-time capping.
    Sqlite,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Memory => "memory",
            StorageBackend::Redis => "redis",
            StorageBackend::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageBackend {
    type Err = SnapvaultError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "redis" => Ok(StorageBackend::Redis),
            "sqlite" => Ok(StorageBackend::Sqlite),
            other => Err(SnapvaultError::Config(format!(
                "Unknown storage backend '{}'. Must be one of: memory, redis, sqlite",
                other
            ))),
        }
    }
}

/// Storage and retention configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Maximum records kept (bounded backends) or returned (sqlite).
    pub retention_cap: usize,
    pub redis_url: String,
    /// Redis list key; the id counter lives at `<key>:seq`.
    pub redis_key: String,
    /// SQLite database file. `~/` is expanded by the binary.
    pub sqlite_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            retention_cap: DEFAULT_RETENTION_CAP,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            redis_key: "snapvault:captures".to_string(),
            sqlite_path: "~/.snapvault/data/snapvault.db".to_string(),
        }
    }
}

/// Ingest endpoint behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Reject submissions whose `images` field is absent with 400.
    pub require_images: bool,
    /// Request body limit; images arrive base64-encoded.
    pub max_body_bytes: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            require_images: false,
            max_body_bytes: 16 * 1024 * 1024,
        }
    }
}
