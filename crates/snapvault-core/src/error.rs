use thiserror::Error;

/// Top-level error type for the Snapvault system.
///
/// Storage backends, config loading and the API layer all report through
/// this enum so the `?` operator works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SnapvaultError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for SnapvaultError {
    fn from(err: toml::de::Error) -> Self {
        SnapvaultError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for SnapvaultError {
    fn from(err: toml::ser::Error) -> Self {
        SnapvaultError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for SnapvaultError {
    fn from(err: serde_json::Error) -> Self {
        SnapvaultError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Snapvault operations.
pub type Result<T> = std::result::Result<T, SnapvaultError>;
