pub mod config;
pub mod error;
pub mod types;

pub use config::{SnapvaultConfig, StorageBackend};
pub use error::{Result, SnapvaultError};
pub use types::*;
