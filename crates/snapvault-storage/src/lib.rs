//! Snapvault Storage crate - capture persistence behind one trait.
//!
//! Provides the `CaptureStore` trait and its three interchangeable
//! implementations: a process-local bounded list, a Redis-backed bounded
//! list, and a SQLite table that caps only at read time.

pub mod db;
pub mod memory;
pub mod migrations;
pub mod redis_list;
pub mod store;
pub mod table;

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use snapvault_core::config::{StorageBackend, StorageConfig};
use snapvault_core::error::Result;

pub use db::Database;
pub use memory::MemoryStore;
pub use redis_list::RedisListStore;
pub use store::{CaptureStore, Retention};
pub use table::TableStore;

/// Build the backend selected in config.
///
/// Called once at process start; the returned handle is shared by every
/// request handler.
pub async fn open_store(config: &StorageConfig) -> Result<Arc<dyn CaptureStore>> {
    let cap = config.retention_cap;
    let store: Arc<dyn CaptureStore> = match config.backend {
        StorageBackend::Memory => Arc::new(MemoryStore::new(cap)),
        StorageBackend::Redis => {
            Arc::new(RedisListStore::connect(&config.redis_url, &config.redis_key, cap).await?)
        }
        StorageBackend::Sqlite => {
            let db = Database::new(Path::new(&config.sqlite_path))?;
            Arc::new(TableStore::new(Arc::new(db), cap))
        }
    };
    info!(backend = %store.kind(), retention = ?store.retention(), "Capture store ready");
    Ok(store)
}
