//! The storage seam shared by every capture backend.

use async_trait::async_trait;

use snapvault_core::config::StorageBackend;
use snapvault_core::error::Result;
use snapvault_core::types::{CaptureRecord, NewCapture, RecordId};

/// How a backend bounds what it keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    /// At most `cap` records are stored; the oldest inserted is evicted first.
    Bounded { cap: usize },
    /// Storage grows without bound; reads return at most `cap` records.
    ReadCapped { cap: usize },
}

impl Retention {
    pub fn cap(&self) -> usize {
        match *self {
            Retention::Bounded { cap } | Retention::ReadCapped { cap } => cap,
        }
    }
}

/// Persistence for capture records.
///
/// Implementations give read-your-writes on the same instance: a record is
/// visible to `list` once `insert` has returned `Ok`. Failures surface as
/// `SnapvaultError::StorageUnavailable` with a message safe to show clients.
#[async_trait]
pub trait CaptureStore: Send + Sync {
    fn kind(&self) -> StorageBackend;

    fn retention(&self) -> Retention;

    /// Append one record and return its assigned id.
    async fn insert(&self, capture: NewCapture) -> Result<RecordId>;

    /// Up to `limit` records, most recent first.
    async fn list(&self, limit: usize) -> Result<Vec<CaptureRecord>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retention_cap() {
        assert_eq!(Retention::Bounded { cap: 50 }.cap(), 50);
        assert_eq!(Retention::ReadCapped { cap: 7 }.cap(), 7);
    }
}
