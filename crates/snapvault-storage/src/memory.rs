//! Process-local bounded capture list.
//!
//! Records live only as long as the process and are not shared between
//! instances. Appends go to the tail; the head is trimmed past the cap.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use snapvault_core::config::StorageBackend;
use snapvault_core::error::{Result, SnapvaultError};
use snapvault_core::types::{CaptureRecord, NewCapture, RecordId};

use crate::store::{CaptureStore, Retention};

struct Inner {
    records: VecDeque<CaptureRecord>,
    next_id: i64,
}

/// In-memory [`CaptureStore`] holding at most `cap` records.
pub struct MemoryStore {
    cap: usize,
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            inner: Mutex::new(Inner {
                records: VecDeque::with_capacity(cap.min(1024) + 1),
                next_id: 1,
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|i| i.records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|e| SnapvaultError::StorageUnavailable(format!("Memory store lock poisoned: {}", e)))
    }
}

#[async_trait]
impl CaptureStore for MemoryStore {
    fn kind(&self) -> StorageBackend {
        StorageBackend::Memory
    }

    fn retention(&self) -> Retention {
        Retention::Bounded { cap: self.cap }
    }

    async fn insert(&self, capture: NewCapture) -> Result<RecordId> {
        let mut inner = self.lock()?;
        let id = RecordId(inner.next_id);
        inner.next_id += 1;
        inner.records.push_back(capture.into_record(id));

        while inner.records.len() > self.cap {
            if let Some(evicted) = inner.records.pop_front() {
                debug!(id = %evicted.id, "Evicted oldest capture");
            }
        }
        Ok(id)
    }

    async fn list(&self, limit: usize) -> Result<Vec<CaptureRecord>> {
        let inner = self.lock()?;
        Ok(inner.records.iter().rev().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use snapvault_core::types::SystemInfo;

    fn capture(n: usize) -> NewCapture {
        let mut info = SystemInfo::new();
        info.insert("seq".into(), serde_json::Value::from(n));
        NewCapture::new(Utc::now(), vec![format!("data:image/png;base64,{n}")], info)
    }

    #[tokio::test]
    async fn test_insert_then_list() {
        let store = MemoryStore::new(50);
        let id = store.insert(capture(1)).await.unwrap();

        let records = store.list(50).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, id);
        assert_eq!(records[0].images, vec!["data:image/png;base64,1".to_string()]);
        assert_eq!(records[0].system_info["seq"], 1);
        assert_eq!(records[0].capture_count, 1);
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let store = MemoryStore::new(5);
        let a = store.insert(capture(1)).await.unwrap();
        let b = store.insert(capture(2)).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_list_is_most_recent_first() {
        let store = MemoryStore::new(10);
        for n in 0..3 {
            store.insert(capture(n)).await.unwrap();
        }
        let seqs: Vec<_> = store
            .list(10)
            .await
            .unwrap()
            .iter()
            .map(|r| r.system_info["seq"].as_u64().unwrap())
            .collect();
        assert_eq!(seqs, vec![2, 1, 0]);
    }

    #[tokio::test]
    async fn test_overflow_keeps_most_recent_cap() {
        let cap = 50;
        let store = MemoryStore::new(cap);
        for n in 0..cap + 7 {
            store.insert(capture(n)).await.unwrap();
        }
        assert_eq!(store.len(), cap);

        let records = store.list(usize::MAX).await.unwrap();
        assert_eq!(records.len(), cap);
        assert_eq!(records[0].system_info["seq"], (cap + 6) as u64);
        assert_eq!(records[cap - 1].system_info["seq"], 7);
    }

    #[tokio::test]
    async fn test_list_respects_limit() {
        let store = MemoryStore::new(50);
        for n in 0..4 {
            store.insert(capture(n)).await.unwrap();
        }
        assert_eq!(store.list(2).await.unwrap().len(), 2);
        assert_eq!(store.list(10).await.unwrap().len(), 4);
        assert!(store.list(0).await.unwrap().is_empty());
    }
}
