//! # Redis
//!
//! Shared bounded capture list.
//!
//! Same retention contract as the in-memory store, but durable and visible
//! to every instance pointed at the same server.
//!
//! ## Layout
//!
//! - `<key>`: list of JSON-encoded records, newest at index 0
//! - `<key>:seq`: integer counter handing out record ids
//!
//! Insert pushes to the head and trims to `[0, cap-1]` in one atomic
//! pipeline, so readers never observe more than `cap` entries.
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError};
use tracing::{info, warn};

use snapvault_core::config::StorageBackend;
use snapvault_core::error::{Result, SnapvaultError};
use snapvault_core::types::{CaptureRecord, NewCapture, RecordId};

use crate::store::{CaptureStore, Retention};

/// Redis-backed [`CaptureStore`].
pub struct RedisListStore {
    conn: ConnectionManager,
    key: String,
    seq_key: String,
    cap: usize,
}

impl RedisListStore {
    /// Connect to `url` and use `key` as the capture list.
    pub async fn connect(url: &str, key: &str, cap: usize) -> Result<Self> {
        let client = Client::open(url).map_err(storage_err)?;
        let conn = client.get_connection_manager().await.map_err(storage_err)?;
        info!(key = %key, cap, "Connected to Redis capture list");

        Ok(Self {
            conn,
            key: key.to_string(),
            seq_key: format!("{key}:seq"),
            cap,
        })
    }
}

#[async_trait]
impl CaptureStore for RedisListStore {
    fn kind(&self) -> StorageBackend {
        StorageBackend::Redis
    }

    fn retention(&self) -> Retention {
        Retention::Bounded { cap: self.cap }
    }

    async fn insert(&self, capture: NewCapture) -> Result<RecordId> {
        let mut conn = self.conn.clone();

        let id: i64 = conn.incr(&self.seq_key, 1).await.map_err(storage_err)?;
        let record = capture.into_record(RecordId(id));
        let payload = serde_json::to_string(&record)?;

        let _: () = redis::pipe()
            .atomic()
            .lpush(&self.key, payload)
            .ignore()
            .ltrim(&self.key, 0, trim_stop(self.cap))
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(storage_err)?;

        Ok(record.id)
    }

    async fn list(&self, limit: usize) -> Result<Vec<CaptureRecord>> {
        let limit = limit.min(self.cap);
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut conn = self.conn.clone();
        let raw: Vec<String> = conn
            .lrange(&self.key, 0, trim_stop(limit))
            .await
            .map_err(storage_err)?;

        Ok(decode_entries(raw))
    }
}

/// Inclusive stop index for a list of `len` entries.
fn trim_stop(len: usize) -> isize {
    isize::try_from(len).unwrap_or(isize::MAX).saturating_sub(1)
}

/// Decode stored entries, skipping any that no longer parse.
fn decode_entries(raw: Vec<String>) -> Vec<CaptureRecord> {
    raw.into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_str(&entry) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(index, error = %e, "Skipping undecodable capture entry");
                None
            }
        })
        .collect()
}

fn storage_err(err: RedisError) -> SnapvaultError {
    SnapvaultError::StorageUnavailable(format!("redis: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use snapvault_core::types::SystemInfo;

    #[test]
    fn test_trim_stop() {
        assert_eq!(trim_stop(50), 49);
        assert_eq!(trim_stop(1), 0);
        assert_eq!(trim_stop(0), -1);
    }

    #[test]
    fn test_decode_skips_malformed_entries() {
        let good = NewCapture::new(Utc::now(), vec![], SystemInfo::new()).into_record(RecordId(4));
        let raw = vec![
            serde_json::to_string(&good).unwrap(),
            "{not json".to_string(),
            r#"{"id":2,"timestamp":"2024-01-01T00:00:00Z","images":["data:image/png;base64,AA"]}"#
                .to_string(),
        ];

        let records = decode_entries(raw);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, RecordId(4));
        assert_eq!(records[1].id, RecordId(2));
        assert_eq!(records[1].images.len(), 1);
    }

    fn test_url() -> Option<String> {
        std::env::var("SNAPVAULT_TEST_REDIS_URL").ok()
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server (SNAPVAULT_TEST_REDIS_URL)"]
    async fn test_bounded_list_against_live_server() {
        let Some(url) = test_url() else { return };
        let key = format!("snapvault:test:{}", std::process::id());
        let store = RedisListStore::connect(&url, &key, 3).await.unwrap();

        for n in 0..5 {
            let mut info = SystemInfo::new();
            info.insert("seq".into(), serde_json::Value::from(n));
            store
                .insert(NewCapture::new(Utc::now(), vec![], info))
                .await
                .unwrap();
        }

        let records = store.list(10).await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].system_info["seq"], 4);
        assert_eq!(records[2].system_info["seq"], 2);

        let mut conn = store.conn.clone();
        let _: () = redis::pipe()
            .del(&store.key)
            .ignore()
            .del(&store.seq_key)
            .ignore()
            .query_async(&mut conn)
            .await
            .unwrap();
    }
}
