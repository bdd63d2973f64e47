//! SQLite table backend.
//!
//! Durable and unbounded: nothing is evicted on write. Reads are capped at
//! `cap` rows ordered by `created_at DESC`, so the table keeps growing while
//! the visible window stays fixed.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tracing::warn;

use snapvault_core::config::StorageBackend;
use snapvault_core::error::{Result, SnapvaultError};
use snapvault_core::types::{CaptureRecord, NewCapture, RecordId, SystemInfo};

use crate::db::Database;
use crate::store::{CaptureStore, Retention};

/// Table-backed [`CaptureStore`].
pub struct TableStore {
    db: Arc<Database>,
    cap: usize,
}

/// Raw column values before JSON decoding.
struct CaptureRow {
    id: i64,
    created_at: i64,
    images: String,
    system_info: String,
    capture_count: i64,
}

impl TableStore {
    pub fn new(db: Arc<Database>, cap: usize) -> Self {
        Self { db, cap }
    }

    /// Total rows stored, ignoring the read cap.
    pub fn count(&self) -> Result<u64> {
        self.db.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM captures", [], |row| row.get(0))
                .map_err(|e| SnapvaultError::StorageUnavailable(e.to_string()))?;
            Ok(count as u64)
        })
    }
}

#[async_trait]
impl CaptureStore for TableStore {
    fn kind(&self) -> StorageBackend {
        StorageBackend::Sqlite
    }

    fn retention(&self) -> Retention {
        Retention::ReadCapped { cap: self.cap }
    }

    async fn insert(&self, capture: NewCapture) -> Result<RecordId> {
        let images = serde_json::to_string(&capture.images)?;
        let system_info = serde_json::to_string(&capture.system_info)?;

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO captures (created_at, images, system_info, capture_count)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    capture.created_at.timestamp_millis(),
                    images,
                    system_info,
                    capture.capture_count as i64,
                ],
            )
            .map_err(|e| SnapvaultError::StorageUnavailable(format!("Failed to save capture: {}", e)))?;
            Ok(RecordId(conn.last_insert_rowid()))
        })
    }

    async fn list(&self, limit: usize) -> Result<Vec<CaptureRecord>> {
        let limit = limit.min(self.cap);
        if limit == 0 {
            return Ok(Vec::new());
        }

        let rows = self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, created_at, images, system_info, capture_count
                     FROM captures
                     ORDER BY created_at DESC, id DESC
                     LIMIT ?1",
                )
                .map_err(|e| SnapvaultError::StorageUnavailable(e.to_string()))?;

            let rows = stmt
                .query_map(rusqlite::params![limit as i64], |row| {
                    Ok(CaptureRow {
                        id: row.get(0)?,
                        created_at: row.get(1)?,
                        images: row.get(2)?,
                        system_info: row.get(3)?,
                        capture_count: row.get(4)?,
                    })
                })
                .map_err(|e| SnapvaultError::StorageUnavailable(e.to_string()))?;

            let mut out = Vec::new();
            for row in rows {
                out.push(row.map_err(|e| SnapvaultError::StorageUnavailable(e.to_string()))?);
            }
            Ok(out)
        })?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let id = row.id;
                row_to_record(row)
                    .map_err(|e| warn!(id, error = %e, "Skipping undecodable capture row"))
                    .ok()
            })
            .collect())
    }
}

fn row_to_record(row: CaptureRow) -> Result<CaptureRecord> {
    let created_at: DateTime<Utc> = Utc
        .timestamp_millis_opt(row.created_at)
        .single()
        .ok_or_else(|| {
            SnapvaultError::Serialization(format!("Invalid created_at: {}", row.created_at))
        })?;
    let images: Vec<String> = serde_json::from_str(&row.images)?;
    let system_info: SystemInfo = serde_json::from_str(&row.system_info)?;

    Ok(CaptureRecord {
        id: RecordId(row.id),
        created_at,
        images,
        system_info,
        capture_count: usize::try_from(row.capture_count).unwrap_or(0),
    })
}
