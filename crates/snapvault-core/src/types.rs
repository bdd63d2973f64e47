use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Free-form client metadata attached to a capture.
///
/// Values are expected to be strings, but any JSON value is tolerated.
pub type SystemInfo = serde_json::Map<String, serde_json::Value>;

// =============================================================================
// Identifiers
// =============================================================================

/// Backend-assigned record identifier.
///
/// Opaque to callers; unique within one storage backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Records
// =============================================================================

/// One submitted batch of images plus metadata; the unit of storage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CaptureRecord {
    pub id: RecordId,
    #[serde(alias = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub system_info: SystemInfo,
    #[serde(default)]
    pub capture_count: usize,
}

/// A capture that has not been assigned an id yet.
#[derive(Clone, Debug, PartialEq)]
pub struct NewCapture {
    pub created_at: DateTime<Utc>,
    pub images: Vec<String>,
    pub system_info: SystemInfo,
    pub capture_count: usize,
}

impl NewCapture {
    pub fn new(created_at: DateTime<Utc>, images: Vec<String>, system_info: SystemInfo) -> Self {
        let capture_count = images.len();
        Self {
            created_at,
            images,
            system_info,
            capture_count,
        }
    }

    /// Attach the backend-assigned id.
    pub fn into_record(self, id: RecordId) -> CaptureRecord {
        CaptureRecord {
            id,
            created_at: self.created_at,
            images: self.images,
            system_info: self.system_info,
            capture_count: self.capture_count,
        }
    }
}

/// Request body accepted by the ingest endpoint.
///
/// Every field is optional; absent and `null` fields are defaulted when the
/// submission is normalized.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CaptureSubmission {
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default)]
    pub system_info: Option<SystemInfo>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl CaptureSubmission {
    /// Build a [`NewCapture`], filling gaps with `received_at` and empty values.
    pub fn normalize(self, received_at: DateTime<Utc>) -> NewCapture {
        let created_at = match self.timestamp.as_deref() {
            Some(raw) => parse_timestamp(raw).unwrap_or_else(|| {
                warn!(timestamp = %raw, "Unparseable client timestamp, using receipt time");
                received_at
            }),
            None => received_at,
        };

        NewCapture::new(
            created_at,
            self.images.unwrap_or_default(),
            self.system_info.unwrap_or_default(),
        )
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// =============================================================================
// Events
// =============================================================================

/// Summary published after a capture is stored.
///
/// Carries no images or client metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CaptureEvent {
    pub id: RecordId,
    pub created_at: DateTime<Utc>,
    pub capture_count: usize,
}

impl From<&CaptureRecord> for CaptureEvent {
    fn from(record: &CaptureRecord) -> Self {
        Self {
            id: record.id,
            created_at: record.created_at,
            capture_count: record.capture_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn received() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_capture_count_matches_images() {
        let capture = NewCapture::new(
            received(),
            vec!["data:image/png;base64,AAAA".into(), "data:image/png;base64,BBBB".into()],
            SystemInfo::new(),
        );
        assert_eq!(capture.capture_count, 2);
    }

    #[test]
    fn test_normalize_defaults_missing_fields() {
        let capture = CaptureSubmission::default().normalize(received());
        assert!(capture.images.is_empty());
        assert!(capture.system_info.is_empty());
        assert_eq!(capture.capture_count, 0);
        assert_eq!(capture.created_at, received());
    }

    #[test]
    fn test_normalize_uses_client_timestamp() {
        let submission: CaptureSubmission = serde_json::from_str(
            r#"{"images":["data:image/png;base64,AAAA"],"system_info":{"ip_address":"1.2.3.4"},"timestamp":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        let capture = submission.normalize(received());
        assert_eq!(
            capture.created_at,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(capture.capture_count, 1);
        assert_eq!(capture.system_info["ip_address"], "1.2.3.4");
    }

    #[test]
    fn test_normalize_falls_back_on_bad_timestamp() {
        let submission = CaptureSubmission {
            timestamp: Some("yesterday-ish".into()),
            ..Default::default()
        };
        assert_eq!(submission.normalize(received()).created_at, received());
    }

    #[test]
    fn test_null_fields_are_treated_as_absent() {
        let submission: CaptureSubmission =
            serde_json::from_str(r#"{"images":null,"system_info":null}"#).unwrap();
        assert!(submission.images.is_none());
        let capture = submission.normalize(received());
        assert!(capture.images.is_empty());
    }

    #[test]
    fn test_record_json_shape() {
        let record = NewCapture::new(received(), vec![], SystemInfo::new()).into_record(RecordId(7));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["capture_count"], 0);
        assert!(json["created_at"].is_string());
    }

    #[test]
    fn test_record_tolerates_legacy_and_missing_fields() {
        let record: CaptureRecord =
            serde_json::from_str(r#"{"id":3,"timestamp":"2024-01-01T00:00:00Z"}"#).unwrap();
        assert_eq!(record.id, RecordId(3));
        assert!(record.images.is_empty());
        assert!(record.system_info.is_empty());
    }

    #[test]
    fn test_event_from_record() {
        let record = NewCapture::new(received(), vec!["x".into()], SystemInfo::new())
            .into_record(RecordId(11));
        let event = CaptureEvent::from(&record);
        assert_eq!(event.id, RecordId(11));
        assert_eq!(event.capture_count, 1);
    }
}
