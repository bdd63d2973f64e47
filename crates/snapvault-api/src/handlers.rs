//! Route handler functions for all API endpoints.
//!
//! Handlers talk to the storage backend through `AppState::store` and never
//! panic on backend failures; those become error responses.

use std::convert::Infallible;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::{debug, error, info};

use snapvault_core::error::SnapvaultError;
use snapvault_core::types::{CaptureEvent, CaptureRecord, CaptureSubmission, RecordId};

use crate::error::ApiError;
use crate::gallery;
use crate::state::AppState;

/// Cache policy for the gallery page.
pub const GALLERY_CACHE_CONTROL: &str = "s-maxage=1, stale-while-revalidate";

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct IngestResponse {
    pub success: bool,
    pub message: String,
    pub id: RecordId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub backend: String,
    pub uptime_secs: u64,
}

// =============================================================================
// Capture endpoints
// =============================================================================

/// POST /captures - store one capture submission.
///
/// Missing fields are defaulted. With `ingest.require_images` set, a
/// submission without an `images` field is rejected with 400.
pub async fn ingest(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<IngestResponse>, ApiError> {
    let submission = parse_submission(&body)?;

    if state.config.ingest.require_images && submission.images.is_none() {
        return Err(SnapvaultError::Validation("'images' is required".to_string()).into());
    }

    let capture = submission.normalize(Utc::now());
    let created_at = capture.created_at;
    let capture_count = capture.capture_count;

    let id = state.store.insert(capture).await.map_err(|e| {
        error!(backend = %state.store.kind(), error = %e, "Failed to store capture");
        ApiError::storage("Failed to store capture", e)
    })?;

    info!(id = %id, capture_count, "Capture stored");

    publish_event(
        &state,
        CaptureEvent {
            id,
            created_at,
            capture_count,
        },
    );

    Ok(Json(IngestResponse {
        success: true,
        message: "Capture received".to_string(),
        id,
    }))
}

/// GET /captures - stored records as JSON, most recent first.
pub async fn list_captures(
    State(state): State<AppState>,
) -> Result<Json<Vec<CaptureRecord>>, ApiError> {
    let records = state.store.list(state.list_limit()).await.map_err(|e| {
        error!(backend = %state.store.kind(), error = %e, "Failed to list captures");
        ApiError::storage("Failed to load captures", e)
    })?;
    Ok(Json(records))
}

/// OPTIONS /captures - bare success for preflight requests.
///
/// Requests carrying CORS preflight headers are answered by the CORS layer
/// before reaching this handler.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// Any other method on /captures.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// GET /captures/stream - SSE stream of new-capture events.
pub async fn stream(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>> + Send> {
    let rx = state.event_tx.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(event) => {
            let data = serde_json::to_string(&event).unwrap_or_default();
            Some(Ok(Event::default().event("capture").data(data)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

// =============================================================================
// Gallery and health
// =============================================================================

/// GET /gallery - HTML page with one card per stored record.
pub async fn gallery(State(state): State<AppState>) -> Response {
    match state.store.list(state.list_limit()).await {
        Ok(records) => {
            debug!(count = records.len(), "Rendering gallery");
            (
                [(header::CACHE_CONTROL, GALLERY_CACHE_CONTROL)],
                Html(gallery::render_gallery(&records)),
            )
                .into_response()
        }
        Err(e) => {
            error!(backend = %state.store.kind(), error = %e, "Failed to load gallery");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(gallery::render_error_page("storage unavailable")),
            )
                .into_response()
        }
    }
}

/// GET /health - liveness and backend summary.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        backend: state.store.kind().to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

// =============================================================================
// Helpers
// =============================================================================

/// Parse a submission body. An empty body counts as `{}`.
fn parse_submission(body: &[u8]) -> Result<CaptureSubmission, SnapvaultError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(CaptureSubmission::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| SnapvaultError::Validation(format!("Malformed capture payload: {}", e)))
}

/// Hand the event to a detached task. Nothing observes its outcome.
fn publish_event(state: &AppState, event: CaptureEvent) {
    let tx = state.event_tx.clone();
    tokio::spawn(async move {
        let id = event.id;
        match tx.send(event) {
            Ok(receivers) => debug!(id = %id, receivers, "Capture event published"),
            Err(_) => debug!(id = %id, "No subscribers for capture event"),
        }
    });
}
