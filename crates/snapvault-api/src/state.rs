//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::broadcast;

use snapvault_core::config::SnapvaultConfig;
use snapvault_core::types::CaptureEvent;
use snapvault_storage::CaptureStore;

/// Shared application state.
///
/// Built once at start-up and cloned into each handler; every field is
/// cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<SnapvaultConfig>,
    /// The storage backend selected in config.
    pub store: Arc<dyn CaptureStore>,
    /// Broadcast sender for new-capture events.
    pub event_tx: broadcast::Sender<CaptureEvent>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: SnapvaultConfig, store: Arc<dyn CaptureStore>) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            config: Arc::new(config),
            store,
            event_tx,
            start_time: Instant::now(),
        }
    }

    /// Records returned by list routes; the configured retention cap.
    pub fn list_limit(&self) -> usize {
        self.store.retention().cap()
    }
}
