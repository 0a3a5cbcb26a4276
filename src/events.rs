//! Download event recording.
//!
//! Recording is strictly fire-and-forget: the recorder runs in a spawned
//! task that is never joined, and a failed record is logged and dropped.
//! Nothing here may delay the first streamed byte of an archive.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

use crate::catalog::TrustTier;

/// One archive download, as seen by downstream consumers (billing, abuse
/// detection, analytics).
#[derive(Debug, Clone, Serialize)]
pub struct DownloadEvent {
    pub set_id: String,
    pub requester_id: String,
    pub tier: TrustTier,
    pub image_count: usize,
    /// Seconds since the Unix epoch at which the download was accepted.
    pub timestamp: u64,
}

impl DownloadEvent {
    pub fn new(
        set_id: impl Into<String>,
        requester_id: impl Into<String>,
        tier: TrustTier,
        image_count: usize,
    ) -> Self {
        Self {
            set_id: set_id.into(),
            requester_id: requester_id.into(),
            tier,
            image_count,
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap()
                .as_secs(),
        }
    }
}

/// Sink for download events.
#[async_trait]
pub trait EventRecorder: Send + Sync {
    async fn record(&self, event: DownloadEvent) -> Result<(), String>;
}

/// Recorder that writes events to the structured log.
pub struct LogRecorder;

#[async_trait]
impl EventRecorder for LogRecorder {
    async fn record(&self, event: DownloadEvent) -> Result<(), String> {
        info!(
            set_id = event.set_id.as_str(),
            requester_id = event.requester_id.as_str(),
            tier = %event.tier,
            image_count = event.image_count,
            timestamp = event.timestamp,
            "Archive download"
        );
        Ok(())
    }
}

/// Record an event without waiting for it.
pub fn record_detached(recorder: Arc<dyn EventRecorder>, event: DownloadEvent) {
    tokio::spawn(async move {
        let set_id = event.set_id.clone();
        if let Err(e) = recorder.record(event).await {
            warn!(set_id = set_id.as_str(), error = e.as_str(), "Failed to record download event");
        }
    });
}
