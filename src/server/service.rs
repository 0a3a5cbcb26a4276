use std::sync::Arc;

use tracing::info;

use crate::archive::{ArchiveSink, ArchiveStream, DEFAULT_CHUNK_CAPACITY};
use crate::catalog::{Catalog, GallerySet, ManifestCatalog, TrustTier};
use crate::error::CatalogError;
use crate::events::{record_detached, DownloadEvent, EventRecorder, LogRecorder};
use crate::io::BlobStore;
use crate::pipeline::{DownloadRequest, Scheduler};
use crate::protect::Protector;

/// Bridges one HTTP download request onto the pipeline.
///
/// `start_download` resolves the set up front (so catalog failures can still
/// become a proper error status), then spawns the pipeline run and hands the
/// chunk stream back for the response body. Everything after the first byte
/// is the pipeline's business.
pub struct DownloadService<B: BlobStore + 'static> {
    blob: Arc<B>,
    catalog: ManifestCatalog<B>,
    scheduler: Arc<Scheduler<B>>,
    recorder: Arc<dyn EventRecorder>,
    stream_capacity: usize,
}

impl<B: BlobStore + 'static> DownloadService<B> {
    /// Create a service over a blob store with a given worker limit.
    pub fn new(blob: Arc<B>, protector: Protector, concurrency: usize) -> Self {
        Self {
            catalog: ManifestCatalog::new(blob.clone()),
            scheduler: Arc::new(Scheduler::new(blob.clone(), protector, concurrency)),
            blob,
            recorder: Arc::new(LogRecorder),
            stream_capacity: DEFAULT_CHUNK_CAPACITY,
        }
    }

    /// Read set manifests under a custom key prefix.
    pub fn with_manifest_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.catalog = ManifestCatalog::with_prefix(self.blob.clone(), prefix);
        self
    }

    /// Replace the default log-only event recorder.
    pub fn with_recorder(mut self, recorder: Arc<dyn EventRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    /// Set the chunk channel depth between pipeline and response body.
    pub fn with_stream_capacity(mut self, capacity: usize) -> Self {
        self.stream_capacity = capacity.max(1);
        self
    }

    /// Resolve the set and start streaming its archive.
    ///
    /// The returned stream starts producing chunks as soon as the first
    /// entry is sealed; the pipeline run continues in a detached task. If
    /// the caller drops the stream, the run observes the closed channel and
    /// aborts.
    pub async fn start_download(
        &self,
        set_id: &str,
        requester_id: &str,
        tier: TrustTier,
    ) -> Result<(GallerySet, ArchiveStream), CatalogError> {
        let set = self.catalog.resolve_set(set_id).await?;

        record_detached(
            self.recorder.clone(),
            DownloadEvent::new(set_id, requester_id, tier, set.images.len()),
        );

        let request = DownloadRequest::new(set_id, requester_id, tier);
        let (sink, stream) = ArchiveSink::new(self.stream_capacity);

        info!(
            set_id = set_id,
            requester_id = requester_id,
            tier = %tier,
            images = set.images.len(),
            "Accepted archive download"
        );

        let scheduler = self.scheduler.clone();
        let images = set.images.clone();
        tokio::spawn(async move {
            // Failures are logged inside run; a dropped client shows up
            // there as a closed stream.
            let _ = scheduler.run(images, &request, sink).await;
        });

        Ok((set, stream))
    }
}
