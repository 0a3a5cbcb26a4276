use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use serde::Serialize;
use tracing::{error, info, warn};

use crate::archive::{ArchiveEntry, ArchiveSink};
use crate::catalog::{ImageDescriptor, TrustTier};
use crate::error::{ArchiveError, ProtectError};
use crate::io::BlobStore;
use crate::protect::{request_stamp, ForensicIdentity, ImageKind, ProtectionMode, Protector};

use super::fetch::fetch_image;

/// Default number of concurrent per-image workers.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// One archive download request, as the pipeline sees it.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub set_id: String,
    pub requester_id: String,
    pub tier: TrustTier,
    /// Request timestamp in nanoseconds, captured once and shared by every
    /// forensic token minted for this download.
    pub stamp: u128,
}

impl DownloadRequest {
    pub fn new(set_id: impl Into<String>, requester_id: impl Into<String>, tier: TrustTier) -> Self {
        Self {
            set_id: set_id.into(),
            requester_id: requester_id.into(),
            tier,
            stamp: request_stamp(),
        }
    }
}

/// Outcome counts for a settled run. `succeeded + skipped` equals the number
/// of images in the set unless the run aborted early.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub succeeded: usize,
    pub skipped: usize,
}

enum TaskOutcome {
    Done,
    Skipped,
}

/// Drives per-image tasks for one download with bounded concurrency.
pub struct Scheduler<B: BlobStore + 'static> {
    blob: Arc<B>,
    protector: Protector,
    limit: usize,
}

impl<B: BlobStore + 'static> Scheduler<B> {
    pub fn new(blob: Arc<B>, protector: Protector, limit: usize) -> Self {
        Self {
            blob,
            protector,
            limit: limit.max(1),
        }
    }

    /// Process every image and finalize the sink.
    ///
    /// Returns after all descriptors are resolved and the central directory
    /// has been written. Per-image failures are counted as skips; a sink
    /// failure flips the abort flag so no new task starts, then the error is
    /// returned after a best-effort finalize.
    pub async fn run(
        &self,
        images: Vec<ImageDescriptor>,
        request: &DownloadRequest,
        sink: ArchiveSink,
    ) -> Result<Summary, ArchiveError> {
        let total = images.len();
        let workers = self.limit.min(total);
        info!(
            set_id = request.set_id.as_str(),
            images = total,
            workers = workers,
            tier = %request.tier,
            "Starting download run"
        );

        let queue = Arc::new(StdMutex::new(VecDeque::from(images)));
        let sink = Arc::new(sink);
        let succeeded = Arc::new(AtomicUsize::new(0));
        let skipped = Arc::new(AtomicUsize::new(0));
        let abort = Arc::new(AtomicBool::new(false));
        let fatal: Arc<StdMutex<Option<ArchiveError>>> = Arc::new(StdMutex::new(None));

        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            let queue = queue.clone();
            let sink = sink.clone();
            let succeeded = succeeded.clone();
            let skipped = skipped.clone();
            let abort = abort.clone();
            let fatal = fatal.clone();
            let blob = self.blob.clone();
            let protector = self.protector.clone();
            let request = request.clone();

            handles.push(tokio::spawn(async move {
                loop {
                    if abort.load(Ordering::SeqCst) {
                        break;
                    }
                    let descriptor = queue.lock().unwrap().pop_front();
                    let Some(descriptor) = descriptor else { break };

                    match process_one(&*blob, &protector, &request, &descriptor, &sink).await {
                        Ok(TaskOutcome::Done) => {
                            succeeded.fetch_add(1, Ordering::SeqCst);
                        }
                        Ok(TaskOutcome::Skipped) => {
                            skipped.fetch_add(1, Ordering::SeqCst);
                        }
                        Err(e) => {
                            abort.store(true, Ordering::SeqCst);
                            fatal.lock().unwrap().get_or_insert(e);
                            break;
                        }
                    }
                }
            }));
        }

        for handle in handles {
            // Worker bodies never panic on task failure; a join error would
            // mean a bug, and poisoning the whole run is the right response.
            if handle.await.is_err() {
                abort.store(true, Ordering::SeqCst);
            }
        }

        let summary = Summary {
            succeeded: succeeded.load(Ordering::SeqCst),
            skipped: skipped.load(Ordering::SeqCst),
        };

        // All workers have joined, so this is the last handle.
        let Some(sink) = Arc::into_inner(sink) else {
            return Err(ArchiveError::StreamClosed);
        };

        let fatal = fatal.lock().unwrap().take();
        if let Some(e) = fatal {
            error!(
                set_id = request.set_id.as_str(),
                error = %e,
                "Download run aborted"
            );
            let _ = sink.finalize(summary).await;
            return Err(e);
        }

        let summary = sink.finalize(summary).await?;
        info!(
            set_id = request.set_id.as_str(),
            succeeded = summary.succeeded,
            skipped = summary.skipped,
            "Download run complete"
        );
        Ok(summary)
    }
}

/// Run one image task end to end: fetch, protect, append.
async fn process_one<B: BlobStore>(
    blob: &B,
    protector: &Protector,
    request: &DownloadRequest,
    descriptor: &ImageDescriptor,
    sink: &ArchiveSink,
) -> Result<TaskOutcome, ArchiveError> {
    let source = match fetch_image(blob, descriptor, request.tier).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(
                set_id = request.set_id.as_str(),
                image_id = descriptor.id.as_str(),
                error = %e,
                "Skipping image: fetch failed"
            );
            return Ok(TaskOutcome::Skipped);
        }
    };

    let identity = ForensicIdentity::mint(
        &request.requester_id,
        &request.set_id,
        &descriptor.id,
        request.stamp,
    );
    let mode = ProtectionMode::for_tier(request.tier);

    // Decode and re-encode are CPU-bound; keep them off the async workers.
    let protector = protector.clone();
    let requester_id = request.requester_id.clone();
    let protect_result: Result<(bytes::Bytes, ImageKind), ProtectError> =
        match tokio::task::spawn_blocking(move || {
            protector.protect(&source, mode, &identity, &requester_id)
        })
        .await
        {
            Ok(result) => result,
            Err(join_err) => {
                error!(
                    set_id = request.set_id.as_str(),
                    image_id = descriptor.id.as_str(),
                    error = %join_err,
                    "Skipping image: protection task panicked"
                );
                return Ok(TaskOutcome::Skipped);
            }
        };

    let (protected, kind) = match protect_result {
        Ok(out) => out,
        Err(e) => {
            warn!(
                set_id = request.set_id.as_str(),
                image_id = descriptor.id.as_str(),
                error = %e,
                "Skipping image: protection failed"
            );
            return Ok(TaskOutcome::Skipped);
        }
    };

    let entry = ArchiveEntry::new(
        descriptor.order_index,
        &descriptor.id,
        kind.extension(),
        protected,
    );
    sink.append(entry).await?;
    Ok(TaskOutcome::Done)
}
