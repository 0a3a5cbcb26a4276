//! Download pipeline: fetch, protect, append.
//!
//! One download request fans out into per-image tasks over a shared FIFO
//! queue. A fixed pool of workers drains the queue, so at most `limit`
//! fetch-or-protect operations run at any instant regardless of set size.
//! Individual image failures become skips; only sink failure (client gone or
//! broken container) aborts the run.

mod fetch;
mod scheduler;

pub use fetch::fetch_image;
pub use scheduler::{DownloadRequest, Scheduler, Summary, DEFAULT_CONCURRENCY};
