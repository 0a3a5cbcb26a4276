//! # Gallery Vault
//!
//! A streaming protected-archive server for gallery sets stored in
//! S3-compatible object storage.
//!
//! Given a set id, the server fetches every image in the set, applies a
//! trust-tier-dependent protection transform (visible watermark plus an
//! embedded forensic token, or the token alone), and streams a single ZIP
//! archive to the client. The archive is assembled incrementally: the first
//! bytes leave the server while later images are still being fetched, and no
//! complete archive ever exists in memory.
//!
//! ## Features
//!
//! - **Streaming assembly**: sealed archive bytes flow to the client through
//!   a bounded channel; memory stays proportional to one entry, not the set
//! - **Per-download forensics**: every delivered image carries a token tying
//!   it to the requester and the specific download
//! - **Bounded concurrency**: a fixed worker pool caps concurrent fetch and
//!   protect work per download
//! - **Skip-and-continue**: a missing or undecodable image is skipped and
//!   logged; the rest of the archive still arrives
//! - **Authentication**: optional HMAC-SHA256 signed URLs binding requester
//!   identity and trust tier
//!
//! ## Architecture
//!
//! - [`io`] - Blob storage abstraction and the S3 implementation
//! - [`catalog`] - Gallery set resolution from JSON manifests
//! - [`protect`] - Watermarking, forensic tokens and metadata tagging
//! - [`archive`] - Streaming ZIP sink
//! - [`pipeline`] - Fetch policy and the bounded-concurrency scheduler
//! - [`events`] - Fire-and-forget download event recording
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use gallery_vault::io::{create_s3_client, S3BlobStore};
//! use gallery_vault::protect::Protector;
//! use gallery_vault::server::{create_router, DownloadService, RouterConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = create_s3_client(None, "us-east-1").await;
//!     let blob = Arc::new(S3BlobStore::new(client, "my-galleries".to_string()));
//!
//!     let service = DownloadService::new(blob, Protector::new(), 8);
//!     let router = create_router(service, RouterConfig::new("secret-key"));
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod archive;
pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod io;
pub mod pipeline;
pub mod protect;
pub mod server;

// Re-export commonly used types
pub use archive::{ArchiveEntry, ArchiveSink, ArchiveStream};
pub use catalog::{Catalog, GallerySet, ImageDescriptor, ManifestCatalog, TrustTier};
pub use config::Config;
pub use error::{ArchiveError, CatalogError, DownloadError, IoError, ProtectError};
pub use events::{DownloadEvent, EventRecorder, LogRecorder};
pub use io::{create_s3_client, BlobStore, S3BlobStore};
pub use pipeline::{DownloadRequest, Scheduler, Summary};
pub use protect::{ForensicIdentity, ProtectionMode, Protector};
pub use server::{create_router, AppState, DownloadService, RouterConfig, SignedUrlAuth};
