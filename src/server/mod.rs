//! HTTP server layer for protected archive downloads.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │               GET /sets/{set_id}/archive                        │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐  │
//! │  │  handlers   │  │    auth     │  │        routes           │  │
//! │  │ (requests)  │  │ (signed URL)│  │  (router config)        │  │
//! │  └──────┬──────┘  └─────────────┘  └─────────────────────────┘  │
//! │         │                                                       │
//! │  ┌──────▼──────┐                                                │
//! │  │   service   │  resolve set, spawn pipeline, hand back the    │
//! │  │  (bridge)   │  chunk stream as the response body             │
//! │  └─────────────┘                                                │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod handlers;
pub mod routes;
pub mod service;

pub use auth::{auth_middleware, AuthError, DownloadContext, SignedUrlAuth};
pub use handlers::{download_handler, health_handler, AppState, ErrorResponse, HealthResponse};
pub use routes::{create_router, RouterConfig};
pub use service::DownloadService;
