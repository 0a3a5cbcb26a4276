//! HTTP request handlers for the archive download API.
//!
//! # Endpoints
//!
//! - `GET /sets/{set_id}/archive` - Stream a protected ZIP of the set
//! - `GET /health` - Health check endpoint

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};

use crate::error::{CatalogError, DownloadError};
use crate::io::BlobStore;

use super::auth::DownloadContext;
use super::service::DownloadService;

// =============================================================================
// Application State
// =============================================================================

/// Shared application state, passed to handlers via Axum's State extractor.
pub struct AppState<B: BlobStore + 'static> {
    /// The download service bridging requests onto the pipeline
    pub service: Arc<DownloadService<B>>,
}

impl<B: BlobStore + 'static> AppState<B> {
    pub fn new(service: DownloadService<B>) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

impl<B: BlobStore + 'static> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all pre-stream error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "set_not_found")
    pub error: String,

    /// Human-readable error message
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

impl IntoResponse for DownloadError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            DownloadError::Catalog(CatalogError::SetNotFound { .. }) => {
                (StatusCode::NOT_FOUND, "set_not_found")
            }
            DownloadError::Catalog(CatalogError::InvalidManifest { .. }) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "invalid_manifest")
            }
            DownloadError::Catalog(CatalogError::Io(_)) | DownloadError::Io(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "storage_error")
            }
        };
        let message = self.to_string();

        // Missing sets are a client-side mistake; everything else here means
        // the platform itself is unhealthy.
        if status == StatusCode::NOT_FOUND {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Download rejected: {}",
                message
            );
        } else {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Download failed: {}",
                message
            );
        }

        (status, Json(ErrorResponse::new(error_type, message))).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Stream a protected archive of one gallery set.
///
/// Headers are committed before the first chunk, so any failure past this
/// point can only surface as an aborted transfer; all catalog and auth
/// errors are raised before the body starts.
pub async fn download_handler<B: BlobStore>(
    State(state): State<AppState<B>>,
    Path(set_id): Path<String>,
    context: DownloadContext,
) -> Result<Response, DownloadError> {
    let (set, stream) = state
        .service
        .start_download(&set_id, &context.requester_id, context.tier)
        .await?;

    let filename = format!("{}.zip", set.filename_slug());
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
            (header::CACHE_CONTROL, "no-cache".to_string()),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}

/// Health check endpoint.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "gallery-vault".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
