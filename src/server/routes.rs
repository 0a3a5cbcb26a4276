//! Router configuration for the archive download server.
//!
//! # Route Structure
//!
//! ```text
//! /health                      - Health check (public)
//! /sets/{set_id}/archive       - Streamed protected ZIP (protected)
//! ```

use std::time::Duration;

use axum::{middleware, routing::get, Router};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::io::BlobStore;

use super::auth::SignedUrlAuth;
use super::handlers::{download_handler, health_handler, AppState};
use super::service::DownloadService;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Clone)]
pub struct RouterConfig {
    /// Secret key for signed URL authentication
    pub auth_secret: String,

    /// Whether authentication is enabled for archive requests
    pub auth_enabled: bool,

    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a router configuration with the given auth secret.
    ///
    /// Authentication and tracing are enabled by default; CORS allows any
    /// origin.
    pub fn new(auth_secret: impl Into<String>) -> Self {
        Self {
            auth_secret: auth_secret.into(),
            auth_enabled: true,
            cors_origins: None,
            enable_tracing: true,
        }
    }

    /// Create a configuration with authentication disabled.
    ///
    /// **Warning**: only for development and testing.
    pub fn without_auth() -> Self {
        Self {
            auth_secret: String::new(),
            auth_enabled: false,
            cors_origins: None,
            enable_tracing: true,
        }
    }

    /// Set specific allowed CORS origins.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Enable or disable authentication.
    pub fn with_auth_enabled(mut self, enabled: bool) -> Self {
        self.auth_enabled = enabled;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
pub fn create_router<B>(service: DownloadService<B>, config: RouterConfig) -> Router
where
    B: BlobStore + 'static,
{
    let app_state = AppState::new(service);
    let cors = build_cors_layer(&config);

    let router = if config.auth_enabled {
        let auth = SignedUrlAuth::new(&config.auth_secret);
        build_protected_router(app_state, auth, cors)
    } else {
        build_public_router(app_state, cors)
    };

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build router with signed-URL authentication on the archive route.
fn build_protected_router<B>(app_state: AppState<B>, auth: SignedUrlAuth, cors: CorsLayer) -> Router
where
    B: BlobStore + 'static,
{
    // Auth is applied after nesting so the middleware sees the full
    // /sets/... path that was signed.
    let archive_routes = Router::new()
        .route("/{set_id}/archive", get(download_handler::<B>))
        .with_state(app_state);

    let protected_routes = Router::new()
        .nest("/sets", archive_routes)
        .layer(middleware::from_fn_with_state(
            auth,
            super::auth::auth_middleware,
        ));

    let public_routes = Router::new().route("/health", get(health_handler));

    Router::new()
        .merge(protected_routes)
        .merge(public_routes)
        .layer(cors)
}

/// Build router without authentication (for development/testing).
fn build_public_router<B>(app_state: AppState<B>, cors: CorsLayer) -> Router
where
    B: BlobStore + 'static,
{
    Router::new()
        .route("/health", get(health_handler))
        .route("/sets/{set_id}/archive", get(download_handler::<B>))
        .with_state(app_state)
        .layer(cors)
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(86400));

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
