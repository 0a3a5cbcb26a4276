//! Gallery Vault - streaming protected archive server.
//!
//! This binary starts the HTTP server and wires up all components.

use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gallery_vault::{
    config::Config,
    io::{create_s3_client, S3BlobStore},
    protect::Protector,
    server::{DownloadService, RouterConfig},
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    // Initialize logging
    init_logging(config.verbose);

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Gallery Vault v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  S3 bucket: {}", config.s3_bucket);
    if let Some(ref endpoint) = config.s3_endpoint {
        info!("  S3 endpoint: {}", endpoint);
    }
    info!("  S3 region: {}", config.s3_region);
    info!("  Manifest prefix: {}", config.manifest_prefix);
    info!(
        "  Pipeline: {} workers, {} chunk buffer, JPEG quality {}",
        config.concurrency, config.stream_buffer, config.jpeg_quality
    );

    // Auth status with warning if disabled
    if config.auth_enabled {
        info!("  Auth: enabled");
    } else {
        warn!("  Auth: DISABLED - archive downloads are publicly accessible");
        warn!("        Enable for production: --auth-enabled --auth-secret=<secret>");
    }

    // Create S3 client
    let s3_client = create_s3_client(config.s3_endpoint.as_deref(), &config.s3_region).await;

    // Test S3 connectivity
    info!("Connecting to S3...");
    match test_s3_connection(&s3_client, &config.s3_bucket, &config.manifest_prefix).await {
        Ok(manifest_count) => {
            info!("  Connected successfully");
            info!(
                "  Found {} manifest object(s) under '{}/'",
                manifest_count, config.manifest_prefix
            );
        }
        Err(e) => {
            error!("  Failed to connect to S3: {}", e);
            error!("  Please check:");
            error!("    - Your AWS credentials are configured correctly");
            error!(
                "    - The bucket '{}' exists and is accessible",
                config.s3_bucket
            );
            error!("    - The S3 endpoint is correct (if using MinIO/custom S3)");
            return ExitCode::FAILURE;
        }
    }

    // Build the download service
    let blob = Arc::new(S3BlobStore::new(s3_client, config.s3_bucket.clone()));
    let protector = Protector::with_quality(config.jpeg_quality);
    let service = DownloadService::new(blob, protector, config.concurrency)
        .with_manifest_prefix(&config.manifest_prefix)
        .with_stream_capacity(config.stream_buffer);

    // Create router
    let router = create_router(&config, service);

    // Bind and serve
    let addr = config.bind_address();
    info!("Server listening on http://{}", addr);
    info!("  Health: curl http://{}/health", addr);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Test S3 connectivity and count manifest objects.
async fn test_s3_connection(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    manifest_prefix: &str,
) -> Result<usize, String> {
    let result = client
        .list_objects_v2()
        .bucket(bucket)
        .prefix(format!("{}/", manifest_prefix))
        .max_keys(1000)
        .send()
        .await
        .map_err(|e| format!("{}", e))?;

    let count = result
        .contents()
        .iter()
        .filter(|obj| {
            obj.key()
                .map(|k| k.to_lowercase().ends_with(".json"))
                .unwrap_or(false)
        })
        .count();

    Ok(count)
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "gallery_vault=debug,tower_http=debug"
    } else {
        "gallery_vault=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build the router from the application config.
fn create_router(
    config: &Config,
    service: DownloadService<S3BlobStore>,
) -> axum::Router {
    let mut router_config = if config.auth_enabled {
        RouterConfig::new(config.auth_secret_or_empty())
    } else {
        RouterConfig::without_auth()
    };

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }
    router_config = router_config.with_tracing(!config.no_tracing);

    gallery_vault::server::create_router(service, router_config)
}
