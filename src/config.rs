//! Configuration management for the archive download server.
//!
//! Supports command-line arguments via clap, environment variables with the
//! `GV_` prefix, and sensible defaults for all optional settings.
//!
//! # Environment Variables
//!
//! - `GV_HOST` - Server bind address (default: 0.0.0.0)
//! - `GV_PORT` - Server port (default: 3000)
//! - `GV_S3_BUCKET` - S3 bucket name (required)
//! - `GV_S3_ENDPOINT` - Custom S3 endpoint for S3-compatible services
//! - `GV_S3_REGION` - AWS region (default: us-east-1)
//! - `GV_MANIFEST_PREFIX` - Key prefix for set manifests (default: manifests)
//! - `GV_AUTH_SECRET` - HMAC secret for signed URLs
//! - `GV_AUTH_ENABLED` - Enable authentication (default: true)
//! - `GV_CONCURRENCY` - Per-download worker limit (default: 8)
//! - `GV_STREAM_BUFFER` - Chunk channel depth (default: 16)
//! - `GV_JPEG_QUALITY` - Re-encode quality for watermarked JPEGs (default: 90)
//! - `GV_CORS_ORIGINS` - Allowed CORS origins (comma-separated)

use clap::Parser;

use crate::archive::DEFAULT_CHUNK_CAPACITY;
use crate::catalog::DEFAULT_MANIFEST_PREFIX;
use crate::pipeline::DEFAULT_CONCURRENCY;
use crate::protect::DEFAULT_REENCODE_QUALITY;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default AWS region.
pub const DEFAULT_REGION: &str = "us-east-1";

// =============================================================================
// CLI Arguments
// =============================================================================

/// Gallery Vault - streaming protected archive server.
///
/// Assembles on-demand ZIP archives of gallery sets stored in S3-compatible
/// storage, applying per-download protection to every image and streaming
/// the result without buffering whole archives in memory.
#[derive(Parser, Debug, Clone)]
#[command(name = "gallery-vault")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "GV_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "GV_PORT")]
    pub port: u16,

    // =========================================================================
    // S3 Configuration
    // =========================================================================
    /// S3 bucket holding images and set manifests.
    #[arg(long, env = "GV_S3_BUCKET")]
    pub s3_bucket: String,

    /// Custom S3 endpoint URL for S3-compatible services (MinIO, etc.).
    ///
    /// If not specified, uses the default AWS S3 endpoint.
    #[arg(long, env = "GV_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// AWS region for S3.
    #[arg(long, default_value = DEFAULT_REGION, env = "GV_S3_REGION")]
    pub s3_region: String,

    /// Key prefix under which set manifests live.
    #[arg(long, default_value = DEFAULT_MANIFEST_PREFIX, env = "GV_MANIFEST_PREFIX")]
    pub manifest_prefix: String,

    // =========================================================================
    // Authentication Configuration
    // =========================================================================
    /// Secret key for HMAC-SHA256 signed URL authentication.
    ///
    /// If not provided and auth is enabled, the server will fail to start.
    #[arg(long, env = "GV_AUTH_SECRET")]
    pub auth_secret: Option<String>,

    /// Enable signed URL authentication.
    ///
    /// When disabled, all archive requests are allowed without authentication.
    /// WARNING: Only disable authentication in development/testing.
    #[arg(long, default_value_t = true, env = "GV_AUTH_ENABLED")]
    pub auth_enabled: bool,

    // =========================================================================
    // Pipeline Configuration
    // =========================================================================
    /// Maximum concurrent fetch/protect operations per download.
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY, env = "GV_CONCURRENCY")]
    pub concurrency: usize,

    /// Depth of the chunk channel between pipeline and response body.
    #[arg(long, default_value_t = DEFAULT_CHUNK_CAPACITY, env = "GV_STREAM_BUFFER")]
    pub stream_buffer: usize,

    /// JPEG quality used when re-encoding watermarked images (1-100).
    #[arg(long, default_value_t = DEFAULT_REENCODE_QUALITY, env = "GV_JPEG_QUALITY")]
    pub jpeg_quality: u8,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "GV_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.auth_enabled && self.auth_secret.is_none() {
            return Err(
                "Authentication is enabled but no secret provided. \
                 Set --auth-secret or GV_AUTH_SECRET, or disable auth with --auth-enabled=false"
                    .to_string(),
            );
        }

        if self.s3_bucket.is_empty() {
            return Err("S3 bucket name is required. Set --s3-bucket or GV_S3_BUCKET".to_string());
        }

        if self.manifest_prefix.is_empty() {
            return Err("manifest_prefix must not be empty".to_string());
        }

        if self.concurrency == 0 {
            return Err("concurrency must be greater than 0".to_string());
        }

        if self.stream_buffer == 0 {
            return Err("stream_buffer must be greater than 0".to_string());
        }

        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err("jpeg_quality must be between 1 and 100".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the auth secret, or empty when auth is disabled (call validate() first).
    pub fn auth_secret_or_empty(&self) -> &str {
        self.auth_secret.as_deref().unwrap_or("")
    }
}

// =============================================================================
// Tests
// =============================================================================
