use async_trait::async_trait;
use bytes::Bytes;

use crate::error::IoError;

/// Trait for whole-object reads and writes against remote blob storage.
///
/// This abstraction lets the download pipeline work against S3 in production
/// and against in-memory stores in tests. Implementations must be thread-safe;
/// the pipeline issues `get` calls from many concurrent worker tasks.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Fetch the full contents of the object at `key`.
    ///
    /// Returns `IoError::NotFound` if the object does not exist; the pipeline
    /// relies on that variant to drive its single-fallback fetch policy.
    async fn get(&self, key: &str) -> Result<Bytes, IoError>;

    /// Store `bytes` at `key`, replacing any existing object.
    async fn put(&self, key: &str, bytes: Bytes) -> Result<(), IoError>;

    /// Get a unique identifier for this store (for logging).
    ///
    /// For S3, this would typically be `s3://bucket`.
    fn identifier(&self) -> &str;
}
