use bytes::Bytes;
use tracing::warn;

use crate::catalog::{ImageDescriptor, TrustTier};
use crate::error::IoError;
use crate::io::BlobStore;

/// Fetch the bytes to protect for one image.
///
/// Untrusted callers are served the pre-protected variant when the upload
/// pipeline produced one; everyone else gets the original. A missing
/// pre-protected variant falls back to the original exactly once; that
/// single retry is the whole budget, so a set with both keys missing costs
/// two lookups, not a retry loop.
pub async fn fetch_image<B: BlobStore>(
    blob: &B,
    descriptor: &ImageDescriptor,
    tier: TrustTier,
) -> Result<Bytes, IoError> {
    let primary = match (&descriptor.primary_key, tier) {
        (Some(key), TrustTier::Untrusted) => Some(key.as_str()),
        _ => None,
    };

    if let Some(key) = primary {
        match blob.get(key).await {
            Ok(bytes) => return Ok(bytes),
            Err(IoError::NotFound(_)) => {
                warn!(
                    image_id = descriptor.id.as_str(),
                    key = key,
                    "Pre-protected variant missing, falling back to original"
                );
            }
            Err(e) => return Err(e),
        }
    }

    blob.get(&descriptor.fallback_key).await
}
