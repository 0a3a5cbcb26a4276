use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use crate::error::{CatalogError, IoError};
use crate::io::BlobStore;

use super::types::{GallerySet, ImageDescriptor};

/// Default key prefix under which set manifests live in the blob store.
pub const DEFAULT_MANIFEST_PREFIX: &str = "manifests";

/// Trait for resolving a set id into its title and ordered image list.
///
/// The metadata layer behind this is external to the download pipeline; only
/// the resolved [`GallerySet`] matters downstream.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn resolve_set(&self, set_id: &str) -> Result<GallerySet, CatalogError>;
}

/// On-disk manifest shape: what the upload pipeline writes per set.
#[derive(Debug, Deserialize)]
struct SetManifest {
    title: String,
    images: Vec<ImageDescriptor>,
}

/// Catalog that reads one JSON manifest per set from the blob store.
///
/// The manifest for set `abc` lives at `{prefix}/abc.json`. A missing object
/// maps to `SetNotFound` (HTTP 404); a present-but-unparseable manifest maps
/// to `InvalidManifest` (HTTP 500), since that indicates upload-side breakage
/// rather than a bad request.
pub struct ManifestCatalog<B: BlobStore> {
    blob: Arc<B>,
    prefix: String,
}

impl<B: BlobStore> ManifestCatalog<B> {
    /// Create a catalog with the default manifest prefix.
    pub fn new(blob: Arc<B>) -> Self {
        Self::with_prefix(blob, DEFAULT_MANIFEST_PREFIX)
    }

    /// Create a catalog reading manifests under a custom prefix.
    pub fn with_prefix(blob: Arc<B>, prefix: impl Into<String>) -> Self {
        Self {
            blob,
            prefix: prefix.into(),
        }
    }

    /// Storage key of the manifest for `set_id`.
    pub fn manifest_key(&self, set_id: &str) -> String {
        format!("{}/{}.json", self.prefix, set_id)
    }
}

#[async_trait]
impl<B: BlobStore> Catalog for ManifestCatalog<B> {
    async fn resolve_set(&self, set_id: &str) -> Result<GallerySet, CatalogError> {
        let key = self.manifest_key(set_id);
        let raw = match self.blob.get(&key).await {
            Ok(bytes) => bytes,
            Err(IoError::NotFound(_)) => {
                return Err(CatalogError::SetNotFound {
                    set_id: set_id.to_string(),
                })
            }
            Err(e) => return Err(CatalogError::Io(e)),
        };

        let manifest: SetManifest =
            serde_json::from_slice(&raw).map_err(|e| CatalogError::InvalidManifest {
                set_id: set_id.to_string(),
                message: e.to_string(),
            })?;

        let mut images = manifest.images;
        images.sort_by_key(|img| img.order_index);

        debug!(
            set_id = set_id,
            image_count = images.len(),
            "Resolved set manifest"
        );

        Ok(GallerySet {
            id: set_id.to_string(),
            title: manifest.title,
            images,
        })
    }
}
