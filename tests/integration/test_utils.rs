//! Test utilities for integration tests.
//!
//! Provides an in-memory blob store, sample image generators, manifest
//! builders and archive inspection helpers.

use async_trait::async_trait;
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::ImageEncoder;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::Arc;
use tokio::sync::RwLock;

use axum::Router;
use gallery_vault::error::IoError;
use gallery_vault::io::BlobStore;
use gallery_vault::protect::Protector;
use gallery_vault::server::{create_router, DownloadService, RouterConfig};

// =============================================================================
// In-Memory Blob Store
// =============================================================================

/// Blob store backed by a HashMap, shared across clones.
pub struct MemoryBlobStore {
    objects: RwLock<HashMap<String, Bytes>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    pub async fn insert(&self, key: impl Into<String>, data: Vec<u8>) {
        self.objects
            .write()
            .await
            .insert(key.into(), Bytes::from(data));
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, key: &str) -> Result<Bytes, IoError> {
        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| IoError::NotFound(key.to_string()))
    }

    async fn put(&self, key: &str, bytes: Bytes) -> Result<(), IoError> {
        self.objects.write().await.insert(key.to_string(), bytes);
        Ok(())
    }

    fn identifier(&self) -> &str {
        "mem://test"
    }
}

// =============================================================================
// Sample Images
// =============================================================================

/// A small decodable JPEG with a simple gradient.
pub fn sample_jpeg() -> Vec<u8> {
    let img = image::RgbImage::from_fn(48, 48, |x, y| {
        image::Rgb([(x * 5) as u8, (y * 5) as u8, 120])
    });
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, 85)
        .encode_image(&img)
        .unwrap();
    out
}

/// A small decodable PNG with a simple gradient.
pub fn sample_png() -> Vec<u8> {
    let img = image::RgbImage::from_fn(48, 48, |x, y| {
        image::Rgb([(x * 5) as u8, 60, (y * 5) as u8])
    });
    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(img.as_raw(), 48, 48, image::ExtendedColorType::Rgb8)
        .unwrap();
    out
}

// =============================================================================
// Manifests
// =============================================================================

/// Build a set manifest from (id, order_index, fallback_key) triples.
pub fn manifest_json(title: &str, images: &[(&str, u32, &str)]) -> Vec<u8> {
    let images: Vec<_> = images
        .iter()
        .map(|(id, order, key)| {
            serde_json::json!({
                "id": id,
                "order_index": order,
                "fallback_key": key,
            })
        })
        .collect();
    serde_json::to_vec(&serde_json::json!({
        "title": title,
        "images": images,
    }))
    .unwrap()
}

/// Seed a store with a set of `n` JPEG images and its manifest.
pub async fn seeded_store(set_id: &str, title: &str, n: u32) -> Arc<MemoryBlobStore> {
    let store = Arc::new(MemoryBlobStore::new());
    let mut images = Vec::new();
    let keys: Vec<String> = (0..n).map(|i| format!("orig/{}-{}.jpg", set_id, i)).collect();
    for (i, key) in keys.iter().enumerate() {
        store.insert(key.clone(), sample_jpeg()).await;
        images.push((format!("img-{}", i), i as u32, key.clone()));
    }
    let image_refs: Vec<(&str, u32, &str)> = images
        .iter()
        .map(|(id, order, key)| (id.as_str(), *order, key.as_str()))
        .collect();
    store
        .insert(
            format!("manifests/{}.json", set_id),
            manifest_json(title, &image_refs),
        )
        .await;
    store
}

// =============================================================================
// Router + Archive Helpers
// =============================================================================

/// Build a router over the store with the given config.
pub fn build_router(store: Arc<MemoryBlobStore>, config: RouterConfig) -> Router {
    let service = DownloadService::new(store, Protector::new(), 4);
    create_router(service, config)
}

/// Read all entries of a zip archive as (name, bytes) pairs.
pub fn read_archive(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
    let mut entries = Vec::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).unwrap();
        let mut data = Vec::new();
        file.read_to_end(&mut data).unwrap();
        entries.push((file.name().to_string(), data));
    }
    entries
}

/// Check that an entry name has the `{order:03}-{id}.{jpg|png}` shape.
pub fn is_valid_entry_name(name: &str) -> bool {
    let Some((stem, ext)) = name.rsplit_once('.') else {
        return false;
    };
    if ext != "jpg" && ext != "png" {
        return false;
    }
    let digits: String = stem.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.len() < 3 {
        return false;
    }
    let rest = &stem[digits.len()..];
    rest.starts_with('-') && rest.len() > 1 && !rest.contains('/')
}

/// Check for a byte substring.
pub fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
