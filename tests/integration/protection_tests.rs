//! End-to-end protection behavior.
//!
//! Tests verify that the tier-dependent transform and forensic tokens
//! survive the whole HTTP round trip: what lands in the client's archive is
//! what the protection layer promised.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

use gallery_vault::protect::SOFTWARE_TAG;
use gallery_vault::server::RouterConfig;

use super::test_utils::{
    build_router, contains_bytes, manifest_json, read_archive, sample_jpeg, seeded_store,
    MemoryBlobStore,
};

async fn download(router: axum::Router, uri: &str) -> Vec<(String, Vec<u8>)> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    read_archive(&body)
}

#[tokio::test]
async fn test_every_delivered_image_is_tagged() {
    let store = seeded_store("beach", "Beach", 3).await;
    let router = build_router(store, RouterConfig::without_auth());

    let entries = download(router, "/sets/beach/archive?uid=u-1&tier=trusted-low").await;
    assert_eq!(entries.len(), 3);
    for (name, data) in &entries {
        assert!(
            contains_bytes(data, SOFTWARE_TAG.as_bytes()),
            "entry {} is missing the embedded tag",
            name
        );
    }
}

#[tokio::test]
async fn test_untrusted_and_trusted_deliveries_differ() {
    let store = seeded_store("beach", "Beach", 1).await;

    let untrusted = download(
        build_router(store.clone(), RouterConfig::without_auth()),
        "/sets/beach/archive?uid=u-1&tier=untrusted",
    )
    .await;
    let trusted = download(
        build_router(store, RouterConfig::without_auth()),
        "/sets/beach/archive?uid=u-1&tier=trusted-high",
    )
    .await;

    // Full protection re-encodes watermarked pixels; light protection does
    // not touch them. Both carry the tag.
    assert_ne!(untrusted[0].1, trusted[0].1);
    assert!(contains_bytes(&untrusted[0].1, SOFTWARE_TAG.as_bytes()));
    assert!(contains_bytes(&trusted[0].1, SOFTWARE_TAG.as_bytes()));

    // The untrusted delivery still decodes as an image.
    let decoded = image::load_from_memory(&untrusted[0].1).unwrap();
    assert_eq!(decoded.width(), 48);
}

#[tokio::test]
async fn test_repeat_downloads_carry_distinct_tokens() {
    let store = seeded_store("beach", "Beach", 1).await;

    let first = download(
        build_router(store.clone(), RouterConfig::without_auth()),
        "/sets/beach/archive?uid=u-1&tier=trusted-low",
    )
    .await;
    tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    let second = download(
        build_router(store, RouterConfig::without_auth()),
        "/sets/beach/archive?uid=u-1&tier=trusted-low",
    )
    .await;

    // Same requester, same image, different download: the minting stamp
    // differs, so the embedded bytes must too.
    assert_ne!(first[0].1, second[0].1);
}

#[tokio::test]
async fn test_different_requesters_get_different_watermarks() {
    let store = seeded_store("beach", "Beach", 1).await;

    let alice = download(
        build_router(store.clone(), RouterConfig::without_auth()),
        "/sets/beach/archive?uid=alice&tier=untrusted",
    )
    .await;
    let bob = download(
        build_router(store, RouterConfig::without_auth()),
        "/sets/beach/archive?uid=bob&tier=untrusted",
    )
    .await;

    assert_ne!(alice[0].1, bob[0].1);
}

#[tokio::test]
async fn test_corrupt_image_never_delivered_unprotected() {
    let store = Arc::new(MemoryBlobStore::new());
    store.insert("orig/good.jpg", sample_jpeg()).await;
    // Sniffs as JPEG but cannot be decoded, so full protection fails on it.
    store.insert("orig/bad.jpg", b"\xFF\xD8\xFFnot really".to_vec()).await;
    store
        .insert(
            "manifests/mixed.json",
            manifest_json(
                "Mixed",
                &[("good", 0, "orig/good.jpg"), ("bad", 1, "orig/bad.jpg")],
            ),
        )
        .await;
    let router = build_router(store, RouterConfig::without_auth());

    let entries = download(router, "/sets/mixed/archive?uid=u-1&tier=untrusted").await;

    // The undecodable image is skipped rather than passed through raw.
    let names: Vec<&str> = entries.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["000-good.jpg"]);
}
