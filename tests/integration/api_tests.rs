//! API integration tests for archive downloads and error handling.
//!
//! Tests verify:
//! - Streamed ZIP responses (status, headers, body validity, entry names)
//! - Skip-and-continue for missing images
//! - Error cases (missing set, broken manifest)

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

use gallery_vault::server::RouterConfig;

use super::test_utils::{
    build_router, is_valid_entry_name, manifest_json, read_archive, sample_png, seeded_store,
    MemoryBlobStore,
};

// =============================================================================
// Successful Downloads
// =============================================================================

#[tokio::test]
async fn test_archive_download_success() {
    let store = seeded_store("beach", "Beach Day 2024", 4).await;
    let router = build_router(store, RouterConfig::without_auth());

    let request = Request::builder()
        .uri("/sets/beach/archive?uid=u-1&tier=trusted-low")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/zip"
    );
    assert_eq!(
        response.headers().get("content-disposition").unwrap(),
        "attachment; filename=\"Beach_Day_2024.zip\""
    );
    assert_eq!(response.headers().get("cache-control").unwrap(), "no-cache");

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let entries = read_archive(&body);
    assert_eq!(entries.len(), 4);
    for (name, data) in &entries {
        assert!(is_valid_entry_name(name), "bad entry name: {}", name);
        assert!(!data.is_empty());
    }

    // Names sort into set order regardless of completion order.
    let mut names: Vec<&str> = entries.iter().map(|(n, _)| n.as_str()).collect();
    names.sort();
    assert_eq!(
        names,
        vec!["000-img-0.jpg", "001-img-1.jpg", "002-img-2.jpg", "003-img-3.jpg"]
    );
}

#[tokio::test]
async fn test_archive_preserves_mixed_formats() {
    let store = Arc::new(MemoryBlobStore::new());
    store.insert("orig/a.jpg", super::test_utils::sample_jpeg()).await;
    store.insert("orig/b.png", sample_png()).await;
    store
        .insert(
            "manifests/mixed.json",
            manifest_json(
                "Mixed",
                &[("a", 0, "orig/a.jpg"), ("b", 1, "orig/b.png")],
            ),
        )
        .await;
    let router = build_router(store, RouterConfig::without_auth());

    let request = Request::builder()
        .uri("/sets/mixed/archive?uid=u-1&tier=untrusted")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let mut names: Vec<String> = read_archive(&body).into_iter().map(|(n, _)| n).collect();
    names.sort();
    assert_eq!(names, vec!["000-a.jpg", "001-b.png"]);
}

#[tokio::test]
async fn test_missing_image_is_skipped() {
    let store = Arc::new(MemoryBlobStore::new());
    store.insert("orig/a.jpg", super::test_utils::sample_jpeg()).await;
    store.insert("orig/c.jpg", super::test_utils::sample_jpeg()).await;
    store
        .insert(
            "manifests/holey.json",
            manifest_json(
                "Holey",
                &[
                    ("a", 0, "orig/a.jpg"),
                    ("b", 1, "orig/missing.jpg"),
                    ("c", 2, "orig/c.jpg"),
                ],
            ),
        )
        .await;
    let router = build_router(store, RouterConfig::without_auth());

    let request = Request::builder()
        .uri("/sets/holey/archive?uid=u-1&tier=trusted-low")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let mut names: Vec<String> = read_archive(&body).into_iter().map(|(n, _)| n).collect();
    names.sort();
    // The missing image contributes nothing; its neighbors still arrive.
    assert_eq!(names, vec!["000-a.jpg", "002-c.jpg"]);
}

#[tokio::test]
async fn test_empty_set_yields_valid_empty_archive() {
    let store = Arc::new(MemoryBlobStore::new());
    store
        .insert("manifests/empty.json", manifest_json("Empty Set", &[]))
        .await;
    let router = build_router(store, RouterConfig::without_auth());

    let request = Request::builder()
        .uri("/sets/empty/archive?uid=u-1&tier=untrusted")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(read_archive(&body).is_empty());
}

// =============================================================================
// Error Cases
// =============================================================================

#[tokio::test]
async fn test_unknown_set_returns_404() {
    let store = Arc::new(MemoryBlobStore::new());
    let router = build_router(store, RouterConfig::without_auth());

    let request = Request::builder()
        .uri("/sets/ghost/archive?uid=u-1")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "set_not_found");
}

#[tokio::test]
async fn test_broken_manifest_returns_500() {
    let store = Arc::new(MemoryBlobStore::new());
    store.insert("manifests/broken.json", b"{oops".to_vec()).await;
    let router = build_router(store, RouterConfig::without_auth());

    let request = Request::builder()
        .uri("/sets/broken/archive?uid=u-1")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "invalid_manifest");
}

#[tokio::test]
async fn test_missing_requester_returns_401() {
    let store = seeded_store("beach", "Beach", 1).await;
    let router = build_router(store, RouterConfig::without_auth());

    let request = Request::builder()
        .uri("/sets/beach/archive")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_tier_returns_400() {
    let store = seeded_store("beach", "Beach", 1).await;
    let router = build_router(store, RouterConfig::without_auth());

    let request = Request::builder()
        .uri("/sets/beach/archive?uid=u-1&tier=root")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let store = Arc::new(MemoryBlobStore::new());
    let router = build_router(store, RouterConfig::without_auth());

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "gallery-vault");
}
