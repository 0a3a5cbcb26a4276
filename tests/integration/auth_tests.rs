//! Authentication integration tests.
//!
//! Tests verify signed-URL enforcement on the archive route: valid links
//! stream, and any tampering with signature, expiry, requester or tier is
//! rejected before the first byte.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tower::ServiceExt;

use gallery_vault::server::{RouterConfig, SignedUrlAuth};

use super::test_utils::{build_router, read_archive, seeded_store};

const SECRET: &str = "integration-test-secret";

fn signed_uri(path: &str, uid: &str, tier: &str, ttl_secs: u64) -> String {
    let auth = SignedUrlAuth::new(SECRET);
    let (sig, exp) =
        auth.sign_with_params(path, Duration::from_secs(ttl_secs), &[("uid", uid), ("tier", tier)]);
    format!("{}?uid={}&tier={}&exp={}&sig={}", path, uid, tier, exp, sig)
}

#[tokio::test]
async fn test_valid_signed_url_streams_archive() {
    let store = seeded_store("beach", "Beach", 2).await;
    let router = build_router(store, RouterConfig::new(SECRET));

    let uri = signed_uri("/sets/beach/archive", "u-1", "trusted-low", 3600);
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(read_archive(&body).len(), 2);
}

#[tokio::test]
async fn test_missing_signature_rejected() {
    let store = seeded_store("beach", "Beach", 1).await;
    let router = build_router(store, RouterConfig::new(SECRET));

    let request = Request::builder()
        .uri("/sets/beach/archive?uid=u-1&tier=trusted-low")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_signature_rejected() {
    let store = seeded_store("beach", "Beach", 1).await;
    let router = build_router(store, RouterConfig::new(SECRET));

    let exp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
        + 3600;
    let uri = format!(
        "/sets/beach/archive?uid=u-1&tier=trusted-low&exp={}&sig={}",
        exp,
        "0".repeat(64)
    );
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_signature_rejected() {
    let store = seeded_store("beach", "Beach", 1).await;
    let router = build_router(store, RouterConfig::new(SECRET));

    let auth = SignedUrlAuth::new(SECRET);
    let expired = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
        - 60;
    let sig = auth.sign_with_expiry_and_params(
        "/sets/beach/archive",
        expired,
        &[("uid", "u-1"), ("tier", "trusted-low")],
    );
    let uri = format!(
        "/sets/beach/archive?uid=u-1&tier=trusted-low&exp={}&sig={}",
        expired, sig
    );
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_requester_tampering_rejected() {
    let store = seeded_store("beach", "Beach", 1).await;
    let router = build_router(store, RouterConfig::new(SECRET));

    // Sign for u-1, then present the link as u-2.
    let uri = signed_uri("/sets/beach/archive", "u-1", "trusted-low", 3600)
        .replace("uid=u-1", "uid=u-2");
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_tier_escalation_rejected() {
    let store = seeded_store("beach", "Beach", 1).await;
    let router = build_router(store, RouterConfig::new(SECRET));

    // A link minted for the untrusted tier must not unlock a trusted one.
    let uri = signed_uri("/sets/beach/archive", "u-1", "untrusted", 3600)
        .replace("tier=untrusted", "tier=operator");
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_set_swap_rejected() {
    let store = seeded_store("beach", "Beach", 1).await;
    let router = build_router(store, RouterConfig::new(SECRET));

    let auth = SignedUrlAuth::new(SECRET);
    let (sig, exp) = auth.sign_with_params(
        "/sets/beach/archive",
        Duration::from_secs(3600),
        &[("uid", "u-1"), ("tier", "trusted-low")],
    );
    // Replay the beach signature against a different set path.
    let uri = format!(
        "/sets/private/archive?uid=u-1&tier=trusted-low&exp={}&sig={}",
        exp, sig
    );
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_is_public() {
    let store = seeded_store("beach", "Beach", 1).await;
    let router = build_router(store, RouterConfig::new(SECRET));

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
