//! Webhook transport against the in-memory router.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::util::ServiceExt;

use crate::web::build_router;

use super::support::{fixture, Fixture};

async fn send_form(router: axum::Router, body: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_webhook_routes_message_to_resolver() {
    let Fixture {
        resolver, orders, ..
    } = fixture();
    let router = build_router(Arc::new(resolver));

    let (status, reply) =
        send_form(router, "Body=110+mm+elbow&From=%2B911234567890").await;

    assert_eq!(status, StatusCode::OK);
    assert!(reply.contains("Acme Elbow"));
    assert!(reply.ends_with("1. Yes\n2. No thanks"));

    let records = orders.records.lock().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].phone, "+911234567890");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_webhook_tolerates_blank_payload() {
    let Fixture { resolver, .. } = fixture();
    let router = build_router(Arc::new(resolver));

    let (status, reply) = send_form(router, "").await;

    assert_eq!(status, StatusCode::OK);
    assert!(reply.starts_with("Could you please specify"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_health_endpoint() {
    let Fixture { resolver, .. } = fixture();
    let router = build_router(Arc::new(resolver));

    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"ok");
}
