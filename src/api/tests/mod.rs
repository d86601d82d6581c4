use super::*;
use crate::test_helpers::{StaticFetcher, create_test_mirror, test_config};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;
use tower::ServiceExt;

mod system;

/// Router over a mirror already synced up to `latest`
async fn synced_router(latest: u32) -> (Router, Mirror, tempfile::TempDir) {
    let (mirror, temp_dir) = create_test_mirror(latest).await;
    mirror.sync().await.unwrap();
    (create_router(mirror.clone()), mirror, temp_dir)
}

async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_json(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_api_server_spawns() {
    let temp_dir = tempdir().unwrap();
    let mut config = test_config(&temp_dir);
    // Port 0 = OS assigns a free port
    config.server.bind_address = "127.0.0.1:0".parse().unwrap();
    let mirror = Mirror::with_fetcher(
        config,
        Arc::new(StaticFetcher {
            latest: Some(1),
            refuse: None,
        }),
    )
    .await
    .unwrap();

    let api_handle = tokio::spawn(start_api_server(mirror));
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(!api_handle.is_finished(), "server should still be serving");
    api_handle.abort();
}

#[tokio::test]
async fn test_cors_enabled() {
    let (mirror, _temp_dir) = create_test_mirror(1).await;
    let app = create_router(mirror);

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let temp_dir = tempdir().unwrap();
    let mut config = test_config(&temp_dir);
    config.server.cors_enabled = false;
    let mirror = Mirror::with_fetcher(
        config,
        Arc::new(StaticFetcher {
            latest: Some(1),
            refuse: None,
        }),
    )
    .await
    .unwrap();
    let app = create_router(mirror);

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be absent when CORS is disabled"
    );
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (app, _mirror, _temp_dir) = synced_router(1).await;
    let response = get(app, "/api/nope").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
