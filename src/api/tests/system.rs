use super::*;

#[tokio::test]
async fn test_health_endpoint() {
    let (mirror, _temp_dir) = create_test_mirror(1).await;
    let response = get(create_router(mirror), "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_openapi_endpoint() {
    let (mirror, _temp_dir) = create_test_mirror(1).await;
    let response = get(create_router(mirror), "/openapi.json").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["info"]["title"], "xkcd-mirror REST API");
    assert!(body["paths"]["/api/comics/{id}/image"].is_object());
}
