//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the xkcd-mirror REST API
//! using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the xkcd-mirror REST API
///
/// Served at `/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "xkcd-mirror REST API",
        version = "0.1.0",
        description = "Read-only access to a local xkcd mirror: comics, images and index statistics",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:4000", description = "Local server")
    ),
    paths(
        // Comics
        crate::api::routes::latest_comic,
        crate::api::routes::list_comics,
        crate::api::routes::get_comic,
        crate::api::routes::get_comic_image,
        crate::api::routes::index_stats,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::Document,
        crate::types::DocumentSummary,
        crate::types::IndexStats,
        crate::types::SyncRecord,
        crate::types::SyncPhase,

        // API response types from routes
        crate::api::routes::LatestComic,
        crate::api::routes::HealthStatus,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "comics", description = "Indexed comics and their images"),
        (name = "system", description = "System endpoints - Health checks, OpenAPI spec"),
    )
)]
pub struct ApiDoc;
