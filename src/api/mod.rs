//! Read-only REST API
//!
//! Serves the local index over HTTP with an OpenAPI 3 description. Nothing here
//! mutates the index; synchronization stays a command-line operation.

use crate::{Mirror, Result};
use axum::{Router, http::Method, routing::get};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Comics
/// - `GET /api/latest` - Highest indexed id
/// - `GET /api/comics` - Summaries of every indexed comic
/// - `GET /api/comics/:id` - Single comic
/// - `GET /api/comics/:id/image` - Image bytes of a comic
/// - `GET /api/stats` - Index statistics
///
/// ## System
/// - `GET /health` - Health check
/// - `GET /openapi.json` - OpenAPI specification
pub fn create_router(mirror: Mirror) -> Router {
    let cors_enabled = mirror.config().server.cors_enabled;
    let state = AppState::new(mirror);

    let router = Router::new()
        // Comics
        .route("/api/latest", get(routes::latest_comic))
        .route("/api/comics", get(routes::list_comics))
        .route("/api/comics/:id", get(routes::get_comic))
        .route("/api/comics/:id/image", get(routes::get_comic_image))
        .route("/api/stats", get(routes::index_stats))
        // System
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors_enabled {
        router.layer(build_cors_layer())
    } else {
        router
    }
}

/// CORS for a read-only API: any origin, GET only
fn build_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers(Any)
}

/// Start the API server on the configured bind address.
///
/// Runs until the server stops, either due to an error or the process exiting.
///
/// # Example
///
/// ```no_run
/// use xkcd_mirror::{Config, Mirror};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mirror = Mirror::new(Config::default()).await?;
/// mirror.load_index().await;
///
/// // Blocks until shutdown
/// xkcd_mirror::api::start_api_server(mirror).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(mirror: Mirror) -> Result<()> {
    let bind_address = mirror.config().server.bind_address;

    tracing::info!(
        address = %bind_address,
        "Starting API server"
    );

    let app = create_router(mirror);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(
        address = %bind_address,
        "API server listening"
    );

    axum::serve(listener, app)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
