//! Comic handlers: latest, list, single comic, image, stats.

use super::LatestComic;
use crate::api::AppState;
use crate::error::Error;
use crate::types::{Document, DocumentSummary, IndexStats};
use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

/// Look up an indexed comic, rejecting the unresolved id 0
fn find_comic(state: &AppState, id: u32) -> Result<Document, Error> {
    if id == 0 {
        return Err(Error::InvalidId(id));
    }
    state
        .mirror
        .collection()
        .get(id)
        .map(|(_, document)| document)
        .ok_or_else(|| Error::NotFound(format!("comic {id}")))
}

/// GET /api/latest - Highest indexed id
#[utoipa::path(
    get,
    path = "/api/latest",
    tag = "comics",
    responses(
        (status = 200, description = "Most recent indexed comic", body = LatestComic),
        (status = 404, description = "Index is empty", body = crate::error::ApiError)
    )
)]
pub async fn latest_comic(State(state): State<AppState>) -> Response {
    match state.mirror.collection().latest() {
        Some(latest) => (StatusCode::OK, Json(LatestComic { latest })).into_response(),
        None => Error::NotFound("latest comic".to_string()).into_response(),
    }
}

/// GET /api/comics - Summaries of every indexed comic
#[utoipa::path(
    get,
    path = "/api/comics",
    tag = "comics",
    responses(
        (status = 200, description = "Indexed comics in index order", body = Vec<DocumentSummary>)
    )
)]
pub async fn list_comics(State(state): State<AppState>) -> impl IntoResponse {
    let comics: Vec<DocumentSummary> = state.mirror.dump();
    (StatusCode::OK, Json(comics))
}

/// GET /api/comics/:id - Single comic metadata
#[utoipa::path(
    get,
    path = "/api/comics/{id}",
    tag = "comics",
    params(
        ("id" = u32, Path, description = "Comic id")
    ),
    responses(
        (status = 200, description = "Comic metadata", body = Document),
        (status = 400, description = "Invalid id", body = crate::error::ApiError),
        (status = 404, description = "Comic not indexed", body = crate::error::ApiError)
    )
)]
pub async fn get_comic(State(state): State<AppState>, Path(id): Path<u32>) -> Response {
    match find_comic(&state, id) {
        Ok(document) => (StatusCode::OK, Json(document)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /api/comics/:id/image - Image bytes of a comic
#[utoipa::path(
    get,
    path = "/api/comics/{id}/image",
    tag = "comics",
    params(
        ("id" = u32, Path, description = "Comic id")
    ),
    responses(
        (status = 200, description = "Raw image bytes", content_type = "application/octet-stream"),
        (status = 400, description = "Invalid id", body = crate::error::ApiError),
        (status = 404, description = "Comic or image not available", body = crate::error::ApiError)
    )
)]
pub async fn get_comic_image(State(state): State<AppState>, Path(id): Path<u32>) -> Response {
    let document = match find_comic(&state, id) {
        Ok(document) => document,
        Err(e) => return e.into_response(),
    };

    let content_type = document.payload_content_type();
    match document.payload {
        Some(payload) if !payload.is_empty() => {
            (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], payload).into_response()
        }
        _ => Error::NotFound(format!("image of comic {id}")).into_response(),
    }
}

/// GET /api/stats - Index statistics
#[utoipa::path(
    get,
    path = "/api/stats",
    tag = "comics",
    responses(
        (status = 200, description = "Index statistics", body = IndexStats),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn index_stats(State(state): State<AppState>) -> Response {
    match state.mirror.stats().await {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => e.into_response(),
    }
}
