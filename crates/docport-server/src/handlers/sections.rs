//! Section API endpoints.
//!
//! CRUD over the section store plus the navigation tree and view counter.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use docport_store::Section;
use docport_tree::{TreeNode, build_tree};
use md5::{Digest, Md5};
use serde::Serialize;
use serde_json::json;

use super::Envelope;
use crate::error::ApiError;
use crate::extract::{ApiJson, CreateSectionRequest, Secno, UpdateSectionRequest};
use crate::state::AppState;

/// Handle GET /api/v1/docs.
///
/// The body is tagged with an `ETag` so clients holding a cached list can
/// revalidate with `If-None-Match`.
pub(crate) async fn list_sections(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let sections = state.store.list_all().await?;

    let body = serde_json::to_vec(&Envelope::data(&sections)).map_err(|e| {
        tracing::error!(error = %e, "Failed to serialize section list");
        ApiError::Internal
    })?;
    let etag = compute_etag(&body);

    if let Some(if_none_match) = headers.get(header::IF_NONE_MATCH)
        && if_none_match.as_bytes() == etag.as_bytes()
    {
        return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response());
    }

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_owned()),
            (header::ETAG, etag),
            (header::CACHE_CONTROL, "no-cache".to_owned()),
        ],
        body,
    )
        .into_response())
}

/// Compute `ETag` from a response body.
///
/// MD5 truncated to 64 bits, quoted.
fn compute_etag(body: &[u8]) -> String {
    let hash = Md5::digest(body);
    format!("\"{}\"", &hex::encode(hash)[..16])
}

/// Handle GET /api/v1/docs/tree.
pub(crate) async fn get_tree(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Envelope<Vec<TreeNode<Section>>>>, ApiError> {
    let sections = state.store.list_all().await?;
    Ok(Json(Envelope::data(build_tree(&sections))))
}

/// Handle GET /api/v1/docs/{secno}.
pub(crate) async fn get_section(
    State(state): State<Arc<AppState>>,
    Secno(secno): Secno,
) -> Result<Json<Envelope<Section>>, ApiError> {
    let section = state.store.get_by_secno(secno).await?;
    Ok(Json(Envelope::data(section)))
}

/// Handle GET /api/v1/docs/slug/{slug}.
pub(crate) async fn get_section_by_slug(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<Envelope<Section>>, ApiError> {
    let section = state.store.get_by_slug(&slug).await?;
    Ok(Json(Envelope::data(section)))
}

/// Handle POST /api/v1/docs.
pub(crate) async fn create_section(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<CreateSectionRequest>,
) -> Result<(StatusCode, Json<Envelope<Section>>), ApiError> {
    let new = request.into_new_section()?;
    let section = state.store.create(new).await?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::with_message("Section created successfully", section)),
    ))
}

/// Handle PUT /api/v1/docs/{secno}.
pub(crate) async fn update_section(
    State(state): State<Arc<AppState>>,
    Secno(secno): Secno,
    ApiJson(request): ApiJson<UpdateSectionRequest>,
) -> Result<Json<Envelope<Section>>, ApiError> {
    let patch = request.into_patch()?;
    let section = state.store.update(secno, patch).await?;
    Ok(Json(Envelope::with_message(
        "Section updated successfully",
        section,
    )))
}

/// Handle DELETE /api/v1/docs/{secno}.
pub(crate) async fn delete_section(
    State(state): State<Arc<AppState>>,
    Secno(secno): Secno,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.store.delete(secno).await?;
    Ok(Json(
        json!({"error": false, "message": "Section deleted successfully"}),
    ))
}

/// Response for GET /api/v1/docs/{secno}/view.
#[derive(Serialize)]
pub(crate) struct ViewResponse {
    error: bool,
    view_count: i64,
}

/// Handle GET /api/v1/docs/{secno}/view.
pub(crate) async fn increment_view(
    State(state): State<Arc<AppState>>,
    Secno(secno): Secno,
) -> Result<Json<ViewResponse>, ApiError> {
    let view_count = state.store.increment_view(secno).await?;
    Ok(Json(ViewResponse {
        error: false,
        view_count,
    }))
}
