//! Section body endpoints.
//!
//! Bodies are written to the blob store first and linked to their section
//! second. The two writes are not atomic: if linking fails the blob stays
//! behind and the section keeps its previous pointer.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use docport_store::{Section, SectionPatch};
use serde::Serialize;

use super::Envelope;
use crate::error::ApiError;
use crate::extract::{ApiJson, ContentRequest, Secno, UploadRequest};
use crate::state::AppState;

/// Body served when a section has no content, or its content cannot be read.
pub(crate) const NO_CONTENT: &str = "<p>No content yet</p>";

/// Response for POST /api/v1/docs/upload/doc-html.
#[derive(Serialize)]
pub(crate) struct UploadResponse {
    error: bool,
    content_path: String,
}

/// Handle POST /api/v1/docs/upload/doc-html.
///
/// Publishes only. The caller links the returned pointer with a
/// `PUT /docs/{secno}`.
pub(crate) async fn upload_html(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<UploadRequest>,
) -> Result<Json<UploadResponse>, ApiError> {
    let (secno, content) = request.into_parts()?;
    let content_path = state.publisher.publish(secno, &content).await?;
    Ok(Json(UploadResponse {
        error: false,
        content_path,
    }))
}

/// Handle POST /api/v1/docs/{secno}/content.
///
/// Publishes the body and stores its pointer on the section in one call.
pub(crate) async fn publish_and_link(
    State(state): State<Arc<AppState>>,
    Secno(secno): Secno,
    ApiJson(request): ApiJson<ContentRequest>,
) -> Result<Json<Envelope<Section>>, ApiError> {
    let content = request
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("Content is required".to_owned()))?;

    // Refuse before writing so a missing section never leaves a blob behind.
    state.store.get_by_secno(secno).await?;

    let content_path = state.publisher.publish(secno, &content).await?;

    match state
        .store
        .update(secno, SectionPatch::content_path(content_path))
        .await
    {
        Ok(section) => Ok(Json(Envelope::with_message(
            "Content saved successfully",
            section,
        ))),
        Err(err) => {
            tracing::warn!(
                secno,
                key = %state.publisher.storage_key(secno),
                error = %err,
                "Content published but pointer update failed; blob left in store"
            );
            Err(err.into())
        }
    }
}

/// Section with its resolved body.
#[derive(Serialize)]
pub(crate) struct Page {
    section: Section,
    content: String,
}

/// Handle GET /api/v1/docs/page/{slug}.
pub(crate) async fn get_page(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<Envelope<Page>>, ApiError> {
    let section = state.store.get_by_slug(&slug).await?;

    let content = match section.content_path.as_deref() {
        Some(pointer) => state.resolver.resolve(pointer).await,
        None => None,
    }
    .unwrap_or_else(|| NO_CONTENT.to_owned());

    Ok(Json(Envelope::data(Page { section, content })))
}
