//! Content operations for the portal API.

use serde_json::json;
use tracing::info;

use super::{PortalClient, read_json, segment};
use crate::error::ClientError;
use crate::types::{Envelope, Page, Section, UploadResponse};

impl PortalClient {
    /// Publish a section body and return its content pointer.
    ///
    /// The pointer is not stored on the section; see
    /// [`PortalClient::publish_content`] for the one-call variant.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] with status 500 if the blob store write
    /// fails.
    pub fn upload_html(&self, secno: i64, html: &str) -> Result<String, ClientError> {
        info!(secno, bytes = html.len(), "Uploading section body");

        let response = self
            .agent
            .post(&self.docs_url("/upload/doc-html"))
            .header("Accept", "application/json")
            .send_json(json!({"secno": secno, "content": html}))?;
        let upload: UploadResponse = read_json(response)?;
        Ok(upload.content_path)
    }

    /// Publish a section body and link it to the section server-side.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] with status 404 for a missing section and
    /// 500 if the blob store write fails.
    pub fn publish_content(&self, secno: i64, html: &str) -> Result<Section, ClientError> {
        info!(secno, bytes = html.len(), "Publishing section body");

        let response = self
            .agent
            .post(&self.docs_url(&format!("/{secno}/content")))
            .header("Accept", "application/json")
            .send_json(json!({"content": html}))?;
        let envelope: Envelope<Section> = read_json(response)?;
        Ok(envelope.data)
    }

    /// Get a section and its resolved body by slug.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] with status 404 if no section has the
    /// slug.
    pub fn page(&self, slug: &str) -> Result<Page, ClientError> {
        let response = self
            .agent
            .get(&self.docs_url(&format!("/page/{}", segment(slug))))
            .header("Accept", "application/json")
            .call()?;
        let envelope: Envelope<Page> = read_json(response)?;
        Ok(envelope.data)
    }
}
