//! Section operations for the portal API.

use docport_tree::TreeNode;
use tracing::info;

use super::{PortalClient, check_status, read_json, segment};
use crate::error::ClientError;
use crate::types::{Envelope, Listing, NewSection, Section, SectionUpdate, ViewResponse};

impl PortalClient {
    /// List all sections.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub fn list_sections(&self) -> Result<Vec<Section>, ClientError> {
        match self.list_sections_if_changed(None)? {
            Listing::Fresh { sections, .. } => Ok(sections),
            Listing::NotModified => Err(ClientError::Api {
                status: 304,
                message: "unexpected Not Modified without If-None-Match".to_owned(),
            }),
        }
    }

    /// List all sections unless the list still matches `etag`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub fn list_sections_if_changed(&self, etag: Option<&str>) -> Result<Listing, ClientError> {
        let url = self.docs_url("");
        let mut request = self.agent.get(&url).header("Accept", "application/json");
        if let Some(etag) = etag {
            request = request.header("If-None-Match", etag);
        }
        let response = request.call()?;

        if response.status().as_u16() == 304 {
            return Ok(Listing::NotModified);
        }

        let etag = response
            .headers()
            .get("etag")
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let envelope: Envelope<Vec<Section>> = read_json(response)?;

        Ok(Listing::Fresh {
            sections: envelope.data,
            etag,
        })
    }

    /// Get the navigation forest as assembled by the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub fn tree(&self) -> Result<Vec<TreeNode<Section>>, ClientError> {
        let response = self
            .agent
            .get(&self.docs_url("/tree"))
            .header("Accept", "application/json")
            .call()?;
        let envelope: Envelope<Vec<TreeNode<Section>>> = read_json(response)?;
        Ok(envelope.data)
    }

    /// Get a section by number.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] with status 404 if the section does not
    /// exist.
    pub fn get_section(&self, secno: i64) -> Result<Section, ClientError> {
        let response = self
            .agent
            .get(&self.docs_url(&format!("/{secno}")))
            .header("Accept", "application/json")
            .call()?;
        let envelope: Envelope<Section> = read_json(response)?;
        Ok(envelope.data)
    }

    /// Get a section by slug.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] with status 404 if no section has the
    /// slug.
    pub fn get_section_by_slug(&self, slug: &str) -> Result<Section, ClientError> {
        let response = self
            .agent
            .get(&self.docs_url(&format!("/slug/{}", segment(slug))))
            .header("Accept", "application/json")
            .call()?;
        let envelope: Envelope<Section> = read_json(response)?;
        Ok(envelope.data)
    }

    /// Create a section.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] with status 400 for invalid input and 409
    /// when the display order is already used among the new section's
    /// siblings.
    pub fn create_section(&self, new: &NewSection) -> Result<Section, ClientError> {
        info!(name = %new.name, "Creating section");

        let response = self
            .agent
            .post(&self.docs_url(""))
            .header("Accept", "application/json")
            .send_json(new)?;
        let envelope: Envelope<Section> = read_json(response)?;

        info!(secno = envelope.data.secno, "Created section");
        Ok(envelope.data)
    }

    /// Update some fields of a section.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] with status 400 when `update` sets no
    /// field, 404 for a missing section and 409 on a display order clash.
    pub fn update_section(&self, secno: i64, update: &SectionUpdate) -> Result<Section, ClientError> {
        info!(secno, "Updating section");

        let response = self
            .agent
            .put(&self.docs_url(&format!("/{secno}")))
            .header("Accept", "application/json")
            .send_json(update)?;
        let envelope: Envelope<Section> = read_json(response)?;
        Ok(envelope.data)
    }

    /// Delete a section.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] with status 404 if the section does not
    /// exist.
    pub fn delete_section(&self, secno: i64) -> Result<(), ClientError> {
        info!(secno, "Deleting section");

        let response = self
            .agent
            .delete(&self.docs_url(&format!("/{secno}")))
            .header("Accept", "application/json")
            .call()?;
        check_status(response)?;
        Ok(())
    }

    /// Record a view and return the new count.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] with status 404 if the section does not
    /// exist.
    pub fn increment_view(&self, secno: i64) -> Result<i64, ClientError> {
        let response = self
            .agent
            .get(&self.docs_url(&format!("/{secno}/view")))
            .header("Accept", "application/json")
            .call()?;
        let view: ViewResponse = read_json(response)?;
        Ok(view.view_count)
    }
}
