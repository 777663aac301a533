//! Portal REST API client.
//!
//! Provides a sync HTTP client for the `/api/v1` surface of the portal
//! server.

mod content;
mod sections;

use std::time::Duration;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::de::DeserializeOwned;
use ureq::Agent;
use ureq::http::Response;

use crate::error::ClientError;
use crate::types::{ErrorBody, HealthResponse};

/// Default HTTP timeout in seconds.
const DEFAULT_TIMEOUT: u64 = 30;

/// RFC 3986 unreserved characters: A-Z a-z 0-9 - . _ ~
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Portal REST API client.
#[derive(Clone, Debug)]
pub struct PortalClient {
    agent: Agent,
    base_url: String,
}

impl PortalClient {
    /// Create a client for the portal at `base_url` (e.g. `http://localhost:8080`).
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT))
    }

    /// Create a client whose requests give up after `timeout`.
    #[must_use]
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// Get the API base URL.
    fn api_url(&self) -> String {
        format!("{}/api/v1", self.base_url)
    }

    /// URL of a path under `/api/v1/docs`.
    fn docs_url(&self, path: &str) -> String {
        format!("{}/docs{}", self.api_url(), path)
    }

    /// Check that the portal is up.
    ///
    /// # Errors
    ///
    /// Returns an error if the portal cannot be reached or reports an
    /// unexpected status.
    pub fn health(&self) -> Result<(), ClientError> {
        let url = format!("{}/healthcheck", self.api_url());
        let response = self
            .agent
            .get(&url)
            .header("Accept", "application/json")
            .call()?;

        let health: HealthResponse = read_json(response)?;
        if health.status == "Ok" {
            Ok(())
        } else {
            Err(ClientError::Api {
                status: 200,
                message: format!("unexpected health status: {}", health.status),
            })
        }
    }
}

/// Encode a value for use as a single path segment.
fn segment(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT).to_string()
}

/// Turn an error status into [`ClientError::Api`], carrying the envelope
/// message when the body has one.
fn check_status(response: Response<ureq::Body>) -> Result<Response<ureq::Body>, ClientError> {
    let status = response.status().as_u16();
    if status < 400 {
        return Ok(response);
    }

    let body = response
        .into_body()
        .read_to_string()
        .unwrap_or_else(|_| "(unable to read error body)".to_owned());
    let message = serde_json::from_str::<ErrorBody>(&body).map_or(body, |e| e.message);

    Err(ClientError::Api { status, message })
}

/// Check the status and decode a JSON body.
fn read_json<T: DeserializeOwned>(response: Response<ureq::Body>) -> Result<T, ClientError> {
    let response = check_status(response)?;
    Ok(response.into_body().read_json()?)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_server;
    use crate::types::{Listing, NewSection, SectionUpdate};

    #[test]
    fn test_urls() {
        let client = PortalClient::new("http://localhost:8080/");

        assert_eq!(client.api_url(), "http://localhost:8080/api/v1");
        assert_eq!(client.docs_url("/tree"), "http://localhost:8080/api/v1/docs/tree");
        assert_eq!(client.docs_url(""), "http://localhost:8080/api/v1/docs");
    }

    #[test]
    fn test_health() {
        let client = PortalClient::new(&test_server::spawn());

        client.health().unwrap();
    }

    #[test]
    fn test_section_round_trip() {
        let client = PortalClient::new(&test_server::spawn());

        let guide = client
            .create_section(&NewSection::new("User Guide").with_order(1))
            .unwrap();
        assert_eq!(guide.slug, "user-guide");
        assert_eq!(client.get_section(guide.secno).unwrap(), guide);
        assert_eq!(client.get_section_by_slug("user-guide").unwrap(), guide);

        let renamed = client
            .update_section(
                guide.secno,
                &SectionUpdate {
                    name: Some("Handbook".to_owned()),
                    ..SectionUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(renamed.slug, "handbook");

        assert_eq!(client.increment_view(guide.secno).unwrap(), 1);

        client.delete_section(guide.secno).unwrap();
        assert!(client.get_section(guide.secno).unwrap_err().is_not_found());
    }

    #[test]
    fn test_error_envelope_message() {
        let client = PortalClient::new(&test_server::spawn());

        let err = client.create_section(&NewSection::new("  ")).unwrap_err();

        match err {
            ClientError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Section name is required");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_list_and_tree() {
        let client = PortalClient::new(&test_server::spawn());
        let guide = client.create_section(&NewSection::new("Guide")).unwrap();
        client
            .create_section(&NewSection::new("Install").with_parent(guide.secno))
            .unwrap();

        let Listing::Fresh { sections, etag } = client.list_sections_if_changed(None).unwrap()
        else {
            panic!("expected a fresh listing");
        };
        assert_eq!(sections.len(), 2);
        let etag = etag.unwrap();
        assert_eq!(
            client.list_sections_if_changed(Some(&etag)).unwrap(),
            Listing::NotModified
        );

        let tree = client.tree().unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].children[0].item.name, "Install");
    }

    #[test]
    fn test_upload_then_link() {
        let client = PortalClient::new(&test_server::spawn());
        let guide = client.create_section(&NewSection::new("Guide")).unwrap();

        let pointer = client.upload_html(guide.secno, "<p>Body</p>").unwrap();
        assert_eq!(
            pointer,
            format!("{}/docs/sec_{}.html", test_server::BLOB_BASE, guide.secno)
        );
        assert_eq!(client.page("guide").unwrap().content, "<p>No content yet</p>");

        let linked = client.publish_content(guide.secno, "<p>Body v2</p>").unwrap();
        assert_eq!(linked.content_path, Some(pointer));
        assert_eq!(client.page("guide").unwrap().content, "<p>Body v2</p>");
    }

    #[test]
    fn test_segment_escapes_reserved_characters() {
        assert_eq!(segment("getting-started"), "getting-started");
        assert_eq!(segment("a/b c"), "a%2Fb%20c");
    }
}
