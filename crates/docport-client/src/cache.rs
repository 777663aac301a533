//! Client-side section cache.
//!
//! The section list changes rarely and every page needs it for navigation,
//! so [`CachedPortal`] keeps one copy together with the `ETag` the server
//! sent for it. Mutations made through the wrapper mark the copy stale; the
//! next read revalidates it with `If-None-Match` instead of trusting it.
//! Changes made by other clients are only seen after [`CachedPortal::refresh`]
//! or a local mutation.

use docport_tree::{TreeNode, build_tree, parent_options};

use crate::client::PortalClient;
use crate::error::ClientError;
use crate::types::{Listing, NewSection, Section, SectionUpdate};

#[derive(Debug)]
struct Cached {
    sections: Vec<Section>,
    etag: Option<String>,
}

/// Flat section list plus the `ETag` it was served with.
#[derive(Debug, Default)]
pub struct SectionCache {
    cached: Option<Cached>,
    stale: bool,
}

impl SectionCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached list, if present and not stale.
    #[must_use]
    pub fn fresh(&self) -> Option<&[Section]> {
        if self.stale {
            return None;
        }
        self.cached.as_ref().map(|c| c.sections.as_slice())
    }

    /// `ETag` of the cached list, stale or not.
    #[must_use]
    pub fn etag(&self) -> Option<&str> {
        self.cached.as_ref().and_then(|c| c.etag.as_deref())
    }

    /// Replace the cached list.
    pub fn store(&mut self, sections: Vec<Section>, etag: Option<String>) {
        self.cached = Some(Cached { sections, etag });
        self.stale = false;
    }

    /// Mark a stale list as current again after the server confirmed its
    /// `ETag`.
    pub fn confirm(&mut self) {
        if self.cached.is_some() {
            self.stale = false;
        }
    }

    /// Mark the cached list stale.
    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    /// Drop the cached list and its `ETag`.
    pub fn clear(&mut self) {
        self.cached = None;
        self.stale = false;
    }
}

/// [`PortalClient`] with a cached section list.
#[derive(Debug)]
pub struct CachedPortal {
    client: PortalClient,
    cache: SectionCache,
}

impl CachedPortal {
    /// Wrap `client` with an empty cache.
    #[must_use]
    pub fn new(client: PortalClient) -> Self {
        Self {
            client,
            cache: SectionCache::new(),
        }
    }

    /// The underlying client, for uncached calls.
    #[must_use]
    pub fn client(&self) -> &PortalClient {
        &self.client
    }

    /// The cache state.
    #[must_use]
    pub fn cache(&self) -> &SectionCache {
        &self.cache
    }

    /// All sections, from the cache when it is fresh.
    ///
    /// # Errors
    ///
    /// Returns an error if the list has to be fetched and the request fails.
    pub fn sections(&mut self) -> Result<&[Section], ClientError> {
        if self.cache.fresh().is_none() {
            self.revalidate()?;
        }
        Ok(self.cache.fresh().unwrap_or(&[]))
    }

    /// Revalidate the cached list with the server even if it looks fresh.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub fn refresh(&mut self) -> Result<&[Section], ClientError> {
        self.revalidate()?;
        Ok(self.cache.fresh().unwrap_or(&[]))
    }

    fn revalidate(&mut self) -> Result<(), ClientError> {
        match self.client.list_sections_if_changed(self.cache.etag())? {
            Listing::NotModified => {
                tracing::debug!("Section list not modified");
                self.cache.confirm();
            }
            Listing::Fresh { sections, etag } => {
                tracing::debug!(count = sections.len(), "Section list refreshed");
                self.cache.store(sections, etag);
            }
        }
        Ok(())
    }

    /// Navigation forest built from the cached list.
    ///
    /// # Errors
    ///
    /// Returns an error if the list has to be fetched and the request fails.
    pub fn navigation(&mut self) -> Result<Vec<TreeNode<Section>>, ClientError> {
        Ok(build_tree(self.sections()?))
    }

    /// Top-level sections offered as parents for a new section.
    ///
    /// # Errors
    ///
    /// Returns an error if the list has to be fetched and the request fails.
    pub fn parent_options(&mut self) -> Result<Vec<Section>, ClientError> {
        Ok(parent_options(self.sections()?)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Create a section.
    ///
    /// # Errors
    ///
    /// See [`PortalClient::create_section`].
    pub fn create(&mut self, new: &NewSection) -> Result<Section, ClientError> {
        let result = self.client.create_section(new);
        self.cache.invalidate();
        result
    }

    /// Update a section.
    ///
    /// # Errors
    ///
    /// See [`PortalClient::update_section`].
    pub fn update(&mut self, secno: i64, update: &SectionUpdate) -> Result<Section, ClientError> {
        let result = self.client.update_section(secno, update);
        self.cache.invalidate();
        result
    }

    /// Delete a section.
    ///
    /// # Errors
    ///
    /// See [`PortalClient::delete_section`].
    pub fn delete(&mut self, secno: i64) -> Result<(), ClientError> {
        let result = self.client.delete_section(secno);
        self.cache.invalidate();
        result
    }

    /// Publish a body and store its pointer on the section.
    ///
    /// Two requests: upload, then `PUT content_path`. If the second one
    /// fails the body stays published but unlinked.
    ///
    /// # Errors
    ///
    /// Returns the first failing request's error.
    pub fn save_content(&mut self, secno: i64, html: &str) -> Result<Section, ClientError> {
        let content_path = self.client.upload_html(secno, html)?;

        let update = SectionUpdate {
            content_path: Some(content_path),
            ..SectionUpdate::default()
        };
        let result = self.client.update_section(secno, &update);
        self.cache.invalidate();

        if let Err(e) = &result {
            tracing::warn!(secno, error = %e, "Body uploaded but section not linked");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_server;

    fn section(secno: i64, parent: Option<i64>, order: i64) -> Section {
        serde_json::from_value(serde_json::json!({
            "secno": secno,
            "name": format!("S{secno}"),
            "slug": format!("s{secno}"),
            "parent_secno": parent,
            "display_order": order,
            "metadescription": null,
            "metakeywords": null,
            "content_path": null,
            "view_count": 0,
            "last_update": "2026-01-05T10:00:00Z",
        }))
        .unwrap()
    }

    #[test]
    fn test_cache_lifecycle() {
        let mut cache = SectionCache::new();
        assert!(cache.fresh().is_none());
        assert_eq!(cache.etag(), None);

        cache.store(vec![section(1, None, 1)], Some("\"abc\"".to_owned()));
        assert_eq!(cache.fresh().map(<[Section]>::len), Some(1));

        cache.invalidate();
        assert!(cache.fresh().is_none());
        assert_eq!(cache.etag(), Some("\"abc\""));

        cache.confirm();
        assert_eq!(cache.fresh().map(<[Section]>::len), Some(1));

        cache.clear();
        assert!(cache.fresh().is_none());
        assert_eq!(cache.etag(), None);
    }

    #[test]
    fn test_confirm_without_list_stays_empty() {
        let mut cache = SectionCache::new();
        cache.invalidate();
        cache.confirm();

        assert!(cache.fresh().is_none());
    }

    #[test]
    fn test_navigation_and_invalidation() {
        let mut portal = CachedPortal::new(PortalClient::new(&test_server::spawn()));

        assert!(portal.navigation().unwrap().is_empty());

        let guide = portal
            .create(&NewSection::new("Guide").with_order(1))
            .unwrap();
        portal
            .create(&NewSection::new("Install").with_parent(guide.secno).with_order(1))
            .unwrap();

        let forest = portal.navigation().unwrap();
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].item.name, "Guide");
        assert_eq!(forest[0].children[0].item.name, "Install");

        portal.delete(guide.secno).unwrap();
        let names: Vec<String> = portal
            .sections()
            .unwrap()
            .iter()
            .map(|s| s.name.clone())
            .collect();
        assert_eq!(names, vec!["Install"]);
    }

    #[test]
    fn test_refresh_revalidates_with_etag() {
        let mut portal = CachedPortal::new(PortalClient::new(&test_server::spawn()));
        portal.create(&NewSection::new("Guide")).unwrap();

        assert_eq!(portal.sections().unwrap().len(), 1);
        let etag = portal.cache().etag().map(str::to_owned);
        assert!(etag.is_some());

        assert_eq!(portal.refresh().unwrap().len(), 1);
        assert_eq!(portal.cache().etag().map(str::to_owned), etag);
    }

    #[test]
    fn test_other_clients_changes_seen_after_refresh() {
        let base_url = test_server::spawn();
        let mut portal = CachedPortal::new(PortalClient::new(&base_url));
        let other = PortalClient::new(&base_url);

        assert!(portal.sections().unwrap().is_empty());
        other.create_section(&NewSection::new("Guide")).unwrap();

        assert!(portal.sections().unwrap().is_empty());
        assert_eq!(portal.refresh().unwrap().len(), 1);
    }

    #[test]
    fn test_save_content_links_pointer() {
        let mut portal = CachedPortal::new(PortalClient::new(&test_server::spawn()));
        let guide = portal.create(&NewSection::new("Guide")).unwrap();

        let saved = portal.save_content(guide.secno, "<h1>Guide</h1>").unwrap();

        assert_eq!(
            saved.content_path,
            Some(format!(
                "{}/docs/sec_{}.html",
                test_server::BLOB_BASE,
                guide.secno
            ))
        );
        assert_eq!(
            portal.sections().unwrap()[0].content_path,
            saved.content_path
        );
        assert_eq!(portal.client().page("guide").unwrap().content, "<h1>Guide</h1>");
    }

    #[test]
    fn test_failed_mutation_still_invalidates() {
        let mut portal = CachedPortal::new(PortalClient::new(&test_server::spawn()));
        portal.create(&NewSection::new("Guide").with_order(1)).unwrap();
        portal.sections().unwrap();

        let err = portal
            .create(&NewSection::new("Other").with_order(1))
            .unwrap_err();

        assert!(err.is_conflict());
        assert!(portal.cache().fresh().is_none());
    }
}
