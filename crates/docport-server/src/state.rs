//! Application state.
//!
//! Shared state for all request handlers.

use std::path::PathBuf;
use std::sync::Arc;

use docport_content::{BlobStore, ContentPublisher, ContentResolver};
use docport_store::SectionStore;

/// Application state shared across all handlers.
#[derive(Debug)]
pub struct AppState {
    /// Section storage.
    pub(crate) store: SectionStore,
    /// Writes section bodies to the blob store.
    pub(crate) publisher: ContentPublisher,
    /// Reads section bodies back through their pointers.
    pub(crate) resolver: ContentResolver,
    /// Directory served under the local content route, for the filesystem
    /// blob backend.
    pub(crate) content_dir: Option<PathBuf>,
}

impl AppState {
    /// Create state where publisher and resolver share one blob store.
    #[must_use]
    pub fn new(store: SectionStore, publisher: ContentPublisher) -> Self {
        let resolver = ContentResolver::new(Arc::clone(publisher.store()));
        Self {
            store,
            publisher,
            resolver,
            content_dir: None,
        }
    }

    /// Serve `dir` under the local content route.
    #[must_use]
    pub fn with_content_dir(mut self, dir: PathBuf) -> Self {
        self.content_dir = Some(dir);
        self
    }

    /// Public URL prefix of the blob store.
    pub(crate) fn content_base_url(&self) -> &str {
        let store: &Arc<dyn BlobStore> = self.publisher.store();
        store.public_base_url()
    }
}
