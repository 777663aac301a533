//! Publishing section bodies to the blob store.

use std::sync::Arc;
use std::time::Duration;

use docport_config::ContentConfig;

use crate::blob::{BlobError, BlobStore};

/// Content type of every published body.
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Error returned by [`ContentPublisher::publish`].
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    /// Body is missing or blank.
    #[error("Content is required")]
    EmptyContent,
    /// Section number is not a positive integer.
    #[error("Invalid section number")]
    InvalidSection(i64),
    /// The blob store rejected the write.
    #[error("Failed to upload {key}")]
    Upload {
        key: String,
        #[source]
        source: BlobError,
    },
    /// The blob store did not answer in time.
    #[error("Upload of {key} timed out after {timeout:?}")]
    Timeout { key: String, timeout: Duration },
}

/// Writes section bodies and hands back their public pointers.
///
/// The publisher never touches the section store. Linking the returned
/// pointer to its section is the caller's job.
#[derive(Clone)]
pub struct ContentPublisher {
    store: Arc<dyn BlobStore>,
    prefix: String,
    timeout: Duration,
}

impl std::fmt::Debug for ContentPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentPublisher")
            .field("backend", &self.store.backend())
            .field("prefix", &self.prefix)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ContentPublisher {
    /// Create a publisher writing under `prefix`.
    #[must_use]
    pub fn new(store: Arc<dyn BlobStore>, prefix: &str, timeout: Duration) -> Self {
        Self {
            store,
            prefix: prefix.trim_matches('/').to_owned(),
            timeout,
        }
    }

    /// Create a publisher with prefix and timeout from configuration.
    #[must_use]
    pub fn from_config(store: Arc<dyn BlobStore>, config: &ContentConfig) -> Self {
        Self::new(store, &config.prefix, config.upload_timeout)
    }

    /// Backing blob store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn BlobStore> {
        &self.store
    }

    /// Key under which the body of `secno` is stored.
    ///
    /// Deterministic, so republishing a section overwrites its blob.
    #[must_use]
    pub fn storage_key(&self, secno: i64) -> String {
        if self.prefix.is_empty() {
            format!("sec_{secno}.html")
        } else {
            format!("{}/sec_{secno}.html", self.prefix)
        }
    }

    /// Store `html` as the body of `secno` and return its public pointer.
    pub async fn publish(&self, secno: i64, html: &str) -> Result<String, ContentError> {
        if secno <= 0 {
            return Err(ContentError::InvalidSection(secno));
        }
        if html.trim().is_empty() {
            return Err(ContentError::EmptyContent);
        }

        let key = self.storage_key(secno);
        let written =
            tokio::time::timeout(self.timeout, self.store.put(&key, html, HTML_CONTENT_TYPE)).await;

        match written {
            Ok(Ok(())) => {}
            Ok(Err(source)) => return Err(ContentError::Upload { key, source }),
            Err(_) => {
                return Err(ContentError::Timeout {
                    key,
                    timeout: self.timeout,
                });
            }
        }

        let url = self.store.public_url(&key);
        tracing::info!(secno, key = %key, bytes = html.len(), "Content published");
        Ok(url)
    }
}
