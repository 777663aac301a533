//! In-memory blob store for testing.
//!
//! Provides [`MemoryBlobStore`] for exercising publishers and resolvers
//! without a filesystem or network.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::blob::{BlobError, BlobErrorKind, BlobStore, check_key};

const BACKEND: &str = "Memory";

/// A stored blob.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredBlob {
    pub content: String,
    pub content_type: String,
}

/// Blob store keeping everything in a map.
///
/// Use the builder methods to seed blobs or inject failures.
///
/// # Example
///
/// ```ignore
/// use docport_content::{BlobStore, MemoryBlobStore};
///
/// let store = MemoryBlobStore::new("/content").with_blob("docs/sec_1.html", "<p>Hi</p>");
/// assert_eq!(store.get("docs/sec_1.html").await?, Some("<p>Hi</p>".to_owned()));
/// ```
#[derive(Debug)]
pub struct MemoryBlobStore {
    public_base_url: String,
    blobs: RwLock<HashMap<String, StoredBlob>>,
    fail_writes: AtomicBool,
    write_delay: Option<Duration>,
}

impl MemoryBlobStore {
    /// Create an empty store.
    #[must_use]
    pub fn new(public_base_url: &str) -> Self {
        Self {
            public_base_url: public_base_url.trim_end_matches('/').to_owned(),
            blobs: RwLock::new(HashMap::new()),
            fail_writes: AtomicBool::new(false),
            write_delay: None,
        }
    }

    /// Seed a blob.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_blob(self, key: impl Into<String>, content: impl Into<String>) -> Self {
        self.blobs.write().unwrap().insert(
            key.into(),
            StoredBlob {
                content: content.into(),
                content_type: "text/html; charset=utf-8".to_owned(),
            },
        );
        self
    }

    /// Sleep this long before every write.
    #[must_use]
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = Some(delay);
        self
    }

    /// Make subsequent writes fail with [`BlobErrorKind::Unavailable`].
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Stored blob under `key`, with its content type.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn blob(&self, key: &str) -> Option<StoredBlob> {
        self.blobs.read().unwrap().get(key).cloned()
    }

    /// Number of stored blobs.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.read().unwrap().len()
    }

    /// True when nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    fn public_base_url(&self) -> &str {
        &self.public_base_url
    }

    async fn put(&self, key: &str, content: &str, content_type: &str) -> Result<(), BlobError> {
        check_key(key, BACKEND)?;

        if let Some(delay) = self.write_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BlobError::new(BlobErrorKind::Unavailable)
                .with_key(key)
                .with_backend(BACKEND)
                .with_source("injected write failure"));
        }

        self.blobs
            .write()
            .map_err(|_| BlobError::new(BlobErrorKind::Other).with_backend(BACKEND))?
            .insert(
                key.to_owned(),
                StoredBlob {
                    content: content.to_owned(),
                    content_type: content_type.to_owned(),
                },
            );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, BlobError> {
        check_key(key, BACKEND)?;

        let blobs = self
            .blobs
            .read()
            .map_err(|_| BlobError::new(BlobErrorKind::Other).with_backend(BACKEND))?;
        Ok(blobs.get(key).map(|b| b.content.clone()))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[tokio::test]
    async fn test_seeded_blob_is_readable() {
        let store = MemoryBlobStore::new("/content").with_blob("docs/sec_1.html", "<p>Hi</p>");

        assert_eq!(
            store.get("docs/sec_1.html").await.unwrap().as_deref(),
            Some("<p>Hi</p>")
        );
        assert_eq!(store.get("docs/sec_2.html").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_records_content_type() {
        let store = MemoryBlobStore::new("/content");

        store
            .put("docs/sec_1.html", "<p>x</p>", "text/html; charset=utf-8")
            .await
            .unwrap();

        let blob = store.blob("docs/sec_1.html").unwrap();
        assert_eq!(blob.content_type, "text/html; charset=utf-8");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = MemoryBlobStore::new("/content");
        store.fail_writes(true);

        let err = store.put("docs/sec_1.html", "x", "text/html").await.unwrap_err();

        assert_eq!(err.kind, BlobErrorKind::Unavailable);
        assert!(store.is_empty());
    }
}
