//! Filesystem blob store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::blob::{BlobError, BlobStore, check_key};

const BACKEND: &str = "Fs";

/// Blob store rooted at a local directory.
///
/// The portal serves the directory itself, so pointers are usually relative
/// (`/content/docs/sec_1.html`).
#[derive(Debug)]
pub struct FsBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl FsBlobStore {
    /// Create a store rooted at `root`. The directory is created on first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// Root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, BlobError> {
        check_key(key, BACKEND)?;
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    fn public_base_url(&self) -> &str {
        &self.public_base_url
    }

    async fn put(&self, key: &str, content: &str, _content_type: &str) -> Result<(), BlobError> {
        let path = self.path_for(key)?;
        let wrap = |e: std::io::Error| BlobError::io(e).with_key(key).with_backend(BACKEND);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(wrap)?;
        }

        // Write beside the target and rename so readers never see a partial file.
        let tmp = path.with_extension(format!("tmp-{}", uuid::Uuid::new_v4()));
        tokio::fs::write(&tmp, content).await.map_err(wrap)?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(wrap(e));
        }

        tracing::debug!(key, path = %path.display(), "Blob written");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, BlobError> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(BlobError::io(e).with_key(key).with_backend(BACKEND)),
        }
    }
}
