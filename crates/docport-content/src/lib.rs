//! Section bodies and content pointers.
//!
//! Rendered HTML for a section lives outside the section database, in a
//! [`BlobStore`]. The section row only keeps a pointer (the blob's public
//! URL). This crate provides:
//!
//! - [`BlobStore`] with filesystem, S3 and (behind the `mock` feature)
//!   in-memory backends
//! - [`ContentPublisher`], which writes a body under a deterministic key and
//!   returns its pointer
//! - [`ContentResolver`], which reads a body back through its pointer
//!
//! Publishing and linking are separate steps. A body written without its
//! pointer being saved is left in the store.

mod blob;
mod fs;
#[cfg(any(test, feature = "mock"))]
mod memory;
mod publisher;
mod resolver;
mod s3;

use std::sync::Arc;

use docport_config::{ContentBackend, ContentConfig};

pub use blob::{BlobError, BlobErrorKind, BlobStore};
pub use fs::FsBlobStore;
#[cfg(any(test, feature = "mock"))]
pub use memory::{MemoryBlobStore, StoredBlob};
pub use publisher::{ContentError, ContentPublisher, HTML_CONTENT_TYPE};
pub use resolver::ContentResolver;
pub use s3::{S3BlobStore, S3Settings};

/// Open the blob store selected by `config`.
pub async fn open_blob_store(config: &ContentConfig) -> Arc<dyn BlobStore> {
    match &config.backend {
        ContentBackend::Fs { dir } => {
            tracing::info!(dir = %dir.display(), "Using filesystem content store");
            Arc::new(FsBlobStore::new(dir, &config.public_base_url))
        }
        ContentBackend::S3 {
            bucket,
            region,
            endpoint,
        } => {
            tracing::info!(bucket = %bucket, region = %region, "Using S3 content store");
            Arc::new(
                S3BlobStore::connect(S3Settings {
                    bucket: bucket.clone(),
                    region: region.clone(),
                    endpoint: endpoint.clone(),
                    public_base_url: config.public_base_url.clone(),
                })
                .await,
            )
        }
    }
}
