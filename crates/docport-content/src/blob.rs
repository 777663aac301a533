//! Blob store trait and error types.
//!
//! Provides the [`BlobStore`] trait for the services that hold rendered
//! section bodies, along with [`BlobError`] for unified error handling across
//! backends.
//!
//! # Keys and URLs
//!
//! Keys are slash-separated relative paths (`docs/sec_7.html`). Every backend
//! exposes its blobs under a public base URL, so a key maps to exactly one
//! pointer and a pointer under that base maps back to its key.

use async_trait::async_trait;

/// Semantic error categories.
#[derive(Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum BlobErrorKind {
    /// Key is empty, absolute or escapes the store root.
    InvalidKey,
    /// Permission denied.
    PermissionDenied,
    /// Backend is temporarily unavailable.
    Unavailable,
    /// Stored bytes are not UTF-8.
    InvalidContent,
    /// Other/unknown error category.
    Other,
}

/// Blob error with semantic kind and backend-specific source.
#[derive(Debug)]
pub struct BlobError {
    /// Semantic error category.
    pub kind: BlobErrorKind,
    /// Key context (if applicable).
    pub key: Option<String>,
    /// Backend identifier (e.g., "Fs", "S3").
    pub backend: Option<&'static str>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl BlobError {
    /// Create a new blob error.
    #[must_use]
    pub fn new(kind: BlobErrorKind) -> Self {
        Self {
            kind,
            key: None,
            backend: None,
            source: None,
        }
    }

    /// Attach key context.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Attach backend identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Create an error from an I/O failure.
    #[must_use]
    pub fn io(err: std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::PermissionDenied => BlobErrorKind::PermissionDenied,
            std::io::ErrorKind::InvalidData => BlobErrorKind::InvalidContent,
            _ => BlobErrorKind::Other,
        };
        Self::new(kind).with_source(err)
    }
}

impl std::fmt::Display for BlobError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: "[Backend] Kind: message (key: docs/sec_1.html)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            BlobErrorKind::InvalidKey => "Invalid key",
            BlobErrorKind::PermissionDenied => "Permission denied",
            BlobErrorKind::Unavailable => "Unavailable",
            BlobErrorKind::InvalidContent => "Invalid content",
            BlobErrorKind::Other => "Error",
        };
        write!(f, "{kind_str}")?;

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        if let Some(key) = &self.key {
            write!(f, " (key: {key})")?;
        }

        Ok(())
    }
}

impl std::error::Error for BlobError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Reject keys that are empty, absolute or contain `..` segments.
pub(crate) fn check_key(key: &str, backend: &'static str) -> Result<(), BlobError> {
    let invalid = key.is_empty()
        || key.starts_with('/')
        || key.split('/').any(|segment| segment.is_empty() || segment == "..");
    if invalid {
        return Err(BlobError::new(BlobErrorKind::InvalidKey)
            .with_key(key)
            .with_backend(backend));
    }
    Ok(())
}

/// Service holding rendered section bodies.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Backend identifier used in logs and errors.
    fn backend(&self) -> &'static str;

    /// Public URL prefix under which blobs are readable, without trailing `/`.
    fn public_base_url(&self) -> &str;

    /// Write `content` under `key`, replacing any existing blob.
    async fn put(&self, key: &str, content: &str, content_type: &str) -> Result<(), BlobError>;

    /// Read the blob under `key`. `Ok(None)` when it does not exist.
    async fn get(&self, key: &str) -> Result<Option<String>, BlobError>;

    /// Public pointer for `key`.
    fn public_url(&self, key: &str) -> String {
        format!("{}/{key}", self.public_base_url())
    }

    /// Inverse of [`public_url`](Self::public_url): the key a pointer refers
    /// to, if it lives in this store.
    fn key_for_url(&self, url: &str) -> Option<String> {
        let key = url
            .strip_prefix(self.public_base_url())?
            .strip_prefix('/')?;
        let key = key.split(['?', '#']).next().unwrap_or(key);
        (!key.is_empty()).then(|| key.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    struct Fixed(&'static str);

    #[async_trait]
    impl BlobStore for Fixed {
        fn backend(&self) -> &'static str {
            "Fixed"
        }

        fn public_base_url(&self) -> &str {
            self.0
        }

        async fn put(&self, _: &str, _: &str, _: &str) -> Result<(), BlobError> {
            Ok(())
        }

        async fn get(&self, _: &str) -> Result<Option<String>, BlobError> {
            Ok(None)
        }
    }

    #[test]
    fn test_public_url_joins_base_and_key() {
        let store = Fixed("https://cdn.example.com/bucket");

        assert_eq!(
            store.public_url("docs/sec_3.html"),
            "https://cdn.example.com/bucket/docs/sec_3.html"
        );
    }

    #[test]
    fn test_key_for_url_inverts_public_url() {
        let store = Fixed("/content");

        assert_eq!(
            store.key_for_url("/content/docs/sec_3.html"),
            Some("docs/sec_3.html".to_owned())
        );
        assert_eq!(
            store.key_for_url("/content/docs/sec_3.html?v=2"),
            Some("docs/sec_3.html".to_owned())
        );
    }

    #[test]
    fn test_key_for_url_rejects_foreign_urls() {
        let store = Fixed("/content");

        assert_eq!(store.key_for_url("https://elsewhere.org/a.html"), None);
        assert_eq!(store.key_for_url("/contentx/a.html"), None);
        assert_eq!(store.key_for_url("/content/"), None);
    }

    #[test]
    fn test_check_key() {
        assert!(check_key("docs/sec_1.html", "Test").is_ok());

        for bad in ["", "/abs.html", "docs/../etc/passwd", "docs//x.html"] {
            let err = check_key(bad, "Test").unwrap_err();
            assert_eq!(err.kind, BlobErrorKind::InvalidKey, "key {bad:?}");
        }
    }

    #[test]
    fn test_display_includes_backend_and_key() {
        let err = BlobError::new(BlobErrorKind::Unavailable)
            .with_backend("S3")
            .with_key("docs/sec_1.html")
            .with_source("connection refused".to_owned());

        assert_eq!(
            err.to_string(),
            "[S3] Unavailable: connection refused (key: docs/sec_1.html)"
        );
    }
}
