//! S3 blob store.

use std::error::Error;

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;

use crate::blob::{BlobError, BlobErrorKind, BlobStore, check_key};

const BACKEND: &str = "S3";

/// Connection settings for [`S3BlobStore`].
#[derive(Clone, Debug)]
pub struct S3Settings {
    /// S3 bucket name.
    pub bucket: String,
    /// AWS region.
    pub region: String,
    /// S3-compatible endpoint URL.
    pub endpoint: Option<String>,
    /// Public URL prefix for objects in the bucket.
    pub public_base_url: String,
}

/// Blob store backed by an S3 bucket.
#[derive(Debug)]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl S3BlobStore {
    /// Build a client from the default AWS credential chain.
    pub async fn connect(settings: S3Settings) -> Self {
        let client = build_client(&settings).await;
        Self::from_client(client, settings.bucket, &settings.public_base_url)
    }

    /// Wrap an already configured client.
    #[must_use]
    pub fn from_client(client: Client, bucket: String, public_base_url: &str) -> Self {
        Self {
            client,
            bucket,
            public_base_url: public_base_url.trim_end_matches('/').to_owned(),
        }
    }
}

async fn build_client(settings: &S3Settings) -> Client {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(settings.region.clone()));

    if let Some(endpoint) = &settings.endpoint {
        loader = loader.endpoint_url(endpoint);
    }

    let sdk_config = loader.load().await;

    // Custom endpoints (MinIO, LocalStack) need endpoint/bucket/key addressing.
    if settings.endpoint.is_some() {
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();
        return Client::from_conf(s3_config);
    }

    Client::new(&sdk_config)
}

/// Walk the error source chain and join all messages.
fn error_chain(err: &dyn Error) -> String {
    let mut msgs = vec![err.to_string()];
    let mut source = err.source();
    while let Some(s) = source {
        msgs.push(s.to_string());
        source = s.source();
    }
    msgs.join(": ")
}

fn unavailable(key: &str, err: &dyn Error) -> BlobError {
    BlobError::new(BlobErrorKind::Unavailable)
        .with_key(key)
        .with_backend(BACKEND)
        .with_source(error_chain(err))
}

#[async_trait]
impl BlobStore for S3BlobStore {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    fn public_base_url(&self) -> &str {
        &self.public_base_url
    }

    async fn put(&self, key: &str, content: &str, content_type: &str) -> Result<(), BlobError> {
        check_key(key, BACKEND)?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(content.as_bytes().to_vec()))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| unavailable(key, &e))?;

        tracing::debug!(bucket = %self.bucket, key, "Uploaded");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, BlobError> {
        check_key(key, BACKEND)?;

        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(output) => output,
            Err(e) if e.as_service_error().is_some_and(|se| se.is_no_such_key()) => {
                return Ok(None);
            }
            Err(e) => return Err(unavailable(key, &e)),
        };

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| unavailable(key, &e))?
            .into_bytes();

        String::from_utf8(bytes.to_vec())
            .map(Some)
            .map_err(|e| {
                BlobError::new(BlobErrorKind::InvalidContent)
                    .with_key(key)
                    .with_backend(BACKEND)
                    .with_source(e)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("outer")]
    struct Outer(#[source] std::io::Error);

    #[test]
    fn test_error_chain_joins_sources() {
        let err = Outer(std::io::Error::other("inner"));

        assert_eq!(error_chain(&err), "outer: inner");
    }

    #[test]
    fn test_public_url_round_trip() {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new("us-east-1"))
            .build();
        let store = S3BlobStore::from_client(
            Client::from_conf(config),
            "portal-docs".to_owned(),
            "http://localhost:9000/portal-docs/",
        );

        assert_eq!(
            store.public_url("docs/sec_4.html"),
            "http://localhost:9000/portal-docs/docs/sec_4.html"
        );
        assert_eq!(
            store.key_for_url("http://localhost:9000/portal-docs/docs/sec_4.html"),
            Some("docs/sec_4.html".to_owned())
        );
    }
}
