//! Reading section bodies back through their pointers.

use std::sync::Arc;
use std::time::Duration;

use ureq::Agent;

use crate::blob::BlobStore;

/// Default HTTP timeout in seconds.
const DEFAULT_TIMEOUT: u64 = 10;

/// Turns content pointers into HTML.
///
/// Pointers into the configured blob store are read from it directly. Other
/// `http(s)` pointers are fetched over HTTP. Every failure degrades to
/// `None` so a missing body never breaks page rendering.
#[derive(Clone)]
pub struct ContentResolver {
    store: Arc<dyn BlobStore>,
    agent: Agent,
}

impl std::fmt::Debug for ContentResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentResolver")
            .field("backend", &self.store.backend())
            .finish_non_exhaustive()
    }
}

impl ContentResolver {
    /// Create a resolver with the default HTTP timeout.
    #[must_use]
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self::with_timeout(store, Duration::from_secs(DEFAULT_TIMEOUT))
    }

    /// Create a resolver whose HTTP fetches give up after `timeout`.
    #[must_use]
    pub fn with_timeout(store: Arc<dyn BlobStore>, timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();

        Self { store, agent }
    }

    /// Fetch the HTML a pointer refers to.
    pub async fn resolve(&self, content_path: &str) -> Option<String> {
        if let Some(key) = self.store.key_for_url(content_path) {
            return match self.store.get(&key).await {
                Ok(Some(html)) => Some(html),
                Ok(None) => {
                    tracing::warn!(key = %key, "Content pointer refers to a missing blob");
                    None
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Failed to read content blob");
                    None
                }
            };
        }

        if content_path.starts_with("http://") || content_path.starts_with("https://") {
            return self.fetch(content_path.to_owned()).await;
        }

        tracing::warn!(content_path, "Unsupported content pointer");
        None
    }

    async fn fetch(&self, url: String) -> Option<String> {
        let agent = self.agent.clone();
        let task_url = url.clone();
        let result = tokio::task::spawn_blocking(move || fetch_blocking(&agent, &task_url)).await;

        match result {
            Ok(Ok(html)) => Some(html),
            Ok(Err(message)) => {
                tracing::warn!(url = %url, error = %message, "Failed to fetch content");
                None
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Content fetch task failed");
                None
            }
        }
    }
}

fn fetch_blocking(agent: &Agent, url: &str) -> Result<String, String> {
    let response = agent.get(url).call().map_err(|e| e.to_string())?;

    let status = response.status().as_u16();
    if !(200..300).contains(&status) {
        return Err(format!("HTTP {status}"));
    }

    response
        .into_body()
        .read_to_string()
        .map_err(|e| e.to_string())
}
