//! HTTP server for the documentation portal.
//!
//! This crate provides the portal's JSON API using axum:
//! - Section CRUD, navigation tree and view counter
//! - Publishing section bodies to the blob store and linking them
//! - Page reads that resolve a section's content pointer
//! - Local blob serving under `/content` for the filesystem backend
//!
//! # Quick Start
//!
//! ```ignore
//! use docport_config::{ContentConfig, DatabaseConfig};
//! use docport_server::{ServerConfig, run_server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig {
//!         host: "127.0.0.1".to_owned(),
//!         port: 8080,
//!         database: DatabaseConfig::default(),
//!         content: ContentConfig::default(),
//!     };
//!
//!     run_server(config).await.unwrap();
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! Client ──HTTP──► axum server (docport-server)
//!                        │
//!                        ├─► /api/v1/docs ──► SectionStore (SQLite)
//!                        │
//!                        ├─► upload / content ──► ContentPublisher ──► BlobStore
//!                        │
//!                        ├─► page ──► ContentResolver ──► BlobStore or HTTP
//!                        │
//!                        └─► /content (filesystem blobs, tower-http)
//! ```

mod app;
mod error;
mod extract;
mod handlers;
mod middleware;
mod state;

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use docport_config::{ContentBackend, ContentConfig, DatabaseConfig};
use docport_content::{ContentPublisher, open_blob_store};
use docport_store::SectionStore;

pub use app::create_router;
pub use error::ApiError;
pub use state::AppState;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Section database.
    pub database: DatabaseConfig,
    /// Blob storage for section bodies.
    pub content: ContentConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8080,
            database: DatabaseConfig::default(),
            content: ContentConfig::default(),
        }
    }
}

/// Run the server.
///
/// # Arguments
///
/// * `config` - Server configuration
///
/// # Errors
///
/// Returns an error if the database cannot be opened or the server fails
/// to start.
pub async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = SectionStore::connect(&config.database).await?;

    let blobs = open_blob_store(&config.content).await;
    let publisher = ContentPublisher::from_config(blobs, &config.content);

    let mut state = AppState::new(store.clone(), publisher);
    if let ContentBackend::Fs { dir } = &config.content.backend {
        state = state.with_content_dir(dir.clone());
    }

    let app = create_router(Arc::new(state));

    let addr = SocketAddr::from_str(&format!("{}:{}", config.host, config.port))?;
    tracing::info!(address = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for Ctrl+C, stopping server");
        return;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}

/// Create server configuration from portal config.
///
/// # Arguments
///
/// * `config` - Portal configuration
#[must_use]
pub fn server_config_from_config(config: &docport_config::Config) -> ServerConfig {
    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        database: config.database_resolved.clone(),
        content: config.content_resolved.clone(),
    }
}
