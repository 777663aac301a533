//! Portal server on a background runtime for client tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;

use docport_config::DatabaseConfig;
use docport_content::{ContentPublisher, MemoryBlobStore};
use docport_server::{AppState, create_router};
use docport_store::SectionStore;

pub(crate) const BLOB_BASE: &str = "https://blobs.example.com";

/// Start a server with an empty in-memory database and return its base URL.
pub(crate) fn spawn() -> String {
    let (tx, rx) = mpsc::channel::<SocketAddr>();

    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async move {
            let store = SectionStore::connect(&DatabaseConfig::in_memory())
                .await
                .unwrap();
            let blobs = Arc::new(MemoryBlobStore::new(BLOB_BASE));
            let publisher = ContentPublisher::new(blobs, "docs", Duration::from_secs(5));
            let app = create_router(Arc::new(AppState::new(store, publisher)));

            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap()).unwrap();
            axum::serve(listener, app).await.unwrap();
        });
    });

    format!("http://{}", rx.recv().unwrap())
}
