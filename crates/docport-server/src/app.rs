//! Router construction.
//!
//! Builds the axum router with all routes and middleware.

use std::sync::Arc;

use axum::Router;
use axum::http::Method;
use axum::routing::{get, post};
use docport_config::FS_PUBLIC_BASE_URL;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handlers::{content, health, sections};
use crate::middleware::security;
use crate::state::AppState;

/// Create the application router.
///
/// # Arguments
///
/// * `state` - Shared application state
pub fn create_router(state: Arc<AppState>) -> Router {
    let docs_routes = Router::new()
        .route(
            "/",
            get(sections::list_sections).post(sections::create_section),
        )
        .route("/tree", get(sections::get_tree))
        .route("/slug/{slug}", get(sections::get_section_by_slug))
        .route("/page/{slug}", get(content::get_page))
        .route("/upload/doc-html", post(content::upload_html))
        .route(
            "/{secno}",
            get(sections::get_section)
                .put(sections::update_section)
                .delete(sections::delete_section),
        )
        .route("/{secno}/view", get(sections::increment_view))
        .route("/{secno}/content", post(content::publish_and_link));

    let api_routes = Router::new()
        .route("/healthcheck", get(health::healthcheck))
        .nest("/docs", docs_routes);

    let mut router = Router::new().nest("/api/v1", api_routes);

    // Filesystem blobs are served by the portal itself
    if let Some(dir) = &state.content_dir {
        router = router.nest_service(FS_PUBLIC_BASE_URL, ServeDir::new(dir));
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(security::csp_layer(state.content_base_url()))
                .layer(security::content_type_options_layer())
                .layer(security::frame_options_layer())
                .layer(security::referrer_policy_layer())
                .layer(security::hsts_layer()),
        )
        .with_state(state)
}
