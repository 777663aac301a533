//! Liveness probe.

use axum::Json;
use serde_json::{Value, json};

/// Handle GET /api/v1/healthcheck.
pub(crate) async fn healthcheck() -> Json<Value> {
    Json(json!({"status": "Ok"}))
}
