//! Error types for the HTTP server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use docport_content::ContentError;
use docport_store::StoreError;
use serde_json::json;

/// API error, rendered as `{"error": true, "message": ...}`.
///
/// Server-side causes are logged when the error is created and never sent
/// to the client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed or invalid input.
    #[error("{0}")]
    Validation(String),
    /// Section does not exist.
    #[error("Section not found")]
    NotFound,
    /// Sibling display order already in use.
    #[error("{0}")]
    Conflict(String),
    /// Blob store write failed.
    #[error("Failed to upload HTML")]
    Upload,
    /// Storage or other server-side fault.
    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Upload | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(message) => Self::Validation(message),
            StoreError::NotFound => Self::NotFound,
            conflict @ StoreError::OrderConflict { .. } => Self::Conflict(conflict.to_string()),
            StoreError::Database(e) => {
                tracing::error!(error = %e, "Section store failure");
                Self::Internal
            }
        }
    }
}

impl From<ContentError> for ApiError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::EmptyContent | ContentError::InvalidSection(_) => {
                Self::Validation(err.to_string())
            }
            ContentError::Upload { ref key, ref source } => {
                tracing::error!(key = %key, error = %source, "Content upload failed");
                Self::Upload
            }
            ContentError::Timeout { ref key, timeout } => {
                tracing::error!(key = %key, ?timeout, "Content upload timed out");
                Self::Upload
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({"error": true, "message": self.to_string()});
        (self.status(), axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_store_errors_map_to_statuses() {
        let cases = [
            (StoreError::Validation("bad".to_owned()), StatusCode::BAD_REQUEST),
            (StoreError::NotFound, StatusCode::NOT_FOUND),
            (
                StoreError::OrderConflict { display_order: 2 },
                StatusCode::CONFLICT,
            ),
            (
                StoreError::Database(sqlx_error()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_conflict_message_names_the_order() {
        let err = ApiError::from(StoreError::OrderConflict { display_order: 4 });

        assert!(err.to_string().starts_with("Display order 4 is already used"));
    }

    #[test]
    fn test_database_cause_is_not_exposed() {
        let err = ApiError::from(StoreError::Database(sqlx_error()));

        assert_eq!(err.to_string(), "Internal server error");
    }

    #[test]
    fn test_content_errors_map_to_statuses() {
        assert_eq!(
            ApiError::from(ContentError::EmptyContent).status(),
            StatusCode::BAD_REQUEST
        );
        let timeout = ApiError::from(ContentError::Timeout {
            key: "docs/sec_1.html".to_owned(),
            timeout: Duration::from_secs(30),
        });
        assert_eq!(timeout.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(timeout.to_string(), "Failed to upload HTML");
    }

    fn sqlx_error() -> docport_store::SqlxError {
        docport_store::SqlxError::PoolTimedOut
    }
}
