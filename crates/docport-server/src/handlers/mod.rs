//! HTTP request handlers.

pub(crate) mod content;
pub(crate) mod health;
pub(crate) mod sections;

use serde::Serialize;

/// Success envelope: `{"error": false, "message"?: ..., "data": ...}`.
#[derive(Serialize)]
pub(crate) struct Envelope<T> {
    error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
    data: T,
}

impl<T> Envelope<T> {
    pub(crate) fn data(data: T) -> Self {
        Self {
            error: false,
            message: None,
            data,
        }
    }

    pub(crate) fn with_message(message: &'static str, data: T) -> Self {
        Self {
            error: false,
            message: Some(message),
            data,
        }
    }
}
