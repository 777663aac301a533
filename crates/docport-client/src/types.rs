//! Wire types for the portal API.

use chrono::{DateTime, Utc};
use docport_tree::TreeItem;
use serde::{Deserialize, Serialize};

/// A section as returned by the portal.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Section {
    pub secno: i64,
    pub name: String,
    pub slug: String,
    pub parent_secno: Option<i64>,
    pub display_order: i64,
    pub metadescription: Option<String>,
    pub metakeywords: Option<String>,
    /// Public URL of the rendered body, if one was published.
    pub content_path: Option<String>,
    pub view_count: i64,
    pub last_update: DateTime<Utc>,
}

impl TreeItem for Section {
    fn secno(&self) -> i64 {
        self.secno
    }

    fn parent_secno(&self) -> Option<i64> {
        self.parent_secno
    }

    fn display_order(&self) -> i64 {
        self.display_order
    }
}

/// A section with its resolved HTML body.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Page {
    pub section: Section,
    pub content: String,
}

/// Body of a create request.
#[derive(Clone, Debug, Default, Serialize)]
pub struct NewSection {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_secno: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadescription: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metakeywords: Option<String>,
}

impl NewSection {
    /// Create a request with only a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Place the section under `parent_secno`.
    #[must_use]
    pub fn with_parent(mut self, parent_secno: i64) -> Self {
        self.parent_secno = Some(parent_secno);
        self
    }

    /// Set the display order.
    #[must_use]
    pub fn with_order(mut self, display_order: i64) -> Self {
        self.display_order = Some(display_order);
        self
    }
}

/// Body of an update request; only set fields are sent.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SectionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadescription: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metakeywords: Option<String>,
}

/// Result of a conditional list request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Listing {
    /// The list matching the supplied `ETag` is still current.
    NotModified,
    /// A fresh list and its `ETag`.
    Fresh {
        sections: Vec<Section>,
        etag: Option<String>,
    },
}

/// Success envelope: `{"error": false, "message"?: ..., "data": ...}`.
#[derive(Deserialize)]
pub(crate) struct Envelope<T> {
    pub(crate) data: T,
}

/// Error envelope: `{"error": true, "message": ...}`.
#[derive(Deserialize)]
pub(crate) struct ErrorBody {
    pub(crate) message: String,
}

#[derive(Deserialize)]
pub(crate) struct UploadResponse {
    pub(crate) content_path: String,
}

#[derive(Deserialize)]
pub(crate) struct ViewResponse {
    pub(crate) view_count: i64,
}

#[derive(Deserialize)]
pub(crate) struct HealthResponse {
    pub(crate) status: String,
}
