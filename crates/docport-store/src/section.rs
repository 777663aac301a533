//! Section row and write payloads.

use chrono::{DateTime, Utc};
use docport_tree::TreeItem;
use serde::Serialize;
use sqlx::FromRow;

/// Display order assigned when a create request does not specify one.
pub const DEFAULT_DISPLAY_ORDER: i64 = 999;

/// A row from the `docsection` table.
#[derive(Clone, Debug, PartialEq, Eq, FromRow, Serialize)]
pub struct Section {
    /// Identifier, assigned on insert and never reused.
    pub secno: i64,
    /// HTML-escaped display name.
    pub name: String,
    /// URL slug derived from the name.
    pub slug: String,
    /// Parent section, `None` for top-level sections.
    pub parent_secno: Option<i64>,
    /// Sort key among siblings.
    pub display_order: i64,
    pub metadescription: Option<String>,
    pub metakeywords: Option<String>,
    /// Pointer to the rendered HTML body.
    pub content_path: Option<String>,
    pub view_count: i64,
    /// Set on insert, re-stamped whenever `content_path` changes.
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

/// Payload for creating a section.
///
/// `name` is raw user text; the store trims, escapes and slugifies it.
#[derive(Clone, Debug, Default)]
pub struct NewSection {
    pub name: String,
    /// `Some(0)` is treated as top-level.
    pub parent_secno: Option<i64>,
    /// Defaults to [`DEFAULT_DISPLAY_ORDER`].
    pub display_order: Option<i64>,
    pub metadescription: Option<String>,
    pub metakeywords: Option<String>,
}

impl NewSection {
    /// Create a payload with only a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the parent section.
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

/// Partial update of a section. `None` fields are left untouched.
#[derive(Clone, Debug, Default)]
pub struct SectionPatch {
    /// New name; the slug is recomputed.
    pub name: Option<String>,
    /// New content pointer; `last_update` is re-stamped.
    pub content_path: Option<String>,
    pub display_order: Option<i64>,
    pub metadescription: Option<String>,
    pub metakeywords: Option<String>,
}

impl SectionPatch {
    /// Patch that only sets the content pointer.
    #[must_use]
    pub fn content_path(path: impl Into<String>) -> Self {
        Self {
            content_path: Some(path.into()),
            ..Self::default()
        }
    }

    /// True when no field would change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.content_path.is_none()
            && self.display_order.is_none()
            && self.metadescription.is_none()
            && self.metakeywords.is_none()
    }
}
