//! Section storage for the documentation portal.
//!
//! Sections live in a single `docsection` table. The store enforces the
//! sibling ordering rule (one `display_order` per parent, top level
//! included) with a check inside the create transaction and a unique index
//! that holds even when creates race.
//!
//! Parent references are not validated: a section may point at a missing
//! or descendant parent. `docport_tree` tolerates both when assembling the
//! navigation forest.

mod error;
mod schema;
mod section;
mod slug;
mod store;

pub use error::StoreError;
pub use section::{DEFAULT_DISPLAY_ORDER, NewSection, Section, SectionPatch};
pub use slug::{MAX_NAME_LEN, sanitize_name, slugify};
pub use store::SectionStore;

/// Database driver error carried by [`StoreError::Database`].
pub use sqlx::Error as SqlxError;
