//! Section store errors.

/// Error returned by [`SectionStore`](crate::SectionStore) operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Input rejected before touching storage.
    #[error("{0}")]
    Validation(String),
    /// No section with the requested key.
    #[error("Section not found")]
    NotFound,
    /// Another section in the same sibling group uses this display order.
    #[error(
        "Display order {display_order} is already used in this level (same parent or top-level). Please choose a different order."
    )]
    OrderConflict {
        /// The requested display order.
        display_order: i64,
    },
    /// Storage fault.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Map a write failure, turning a sibling-order index violation into
    /// [`StoreError::OrderConflict`].
    pub(crate) fn from_write(err: sqlx::Error, display_order: Option<i64>) -> Self {
        if let sqlx::Error::Database(db) = &err
            && db.is_unique_violation()
            && let Some(display_order) = display_order
        {
            return Self::OrderConflict { display_order };
        }
        Self::Database(err)
    }
}
