//! Table and index definitions.

use sqlx::SqlitePool;

/// Statements applied on every connect. All are idempotent.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS docsection (
        secno INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        slug TEXT NOT NULL,
        parent_secno INTEGER,
        display_order INTEGER NOT NULL DEFAULT 999,
        metadescription TEXT,
        metakeywords TEXT,
        content_path TEXT,
        view_count INTEGER NOT NULL DEFAULT 0,
        last_update TEXT NOT NULL
    )",
    // One display order per sibling group; top-level rows share group 0.
    "CREATE UNIQUE INDEX IF NOT EXISTS docsection_sibling_order
        ON docsection (COALESCE(parent_secno, 0), display_order)",
    "CREATE INDEX IF NOT EXISTS docsection_slug ON docsection (slug)",
];

/// Create the `docsection` table and its indexes if missing.
pub(crate) async fn apply(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    tracing::debug!("Applying docsection schema");

    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }

    Ok(())
}
