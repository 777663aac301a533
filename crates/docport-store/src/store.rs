//! `SQLite`-backed section store.

use std::str::FromStr;

use chrono::Utc;
use docport_config::{DatabaseConfig, DatabaseLocation};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::section::{DEFAULT_DISPLAY_ORDER, NewSection, Section, SectionPatch};
use crate::slug::{sanitize_name, slugify, trim_optional};
use crate::{StoreError, schema};

/// Persistent section storage.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone, Debug)]
pub struct SectionStore {
    pool: SqlitePool,
}

impl SectionStore {
    /// Open the database described by `config` and apply the schema.
    ///
    /// File databases are created if missing and run in WAL mode with the
    /// configured busy timeout.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = match &config.location {
            DatabaseLocation::File(path) => {
                tracing::info!(path = %path.display(), "Opening section database");
                let options = SqliteConnectOptions::new()
                    .filename(path)
                    .create_if_missing(true)
                    .journal_mode(SqliteJournalMode::Wal)
                    .busy_timeout(config.busy_timeout);
                SqlitePoolOptions::new()
                    .max_connections(config.max_connections)
                    .connect_with(options)
                    .await?
            }
            DatabaseLocation::Memory => {
                tracing::info!("Opening in-memory section database");
                let options = SqliteConnectOptions::from_str("sqlite::memory:")?
                    .busy_timeout(config.busy_timeout);
                // Every connection to :memory: is a separate database, so
                // keep exactly one alive for the lifetime of the pool.
                SqlitePoolOptions::new()
                    .max_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None)
                    .connect_with(options)
                    .await?
            }
        };

        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, applying the schema.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        schema::apply(&pool).await?;
        Ok(Self { pool })
    }

    /// Underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the pool, waiting for in-flight queries.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// All sections ordered by display order, ties by secno.
    pub async fn list_all(&self) -> Result<Vec<Section>, StoreError> {
        let sections = sqlx::query_as::<_, Section>(
            "SELECT * FROM docsection ORDER BY display_order, secno",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(sections)
    }

    /// Sections in one sibling group, `None` for top level.
    pub async fn list_children(&self, parent: Option<i64>) -> Result<Vec<Section>, StoreError> {
        let sections = sqlx::query_as::<_, Section>(
            "SELECT * FROM docsection WHERE parent_secno IS ? ORDER BY display_order, secno",
        )
        .bind(parent)
        .fetch_all(&self.pool)
        .await?;
        Ok(sections)
    }

    /// Fetch a section by identifier.
    pub async fn get_by_secno(&self, secno: i64) -> Result<Section, StoreError> {
        sqlx::query_as::<_, Section>("SELECT * FROM docsection WHERE secno = ?")
            .bind(secno)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)
    }

    /// Fetch a section by slug. Among duplicates the lowest secno wins.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Section, StoreError> {
        sqlx::query_as::<_, Section>(
            "SELECT * FROM docsection WHERE slug = ? ORDER BY secno LIMIT 1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }

    /// Insert a section after checking its sibling group for the same
    /// display order.
    ///
    /// Check and insert run in one `BEGIN IMMEDIATE` transaction, so the
    /// write lock is held before the check and concurrent creates wait on the
    /// busy timeout instead of failing on a lock upgrade. The unique index on
    /// `(parent, display_order)` backs the check.
    pub async fn create(&self, new: NewSection) -> Result<Section, StoreError> {
        let name = sanitize_name(&new.name)?;
        let slug = slugify(new.name.trim());
        let parent_secno = match new.parent_secno {
            None | Some(0) => None,
            Some(p) if p < 0 => {
                return Err(StoreError::Validation(
                    "Parent section number must be a positive integer".to_owned(),
                ));
            }
            Some(p) => Some(p),
        };
        let display_order = new.display_order.unwrap_or(DEFAULT_DISPLAY_ORDER);

        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        let taken: Option<i64> = sqlx::query_scalar(
            "SELECT secno FROM docsection WHERE parent_secno IS ? AND display_order = ? LIMIT 1",
        )
        .bind(parent_secno)
        .bind(display_order)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(existing) = taken {
            tx.rollback().await?;
            tracing::debug!(
                existing,
                ?parent_secno,
                display_order,
                "Display order already taken"
            );
            return Err(StoreError::OrderConflict { display_order });
        }

        let inserted = sqlx::query_as::<_, Section>(
            "INSERT INTO docsection
                (name, slug, parent_secno, display_order, metadescription, metakeywords, last_update)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(&name)
        .bind(&slug)
        .bind(parent_secno)
        .bind(display_order)
        .bind(trim_optional(new.metadescription.as_deref()))
        .bind(trim_optional(new.metakeywords.as_deref()))
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await;

        let section = match inserted {
            Ok(section) => section,
            Err(err) => {
                tx.rollback().await?;
                return Err(StoreError::from_write(err, Some(display_order)));
            }
        };

        tx.commit().await?;

        tracing::info!(secno = section.secno, slug = %section.slug, "Section created");
        Ok(section)
    }

    /// Apply a partial update.
    ///
    /// The sibling-order check is not repeated here; a collision is still
    /// rejected by the unique index and reported as
    /// [`StoreError::OrderConflict`].
    pub async fn update(&self, secno: i64, patch: SectionPatch) -> Result<Section, StoreError> {
        if patch.is_empty() {
            return Err(StoreError::Validation("No fields to update".to_owned()));
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE docsection SET ");
        let mut fields = query.separated(", ");

        if let Some(name) = &patch.name {
            fields.push("name = ").push_bind_unseparated(sanitize_name(name)?);
            fields.push("slug = ").push_bind_unseparated(slugify(name.trim()));
        }
        if let Some(path) = &patch.content_path {
            let path = path.trim();
            if path.is_empty() {
                return Err(StoreError::Validation(
                    "Content path cannot be empty".to_owned(),
                ));
            }
            fields.push("content_path = ").push_bind_unseparated(path.to_owned());
            fields.push("last_update = ").push_bind_unseparated(Utc::now());
        }
        if let Some(order) = patch.display_order {
            fields.push("display_order = ").push_bind_unseparated(order);
        }
        if let Some(description) = &patch.metadescription {
            fields
                .push("metadescription = ")
                .push_bind_unseparated(trim_optional(Some(description)));
        }
        if let Some(keywords) = &patch.metakeywords {
            fields
                .push("metakeywords = ")
                .push_bind_unseparated(trim_optional(Some(keywords)));
        }

        query.push(" WHERE secno = ").push_bind(secno);
        query.push(" RETURNING *");

        let section = query
            .build_query_as::<Section>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| StoreError::from_write(err, patch.display_order))?
            .ok_or(StoreError::NotFound)?;

        tracing::info!(secno, "Section updated");
        Ok(section)
    }

    /// Remove a section. Children keep their `parent_secno`.
    pub async fn delete(&self, secno: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM docsection WHERE secno = ?")
            .bind(secno)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        tracing::info!(secno, "Section deleted");
        Ok(())
    }

    /// Atomically increment the view counter, returning the new value.
    pub async fn increment_view(&self, secno: i64) -> Result<i64, StoreError> {
        sqlx::query_scalar(
            "UPDATE docsection SET view_count = view_count + 1 WHERE secno = ? RETURNING view_count",
        )
        .bind(secno)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;

    async fn memory_store() -> SectionStore {
        SectionStore::connect(&DatabaseConfig::in_memory())
            .await
            .unwrap()
    }

    async fn seed(store: &SectionStore, name: &str, parent: Option<i64>, order: i64) -> Section {
        let mut new = NewSection::new(name).with_order(order);
        new.parent_secno = parent;
        store.create(new).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_assigns_defaults() {
        let store = memory_store().await;

        let section = store
            .create(NewSection::new("  Getting Started  "))
            .await
            .unwrap();

        assert_eq!(section.secno, 1);
        assert_eq!(section.name, "Getting Started");
        assert_eq!(section.slug, "getting-started");
        assert_eq!(section.parent_secno, None);
        assert_eq!(section.display_order, DEFAULT_DISPLAY_ORDER);
        assert_eq!(section.view_count, 0);
        assert_eq!(section.content_path, None);
    }

    #[tokio::test]
    async fn test_create_escapes_name_but_slugs_raw_text() {
        let store = memory_store().await;

        let section = store
            .create(NewSection::new("Tips & Tricks"))
            .await
            .unwrap();

        assert_eq!(section.name, "Tips &amp; Tricks");
        assert_eq!(section.slug, "tips-and-tricks");
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name() {
        let store = memory_store().await;

        let err = store.create(NewSection::new("   ")).await.unwrap_err();

        assert!(matches!(err, StoreError::Validation(_)));
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_normalizes_zero_parent_to_top_level() {
        let store = memory_store().await;

        let section = store
            .create(NewSection::new("Root").with_parent(0).with_order(1))
            .await
            .unwrap();

        assert_eq!(section.parent_secno, None);
    }

    #[tokio::test]
    async fn test_create_rejects_negative_parent() {
        let store = memory_store().await;

        let err = store
            .create(NewSection::new("Bad").with_parent(-4))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_trims_metadata() {
        let store = memory_store().await;
        let mut new = NewSection::new("Meta");
        new.metadescription = Some("  About billing  ".to_owned());
        new.metakeywords = Some("   ".to_owned());

        let section = store.create(new).await.unwrap();

        assert_eq!(section.metadescription.as_deref(), Some("About billing"));
        assert_eq!(section.metakeywords, None);
    }

    #[tokio::test]
    async fn test_create_conflict_in_same_top_level_group() {
        let store = memory_store().await;
        seed(&store, "First", None, 1).await;

        let err = store
            .create(NewSection::new("Second").with_order(1))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            StoreError::OrderConflict { display_order: 1 }
        ));
        assert_eq!(
            err.to_string(),
            "Display order 1 is already used in this level (same parent or top-level). Please choose a different order."
        );
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_conflict_within_parent() {
        let store = memory_store().await;
        let parent = seed(&store, "Parent", None, 1).await;
        seed(&store, "Child", Some(parent.secno), 5).await;

        let err = store
            .create(NewSection::new("Twin").with_parent(parent.secno).with_order(5))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::OrderConflict { .. }));
    }

    #[tokio::test]
    async fn test_same_order_allowed_in_different_groups() {
        let store = memory_store().await;
        let a = seed(&store, "A", None, 1).await;
        let b = seed(&store, "B", None, 2).await;

        seed(&store, "A child", Some(a.secno), 1).await;
        seed(&store, "B child", Some(b.secno), 1).await;

        assert_eq!(store.list_all().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_default_order_collides_on_second_create() {
        let store = memory_store().await;
        store.create(NewSection::new("One")).await.unwrap();

        let err = store.create(NewSection::new("Two")).await.unwrap_err();

        assert!(matches!(
            err,
            StoreError::OrderConflict {
                display_order: DEFAULT_DISPLAY_ORDER
            }
        ));
    }

    #[tokio::test]
    async fn test_secno_never_reused_after_delete() {
        let store = memory_store().await;
        let first = seed(&store, "First", None, 1).await;
        store.delete(first.secno).await.unwrap();

        let second = seed(&store, "Second", None, 1).await;

        assert!(second.secno > first.secno);
    }

    #[tokio::test]
    async fn test_list_all_orders_by_display_order_then_secno() {
        let store = memory_store().await;
        let parent = seed(&store, "Parent", None, 3).await;
        seed(&store, "Top", None, 1).await;
        seed(&store, "Child", Some(parent.secno), 1).await;

        let names: Vec<String> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();

        assert_eq!(names, vec!["Top", "Child", "Parent"]);
    }

    #[tokio::test]
    async fn test_list_children() {
        let store = memory_store().await;
        let parent = seed(&store, "Parent", None, 1).await;
        seed(&store, "Second", Some(parent.secno), 2).await;
        seed(&store, "First", Some(parent.secno), 1).await;

        let children: Vec<String> = store
            .list_children(Some(parent.secno))
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        let top = store.list_children(None).await.unwrap();

        assert_eq!(children, vec!["First", "Second"]);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].secno, parent.secno);
    }

    #[tokio::test]
    async fn test_get_by_secno_and_not_found() {
        let store = memory_store().await;
        let created = seed(&store, "Guide", None, 1).await;

        assert_eq!(store.get_by_secno(created.secno).await.unwrap(), created);
        assert!(matches!(
            store.get_by_secno(999).await.unwrap_err(),
            StoreError::NotFound
        ));
    }

    #[tokio::test]
    async fn test_get_by_slug_prefers_lowest_secno() {
        let store = memory_store().await;
        let first = seed(&store, "FAQ", None, 1).await;
        seed(&store, "faq!", None, 2).await;

        let found = store.get_by_slug("faq").await.unwrap();

        assert_eq!(found.secno, first.secno);
        assert!(matches!(
            store.get_by_slug("missing").await.unwrap_err(),
            StoreError::NotFound
        ));
    }

    #[tokio::test]
    async fn test_update_rename_recomputes_slug() {
        let store = memory_store().await;
        let created = seed(&store, "Old Name", None, 1).await;

        let updated = store
            .update(
                created.secno,
                SectionPatch {
                    name: Some("New Name".to_owned()),
                    ..SectionPatch::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "New Name");
        assert_eq!(updated.slug, "new-name");
        assert_eq!(updated.last_update, created.last_update);
    }

    #[tokio::test]
    async fn test_update_content_path_stamps_last_update() {
        let store = memory_store().await;
        let created = seed(&store, "Page", None, 1).await;

        let updated = store
            .update(
                created.secno,
                SectionPatch::content_path("/content/docs/sec_1.html"),
            )
            .await
            .unwrap();

        assert_eq!(
            updated.content_path.as_deref(),
            Some("/content/docs/sec_1.html")
        );
        assert!(updated.last_update >= created.last_update);
        assert_eq!(updated.name, created.name);
    }

    #[tokio::test]
    async fn test_update_empty_patch_is_validation_error() {
        let store = memory_store().await;

        let err = store
            .update(42, SectionPatch::default())
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Validation(ref m) if m == "No fields to update"));
    }

    #[tokio::test]
    async fn test_update_missing_section() {
        let store = memory_store().await;

        let err = store
            .update(
                42,
                SectionPatch {
                    display_order: Some(3),
                    ..SectionPatch::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn test_update_order_collision_is_conflict() {
        let store = memory_store().await;
        seed(&store, "A", None, 1).await;
        let b = seed(&store, "B", None, 2).await;

        let err = store
            .update(
                b.secno,
                SectionPatch {
                    display_order: Some(1),
                    ..SectionPatch::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            StoreError::OrderConflict { display_order: 1 }
        ));
        assert_eq!(store.get_by_secno(b.secno).await.unwrap().display_order, 2);
    }

    #[tokio::test]
    async fn test_update_rejects_empty_content_path() {
        let store = memory_store().await;
        let created = seed(&store, "Page", None, 1).await;

        let err = store
            .update(created.secno, SectionPatch::content_path("  "))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_delete_orphans_children() {
        let store = memory_store().await;
        let parent = seed(&store, "Parent", None, 1).await;
        let child = seed(&store, "Child", Some(parent.secno), 1).await;

        store.delete(parent.secno).await.unwrap();

        let orphan = store.get_by_secno(child.secno).await.unwrap();
        assert_eq!(orphan.parent_secno, Some(parent.secno));
        assert!(matches!(
            store.delete(parent.secno).await.unwrap_err(),
            StoreError::NotFound
        ));
    }

    #[tokio::test]
    async fn test_increment_view() {
        let store = memory_store().await;
        let section = seed(&store, "Popular", None, 1).await;

        assert_eq!(store.increment_view(section.secno).await.unwrap(), 1);
        assert_eq!(store.increment_view(section.secno).await.unwrap(), 2);
        assert!(matches!(
            store.increment_view(999).await.unwrap_err(),
            StoreError::NotFound
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_increments_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            location: DatabaseLocation::File(dir.path().join("portal.db")),
            max_connections: 4,
            ..DatabaseConfig::default()
        };
        let store = Arc::new(SectionStore::connect(&config).await.unwrap());
        let secno = seed(&store, "Hot", None, 1).await.secno;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                for _ in 0..10 {
                    store.increment_view(secno).await.unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let reloaded = store.get_by_secno(secno).await.unwrap();
        assert_eq!(reloaded.view_count, 80);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_same_order_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            location: DatabaseLocation::File(dir.path().join("portal.db")),
            max_connections: 8,
            ..DatabaseConfig::default()
        };
        let store = Arc::new(SectionStore::connect(&config).await.unwrap());

        for round in 1..=10 {
            let mut handles = Vec::new();
            for racer in 0..8 {
                let store = Arc::clone(&store);
                handles.push(tokio::spawn(async move {
                    store
                        .create(NewSection::new(format!("Racer {round}-{racer}")).with_order(round))
                        .await
                }));
            }

            let mut created = 0;
            for handle in handles {
                match handle.await.unwrap() {
                    Ok(_) => created += 1,
                    Err(StoreError::OrderConflict { display_order }) => {
                        assert_eq!(display_order, round);
                    }
                    Err(err) => panic!("round {round}: unexpected error: {err}"),
                }
            }
            assert_eq!(created, 1, "round {round}");
        }

        let sections = store.list_all().await.unwrap();
        assert_eq!(sections.len(), 10);
    }

    #[tokio::test]
    async fn test_file_database_accepts_unknown_parent() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            location: DatabaseLocation::File(dir.path().join("portal.db")),
            ..DatabaseConfig::default()
        };
        let store = SectionStore::connect(&config).await.unwrap();
        let parent = seed(&store, "Parent", None, 1).await;
        let stray = seed(&store, "Stray", Some(404), 1).await;
        let child = seed(&store, "Child", Some(parent.secno), 1).await;

        store.delete(parent.secno).await.unwrap();

        assert_eq!(stray.parent_secno, Some(404));
        let reloaded = store.get_by_secno(child.secno).await.unwrap();
        assert_eq!(reloaded.parent_secno, Some(parent.secno));
    }

    #[tokio::test]
    async fn test_file_database_persists_across_connects() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            location: DatabaseLocation::File(dir.path().join("portal.db")),
            ..DatabaseConfig::default()
        };

        let store = SectionStore::connect(&config).await.unwrap();
        seed(&store, "Durable", None, 1).await;
        store.close().await;

        let reopened = SectionStore::connect(&config).await.unwrap();
        let sections = reopened.list_all().await.unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].slug, "durable");
    }

    #[tokio::test]
    async fn test_sections_build_a_tree() {
        let store = memory_store().await;
        let root = seed(&store, "Root", None, 1).await;
        seed(&store, "Second", Some(root.secno), 2).await;
        seed(&store, "First", Some(root.secno), 1).await;

        let forest = docport_tree::build_tree(&store.list_all().await.unwrap());

        assert_eq!(forest.len(), 1);
        let children: Vec<&str> = forest[0]
            .children
            .iter()
            .map(|n| n.item.name.as_str())
            .collect();
        assert_eq!(children, vec!["First", "Second"]);
    }
}
