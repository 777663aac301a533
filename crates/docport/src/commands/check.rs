//! `docport check` command implementation.
//!
//! Parent references are not validated on write and old databases may
//! predate the sibling order index, so the hierarchy can drift. This command
//! reports what the navigation tree silently drops or orders ambiguously.

use std::collections::{BTreeMap, BTreeSet};

use clap::Args;
use docport_store::Section;
use docport_tree::unreachable;

use super::DatabaseArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the check command.
#[derive(Args)]
pub(crate) struct CheckArgs {
    #[command(flatten)]
    database: DatabaseArgs,
}

impl CheckArgs {
    /// Execute the check command.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Validation`] if any problem is found.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let store = self.database.open_store().await?;
        let sections = store.list_all().await?;
        store.close().await;

        let report = Report::inspect(&sections);
        if report.is_clean() {
            output.success(&format!("{} section(s), no problems found", sections.len()));
            return Ok(());
        }

        report.print(&output);
        Err(CliError::Validation(format!(
            "{} problem(s) found",
            report.problem_count()
        )))
    }
}

/// Hierarchy problems found in a section list.
#[derive(Debug, Default, PartialEq, Eq)]
struct Report {
    /// `(secno, missing parent)`.
    dangling: Vec<(i64, i64)>,
    /// Sections cut off from the top level by a cycle or a dangling ancestor.
    unreachable: Vec<i64>,
    /// `(parent, display order, secnos)` for orders used more than once.
    duplicate_orders: Vec<(Option<i64>, i64, Vec<i64>)>,
    /// `(slug, secnos)` for slugs shared by several sections.
    slug_collisions: Vec<(String, Vec<i64>)>,
}

impl Report {
    fn inspect(sections: &[Section]) -> Self {
        let known: BTreeSet<i64> = sections.iter().map(|s| s.secno).collect();

        let mut dangling: Vec<(i64, i64)> = sections
            .iter()
            .filter_map(|s| {
                s.parent_secno
                    .filter(|parent| !known.contains(parent))
                    .map(|parent| (s.secno, parent))
            })
            .collect();
        dangling.sort_unstable();

        let dangling_ids: BTreeSet<i64> = dangling.iter().map(|(secno, _)| *secno).collect();
        let unreachable = unreachable(sections)
            .into_iter()
            .filter(|secno| !dangling_ids.contains(secno))
            .collect();

        let mut orders: BTreeMap<(Option<i64>, i64), Vec<i64>> = BTreeMap::new();
        let mut slugs: BTreeMap<&str, Vec<i64>> = BTreeMap::new();
        for section in sections {
            orders
                .entry((section.parent_secno, section.display_order))
                .or_default()
                .push(section.secno);
            slugs.entry(section.slug.as_str()).or_default().push(section.secno);
        }

        let duplicate_orders = orders
            .into_iter()
            .filter(|(_, secnos)| secnos.len() > 1)
            .map(|((parent, order), mut secnos)| {
                secnos.sort_unstable();
                (parent, order, secnos)
            })
            .collect();

        let slug_collisions = slugs
            .into_iter()
            .filter(|(_, secnos)| secnos.len() > 1)
            .map(|(slug, mut secnos)| {
                secnos.sort_unstable();
                (slug.to_owned(), secnos)
            })
            .collect();

        Self {
            dangling,
            unreachable,
            duplicate_orders,
            slug_collisions,
        }
    }

    fn problem_count(&self) -> usize {
        self.dangling.len()
            + self.unreachable.len()
            + self.duplicate_orders.len()
            + self.slug_collisions.len()
    }

    fn is_clean(&self) -> bool {
        self.problem_count() == 0
    }

    fn print(&self, output: &Output) {
        if !self.dangling.is_empty() {
            output.highlight("Dangling parents");
            for (secno, parent) in &self.dangling {
                output.warning(&format!("  #{secno}: parent #{parent} does not exist"));
            }
        }

        if !self.unreachable.is_empty() {
            output.highlight("Unreachable sections");
            for secno in &self.unreachable {
                output.warning(&format!("  #{secno}: not under any top-level section"));
            }
        }

        if !self.duplicate_orders.is_empty() {
            output.highlight("Duplicate sibling orders");
            for (parent, order, secnos) in &self.duplicate_orders {
                let level = parent.map_or_else(|| "top level".to_owned(), |p| format!("under #{p}"));
                output.warning(&format!("  order {order} {level}: {}", join(secnos)));
            }
        }

        if !self.slug_collisions.is_empty() {
            output.highlight("Slug collisions");
            for (slug, secnos) in &self.slug_collisions {
                output.warning(&format!(
                    "  {slug}: {} (lookups return #{})",
                    join(secnos),
                    secnos[0]
                ));
            }
        }
    }
}

fn join(secnos: &[i64]) -> String {
    secnos
        .iter()
        .map(|s| format!("#{s}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    use super::*;

    fn section(secno: i64, parent: Option<i64>, order: i64, slug: &str) -> Section {
        Section {
            secno,
            name: slug.to_owned(),
            slug: slug.to_owned(),
            parent_secno: parent,
            display_order: order,
            metadescription: None,
            metakeywords: None,
            content_path: None,
            view_count: 0,
            last_update: Utc::now(),
        }
    }

    #[test]
    fn test_clean_hierarchy() {
        let report = Report::inspect(&[
            section(1, None, 1, "guide"),
            section(2, Some(1), 1, "install"),
            section(3, Some(1), 2, "upgrade"),
        ]);

        assert!(report.is_clean());
        assert_eq!(report, Report::default());
    }

    #[test]
    fn test_dangling_parent_and_descendants() {
        let report = Report::inspect(&[
            section(1, None, 1, "guide"),
            section(2, Some(9), 1, "orphan"),
            section(3, Some(2), 1, "orphan-child"),
        ]);

        assert_eq!(report.dangling, vec![(2, 9)]);
        assert_eq!(report.unreachable, vec![3]);
        assert_eq!(report.problem_count(), 2);
    }

    #[test]
    fn test_cycle_is_unreachable() {
        let report = Report::inspect(&[
            section(1, Some(2), 1, "a"),
            section(2, Some(1), 1, "b"),
            section(3, Some(3), 1, "self"),
        ]);

        assert!(report.dangling.is_empty());
        assert_eq!(report.unreachable, vec![1, 2, 3]);
    }

    #[test]
    fn test_duplicate_orders_and_slugs() {
        let report = Report::inspect(&[
            section(1, None, 1, "guide"),
            section(2, None, 1, "reference"),
            section(3, Some(1), 5, "faq"),
            section(4, Some(2), 5, "faq"),
        ]);

        assert_eq!(report.duplicate_orders, vec![(None, 1, vec![1, 2])]);
        assert_eq!(report.slug_collisions, vec![("faq".to_owned(), vec![3, 4])]);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_join() {
        assert_eq!(join(&[3, 4]), "#3, #4");
    }
}
