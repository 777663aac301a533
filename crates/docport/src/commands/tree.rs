//! `docport tree` command implementation.

use clap::Args;
use docport_store::Section;
use docport_tree::{TreeNode, build_tree, unreachable};

use super::DatabaseArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the tree command.
#[derive(Args)]
pub(crate) struct TreeArgs {
    #[command(flatten)]
    database: DatabaseArgs,
}

impl TreeArgs {
    /// Execute the tree command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the database cannot be
    /// read.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let store = self.database.open_store().await?;
        let sections = store.list_all().await?;
        store.close().await;

        if sections.is_empty() {
            output.info("No sections");
            return Ok(());
        }

        for root in build_tree(&sections) {
            for (depth, label, details) in tree_lines(&root) {
                output.tree_line(depth, &label, &details);
            }
        }

        let hidden = unreachable(&sections);
        if !hidden.is_empty() {
            output.warning(&format!(
                "{} section(s) not reachable from the top level; run `docport check`",
                hidden.len()
            ));
        }

        Ok(())
    }
}

/// `(depth, label, details)` for every node of a subtree, in display order.
fn tree_lines(root: &TreeNode<Section>) -> Vec<(usize, String, String)> {
    root.walk()
        .map(|(depth, section)| {
            let mut details = format!("#{} order {}", section.secno, section.display_order);
            if section.content_path.is_none() {
                details.push_str(", no content");
            }
            (depth, section.name.clone(), details)
        })
        .collect()
}
