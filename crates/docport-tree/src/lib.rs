//! Section hierarchy assembly for the documentation portal.
//!
//! Sections are persisted as a flat list where each row optionally points at
//! its parent. This crate turns such a list into a forest ordered by sibling
//! display order. The tree is never stored; it is rebuilt on demand from the
//! flat list, on the server for the navigation endpoint and on the client for
//! rendering.
//!
//! # Example
//!
//! ```
//! use docport_tree::{TreeItem, build_tree};
//!
//! #[derive(Clone)]
//! struct Item(i64, Option<i64>, i64);
//!
//! impl TreeItem for Item {
//!     fn secno(&self) -> i64 { self.0 }
//!     fn parent_secno(&self) -> Option<i64> { self.1 }
//!     fn display_order(&self) -> i64 { self.2 }
//! }
//!
//! let forest = build_tree(&[Item(2, Some(1), 1), Item(1, None, 1)]);
//! assert_eq!(forest.len(), 1);
//! assert_eq!(forest[0].children[0].item.secno(), 2);
//! ```
//!
//! # Malformed hierarchies
//!
//! Parent references are not validated when sections are written, so the
//! builder tolerates two kinds of damage silently:
//!
//! - **Dangling parents**: a section whose parent does not exist is dropped,
//!   together with everything below it.
//! - **Cycles**: sections whose parent chain never reaches a top-level
//!   section (self-reference, mutual reference) are unreachable from any
//!   root and never appear. Assembly walks down from roots only, so it
//!   always terminates.
//!
//! [`unreachable`] reports the sections excluded for either reason.

mod node;

use std::collections::{BTreeMap, HashMap, HashSet};

pub use node::{TreeNode, Walk};

/// A row that can be placed in the section forest.
pub trait TreeItem {
    /// Unique identifier of the item.
    fn secno(&self) -> i64;

    /// Identifier of the parent item, `None` for top-level items.
    fn parent_secno(&self) -> Option<i64>;

    /// Sort key among siblings (ascending).
    fn display_order(&self) -> i64;
}

/// Sibling ordering: display order first, secno as a tie breaker so the
/// output does not depend on input order.
fn sibling_key<T: TreeItem>(item: &T) -> (i64, i64) {
    (item.display_order(), item.secno())
}

/// Index items by secno. The last occurrence of a repeated secno wins.
fn index_items<T: TreeItem>(items: &[T]) -> BTreeMap<i64, &T> {
    items.iter().map(|item| (item.secno(), item)).collect()
}

/// Group child secnos under their parent secno, each group sorted.
fn index_children<T: TreeItem>(lookup: &BTreeMap<i64, &T>) -> HashMap<i64, Vec<i64>> {
    let mut children: HashMap<i64, Vec<i64>> = HashMap::new();
    for item in lookup.values() {
        if let Some(parent) = item.parent_secno()
            && lookup.contains_key(&parent)
        {
            children.entry(parent).or_default().push(item.secno());
        }
    }
    for group in children.values_mut() {
        group.sort_by_key(|secno| sibling_key(lookup[secno]));
    }
    children
}

/// Top-level items sorted by sibling order.
fn sorted_roots<'a, T: TreeItem>(lookup: &BTreeMap<i64, &'a T>) -> Vec<&'a T> {
    let mut roots: Vec<&T> = lookup
        .values()
        .copied()
        .filter(|item| item.parent_secno().is_none())
        .collect();
    roots.sort_by_key(|item| sibling_key(*item));
    roots
}

/// Secnos reachable from `roots`, each listed after its parent.
fn preorder(roots: &[i64], children: &HashMap<i64, Vec<i64>>) -> Vec<i64> {
    let mut visited = Vec::new();
    let mut pending = roots.to_vec();
    while let Some(secno) = pending.pop() {
        visited.push(secno);
        if let Some(group) = children.get(&secno) {
            pending.extend(group);
        }
    }
    visited
}

/// Build the section forest from a flat list.
///
/// Roots and every children list are ordered by `display_order` ascending,
/// ties broken by `secno`. The result is identical for any permutation of
/// `items`. Nodes are assembled bottom-up without recursion, so hierarchy
/// depth is bounded only by memory.
#[must_use]
pub fn build_tree<T: TreeItem + Clone>(items: &[T]) -> Vec<TreeNode<T>> {
    let lookup = index_items(items);
    let children = index_children(&lookup);
    let roots: Vec<i64> = sorted_roots(&lookup).iter().map(|r| r.secno()).collect();

    let visited = preorder(&roots, &children);
    let mut built: HashMap<i64, TreeNode<T>> = HashMap::with_capacity(visited.len());
    for secno in visited.into_iter().rev() {
        let kids = children
            .get(&secno)
            .map(|group| group.iter().filter_map(|c| built.remove(c)).collect())
            .unwrap_or_default();
        built.insert(
            secno,
            TreeNode {
                item: lookup[&secno].clone(),
                children: kids,
            },
        );
    }

    roots
        .iter()
        .filter_map(|secno| built.remove(secno))
        .collect()
}

/// Top-level items in sibling order.
///
/// These are the candidates offered as a parent when a new section is
/// created.
#[must_use]
pub fn parent_options<T: TreeItem>(items: &[T]) -> Vec<&T> {
    sorted_roots(&index_items(items))
}

/// Secnos of items that [`build_tree`] leaves out, ascending.
///
/// An item is unreachable when its parent chain hits a missing secno or loops
/// back on itself before reaching a top-level item.
#[must_use]
pub fn unreachable<T: TreeItem>(items: &[T]) -> Vec<i64> {
    let lookup = index_items(items);
    let children = index_children(&lookup);

    let roots: Vec<i64> = sorted_roots(&lookup).iter().map(|r| r.secno()).collect();
    let reached: HashSet<i64> = preorder(&roots, &children).into_iter().collect();

    lookup
        .keys()
        .copied()
        .filter(|secno| !reached.contains(secno))
        .collect()
}
