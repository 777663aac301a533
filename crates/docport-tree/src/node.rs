//! Forest node type and traversal.

/// A section with its ordered children.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TreeNode<T> {
    /// The wrapped item.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub item: T,
    /// Children ordered by display order.
    pub children: Vec<TreeNode<T>>,
}

impl<T> TreeNode<T> {
    /// Number of nodes in this subtree, including this node.
    #[must_use]
    pub fn len(&self) -> usize {
        self.walk().count()
    }

    /// Always `false`: a node counts itself.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Pre-order traversal yielding `(depth, item)`, depth 0 for this node.
    #[must_use]
    pub fn walk(&self) -> Walk<'_, T> {
        Walk {
            stack: vec![(0, self)],
        }
    }
}

impl<T> Drop for TreeNode<T> {
    fn drop(&mut self) {
        // Detach descendants first so deep chains drop without recursion.
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// Pre-order iterator returned by [`TreeNode::walk`].
pub struct Walk<'a, T> {
    stack: Vec<(usize, &'a TreeNode<T>)>,
}

impl<'a, T> Iterator for Walk<'a, T> {
    type Item = (usize, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        // Reverse so the first child is popped next.
        self.stack
            .extend(node.children.iter().rev().map(|child| (depth + 1, child)));
        Some((depth, &node.item))
    }
}
